// Line-oriented agent process
//
// Reads one JSON snapshot per line on stdin and answers with one uppercase
// direction per line on stdout. Logs go to stderr so they never interleave
// with answers.

use log::{error, info};
use std::env;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use lightcycle_agent::bot::Bot;
use lightcycle_agent::config::Config;
use lightcycle_agent::debug_logger::DebugLogger;
use lightcycle_agent::error::EngineError;
use lightcycle_agent::simple_profiler;
use lightcycle_agent::types::GameState;

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    info!("Starting light-cycle agent...");

    // Load configuration once at startup
    let config = Config::load_or_default();
    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;
    let fallback = config.selection.default_direction;
    let bot = Bot::with_logger(config, logger.clone());

    let started = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut ticks = 0u64;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        ticks += 1;

        let direction = match GameState::from_json(&line) {
            Ok(state) => bot.get_move(&state).await,
            Err(e) => {
                // The harness waits for exactly one answer per snapshot
                error!("Rejected snapshot: {}", e);
                fallback
            }
        };

        stdout
            .write_all(format!("{}\n", direction.as_str()).as_bytes())
            .await?;
        stdout.flush().await?;
    }

    info!("Input closed after {} snapshot(s)", ticks);
    logger.flush().await;

    if simple_profiler::is_profiling_enabled() {
        simple_profiler::merge_thread_local();
        simple_profiler::print_report(started.elapsed().as_millis() as u64);
    }

    Ok(())
}
