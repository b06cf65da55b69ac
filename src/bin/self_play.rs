// Self-play tool: pits two copies of the engine against each other
//
// Usage:
//   cargo run --release --bin self_play -- [--games N] [--config <path>] [--show]
//
// Each move gets the configured decision budget as its deadline.

use std::env;
use std::process;
use std::time::Instant;

use lightcycle_agent::arena::{Arena, GameResult};
use lightcycle_agent::bot::Bot;
use lightcycle_agent::config::Config;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut games = 1usize;
    let mut config_path = "Agent.toml".to_string();
    let mut show = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--games" if i + 1 < args.len() => {
                games = args[i + 1].parse().unwrap_or_else(|e| {
                    eprintln!("Error: invalid game count '{}': {}", args[i + 1], e);
                    process::exit(1);
                });
                i += 1;
            }
            "--config" if i + 1 < args.len() => {
                config_path = args[i + 1].clone();
                i += 1;
            }
            "--show" => show = true,
            other => {
                eprintln!("Usage: {} [--games N] [--config <path>] [--show]", args[0]);
                eprintln!("Error: unexpected argument '{}'", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = Config::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", config_path, e);
        Config::default_hardcoded()
    });
    let budget_ms = config.timing.decision_budget_ms;
    let arena_config = config.arena.clone();
    let bot = Bot::new(config);

    let mut tally = [0usize; 3];
    let started = Instant::now();

    for game in 1..=games {
        let mut arena = Arena::new(&arena_config).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        });

        let result = arena.play(|_, state| {
            let mut state = state.clone();
            state.deadline_ms = Some(budget_ms);
            bot.choose_move(&state)
        });

        if show {
            println!("{}", arena);
        }
        println!(
            "Game {}: {:?} after {} turns (lengths {} vs {})",
            game,
            result,
            arena.turns(),
            arena.trail_len(0),
            arena.trail_len(1)
        );

        tally[match result {
            GameResult::Agent1Win => 0,
            GameResult::Agent2Win => 1,
            GameResult::Draw => 2,
        }] += 1;
    }

    println!("\n═══════════════════════════════════════════════════════════");
    println!("                  SELF-PLAY SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!("Games:        {}", games);
    println!("Agent 1 wins: {}", tally[0]);
    println!("Agent 2 wins: {}", tally[1]);
    println!("Draws:        {}", tally[2]);
    println!("Total time:   {}ms", started.elapsed().as_millis());
    println!("═══════════════════════════════════════════════════════════");
}
