// Debug logging module for asynchronous decision logging
//
// Fire-and-forget async logging so the decision loop never waits on disk.
// Each decision is written as one JSONL line that the replay tool can load.

use log::error;
use serde::Serialize;
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::bot::{CandidateScore, Decision, Fallback};
use crate::types::{Direction, GameState};

/// Represents a single debug log entry
#[derive(Debug, Serialize)]
struct DebugLogEntry {
    turn: u32,
    chosen_move: Direction,
    state: GameState,
    candidates: Vec<CandidateScore>,
    fallback: Option<Fallback>,
    timestamp: String,
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    /// Write tasks spawned by `log_move` that may still be running
    pending: Arc<parking_lot::Mutex<Vec<JoinHandle<()>>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    pending: Arc::new(parking_lot::Mutex::new(Vec::new())),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            pending: Arc::new(parking_lot::Mutex::new(Vec::new())),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a decision asynchronously (fire-and-forget)
    /// Must be called from within a tokio runtime
    pub fn log_move(&self, turn: u32, state: GameState, decision: Decision) {
        if !self.enabled {
            return;
        }

        let file_handle = self.file.clone();
        let entry = DebugLogEntry {
            turn,
            chosen_move: decision.direction,
            state,
            candidates: decision.candidates,
            fallback: decision.fallback,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let handle = tokio::spawn(async move {
            Self::write_entry(file_handle, entry).await;
        });

        let mut pending = self.pending.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Waits for every spawned write to finish, then flushes the file
    pub async fn flush(&self) {
        let handles = std::mem::take(&mut *self.pending.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Debug log write task failed: {}", e);
            }
        }

        let mut file_guard = self.file.lock().await;
        if let Some(file) = file_guard.as_mut() {
            if let Err(e) = file.flush().await {
                error!("Failed to flush debug log: {}", e);
            }
        }
    }

    async fn write_entry(file_handle: Arc<Mutex<Option<File>>>, entry: DebugLogEntry) {
        let mut file_guard = file_handle.lock().await;

        if let Some(file) = file_guard.as_mut() {
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    let line_with_newline = format!("{}\n", json_line);
                    if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                        error!("Failed to write debug log entry: {}", e);
                    } else if let Err(e) = file.flush().await {
                        error!("Failed to flush debug log: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize debug log entry: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::types::Position;

    fn decision(direction: Direction) -> Decision {
        Decision {
            direction,
            score: 0.25,
            candidates: Vec::new(),
            fallback: None,
        }
    }

    #[tokio::test]
    async fn test_flush_waits_for_spawned_writes() {
        let path = std::env::temp_dir().join(format!("debug-log-flush-{}.jsonl", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        let logger = DebugLogger::new(true, &path_str).await;
        assert!(logger.is_enabled());

        let state = GameState::new(
            Board::new(3, 3),
            Position::new(0, 0),
            Position::new(2, 2),
            Direction::Up,
        );
        for turn in 0..25 {
            logger.log_move(turn, state.clone(), decision(Direction::Right));
        }
        logger.flush().await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 25);
        assert!(contents.lines().all(|l| l.contains("\"chosen_move\":\"RIGHT\"")));

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_disabled_logger_writes_nothing() {
        let logger = DebugLogger::disabled();
        let state = GameState::new(
            Board::new(1, 2),
            Position::new(0, 0),
            Position::new(0, 1),
            Direction::Up,
        );
        logger.log_move(0, state, decision(Direction::Up));
        logger.flush().await;
        assert!(logger.pending.lock().is_empty());
    }
}
