// Replay module for analyzing logged decisions
//
// This module provides functionality to:
// 1. Parse JSONL debug logs
// 2. Re-run the engine on each logged state
// 3. Compare logged vs replayed moves
// 4. Validate expected moves for regression checks

use log::{info, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::bot::{Bot, Fallback};
use crate::config::Config;
use crate::space::Deadline;
use crate::types::{Direction, GameState};

/// Represents a single log entry from the debug JSONL file
#[derive(Debug, Deserialize, Clone)]
pub struct LogEntry {
    pub turn: u32,
    pub chosen_move: Direction,
    pub state: GameState,
    pub timestamp: String,
}

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: u32,
    pub original_move: Direction,
    pub replayed_move: Direction,
    pub matches: bool,
    pub replayed_score: f64,
    pub fallback: Option<Fallback>,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    bot: Bot,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine {
            bot: Bot::new(config),
            verbose,
        }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Replays a single log entry and compares the result.
    /// Runs without a deadline so the replay is deterministic.
    pub fn replay_entry(&self, entry: &LogEntry) -> ReplayResult {
        if self.verbose {
            info!("Replaying turn {}...", entry.turn);
        }

        let start_time = Instant::now();
        let decision = self.bot.decide(&entry.state, Deadline::none(), None);
        let computation_time = start_time.elapsed().as_millis();

        let matches = decision.direction == entry.chosen_move;
        let result = ReplayResult {
            turn: entry.turn,
            original_move: entry.chosen_move,
            replayed_move: decision.direction,
            matches,
            replayed_score: decision.score,
            fallback: decision.fallback,
            computation_time_ms: computation_time,
        };

        if self.verbose {
            if matches {
                info!(
                    "Turn {}: ✓ MATCH - {} (score: {:.3}, time: {}ms)",
                    entry.turn, decision.direction, decision.score, computation_time
                );
            } else {
                warn!(
                    "Turn {}: ✗ MISMATCH - Original: {}, Replayed: {} (score: {:.3}, time: {}ms)",
                    entry.turn, entry.chosen_move, decision.direction, decision.score, computation_time
                );
            }
        }

        result
    }

    /// Replays all entries in a log file
    pub fn replay_all(&self, entries: &[LogEntry]) -> Vec<ReplayResult> {
        entries.iter().map(|entry| self.replay_entry(entry)).collect()
    }

    /// Replays specific turns from a log file
    pub fn replay_turns(
        &self,
        entries: &[LogEntry],
        turn_numbers: &[u32],
    ) -> Result<Vec<ReplayResult>, String> {
        turn_numbers
            .iter()
            .map(|turn_num| {
                entries
                    .iter()
                    .find(|e| e.turn == *turn_num)
                    .map(|entry| self.replay_entry(entry))
                    .ok_or_else(|| format!("Turn {} not found in log file", turn_num))
            })
            .collect()
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results
                .iter()
                .map(|r| r.computation_time_ms as f64)
                .sum::<f64>()
                / results.len() as f64;
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                let note = match result.fallback {
                    Some(Fallback::Trapped) => " [trapped, random fallback]",
                    Some(Fallback::AllCandidatesFailed) => " [evaluation failed]",
                    Some(Fallback::Timeout) => " [budget exhausted]",
                    None => "",
                };
                println!(
                    "Turn {}: {} → {} (score: {:.3}, time: {}ms){}",
                    result.turn,
                    result.original_move,
                    result.replayed_move,
                    result.replayed_score,
                    result.computation_time_ms,
                    note
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were made
    pub fn validate_expected_moves(
        &self,
        entries: &[LogEntry],
        expected_moves: &[(u32, Vec<Direction>)], // (turn, acceptable_moves)
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            if !acceptable.contains(&entry.chosen_move) {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    turn,
                    acceptable.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    entry.chosen_move
                ));
            }
        }

        Ok(())
    }
}
