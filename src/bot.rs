// Move selection
//
// Enumerates legal directions, scores each through the heuristic and returns
// the arg-max. Ties go to the first direction in UP, DOWN, LEFT, RIGHT order.
// A candidate whose evaluation errors or panics is dropped from selection;
// the engine itself never propagates an error out of a decision.

use log::{info, warn};
use rand::seq::IndexedRandom;
use rayon::prelude::*;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::debug_logger::DebugLogger;
use crate::heuristic::{EvalContext, Evaluation, Heuristic};
use crate::simple_profiler;
use crate::space::{Deadline, FloodFillCache, SearchLimits};
use crate::types::{Direction, GameState};

/// Execution strategy based on candidate count and hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecutionStrategy {
    Sequential,
    Parallel,
}

/// How a single candidate fared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Scored,
    Fatal,
    /// Evaluation raised an error or panicked; excluded from selection
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub direction: Direction,
    pub score: f64,
    pub outcome: Outcome,
}

/// Why the selector could not simply take the arg-max
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// No legal direction existed
    Trapped,
    /// Every candidate failed to evaluate
    AllCandidatesFailed,
    /// The budget ran out; the answer is the best candidate scored in time
    Timeout,
}

/// Result of one decision
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub direction: Direction,
    pub score: f64,
    pub candidates: Vec<CandidateScore>,
    pub fallback: Option<Fallback>,
}

/// Slot value for a direction that has not been scored yet
const UNSCORED: u64 = u64::MAX;

/// Lock-free shared state between the async poller and the blocking selector
///
/// Every scored candidate lands in its own slot, so workers never race on a
/// single best value; readers reduce the slots with the selector's tie-break.
#[derive(Debug)]
pub struct SharedDecisionState {
    /// Answer used until a candidate has been scored (direction index)
    seed_move: AtomicU8,
    /// Candidate scores as f64 bits, indexed by `Direction::index`
    candidate_scores: [AtomicU64; 4],
    final_move: AtomicU8,
    final_score: AtomicU64,
    search_complete: AtomicBool,
}

impl SharedDecisionState {
    pub fn new(seed: Direction) -> Self {
        SharedDecisionState {
            seed_move: AtomicU8::new(seed.index()),
            candidate_scores: std::array::from_fn(|_| AtomicU64::new(UNSCORED)),
            final_move: AtomicU8::new(seed.index()),
            final_score: AtomicU64::new(f64::NEG_INFINITY.to_bits()),
            search_complete: AtomicBool::new(false),
        }
    }

    /// Publishes one evaluated candidate; failed ones are never selectable
    fn record(&self, candidate: &CandidateScore) {
        if candidate.outcome != Outcome::Failed {
            self.candidate_scores[candidate.direction.index() as usize]
                .store(candidate.score.to_bits(), Ordering::Release);
        }
    }

    fn finish(&self, direction: Direction, score: f64) {
        self.final_move.store(direction.index(), Ordering::Release);
        self.final_score.store(score.to_bits(), Ordering::Release);
        self.search_complete.store(true, Ordering::Release);
    }

    /// Final decision if complete, else the first maximum among scored
    /// candidates in UP, DOWN, LEFT, RIGHT order, else the seed
    pub fn get_best(&self) -> (Direction, f64) {
        if self.is_complete() {
            return (
                Self::direction_at(&self.final_move),
                f64::from_bits(self.final_score.load(Ordering::Acquire)),
            );
        }

        let mut best: Option<(Direction, f64)> = None;
        for direction in Direction::all() {
            let bits = self.candidate_scores[direction.index() as usize].load(Ordering::Acquire);
            if bits == UNSCORED {
                continue;
            }
            let score = f64::from_bits(bits);
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((direction, score));
            }
        }
        best.unwrap_or((Self::direction_at(&self.seed_move), f64::NEG_INFINITY))
    }

    pub fn is_complete(&self) -> bool {
        self.search_complete.load(Ordering::Acquire)
    }

    fn direction_at(slot: &AtomicU8) -> Direction {
        Direction::from_index(slot.load(Ordering::Acquire)).unwrap_or(Direction::Up)
    }
}

/// Light-cycle decision engine
/// Takes static configuration and exposes the per-tick decision entry points
#[derive(Clone)]
pub struct Bot {
    config: Config,
    heuristic: Heuristic,
    logger: DebugLogger,
}

impl Bot {
    /// Creates a new Bot with logging disabled
    pub fn new(config: Config) -> Self {
        Self::with_logger(config, DebugLogger::disabled())
    }

    pub fn with_logger(config: Config, logger: DebugLogger) -> Self {
        let heuristic = Heuristic::new(&config);
        Bot {
            config,
            heuristic,
            logger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn heuristic(&self) -> &Heuristic {
        &self.heuristic
    }

    /// Picks a direction for the evaluating agent.
    ///
    /// Honours the snapshot's `deadline_ms` if present, otherwise runs the
    /// estimators to completion.
    pub fn choose_move(&self, state: &GameState) -> Direction {
        let deadline = Deadline::from_millis(state.deadline_ms);
        self.decide(state, deadline, None).direction
    }

    /// Computes the next move within the decision budget
    ///
    /// 1. Seeds the shared state with the first legal move
    /// 2. Runs selection on a blocking task, with the estimators cut off
    ///    `scoring_margin_ms` before the budget so scoring can still finish
    /// 3. Polls shared state until completion or the budget elapses
    /// 4. Returns the best candidate scored so far (anytime property)
    pub async fn get_move(&self, state: &GameState) -> Direction {
        let start_time = Instant::now();
        let legal_moves = state.board.legal_moves(&state.you);
        let Some(&seed) = legal_moves.first() else {
            // Nothing to search: the trapped fallback is immediate
            let decision = self.decide(state, Deadline::none(), None);
            self.logger.log_move(state.turn, state.clone(), decision.clone());
            return decision.direction;
        };

        let timing = &self.config.timing;
        let budget_ms = state.deadline_ms.unwrap_or(timing.decision_budget_ms);
        let poll_deadline = Deadline::after(Duration::from_millis(budget_ms));
        let search_deadline =
            Deadline::after(Duration::from_millis(timing.search_budget_ms(budget_ms)));

        let shared = Arc::new(SharedDecisionState::new(seed));
        let shared_clone = shared.clone();
        let bot = self.clone();
        let state_clone = state.clone();

        let handle = tokio::task::spawn_blocking(move || {
            bot.decide(&state_clone, search_deadline, Some(&shared_clone))
        });

        let polling_interval = Duration::from_millis(timing.polling_interval_ms.max(1));
        while !shared.is_complete() && !poll_deadline.expired() {
            tokio::time::sleep(polling_interval).await;
        }

        if shared.is_complete() {
            match handle.await {
                Ok(decision) => {
                    self.logger.log_move(state.turn, state.clone(), decision.clone());
                    return decision.direction;
                }
                Err(e) => warn!("Turn {}: selection task failed: {}", state.turn, e),
            }
        }

        let (direction, score) = shared.get_best();
        warn!(
            "Turn {}: budget of {}ms exhausted after {}ms, answering {} (score: {:.3})",
            state.turn,
            budget_ms,
            start_time.elapsed().as_millis(),
            direction,
            score
        );
        self.logger.log_move(
            state.turn,
            state.clone(),
            Decision {
                direction,
                score,
                candidates: Vec::new(),
                fallback: Some(Fallback::Timeout),
            },
        );
        direction
    }

    /// Full decision with per-candidate scores
    ///
    /// # Arguments
    /// * `state` - Validated snapshot for this tick
    /// * `deadline` - Cut-off for the longest-path and territory estimators
    /// * `shared` - Optional best-so-far channel for an async poller
    pub fn decide(
        &self,
        state: &GameState,
        deadline: Deadline,
        shared: Option<&SharedDecisionState>,
    ) -> Decision {
        let start_time = Instant::now();
        let decision = self.decide_internal(state, deadline, shared);

        if let Some(shared) = shared {
            shared.finish(decision.direction, decision.score);
        }

        if simple_profiler::is_profiling_enabled() {
            rayon::broadcast(|_| simple_profiler::merge_thread_local());
            simple_profiler::merge_thread_local();
        }

        info!(
            "Turn {}: Chose {} (score: {:.3}, candidates: {}, time: {}ms)",
            state.turn,
            decision.direction,
            decision.score,
            decision.candidates.len(),
            start_time.elapsed().as_millis()
        );

        decision
    }

    fn decide_internal(
        &self,
        state: &GameState,
        deadline: Deadline,
        shared: Option<&SharedDecisionState>,
    ) -> Decision {
        let legal_moves = state.board.legal_moves(&state.you);

        if legal_moves.is_empty() {
            let direction = self.trapped_fallback(state);
            info!("No legal moves available, falling back to {}", direction);
            return Decision {
                direction,
                score: self.heuristic.fatal_score(),
                candidates: Vec::new(),
                fallback: Some(Fallback::Trapped),
            };
        }

        let cache = FloodFillCache::new();
        let ctx = EvalContext {
            limits: SearchLimits {
                deadline,
                check_interval: self.config.timing.deadline_check_interval,
            },
            cache: &cache,
        };

        // Each candidate is published as soon as it is scored
        let score_and_publish = |dir: Direction| {
            let candidate = self.evaluate_candidate(state, dir, &ctx);
            if let Some(shared) = shared {
                shared.record(&candidate);
            }
            candidate
        };

        let candidates: Vec<CandidateScore> = match self.determine_strategy(legal_moves.len()) {
            ExecutionStrategy::Parallel => legal_moves
                .par_iter()
                .map(|&dir| score_and_publish(dir))
                .collect(),
            ExecutionStrategy::Sequential => {
                legal_moves.iter().map(|&dir| score_and_publish(dir)).collect()
            }
        };

        match Self::arg_max(&candidates) {
            Some(best) => Decision {
                direction: best.direction,
                score: best.score,
                fallback: None,
                candidates,
            },
            None => {
                let direction = self.config.selection.default_direction;
                warn!(
                    "All {} candidates failed to evaluate, using default {}",
                    candidates.len(),
                    direction
                );
                Decision {
                    direction,
                    score: self.heuristic.fatal_score(),
                    fallback: Some(Fallback::AllCandidatesFailed),
                    candidates,
                }
            }
        }
    }

    fn determine_strategy(&self, num_candidates: usize) -> ExecutionStrategy {
        let strategy = &self.config.strategy;
        if strategy.parallel
            && num_candidates > 1
            && rayon::current_num_threads() >= strategy.min_cpus_for_parallel
        {
            ExecutionStrategy::Parallel
        } else {
            ExecutionStrategy::Sequential
        }
    }

    /// Scores one candidate, containing errors and panics to that candidate
    fn evaluate_candidate(
        &self,
        state: &GameState,
        direction: Direction,
        ctx: &EvalContext<'_>,
    ) -> CandidateScore {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.heuristic.evaluate(state, direction, ctx)
        }));

        let fatal = self.heuristic.fatal_score();
        match result {
            Ok(Ok(evaluation)) => CandidateScore {
                direction,
                score: self.heuristic.to_score(&evaluation),
                outcome: match evaluation {
                    Evaluation::Fatal => Outcome::Fatal,
                    Evaluation::Scored(_) => Outcome::Scored,
                },
            },
            Ok(Err(e)) => {
                warn!("Evaluation of {} failed: {}", direction, e);
                CandidateScore {
                    direction,
                    score: fatal,
                    outcome: Outcome::Failed,
                }
            }
            Err(_) => {
                warn!("Evaluation of {} panicked", direction);
                CandidateScore {
                    direction,
                    score: fatal,
                    outcome: Outcome::Failed,
                }
            }
        }
    }

    /// First maximum among candidates that evaluated, in input order
    fn arg_max(candidates: &[CandidateScore]) -> Option<&CandidateScore> {
        candidates
            .iter()
            .filter(|c| c.outcome != Outcome::Failed)
            .fold(None, |best: Option<&CandidateScore>, c| match best {
                Some(b) if b.score >= c.score => Some(b),
                _ => Some(c),
            })
    }

    /// Any in-bounds direction if one exists, else any direction at all
    fn trapped_fallback(&self, state: &GameState) -> Direction {
        let all = Direction::all();
        let in_bounds: Vec<Direction> = all
            .into_iter()
            .filter(|dir| state.board.in_bounds(&dir.apply(&state.you)))
            .collect();
        let pool: &[Direction] = if in_bounds.is_empty() { &all } else { &in_bounds };

        pool.choose(&mut rand::rng())
            .copied()
            .unwrap_or(self.config.selection.default_direction)
    }
}
