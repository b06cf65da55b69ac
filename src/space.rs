// Space analysis: reachability, approximate longest safe path, territory threat
//
// All routines take the board by shared reference and never mutate it. The
// longest-path and territory estimators are anytime: when the deadline fires
// they stop expanding and return the best estimate found so far.

use log::debug;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::board::Board;
use crate::profile;
use crate::simple_profiler::{self, Category};
use crate::types::Position;

/// Optional wall-clock cut-off for a decision
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never fires
    pub fn none() -> Self {
        Deadline { at: None }
    }

    pub fn after(budget: Duration) -> Self {
        Deadline {
            at: Some(Instant::now() + budget),
        }
    }

    pub fn from_millis(budget_ms: Option<u64>) -> Self {
        budget_ms
            .map(|ms| Self::after(Duration::from_millis(ms)))
            .unwrap_or_default()
    }

    pub fn expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }
}

/// Deadline plus how often the estimators look at the clock
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub deadline: Deadline,
    pub check_interval: usize,
}

impl SearchLimits {
    pub fn unbounded() -> Self {
        SearchLimits {
            deadline: Deadline::none(),
            check_interval: usize::MAX,
        }
    }

    fn ticker(&self) -> Ticker {
        Ticker {
            deadline: self.deadline,
            interval: self.check_interval.max(1),
            count: 0,
        }
    }
}

/// Amortizes clock reads over node expansions
struct Ticker {
    deadline: Deadline,
    interval: usize,
    count: usize,
}

impl Ticker {
    fn expired(&mut self) -> bool {
        self.count += 1;
        self.count % self.interval == 0 && self.deadline.expired()
    }
}

/// Frontier discipline for the flood fill; the count does not depend on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    DepthFirst,
    BreadthFirst,
}

/// Number of open cells 4-connected to `start`, including `start`.
/// Returns 0 when `start` is off the board or not open.
pub fn flood_fill(board: &Board, start: Position) -> usize {
    flood_fill_with(board, start, Traversal::DepthFirst)
}

pub fn flood_fill_with(board: &Board, start: Position, order: Traversal) -> usize {
    profile!(Category::FloodFill, {
        let Some(start_idx) = board.index(&start) else {
            return 0;
        };
        if !board.is_open(&start) {
            return 0;
        }

        let mut seen = vec![false; board.area()];
        seen[start_idx] = true;
        let mut frontier = VecDeque::from([start]);
        let mut count = 1;

        loop {
            let next = match order {
                Traversal::DepthFirst => frontier.pop_back(),
                Traversal::BreadthFirst => frontier.pop_front(),
            };
            let Some(pos) = next else { break };

            for neighbor in board.neighbors(pos) {
                let Some(idx) = board.index(&neighbor) else {
                    continue;
                };
                if !seen[idx] && board.is_open(&neighbor) {
                    seen[idx] = true;
                    count += 1;
                    frontier.push_back(neighbor);
                }
            }
        }

        count
    })
}

/// Request-scoped memo of flood-fill results keyed by board content and start.
/// Owned by a single decision; dropping it discards every entry.
#[derive(Debug, Default)]
pub struct FloodFillCache {
    entries: Mutex<HashMap<Board, HashMap<Position, usize>>>,
}

impl FloodFillCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flood_fill(&self, board: &Board, start: Position) -> usize {
        let cached = self
            .entries
            .lock()
            .get(board)
            .and_then(|starts| starts.get(&start).copied());
        simple_profiler::record_cache_lookup(cached.is_some());
        if let Some(area) = cached {
            return area;
        }

        // Computed outside the lock so parallel candidates do not serialize
        let area = flood_fill(board, start);
        self.entries
            .lock()
            .entry(board.clone())
            .or_default()
            .insert(start, area);
        area
    }

    pub fn len(&self) -> usize {
        self.entries.lock().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fixed-capacity bit set of board indices on the current path
#[derive(Debug, Clone)]
struct PathSet {
    words: Vec<u64>,
    len: usize,
}

impl PathSet {
    fn with_capacity(cells: usize) -> Self {
        PathSet {
            words: vec![0; cells.div_ceil(64)],
            len: 0,
        }
    }

    fn contains(&self, idx: usize) -> bool {
        self.words[idx / 64] & (1 << (idx % 64)) != 0
    }

    fn insert(&mut self, idx: usize) {
        if !self.contains(idx) {
            self.words[idx / 64] |= 1 << (idx % 64);
            self.len += 1;
        }
    }
}

/// Approximate length of the longest simple path of open cells from `start`.
///
/// Depth-first exploration that never revisits a cell on the current path.
/// Each cell is expanded once; later arrivals reuse the memoized local
/// extension and add it to the length already walked. The memo ignores the
/// visited set, so the result is a heuristic lower-bound style estimate that
/// can over-count by a step, not a certified longest path. The start cell's
/// own state is not checked: it is usually the agent's occupied head.
pub fn longest_safe_path(board: &Board, start: Position, limits: &SearchLimits) -> usize {
    profile!(Category::LongestPath, {
        let Some(start_idx) = board.index(&start) else {
            return 0;
        };

        let area = board.area();
        let mut memo: Vec<Option<usize>> = vec![None; area];
        let mut stack = vec![(start_idx, start, PathSet::with_capacity(area))];
        let mut ticker = limits.ticker();
        let mut max_len = 0;

        while let Some((idx, pos, visited)) = stack.pop() {
            if ticker.expired() {
                debug!(
                    "longest_safe_path from {} cut off by deadline at {}",
                    start, max_len
                );
                break;
            }

            if let Some(best) = memo[idx] {
                max_len = max_len.max(best + visited.len);
                continue;
            }

            let mut path = visited.clone();
            path.insert(idx);

            let mut best_here = 0;
            for next in board.neighbors(pos) {
                let Some(next_idx) = board.index(&next) else {
                    continue;
                };
                if !board.is_open(&next) || visited.contains(next_idx) {
                    continue;
                }
                stack.push((next_idx, next, path.clone()));
                best_here = 1;
            }

            memo[idx] = Some(best_here);
            max_len = max_len.max(visited.len + best_here);
        }

        max_len
    })
}

/// BFS distances from `start` through open cells, capped at `max_depth`.
/// The start itself is always distance 0 even when it is walled (occupied head).
fn bounded_distances(
    board: &Board,
    start: Position,
    max_depth: usize,
    ticker: &mut Ticker,
) -> Vec<Option<usize>> {
    let mut dist = vec![None; board.area()];
    let Some(start_idx) = board.index(&start) else {
        return dist;
    };
    dist[start_idx] = Some(0);

    let mut queue = VecDeque::from([(start, 0usize)]);
    while let Some((pos, depth)) = queue.pop_front() {
        if ticker.expired() {
            break;
        }
        if depth >= max_depth {
            continue;
        }
        for next in board.neighbors(pos) {
            let Some(idx) = board.index(&next) else {
                continue;
            };
            if dist[idx].is_none() && board.is_open(&next) {
                dist[idx] = Some(depth + 1);
                queue.push_back((next, depth + 1));
            }
        }
    }

    dist
}

/// Fraction of the cells `you` reaches within `max_depth` that the opponent
/// reaches at least as fast (ties favour the opponent). In [0, 1]; 0.0 when
/// `you` reaches nothing. Lower is better for `you`.
pub fn territorial_threat(
    board: &Board,
    you: Position,
    opponent: Position,
    max_depth: usize,
    limits: &SearchLimits,
) -> f64 {
    profile!(Category::Territory, {
        let mut ticker = limits.ticker();
        let dist_you = bounded_distances(board, you, max_depth, &mut ticker);
        let dist_opp = bounded_distances(board, opponent, max_depth, &mut ticker);

        let mut total = 0usize;
        let mut contested = 0usize;
        for (mine, theirs) in dist_you.iter().zip(dist_opp.iter()) {
            if let Some(mine) = mine {
                total += 1;
                if theirs.is_some_and(|theirs| theirs <= *mine) {
                    contested += 1;
                }
            }
        }

        if total == 0 {
            0.0
        } else {
            contested as f64 / total as f64
        }
    })
}
