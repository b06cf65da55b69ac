// Reference light-cycle simulator
//
// Rules: every visited cell becomes permanent trail. Agents move in order
// (agent 1, then agent 2). Entering any trail cell kills the mover; entering
// the other agent's current head kills both. A request to reverse is ignored
// and the agent does not advance that turn. After `max_turns` the longer
// trail wins.

use std::fmt;

use crate::board::Board;
use crate::config::ArenaConfig;
use crate::error::EngineError;
use crate::types::{Direction, GameState, Position};

/// Final outcome of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Agent1Win,
    Agent2Win,
    Draw,
}

#[derive(Debug, Clone)]
struct Cycle {
    trail: Vec<Position>,
    direction: Direction,
    alive: bool,
}

impl Cycle {
    fn head(&self) -> Position {
        self.trail[self.trail.len() - 1]
    }
}

/// Two-agent game state with its occupancy grid
#[derive(Debug, Clone)]
pub struct Arena {
    height: usize,
    width: usize,
    wrap: bool,
    max_turns: u32,
    /// Index of the agent whose trail covers each cell
    owner: Vec<Option<usize>>,
    cycles: [Cycle; 2],
    turns: u32,
}

impl Arena {
    /// Creates an arena with both agents on their starting two-cell trails
    pub fn new(config: &ArenaConfig) -> Result<Self, EngineError> {
        let (height, width) = (config.height, config.width);
        if height < 5 || width < 5 {
            return Err(EngineError::Config(format!(
                "arena must be at least 5x5, got {}x{}",
                height, width
            )));
        }

        let (h, w) = (height as i32, width as i32);
        let mut arena = Arena {
            height,
            width,
            wrap: config.wrap,
            max_turns: config.max_turns,
            owner: vec![None; height * width],
            cycles: [
                Cycle {
                    trail: vec![Position::new(2, 1), Position::new(2, 2)],
                    direction: Direction::Right,
                    alive: true,
                },
                Cycle {
                    trail: vec![Position::new(h - 3, w - 3), Position::new(h - 3, w - 4)],
                    direction: Direction::Left,
                    alive: true,
                },
            ],
            turns: 0,
        };

        for idx in 0..2 {
            for pos in arena.cycles[idx].trail.clone() {
                if arena.owner[arena.cell_index(&pos)].is_some() {
                    return Err(EngineError::Config(format!(
                        "starting trails overlap on a {}x{} arena",
                        height, width
                    )));
                }
                arena.claim(pos, idx);
            }
        }
        Ok(arena)
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn head(&self, agent: usize) -> Position {
        self.cycles[agent].head()
    }

    pub fn trail_len(&self, agent: usize) -> usize {
        self.cycles[agent].trail.len()
    }

    pub fn is_alive(&self, agent: usize) -> bool {
        self.cycles[agent].alive
    }

    fn cell_index(&self, pos: &Position) -> usize {
        pos.row as usize * self.width + pos.col as usize
    }

    fn claim(&mut self, pos: Position, agent: usize) {
        let idx = self.cell_index(&pos);
        self.owner[idx] = Some(agent);
    }

    /// Trail walls as the engine sees them
    pub fn board(&self) -> Board {
        let mut board = Board::new(self.height, self.width);
        for (idx, owner) in self.owner.iter().enumerate() {
            if owner.is_some() {
                let pos = Position::new((idx / self.width) as i32, (idx % self.width) as i32);
                board.set_wall(&pos);
            }
        }
        board
    }

    /// Snapshot from `agent`'s point of view
    pub fn snapshot(&self, agent: usize) -> GameState {
        let opponent = &self.cycles[1 - agent];
        let mut state = GameState::new(
            self.board(),
            self.head(agent),
            opponent.head(),
            opponent.direction,
        );
        state.turn = self.turns;
        state
    }

    /// Destination of a step, or None when it leaves a bounded arena
    fn advance(&self, from: Position, direction: Direction) -> Option<Position> {
        let next = direction.apply(&from);
        if self.wrap {
            Some(Position::new(
                next.row.rem_euclid(self.height as i32),
                next.col.rem_euclid(self.width as i32),
            ))
        } else if next.row >= 0
            && next.col >= 0
            && (next.row as usize) < self.height
            && (next.col as usize) < self.width
        {
            Some(next)
        } else {
            None
        }
    }

    /// Moves one agent; returns whether it is still alive
    fn move_agent(&mut self, agent: usize, direction: Direction) -> bool {
        if !self.cycles[agent].alive {
            return false;
        }
        if direction == self.cycles[agent].direction.opposite() {
            return true;
        }

        self.cycles[agent].direction = direction;
        let Some(next) = self.advance(self.head(agent), direction) else {
            self.cycles[agent].alive = false;
            return false;
        };

        if self.owner[self.cell_index(&next)].is_some() {
            let other = 1 - agent;
            if self.cycles[other].alive && self.head(other) == next {
                self.cycles[other].alive = false;
            }
            self.cycles[agent].alive = false;
            return false;
        }

        self.cycles[agent].trail.push(next);
        self.claim(next, agent);
        true
    }

    /// Advances one turn; returns the result once the game is over
    pub fn step(&mut self, dir1: Direction, dir2: Direction) -> Option<GameResult> {
        if self.turns >= self.max_turns {
            return Some(match self.trail_len(0).cmp(&self.trail_len(1)) {
                std::cmp::Ordering::Greater => GameResult::Agent1Win,
                std::cmp::Ordering::Less => GameResult::Agent2Win,
                std::cmp::Ordering::Equal => GameResult::Draw,
            });
        }

        self.move_agent(0, dir1);
        self.move_agent(1, dir2);
        self.turns += 1;

        match (self.cycles[0].alive, self.cycles[1].alive) {
            (false, false) => Some(GameResult::Draw),
            (false, true) => Some(GameResult::Agent2Win),
            (true, false) => Some(GameResult::Agent1Win),
            (true, true) => None,
        }
    }

    /// Plays to completion, asking `choose(agent, snapshot)` for every move
    pub fn play<F>(&mut self, mut choose: F) -> GameResult
    where
        F: FnMut(usize, &GameState) -> Direction,
    {
        loop {
            let dir1 = choose(0, &self.snapshot(0));
            let dir2 = choose(1, &self.snapshot(1));
            if let Some(result) = self.step(dir1, dir2) {
                return result;
            }
        }
    }
}

impl fmt::Display for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heads = [self.head(0), self.head(1)];
        for row in 0..self.height {
            let line: String = (0..self.width)
                .map(|col| {
                    let pos = Position::new(row as i32, col as i32);
                    match self.owner[self.cell_index(&pos)] {
                        Some(0) if heads[0] == pos => 'A',
                        Some(1) if heads[1] == pos => 'B',
                        Some(0) => 'a',
                        Some(_) => 'b',
                        None => '.',
                    }
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
