use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::traversal::Traversal;
use super::Move;

/// Cell value: 0 for empty, a power of two >= 2 for a tile, or [`OBSTACLE`].
pub type Tile = i64;

/// Reserved value for an immovable, unmergeable cell.
pub const OBSTACLE: Tile = -1;

pub const MIN_SIZE: usize = 2;
pub const MAX_SIZE: usize = 8;

/// Largest tile a board may hold. Two of them never merge, so every merge
/// result and the sum of a move's merges stay well inside `i64`/`u64`.
pub const MAX_TILE: Tile = 1 << 61;

/// Zero-based (row, col) coordinate on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

/// True for 0, [`OBSTACLE`] and powers of two in `2..=MAX_TILE`.
#[inline]
pub fn is_legal_value(value: Tile) -> bool {
    value == 0
        || value == OBSTACLE
        || ((2..=MAX_TILE).contains(&value) && (value as u64).is_power_of_two())
}

/// Tiles that may still combine with an equal neighbour.
#[inline]
fn is_mergeable(value: Tile) -> bool {
    value > 0 && value < MAX_TILE
}

/// Square N×N board stored row-major.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<Tile>,
}

/// Outcome of sliding a board in one direction, before any spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub board: Board,
    pub moved: bool,
    /// Destination cell of every merge, in the order the merges happened.
    pub merged_positions: Vec<Position>,
    /// Sum of the values created by merges.
    pub score_gained: u64,
    /// Largest value created by a merge, 0 if none.
    pub max_merged: Tile,
}

impl Board {
    /// An all-empty board. `size` is clamped to [`MIN_SIZE`]..=[`MAX_SIZE`].
    pub fn empty(size: usize) -> Self {
        let size = size.clamp(MIN_SIZE, MAX_SIZE);
        Board { size, cells: vec![0; size * size] }
    }

    /// Build a board from rows without validating values.
    ///
    /// Callers restoring untrusted data go through
    /// [`GameState::validate`](super::GameState::validate) first.
    pub(crate) fn from_rows_unchecked(rows: &[Vec<Tile>]) -> Self {
        let size = rows.len();
        let cells = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Board { size, cells }
    }

    pub fn to_rows(&self) -> Vec<Vec<Tile>> {
        self.cells.chunks(self.size).map(|r| r.to_vec()).collect()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn index(&self, pos: Position) -> usize {
        pos.row * self.size + pos.col
    }

    /// Value at `pos`. Panics if `pos` is outside the board.
    #[inline]
    pub fn get(&self, pos: Position) -> Tile {
        self.cells[self.index(pos)]
    }

    #[inline]
    pub(crate) fn set(&mut self, pos: Position, value: Tile) {
        let idx = self.index(pos);
        self.cells[idx] = value;
    }

    /// Empty cells in row-major order.
    pub fn empty_positions(&self) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 0)
            .map(|(i, _)| Position::new(i / self.size, i % self.size))
            .collect()
    }

    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|&&v| v == 0).count()
    }

    pub fn count_obstacles(&self) -> usize {
        self.cells.iter().filter(|&&v| v == OBSTACLE).count()
    }

    /// Highest tile value on the board, 0 when there are no tiles.
    pub fn highest_tile(&self) -> Tile {
        self.cells.iter().copied().max().unwrap_or(0).max(0)
    }

    /// Uniformly choose one empty cell.
    pub fn random_empty<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        let empties = self.empty_positions();
        if empties.is_empty() {
            return None;
        }
        Some(empties[rng.gen_range(0..empties.len())])
    }

    /// Place a 2 (or a 4 with probability `four_probability`) in a random empty cell.
    pub fn spawn_random_tile<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        four_probability: f64,
    ) -> Option<Position> {
        let pos = self.random_empty(rng)?;
        let value = if rng.gen::<f64>() < four_probability { 4 } else { 2 };
        self.set(pos, value);
        Some(pos)
    }

    /// Slide and merge every line toward the edge named by `direction`. No randomness.
    ///
    /// A cell that received a merge is locked for the rest of the move, so
    /// `[2, 2, 4, 4]` shifted right gives `[0, 0, 4, 8]` and never `[0, 0, 0, 16]`.
    pub fn shift(&self, direction: Move) -> Shift {
        let traversal = Traversal::for_move(direction, self.size);
        let mut next = self.clone();
        let mut locked = vec![false; self.cells.len()];
        let mut merged_positions = Vec::new();
        let mut score_gained = 0u64;
        let mut max_merged = 0;

        for pos in traversal.positions() {
            let value = next.get(pos);
            if value == 0 || value == OBSTACLE {
                continue;
            }
            let mut dest = pos;
            let mut blocker = None;
            while let Some(ahead) = traversal.ahead(dest) {
                if next.get(ahead) == 0 {
                    dest = ahead;
                } else {
                    blocker = Some(ahead);
                    break;
                }
            }
            let merge_into = blocker.filter(|&target| {
                next.get(target) == value && is_mergeable(value) && !locked[next.index(target)]
            });
            match merge_into.zip(value.checked_mul(2)) {
                Some((target, combined)) => {
                    next.set(pos, 0);
                    next.set(target, combined);
                    locked[next.index(target)] = true;
                    merged_positions.push(target);
                    score_gained = score_gained.saturating_add(combined as u64);
                    max_merged = max_merged.max(combined);
                }
                _ if dest != pos => {
                    next.set(dest, value);
                    next.set(pos, 0);
                }
                _ => {}
            }
        }

        let moved = next.cells != self.cells;
        Shift { board: next, moved, merged_positions, score_gained, max_merged }
    }

    /// True if there is no empty cell and no two orthogonal neighbours share a tile value.
    ///
    /// Each cell is compared with its right and lower neighbour only; that visits
    /// every adjacent pair exactly once. Obstacles and [`MAX_TILE`] tiles never
    /// match anything.
    pub fn is_terminal(&self) -> bool {
        let n = self.size;
        for row in 0..n {
            for col in 0..n {
                let v = self.get(Position::new(row, col));
                if v == 0 {
                    return false;
                }
                if !is_mergeable(v) {
                    continue;
                }
                if col + 1 < n && self.get(Position::new(row, col + 1)) == v {
                    return false;
                }
                if row + 1 < n && self.get(Position::new(row + 1, col)) == v {
                    return false;
                }
            }
        }
        true
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({}x{}, {:?})", self.size, self.size, self.to_rows())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(self.size * 8 - 1);
        for (i, row) in self.cells.chunks(self.size).enumerate() {
            if i > 0 {
                writeln!(f, "{}", rule)?;
            }
            let line: Vec<String> = row.iter().map(format_val).collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(val: &Tile) -> String {
    match *val {
        0 => String::from("       "),
        OBSTACLE => String::from("  ###  "),
        x => {
            let mut x = x.to_string();
            while x.len() < 7 {
                match x.len() {
                    6 => x = format!(" {}", x),
                    _ => x = format!(" {} ", x),
                }
            }
            x
        }
    }
}
