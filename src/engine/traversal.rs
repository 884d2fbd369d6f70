use super::board::Position;
use super::Move;

/// Scan order and step vector for one move direction.
///
/// Cells are visited starting from the line nearest the destination edge so
/// that tiles against the wall settle before the tiles behind them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    /// (row delta, col delta) pointing toward the destination edge.
    pub step: (isize, isize),
    size: usize,
}

impl Traversal {
    pub fn for_move(direction: Move, size: usize) -> Self {
        let forward: Vec<usize> = (0..size).collect();
        let backward: Vec<usize> = (0..size).rev().collect();
        let (rows, cols, step) = match direction {
            Move::Up => (forward.clone(), forward, (-1, 0)),
            Move::Down => (backward, forward, (1, 0)),
            Move::Left => (forward.clone(), forward, (0, -1)),
            Move::Right => (forward, backward, (0, 1)),
        };
        Traversal { rows, cols, step, size }
    }

    /// All positions in scan order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.rows
            .iter()
            .flat_map(move |&row| self.cols.iter().map(move |&col| Position::new(row, col)))
    }

    /// The neighbour of `pos` one step toward the destination edge, if any.
    #[inline]
    pub fn ahead(&self, pos: Position) -> Option<Position> {
        let row = pos.row.checked_add_signed(self.step.0)?;
        let col = pos.col.checked_add_signed(self.step.1)?;
        (row < self.size && col < self.size).then(|| Position::new(row, col))
    }
}
