//! Board module - the playfield grid
//!
//! The board is `width` columns by `buffer + visible` rows, stored as a flat
//! row-major array. Row 0 is the top of the hidden buffer; the buffer is part
//! of the playfield for collision purposes and simply never rendered.
//!
//! Out-of-range coordinates passed to [`Board::is_occupied`] or
//! [`Board::lock`] are programming errors and panic. Collision queries that
//! naturally probe outside the grid (a piece pushed into a wall) go through
//! [`Board::can_place`], which treats outside cells as blocked.

use arrayvec::ArrayVec;

use crate::types::{Cell, PieceKind, Square};

/// Widest supported board.
pub const MAX_COLS: u8 = 40;
/// Tallest supported board (buffer + visible). Row sets are tracked in a `u128`.
pub const MAX_ROWS: u16 = 100;
/// A single four-cell piece can complete at most four rows.
pub const MAX_CLEARED_ROWS: usize = 4;

/// Rows completed by a lock, top to bottom.
pub type ClearedRows = ArrayVec<usize, MAX_CLEARED_ROWS>;

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    width: u8,
    height: u8,
    buffer_rows: u8,
    /// Row-major (row * width + col)
    cells: Vec<Cell>,
}

impl Board {
    /// Create an empty board. Dimensions are validated by the settings layer.
    pub fn new(width: u8, visible_rows: u8, buffer_rows: u8) -> Self {
        let height = visible_rows.saturating_add(buffer_rows);
        assert!(
            width <= MAX_COLS && u16::from(height) <= MAX_ROWS,
            "board {width}x{height} exceeds {MAX_COLS}x{MAX_ROWS}"
        );
        Self {
            width,
            height,
            buffer_rows,
            cells: vec![None; usize::from(width) * usize::from(height)],
        }
    }

    #[inline(always)]
    fn index(&self, row: i8, col: i8) -> Option<usize> {
        if row < 0 || col < 0 || row as u8 >= self.height || col as u8 >= self.width {
            return None;
        }
        Some(row as usize * usize::from(self.width) + col as usize)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// Total rows, buffer included.
    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn buffer_rows(&self) -> u8 {
        self.buffer_rows
    }

    pub fn visible_rows(&self) -> u8 {
        self.height - self.buffer_rows
    }

    pub fn in_bounds(&self, row: i8, col: i8) -> bool {
        self.index(row, col).is_some()
    }

    /// Cell at `(row, col)`, or `None` when outside the grid.
    pub fn get(&self, row: i8, col: i8) -> Option<Cell> {
        self.index(row, col).map(|idx| self.cells[idx])
    }

    /// Overwrite a cell. Returns false if out of bounds.
    pub fn set(&mut self, row: i8, col: i8, cell: Cell) -> bool {
        match self.index(row, col) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Whether `(row, col)` holds a locked cell.
    ///
    /// # Panics
    ///
    /// If the coordinate is outside `[0, height) x [0, width)`.
    pub fn is_occupied(&self, row: i8, col: i8) -> bool {
        match self.index(row, col) {
            Some(idx) => self.cells[idx].is_some(),
            None => panic!(
                "cell ({row}, {col}) is outside the {}x{} board",
                self.height, self.width
            ),
        }
    }

    /// In bounds and empty.
    pub fn is_free(&self, row: i8, col: i8) -> bool {
        matches!(self.get(row, col), Some(None))
    }

    /// True iff every square is in bounds and empty.
    pub fn can_place(&self, squares: &[Square]) -> bool {
        squares.iter().all(|&(row, col)| self.is_free(row, col))
    }

    /// Write `color` into every square.
    ///
    /// Callers must have checked [`Board::can_place`] with no mutation in between.
    pub fn lock(&mut self, squares: &[Square], color: PieceKind) {
        debug_assert!(self.can_place(squares), "lock over occupied cells");
        for &(row, col) in squares {
            match self.index(row, col) {
                Some(idx) => self.cells[idx] = Some(color),
                None => panic!("cannot lock outside the board at ({row}, {col})"),
            }
        }
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        let w = usize::from(self.width);
        &self.cells[row * w..(row + 1) * w]
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        row < usize::from(self.height) && self.row(row).iter().all(|cell| cell.is_some())
    }

    /// Indices of every fully occupied row, top to bottom. Does not mutate.
    ///
    /// # Panics
    ///
    /// If more than four rows are full, which cannot happen through piece locks.
    pub fn cleared_rows(&self) -> ClearedRows {
        let mut rows = ClearedRows::new();
        for row in 0..usize::from(self.height) {
            if self.is_row_full(row) {
                assert!(
                    rows.try_push(row).is_ok(),
                    "more than {MAX_CLEARED_ROWS} complete rows on the board"
                );
            }
        }
        rows
    }

    /// Remove `rows` (indices into the current board) in one pass.
    ///
    /// Every surviving row moves down by the number of removed rows below it
    /// and empty rows fill the top. Order and duplicates in `rows` don't matter.
    pub fn remove_rows(&mut self, rows: &[usize]) {
        let mut removed: u128 = 0;
        for &row in rows {
            assert!(
                row < usize::from(self.height),
                "row {row} is outside the board"
            );
            removed |= 1u128 << row;
        }
        if removed == 0 {
            return;
        }

        let width = usize::from(self.width);
        let mut write_row = usize::from(self.height);

        // Bottom-up two-pointer compaction.
        for read_row in (0..usize::from(self.height)).rev() {
            if removed & (1u128 << read_row) != 0 {
                continue;
            }
            write_row -= 1;
            if write_row != read_row {
                let src = read_row * width;
                self.cells.copy_within(src..src + width, write_row * width);
            }
        }

        for cell in &mut self.cells[..write_row * width] {
            *cell = None;
        }
    }

    /// Iterate the rendered rows (buffer excluded), top to bottom.
    pub fn visible(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells
            .chunks(usize::from(self.width))
            .skip(usize::from(self.buffer_rows))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Empty every cell.
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Build a board from text rows (`.` empty, a piece letter otherwise),
    /// bottom-aligned. Handy for tests.
    pub fn from_rows(width: u8, visible_rows: u8, buffer_rows: u8, rows: &[&str]) -> Self {
        let mut board = Self::new(width, visible_rows, buffer_rows);
        let first = usize::from(board.height) - rows.len();
        for (i, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let cell = PieceKind::from_str(&ch.to_string());
                board.set((first + i) as i8, col as i8, cell);
            }
        }
        board
    }
}
