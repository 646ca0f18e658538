//! The playing field.
//!
//! A [`Board`] is a fixed `HEIGHT` x `WIDTH` grid of [`TileKind`]s. It is the only
//! authoritative record of where creatures stand: creatures keep a cached
//! [`Position`], but the simulator checks that cache against the board on every think.

use std::{fmt::Display, path::Path, str::FromStr};

use anyhow::{bail, Context};

use crate::creature::Move;

/// Number of columns.
pub const WIDTH: usize = 19;
/// Number of rows.
pub const HEIGHT: usize = 15;

/// One of the two competing teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// First team (sheep `1`, wolf `2` on maps).
    One,
    /// Second team (sheep `3`, wolf `4` on maps).
    Two,
}

impl Side {
    /// Both sides, in playing order.
    pub const BOTH: [Side; 2] = [Side::One, Side::Two];

    /// The other side.
    pub fn opponent(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }

    /// `1` or `2`
    pub fn number(self) -> u8 {
        match self {
            Side::One => 1,
            Side::Two => 2,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "side {}", self.number())
    }
}

/// What a board cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileKind {
    /// Walkable, nothing on it.
    #[default]
    Empty,
    /// Worth 1 point to a sheep.
    Grass,
    /// Impassable.
    Fence,
    /// Worth 5 points to a sheep.
    Rhubarb,
    /// A side's sheep.
    Sheep(Side),
    /// A side's wolf.
    Wolf(Side),
}

impl TileKind {
    /// Character used by map files.
    pub fn to_char(self) -> char {
        match self {
            TileKind::Empty => '.',
            TileKind::Grass => 'g',
            TileKind::Fence => '#',
            TileKind::Rhubarb => 'r',
            TileKind::Sheep(Side::One) => '1',
            TileKind::Wolf(Side::One) => '2',
            TileKind::Sheep(Side::Two) => '3',
            TileKind::Wolf(Side::Two) => '4',
        }
    }

    /// Inverse of [`TileKind::to_char`].
    pub fn from_char(c: char) -> Option<TileKind> {
        Some(match c {
            '.' => TileKind::Empty,
            'g' => TileKind::Grass,
            '#' => TileKind::Fence,
            'r' => TileKind::Rhubarb,
            '1' => TileKind::Sheep(Side::One),
            '2' => TileKind::Wolf(Side::One),
            '3' => TileKind::Sheep(Side::Two),
            '4' => TileKind::Wolf(Side::Two),
            _ => return None,
        })
    }

    /// Grass or rhubarb.
    pub fn is_food(self) -> bool {
        matches!(self, TileKind::Grass | TileKind::Rhubarb)
    }

    /// The same creature kind seen from the other side. Non-creature tiles are unchanged.
    pub fn swap_sides(self) -> TileKind {
        match self {
            TileKind::Sheep(side) => TileKind::Sheep(side.opponent()),
            TileKind::Wolf(side) => TileKind::Wolf(side.opponent()),
            other => other,
        }
    }
}

/// A cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Row, `0` is the top.
    pub row: usize,
    /// Column, `0` is the left.
    pub col: usize,
}

impl Position {
    /// Make a position. Bounds are not checked.
    pub fn new(row: usize, col: usize) -> Position {
        Position { row, col }
    }

    /// The neighbouring cell in direction `mv`, or `None` when it would leave the grid.
    pub fn step(self, mv: Move) -> Option<Position> {
        let Position { row, col } = self;
        let target = match mv {
            Move::Wait => self,
            Move::Up => Position::new(row.checked_sub(1)?, col),
            Move::Down => Position::new(row + 1, col),
            Move::Left => Position::new(row, col.checked_sub(1)?),
            Move::Right => Position::new(row, col + 1),
        };
        (target.row < HEIGHT && target.col < WIDTH).then_some(target)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Fixed size grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    tiles: [[TileKind; WIDTH]; HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Board::empty()
    }
}

impl Board {
    /// A board with only [`TileKind::Empty`] cells.
    pub fn empty() -> Board {
        Board {
            tiles: [[TileKind::Empty; WIDTH]; HEIGHT],
        }
    }

    /// Read a map file. See [`Board::from_str`] for the format.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Board> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("could not open map file '{}'", path.display()))?;
        text.parse()
            .with_context(|| format!("invalid map file '{}'", path.display()))
    }

    /// # Panics
    /// If `pos` is outside the grid.
    pub fn tile_at(&self, pos: Position) -> TileKind {
        self.tiles[pos.row][pos.col]
    }

    /// The tile at `pos`, or `None` outside the grid.
    pub fn get(&self, pos: Position) -> Option<TileKind> {
        self.tiles.get(pos.row)?.get(pos.col).copied()
    }

    /// # Panics
    /// If `pos` is outside the grid.
    pub fn set_tile(&mut self, pos: Position, kind: TileKind) {
        self.tiles[pos.row][pos.col] = kind;
    }

    /// A copy of the board as seen by `for_side`: side 2 gets sheep and wolves of both
    /// sides swapped, so every agent sees itself as side 1.
    pub fn perspective_view(&self, for_side: Side) -> Board {
        let mut view = self.clone();
        if for_side == Side::Two {
            view.tiles
                .iter_mut()
                .flatten()
                .for_each(|tile| *tile = tile.swap_sides());
        }
        view
    }

    /// Rows in top to bottom order.
    pub fn rows(&self) -> impl Iterator<Item = &[TileKind; WIDTH]> {
        self.tiles.iter()
    }

    /// Copy `tiles` into row `row`. Used to rebuild a board from `MapRow` packets.
    ///
    /// # Panics
    /// If `row` is outside the grid.
    pub fn set_row(&mut self, row: usize, tiles: [TileKind; WIDTH]) {
        self.tiles[row] = tiles;
    }

    /// Number of cells holding `kind`.
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().flatten().filter(|t| **t == kind).count()
    }

    /// Positions of every cell holding `kind`, row by row.
    pub fn find(&self, kind: TileKind) -> Vec<Position> {
        let mut found = vec![];
        for (row, tiles) in self.tiles.iter().enumerate() {
            for (col, tile) in tiles.iter().enumerate() {
                if *tile == kind {
                    found.push(Position::new(row, col));
                }
            }
        }
        found
    }

    /// True while at least one grass or rhubarb is left.
    pub fn food_left(&self) -> bool {
        self.tiles.iter().flatten().any(|t| t.is_food())
    }
}

/// Parses the map file format: `HEIGHT` lines of at least `WIDTH` tile characters.
/// Characters past `WIDTH` and lines past `HEIGHT` are ignored.
impl FromStr for Board {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut board = Board::empty();
        let mut lines = s.lines();
        for row in 0..HEIGHT {
            let Some(line) = lines.next() else {
                bail!("map has {row} rows, expected {HEIGHT}");
            };
            let mut chars = line.trim_end_matches('\r').chars();
            for col in 0..WIDTH {
                let Some(c) = chars.next() else {
                    bail!("row {row} has {col} columns, expected {WIDTH}");
                };
                let tile = TileKind::from_char(c)
                    .with_context(|| format!("unknown tile '{c}' at ({row}, {col})"))?;
                board.tiles[row][col] = tile;
            }
        }
        Ok(board)
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.tiles {
            let line: String = row.iter().map(|t| t.to_char()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
