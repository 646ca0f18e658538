//! Sheep, wolves and their moves.

use std::fmt::Display;

use crate::board::{Position, Side, TileKind};

/// A movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Move {
    /// Stay in place.
    #[default]
    Wait,
    /// Towards row 0.
    Up,
    /// Towards the last row.
    Down,
    /// Towards column 0.
    Left,
    /// Towards the last column.
    Right,
}

impl Move {
    /// Every move, `Wait` first.
    pub const ALL: [Move; 5] = [Move::Wait, Move::Up, Move::Down, Move::Left, Move::Right];
}

/// Sheep or wolf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreatureKind {
    /// Eats food for points.
    Sheep,
    /// Crushes food, eats the opposing sheep.
    Wolf,
}

/// Identity of one of the four creatures of a match, as numbered on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreatureId {
    /// Sheep of side 1.
    Sheep1 = 0,
    /// Wolf of side 1.
    Wolf1 = 1,
    /// Sheep of side 2.
    Sheep2 = 2,
    /// Wolf of side 2.
    Wolf2 = 3,
}

impl CreatureId {
    /// All four creatures, in wire order.
    pub const ALL: [CreatureId; 4] = [
        CreatureId::Sheep1,
        CreatureId::Wolf1,
        CreatureId::Sheep2,
        CreatureId::Wolf2,
    ];

    /// The creature of `kind` playing for `side`.
    pub fn new(kind: CreatureKind, side: Side) -> CreatureId {
        match (kind, side) {
            (CreatureKind::Sheep, Side::One) => CreatureId::Sheep1,
            (CreatureKind::Wolf, Side::One) => CreatureId::Wolf1,
            (CreatureKind::Sheep, Side::Two) => CreatureId::Sheep2,
            (CreatureKind::Wolf, Side::Two) => CreatureId::Wolf2,
        }
    }

    /// Sheep or wolf.
    pub fn kind(self) -> CreatureKind {
        match self {
            CreatureId::Sheep1 | CreatureId::Sheep2 => CreatureKind::Sheep,
            CreatureId::Wolf1 | CreatureId::Wolf2 => CreatureKind::Wolf,
        }
    }

    /// Side it plays for.
    pub fn side(self) -> Side {
        match self {
            CreatureId::Sheep1 | CreatureId::Wolf1 => Side::One,
            CreatureId::Sheep2 | CreatureId::Wolf2 => Side::Two,
        }
    }

    /// The tile this creature occupies on the board.
    pub fn tile(self) -> TileKind {
        match self.kind() {
            CreatureKind::Sheep => TileKind::Sheep(self.side()),
            CreatureKind::Wolf => TileKind::Wolf(self.side()),
        }
    }
}

impl Display for CreatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind() {
            CreatureKind::Sheep => "sheep",
            CreatureKind::Wolf => "wolf",
        };
        write!(f, "{kind}{}", self.side().number())
    }
}

/// A sheep or a wolf taking part in a match.
///
/// `position` is a cache of where the board says the creature stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creature {
    /// Sheep or wolf.
    pub kind: CreatureKind,
    /// Side it plays for.
    pub side: Side,
    /// Cached board position.
    pub position: Position,
    /// Only sheep die.
    pub alive: bool,
    /// Last move decided for this creature (after legality downgrades).
    pub pending_move: Move,
}

impl Creature {
    /// A living creature at `position`, with no move decided yet.
    pub fn new(kind: CreatureKind, side: Side, position: Position) -> Creature {
        Creature {
            kind,
            side,
            position,
            alive: true,
            pending_move: Move::Wait,
        }
    }

    /// Wire identity.
    pub fn id(&self) -> CreatureId {
        CreatureId::new(self.kind, self.side)
    }

    /// The tile this creature occupies on the board.
    pub fn tile(&self) -> TileKind {
        self.id().tile()
    }

    /// Copy of this creature as its own agent sees it (always side 1).
    pub(crate) fn perspective_view(&self) -> Creature {
        Creature {
            side: Side::One,
            ..self.clone()
        }
    }
}
