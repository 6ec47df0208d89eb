//! Types that travel on the wire between players and the server.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One of the two player slots in a match.
///
/// A match has exactly two seats. The first player to connect gets `X`,
/// the second gets `O`; `X` always opens a round. Serialized as the bare
/// strings `"X"` and `"O"`.
///
/// The declaration order matters: `Ord` puts `X` before `O`, which keeps
/// sorted collections of players (and therefore encoded snapshots)
/// deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Both seats, in assignment order.
    pub const ALL: [Player; 2] = [Player::X, Player::O];

    /// The player who moves after this one.
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// The mark this player puts on the board.
    pub fn symbol(self) -> char {
        match self {
            Player::X => 'X',
            Player::O => 'O',
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Messages a connected player sends to the server.
///
/// Internally tagged, so a move looks like
/// `{ "type": "make_turn", "x": 0, "y": 2 }` on the wire. `x` is the row
/// and `y` the column, both zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Place the sender's mark at row `x`, column `y`.
    MakeTurn { x: usize, y: usize },
}
