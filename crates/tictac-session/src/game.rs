//! Game state snapshots and the tic-tac-toe rules.
//!
//! A [`GameState`] is a value: every accepted change produces a new
//! snapshot instead of patching the old one, so whatever was broadcast
//! for an update is exactly what the session committed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tictac_protocol::Player;

/// Width and height of the board.
pub const BOARD_SIZE: usize = 3;

/// The board, indexed `field[row][column]`. `None` is an empty cell.
pub type Field = [[Option<Player>; BOARD_SIZE]; BOARD_SIZE];

/// Every winning line, in the order they are checked: rows top to
/// bottom, columns left to right, main diagonal, anti-diagonal.
const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// Where the current round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    /// Moves are being accepted.
    Ongoing,
    /// A line was completed by this player.
    Won(Player),
    /// The board filled up with no line.
    Drawn,
}

impl RoundStatus {
    /// Whether the round has ended and is waiting for its reset.
    pub fn is_over(self) -> bool {
        !matches!(self, RoundStatus::Ongoing)
    }
}

/// Why a move was not applied.
///
/// Rejections are not reported to players; the session only logs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    /// The coordinates are outside the board.
    #[error("cell ({row}, {col}) is off the board")]
    OutOfBounds { row: usize, col: usize },

    /// The round already has a winner or a full board.
    #[error("round is over")]
    RoundOver,

    /// The cell already holds a mark.
    #[error("cell ({row}, {col}) is occupied")]
    Occupied { row: usize, col: usize },

    /// The mover is not the player at turn.
    #[error("not {0}'s turn")]
    NotYourTurn(Player),
}

/// A full snapshot of one match.
///
/// This is what every connected player receives after each change.
/// Field names are camelCase on the wire (`playerAtTurn`, `isBoardFull`,
/// ...) and `connectedPlayers` encodes as a sorted array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// The board.
    pub field: Field,
    /// Whose move is accepted next.
    pub player_at_turn: Player,
    /// Set once a line is completed; cleared by the round reset.
    pub winning_player: Option<Player>,
    /// True when every cell is occupied.
    pub is_board_full: bool,
    /// Players currently attached to the session.
    pub connected_players: BTreeSet<Player>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            field: [[None; BOARD_SIZE]; BOARD_SIZE],
            player_at_turn: Player::X,
            winning_player: None,
            is_board_full: false,
            connected_players: BTreeSet::new(),
        }
    }
}

impl GameState {
    /// An empty board with nobody connected and `X` to move.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current round status, derived from `winning_player` and
    /// `is_board_full`.
    pub fn status(&self) -> RoundStatus {
        match (self.winning_player, self.is_board_full) {
            (Some(winner), _) => RoundStatus::Won(winner),
            (None, true) => RoundStatus::Drawn,
            (None, false) => RoundStatus::Ongoing,
        }
    }

    /// The seat a newly connecting player would get: `X` if free,
    /// otherwise `O`, or `None` when both are taken.
    pub fn first_free_slot(&self) -> Option<Player> {
        Player::ALL
            .into_iter()
            .find(|p| !self.connected_players.contains(p))
    }

    /// Returns the snapshot after `player` places a mark at `(row, col)`.
    ///
    /// The turn passes to the opponent, the full-board flag is recomputed
    /// and the winner is detected over the new field.
    pub fn with_move(
        &self,
        player: Player,
        row: usize,
        col: usize,
    ) -> Result<GameState, MoveRejection> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(MoveRejection::OutOfBounds { row, col });
        }
        if self.status().is_over() {
            return Err(MoveRejection::RoundOver);
        }
        if self.field[row][col].is_some() {
            return Err(MoveRejection::Occupied { row, col });
        }
        if self.player_at_turn != player {
            return Err(MoveRejection::NotYourTurn(player));
        }

        let mut field = self.field;
        field[row][col] = Some(player);

        Ok(GameState {
            field,
            player_at_turn: player.opponent(),
            winning_player: winning_player(&field),
            is_board_full: is_full(&field),
            connected_players: self.connected_players.clone(),
        })
    }

    /// Returns the snapshot with `player` added to the connected set.
    pub fn with_player(&self, player: Player) -> GameState {
        let mut next = self.clone();
        next.connected_players.insert(player);
        next
    }

    /// Returns the snapshot with `player` removed from the connected set.
    pub fn without_player(&self, player: Player) -> GameState {
        let mut next = self.clone();
        next.connected_players.remove(&player);
        next
    }

    /// Returns the snapshot for a fresh round. Connected players carry
    /// over; everything else goes back to its initial value.
    pub fn next_round(&self) -> GameState {
        GameState {
            connected_players: self.connected_players.clone(),
            ..GameState::default()
        }
    }
}

/// Returns the owner of the first completed line, if any.
pub fn winning_player(field: &Field) -> Option<Player> {
    LINES.iter().find_map(|[a, b, c]| {
        let first = field[a.0][a.1]?;
        (field[b.0][b.1] == Some(first) && field[c.0][c.1] == Some(first))
            .then_some(first)
    })
}

/// Whether every cell is occupied.
pub fn is_full(field: &Field) -> bool {
    field.iter().all(|row| row.iter().all(Option::is_some))
}
