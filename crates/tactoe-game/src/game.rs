//! The 3x3 board game: state, move application, and move (un)parsing.

use std::sync::Mutex;

use tactoe_protocol::Role;

use crate::GameError;

/// Number of cells on the board.
const BOARD_SIZE: usize = 9;

/// The eight winning lines, as cell indices (0-based, row-major).
const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A single placed move: which cell, and which role placed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameMove {
    /// 0-based board cell index.
    pub cell: usize,
    pub role: Role,
}

struct GameInner {
    board: [Role; BOARD_SIZE],
    to_move: Role,
    terminated: bool,
    winner: Role,
}

/// Current state of a game between two invitation endpoints.
///
/// X always moves first. Cells are indexed 0..9, row-major. All mutators
/// take `inner`'s lock; queries clone the fields they need out from under
/// the lock rather than returning a guard.
pub struct Game {
    inner: Mutex<GameInner>,
}

impl Game {
    /// A fresh game: empty board, X to move.
    pub fn new() -> Self {
        Game {
            inner: Mutex::new(GameInner {
                board: [Role::None; BOARD_SIZE],
                to_move: Role::X,
                terminated: false,
                winner: Role::None,
            }),
        }
    }

    pub fn to_move(&self) -> Role {
        self.inner.lock().expect("game mutex poisoned").to_move
    }

    pub fn is_over(&self) -> bool {
        self.inner.lock().expect("game mutex poisoned").terminated
    }

    pub fn winner(&self) -> Role {
        self.inner.lock().expect("game mutex poisoned").winner
    }

    /// Applies `mv`, rejecting it if it's the wrong player's turn, the
    /// cell is occupied, or the game is already over. On success, flips
    /// `to_move`, then checks for a win or a full board.
    pub fn apply_move(&self, mv: GameMove) -> Result<(), GameError> {
        let mut inner = self.inner.lock().expect("game mutex poisoned");

        if inner.terminated {
            return Err(GameError::AlreadyTerminated);
        }
        if mv.role != inner.to_move {
            return Err(GameError::OutOfTurn);
        }
        if inner.board[mv.cell] != Role::None {
            return Err(GameError::CellOccupied(mv.cell));
        }

        inner.board[mv.cell] = mv.role;
        inner.to_move = mv.role.opposite();

        for line in WINNING_LINES {
            let [a, b, c] = line;
            if inner.board[a] != Role::None
                && inner.board[a] == inner.board[b]
                && inner.board[b] == inner.board[c]
            {
                inner.winner = inner.board[a];
                inner.terminated = true;
                inner.to_move = Role::None;
                tracing::debug!(winner = %inner.winner, "game won");
                return Ok(());
            }
        }

        if inner.board.iter().all(|&cell| cell != Role::None) {
            inner.terminated = true;
            inner.to_move = Role::None;
            tracing::debug!("game drawn");
        }

        Ok(())
    }

    /// Resigns the game on behalf of `role`; the opposite role wins.
    pub fn resign(&self, role: Role) -> Result<(), GameError> {
        let mut inner = self.inner.lock().expect("game mutex poisoned");
        if inner.terminated {
            return Err(GameError::AlreadyTerminated);
        }
        inner.winner = role.opposite();
        inner.terminated = true;
        inner.to_move = Role::None;
        Ok(())
    }

    /// Parses a move string: exactly one digit `'1'..'9'`, 1-based cell
    /// numbering on the wire, converted to a 0-based cell index here.
    pub fn parse_move(role: Role, s: &str) -> Result<GameMove, GameError> {
        let mut chars = s.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(GameError::MalformedMove(s.to_string()));
        };
        if !('1'..='9').contains(&c) {
            return Err(GameError::MalformedMove(s.to_string()));
        }
        let cell = (c as u8 - b'1') as usize;
        Ok(GameMove { cell, role })
    }

    /// Inverse of `parse_move`: renders a move as its 1-based digit.
    pub fn unparse_move(mv: GameMove) -> String {
        ((mv.cell as u8 + b'1') as char).to_string()
    }

    /// Renders the board as three rows of three glyphs separated by `|`,
    /// two `-----` separator rows, and a trailing "X to move" / "O to
    /// move" line — or nothing if the game has ended.
    pub fn unparse_state(&self) -> String {
        let inner = self.inner.lock().expect("game mutex poisoned");
        let glyph = |role: Role| match role {
            Role::None => ' ',
            Role::X => 'X',
            Role::O => 'O',
        };

        let mut out = String::new();
        for row in 0..3 {
            for col in 0..3 {
                out.push(glyph(inner.board[row * 3 + col]));
                if col < 2 {
                    out.push('|');
                }
            }
            out.push('\n');
            if row < 2 {
                out.push_str("-----\n");
            }
        }

        match inner.to_move {
            Role::X => out.push_str("X to move"),
            Role::O => out.push_str("O to move"),
            Role::None => {}
        }
        out
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
