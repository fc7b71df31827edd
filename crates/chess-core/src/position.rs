//! FEN parsing and move queries on top of shakmaty.
//!
//! Everything here is a thin adapter: legality, SAN rendering and FEN
//! serialization all come from shakmaty.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};

use crate::error::ChessError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A legal move rendered in both notations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalMove {
    pub uci: String,
    pub san: String,
}

/// A legal move together with the position it leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub uci: String,
    pub san: String,
    pub from_square: String,
    pub to_square: String,
    pub resulting_fen: String,
    pub check: bool,
    pub checkmate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveCheck {
    Legal(PlayedMove),
    /// Well-formed UCI that is not playable in the position
    Illegal,
}

/// Parse a FEN string into a legal standard-chess position.
pub fn parse_fen(fen: &str) -> Result<Chess, ChessError> {
    let parsed: Fen = fen.trim().parse().map_err(|e| ChessError::InvalidFen {
        fen: fen.to_string(),
        reason: format!("{e}"),
    })?;

    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| ChessError::IllegalPosition {
            fen: fen.to_string(),
            reason: format!("{e}"),
        })
}

/// Serialize a position, keeping the en passant square only when a capture is legal.
pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

pub fn turn_name(pos: &Chess) -> &'static str {
    color_name(pos.turn())
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// All legal moves in move-generation order.
pub fn legal_moves(pos: &Chess) -> Vec<LegalMove> {
    pos.legal_moves()
        .iter()
        .map(|mv| LegalMove {
            uci: mv.to_uci(CastlingMode::Standard).to_string(),
            san: san_of(pos, mv),
        })
        .collect()
}

/// Check a UCI move string against the position.
///
/// Returns `Err` only when the string is not UCI at all. A well-formed move
/// that cannot be played is `Ok(MoveCheck::Illegal)`.
pub fn check_move(pos: &Chess, move_uci: &str) -> Result<MoveCheck, ChessError> {
    let uci: UciMove = move_uci
        .trim()
        .parse()
        .map_err(|_| ChessError::InvalidMove(move_uci.to_string()))?;

    let (from, to) = match uci {
        UciMove::Normal { from, to, .. } => (from, to),
        _ => return Ok(MoveCheck::Illegal),
    };

    let legal = match uci.to_move(pos) {
        Ok(m) => m,
        Err(_) => return Ok(MoveCheck::Illegal),
    };

    let mut after = pos.clone();
    let san = SanPlus::from_move_and_play_unchecked(&mut after, legal.clone());

    Ok(MoveCheck::Legal(PlayedMove {
        uci: legal.to_uci(CastlingMode::Standard).to_string(),
        san: san.to_string(),
        from_square: from.to_string(),
        to_square: to.to_string(),
        resulting_fen: to_fen(&after),
        check: after.is_check(),
        checkmate: after.is_checkmate(),
    }))
}

fn san_of(pos: &Chess, mv: &Move) -> String {
    let mut after = pos.clone();
    SanPlus::from_move_and_play_unchecked(&mut after, mv.clone()).to_string()
}
