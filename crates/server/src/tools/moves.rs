use chess_core::position::{self, MoveCheck};
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

#[derive(Deserialize)]
pub struct ValidateMoveArgs {
    pub fen: String,
    pub move_uci: String,
}

#[derive(Deserialize)]
pub struct FenArgs {
    pub fen: String,
}

#[derive(Debug, Serialize)]
pub struct MoveVerdict {
    pub is_legal: bool,
    pub move_uci: String,
    pub original_fen: String,
    #[serde(flatten)]
    pub result: Option<MoveOutcome>,
}

/// Only present for legal moves
#[derive(Debug, Serialize)]
pub struct MoveOutcome {
    pub move_san: String,
    pub resulting_fen: String,
    pub check: bool,
    pub checkmate: bool,
}

#[derive(Debug, Serialize)]
pub struct LegalMovesResponse {
    pub fen: String,
    pub legal_moves_uci: Vec<String>,
    pub legal_moves_san: Vec<String>,
    pub count: usize,
    pub turn: &'static str,
}

/// validate_move tool
pub fn validate_move(args: ValidateMoveArgs) -> Result<MoveVerdict, ToolError> {
    let pos = position::parse_fen(&args.fen)?;

    let result = match position::check_move(&pos, &args.move_uci)? {
        MoveCheck::Legal(played) => Some(MoveOutcome {
            move_san: played.san,
            resulting_fen: played.resulting_fen,
            check: played.check,
            checkmate: played.checkmate,
        }),
        MoveCheck::Illegal => None,
    };

    Ok(MoveVerdict {
        is_legal: result.is_some(),
        move_uci: args.move_uci,
        original_fen: args.fen,
        result,
    })
}

/// get_legal_moves tool
pub fn get_legal_moves(args: FenArgs) -> Result<LegalMovesResponse, ToolError> {
    let pos = position::parse_fen(&args.fen)?;
    let (legal_moves_uci, legal_moves_san): (Vec<String>, Vec<String>) = position::legal_moves(&pos)
        .into_iter()
        .map(|m| (m.uci, m.san))
        .unzip();

    Ok(LegalMovesResponse {
        fen: args.fen,
        count: legal_moves_uci.len(),
        legal_moves_uci,
        legal_moves_san,
        turn: position::turn_name(&pos),
    })
}
