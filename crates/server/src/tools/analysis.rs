use chess_core::position::{self, MoveCheck};
use engine::{Score, SearchLimits};
use serde::{Deserialize, Serialize};
use shakmaty::{Color, Position};

use crate::error::ToolError;
use crate::state::AppState;
use crate::tools::moves::FenArgs;

/// Moves of the principal variation echoed back
const PV_MOVES: usize = 5;

#[derive(Deserialize)]
pub struct AnalyzeArgs {
    pub fen: String,
    #[serde(default)]
    pub depth: Option<i64>,
}

/// Engine evaluation, always from White's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Evaluation {
    Mate(i32),
    Centipawns(i32),
}

impl Evaluation {
    /// Convert a side-to-move score into White's perspective.
    pub fn from_engine(score: Score, turn: Color) -> Self {
        let sign = match turn {
            Color::White => 1,
            Color::Black => -1,
        };
        match score {
            Score::Mate(n) => Evaluation::Mate(n * sign),
            Score::Cp(cp) => Evaluation::Centipawns(cp * sign),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub fen: String,
    pub evaluation: Option<Evaluation>,
    pub best_move: Option<String>,
    pub principal_variation: Vec<String>,
    pub depth: u32,
    pub turn: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BestMoveResponse {
    pub best_move_uci: String,
    pub best_move_san: String,
    pub from_square: String,
    pub to_square: String,
    pub fen: String,
}

/// Requested depth, or the default, forced into `1..=max`.
pub fn clamp_depth(requested: Option<i64>, default: u32, max: u32) -> u32 {
    let max = i64::from(max.max(1));
    requested
        .unwrap_or(i64::from(default))
        .clamp(1, max) as u32
}

/// analyze_position tool
pub async fn analyze_position(
    state: &AppState,
    args: AnalyzeArgs,
) -> Result<AnalysisResponse, ToolError> {
    let pos = position::parse_fen(&args.fen)?;
    let depth = clamp_depth(args.depth, state.config.default_depth, state.config.max_depth);

    tracing::info!(fen = %args.fen, depth, "Analyzing position");

    // The engine gets the re-serialized FEN, never the raw input
    let result = state
        .engine
        .search(
            &position::to_fen(&pos),
            SearchLimits {
                depth,
                movetime: state.config.analysis_time,
            },
        )
        .await?;

    tracing::info!(depth, reached = ?result.depth, score = ?result.score, "Analysis finished");

    let mut principal_variation = result.pv;
    principal_variation.truncate(PV_MOVES);

    Ok(AnalysisResponse {
        evaluation: result
            .score
            .map(|score| Evaluation::from_engine(score, pos.turn())),
        best_move: principal_variation.first().cloned(),
        principal_variation,
        depth,
        turn: position::turn_name(&pos),
        fen: args.fen,
    })
}

/// get_best_move tool
pub async fn get_best_move(state: &AppState, args: FenArgs) -> Result<BestMoveResponse, ToolError> {
    let pos = position::parse_fen(&args.fen)?;
    let depth = clamp_depth(None, state.config.default_depth, state.config.max_depth);

    let result = state
        .engine
        .search(
            &position::to_fen(&pos),
            SearchLimits {
                depth,
                movetime: state.config.analysis_time,
            },
        )
        .await?;

    let uci = result
        .best_move
        .ok_or_else(|| ToolError::Engine("No legal move available in this position".into()))?;

    match position::check_move(&pos, &uci).map_err(|e| ToolError::Engine(e.to_string()))? {
        MoveCheck::Legal(played) => Ok(BestMoveResponse {
            best_move_uci: played.uci,
            best_move_san: played.san,
            from_square: played.from_square,
            to_square: played.to_square,
            fen: args.fen,
        }),
        MoveCheck::Illegal => Err(ToolError::Engine(format!(
            "Engine suggested illegal move {uci}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_depth() {
        assert_eq!(clamp_depth(None, 18, 25), 18);
        assert_eq!(clamp_depth(Some(999), 18, 25), 25);
        assert_eq!(clamp_depth(Some(0), 18, 25), 1);
        assert_eq!(clamp_depth(Some(-4), 18, 25), 1);
        assert_eq!(clamp_depth(Some(12), 18, 25), 12);
        // A default above the ceiling is clamped too
        assert_eq!(clamp_depth(None, 40, 25), 25);
    }

    #[test]
    fn test_evaluation_normalized_to_white() {
        assert_eq!(
            Evaluation::from_engine(Score::Cp(31), Color::White),
            Evaluation::Centipawns(31)
        );
        assert_eq!(
            Evaluation::from_engine(Score::Cp(31), Color::Black),
            Evaluation::Centipawns(-31)
        );
        assert_eq!(
            Evaluation::from_engine(Score::Mate(2), Color::Black),
            Evaluation::Mate(-2)
        );
    }

    #[test]
    fn test_evaluation_wire_shape() {
        let value = serde_json::to_value(Evaluation::Centipawns(-31)).unwrap();
        assert_eq!(value, serde_json::json!({ "type": "centipawns", "value": -31 }));
        let value = serde_json::to_value(Evaluation::Mate(3)).unwrap();
        assert_eq!(value, serde_json::json!({ "type": "mate", "value": 3 }));
    }
}
