pub mod error;
pub mod game_data;
pub mod position;

pub use error::ChessError;
pub use game_data::GameSummary;
pub use position::{LegalMove, MoveCheck, PlayedMove};
