//! UCI engine process management.
//!
//! Drives an external Stockfish binary over stdin/stdout. Only the commands
//! needed to start the engine, run a bounded search and quit are spoken.

pub mod error;
pub mod handle;
pub mod stockfish;

pub use error::EngineError;
pub use handle::EngineHandle;
pub use stockfish::{EngineConfig, Score, SearchLimits, SearchResult, StockfishEngine};
