use serde::{Deserialize, Serialize};

/// Normalized view of one game fetched from Lichess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: String,
    pub pgn: String,
    /// None for anonymous players and AI opponents
    pub white: Option<String>,
    pub black: Option<String>,
    pub winner: Option<String>, // "white", "black", or None for draws
    pub opening: Option<String>,
    /// Speed class ("bullet", "blitz", "rapid", "classical", ...)
    pub time_control: Option<String>,
    pub rated: bool,
    pub url: String,
}

impl GameSummary {
    /// Public game page for `id` on the given site.
    pub fn game_url(site_base: &str, id: &str) -> String {
        format!("{}/{}", site_base.trim_end_matches('/'), id)
    }
}
