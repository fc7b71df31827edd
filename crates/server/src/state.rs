use std::sync::Arc;

use engine::EngineHandle;

use crate::clients::lichess::{LichessClient, LichessError};
use crate::config::Config;

/// Shared by every request. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<EngineHandle>,
    pub lichess: LichessClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, LichessError> {
        let lichess = LichessClient::new(&config.lichess_base_url, config.lichess_token.clone())?;
        let engine = Arc::new(EngineHandle::new(config.engine_config()));
        Ok(Self {
            config: Arc::new(config),
            engine,
            lichess,
        })
    }

    /// Same as [`AppState::new`] but with an explicit engine handle.
    pub fn with_engine(config: Config, engine: EngineHandle) -> Result<Self, LichessError> {
        Ok(Self {
            engine: Arc::new(engine),
            ..Self::new(config)?
        })
    }
}
