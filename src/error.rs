/// Failures raised when a grid, level or restored session does not describe a
/// playable board.
///
/// Move resolution, spawning and AI selection never fail on typed input; these
/// errors only come out of constructors and validators.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Grid or session data that cannot be played as-is (wrong dimensions,
    /// tiles on walls, broken tile bookkeeping).
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Level or persona configuration that cannot be used to start a game.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GameError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        GameError::InvalidState(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        GameError::Configuration(msg.into())
    }
}
