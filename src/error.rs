//! Driver errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DriverError>;

/// Boxed failure raised by an exploration engine.
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DriverError {
    /// The engine raised while analyzing `method`.
    #[error("for method {method} got error: {source}")]
    Engine {
        method: String,
        #[source]
        source: EngineError,
    },
    #[error("solver backend is not configured")]
    SolverNotConfigured,
}

impl DriverError {
    pub fn engine(method: impl ToString, source: impl Into<EngineError>) -> Self {
        DriverError::Engine {
            method: method.to_string(),
            source: source.into(),
        }
    }
}
