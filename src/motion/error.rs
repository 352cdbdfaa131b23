use thiserror::Error;

/// Errors raised by the motion engine.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MotionError {
    /// The canvas is missing or has no area.
    #[error("canvas is not initialized or has no drawable area")]
    UninitializedCanvas,

    /// A configuration value is out of range or not finite.
    #[error("invalid motion config: {0}")]
    InvalidConfig(String),
}

pub type MotionResult<T> = Result<T, MotionError>;
