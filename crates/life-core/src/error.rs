//! Error types for the simulation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid grid size {size}: must be between 1 and {max}")]
    InvalidSize { size: usize, max: usize },

    #[error("Cell ({row}, {col}) is outside the {size}x{size} grid")]
    OutOfBounds { row: usize, col: usize, size: usize },

    #[error("Invalid speed {speed}: must be between {min} and {max}")]
    InvalidSpeed { speed: u32, min: u32, max: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown pattern: {0}")]
    UnknownPattern(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::OutOfBounds { row: 7, col: 2, size: 5 };
        assert_eq!(err.to_string(), "Cell (7, 2) is outside the 5x5 grid");

        let err = Error::InvalidSpeed { speed: 0, min: 1, max: 20 };
        assert_eq!(err.to_string(), "Invalid speed 0: must be between 1 and 20");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
