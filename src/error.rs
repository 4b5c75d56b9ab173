use serde::Serialize;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid value for {field}: '{value}'")]
    InvalidParameter { field: String, value: String },

    #[error("FFmpeg executable not found")]
    ExecutableNotFound,

    #[error("Failed to start FFmpeg: {0}")]
    ProcessSpawn(#[source] io::Error),

    #[error("FFmpeg exited with {0}")]
    ProcessExit(String),

    #[error("A conversion is already in progress")]
    Busy,

    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("Localization Error: {0}")]
    Localization(String),

    #[error("State Error: {0}")]
    State(String),
}

impl AppError {
    pub(crate) fn invalid(field: &str, value: impl Into<String>) -> Self {
        AppError::InvalidParameter {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

// Allow serializing errors to send to frontend
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_message() {
        let err = AppError::invalid("tolerance", "abc");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Invalid value for tolerance: 'abc'\"");
    }

    #[test]
    fn test_spawn_error_keeps_os_message() {
        let err = AppError::ProcessSpawn(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        assert!(err.to_string().contains("no such file"));
    }
}
