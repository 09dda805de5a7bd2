use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the client journey pipeline.
#[derive(Error, Debug)]
pub enum JourneyError {
    /// A required column is absent from a table.
    #[error("Missing field: {column}")]
    MissingField { column: String },

    /// A date token did not satisfy the fixed-slice ISO date contract.
    #[error("Malformed date for client {client}: {value:?}")]
    MalformedDate { client: String, value: String },

    /// A housing range whose end date precedes its start date.
    #[error("Inverted interval for client {client}: {start} is after {end}")]
    InvertedInterval {
        client: String,
        start: String,
        end: String,
    },

    /// A measure cell could not be coerced to a number.
    #[error("Invalid number in column {column}: {value:?}")]
    InvalidNumber { column: String, value: String },

    /// The collaborator did not supply a required input.
    #[error("No input supplied: {0}")]
    NoInput(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be decoded.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl JourneyError {
    /// Shorthand for [`JourneyError::MissingField`].
    pub fn missing(column: impl Into<String>) -> Self {
        Self::MissingField {
            column: column.into(),
        }
    }
}

/// Convenience alias used throughout the journey crates.
pub type Result<T> = std::result::Result<T, JourneyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = JourneyError::FileRead {
            path: PathBuf::from("/data/housed_date.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/housed_date.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_field() {
        let err = JourneyError::missing("Visits");
        assert_eq!(err.to_string(), "Missing field: Visits");
    }

    #[test]
    fn test_error_display_malformed_date() {
        let err = JourneyError::MalformedDate {
            client: "Courtney Bird".to_string(),
            value: "2021-13-01".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed date for client Courtney Bird: \"2021-13-01\""
        );
    }

    #[test]
    fn test_error_display_inverted_interval() {
        let err = JourneyError::InvertedInterval {
            client: "Kelly Baswick".to_string(),
            start: "2021-02-01".to_string(),
            end: "2021-01-01".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Kelly Baswick"));
        assert!(msg.contains("2021-02-01 is after 2021-01-01"));
    }

    #[test]
    fn test_error_display_invalid_number() {
        let err = JourneyError::InvalidNumber {
            column: "Visits".to_string(),
            value: "many".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid number in column Visits: \"many\"");
    }

    #[test]
    fn test_error_display_no_input() {
        let err = JourneyError::NoInput("housing table".to_string());
        assert_eq!(err.to_string(), "No input supplied: housing table");
    }

    #[test]
    fn test_error_display_config() {
        let err = JourneyError::Config("unknown view".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown view");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: JourneyError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: JourneyError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
