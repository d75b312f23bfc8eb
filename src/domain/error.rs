//! Domain error types.

/// Top-level error type for dipbuyer.
#[derive(Debug, thiserror::Error)]
pub enum DipbuyerError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("price data unavailable: {reason}")]
    DataUnavailable { reason: String },

    #[error("invalid price series for {instrument}: {reason}")]
    InvalidSeries { instrument: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to export {path}: {reason}")]
    Export { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&DipbuyerError> for std::process::ExitCode {
    fn from(err: &DipbuyerError) -> Self {
        let code: u8 = match err {
            DipbuyerError::Io(_) | DipbuyerError::Export { .. } => 1,
            DipbuyerError::ConfigParse { .. }
            | DipbuyerError::ConfigMissing { .. }
            | DipbuyerError::ConfigInvalid { .. } => 2,
            DipbuyerError::Database { .. }
            | DipbuyerError::DatabaseQuery { .. }
            | DipbuyerError::DataUnavailable { .. } => 3,
            DipbuyerError::InvalidSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_instrument_and_reason() {
        let err = DipbuyerError::InvalidSeries {
            instrument: "EURUSD".into(),
            reason: "duplicate date 2024-01-02".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid price series for EURUSD: duplicate date 2024-01-02"
        );
    }

    #[test]
    fn config_missing_display() {
        let err = DipbuyerError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        };
        assert_eq!(err.to_string(), "missing config key [data] path");
    }

    #[test]
    fn io_converts_with_question_mark() {
        fn fails() -> Result<(), DipbuyerError> {
            Err(std::io::Error::other("disk gone"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(DipbuyerError::Io(_))));
    }
}
