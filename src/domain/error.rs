//! Domain error types.

/// Top-level error type for regimetrader.
#[derive(Debug, thiserror::Error)]
pub enum RegimetraderError {
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

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("misaligned series: {left} has {left_len} rows, {right} has {right_len}")]
    Alignment {
        left: String,
        left_len: usize,
        right: String,
        right_len: usize,
    },

    #[error("empty input: {what}")]
    EmptyInput { what: String },

    #[error("insufficient data for {ticker}: have {have} bars, need {need}")]
    InsufficientData {
        ticker: String,
        have: usize,
        need: usize,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RegimetraderError> for std::process::ExitCode {
    fn from(err: &RegimetraderError) -> Self {
        let code: u8 = match err {
            RegimetraderError::Io(_) => 1,
            RegimetraderError::ConfigParse { .. }
            | RegimetraderError::ConfigMissing { .. }
            | RegimetraderError::ConfigInvalid { .. }
            | RegimetraderError::InvalidParameter { .. } => 2,
            RegimetraderError::Data { .. } => 3,
            RegimetraderError::Alignment { .. } | RegimetraderError::EmptyInput { .. } => 4,
            RegimetraderError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
