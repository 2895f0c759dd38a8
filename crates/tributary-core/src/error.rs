pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("link {link} references unknown node id {id:?}")]
    UnknownNode { link: usize, id: String },

    #[error("link {link} has negative value {value}")]
    NegativeValue { link: usize, value: f64 },

    #[error("link {link} has a non-finite value")]
    NonFiniteValue { link: usize },

    #[error("duplicate node id {id:?}")]
    DuplicateNode { id: String },

    #[error("period length must be a positive number of days, got {days}")]
    InvalidPeriod { days: f64 },

    #[error("daily-average normalization requires the period length (`days`)")]
    MissingPeriod,

    #[error("unknown node alignment {value:?} (expected left, right, justify or center)")]
    UnknownAlignment { value: String },

    #[error("unknown interval {value:?} (expected asGiven or dailyAverageOverPeriod)")]
    UnknownInterval { value: String },

    #[error("CSV error on line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("flow data JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
