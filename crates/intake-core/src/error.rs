use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid selector: no field named {0:?}")]
    InvalidSelector(String),

    #[error("option index {index} out of range for {field} ({len} options)")]
    OptionOutOfRange {
        field: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{value:?} is not an option of {field}")]
    UnknownOption { field: &'static str, value: String },

    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

impl Error {
    /// Returns `true` when the error means the caller broke a form invariant
    /// (unknown field, option index or option value) rather than the
    /// environment failing.
    #[must_use]
    pub const fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSelector(_) | Self::OptionOutOfRange { .. } | Self::UnknownOption { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_errors_are_programmer_errors() {
        assert!(Error::InvalidSelector("age".to_string()).is_programmer_error());
        assert!(Error::OptionOutOfRange {
            field: "checkedMeals",
            index: 3,
            len: 3
        }
        .is_programmer_error());
        assert!(!Error::Io(std::io::Error::other("disk")).is_programmer_error());
    }

    #[test]
    fn test_out_of_range_display() {
        let err = Error::OptionOutOfRange {
            field: "checkedMeals",
            index: 5,
            len: 3,
        };
        assert_eq!(
            err.to_string(),
            "option index 5 out of range for checkedMeals (3 options)"
        );
    }
}
