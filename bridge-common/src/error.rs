//! Errors for the local state every Bridge service keeps
//!
//! That is the TOML config file and the SQLite sync ledger. CRM and HTTP
//! errors belong to the service crate, which maps these into responses.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Ledger query or connection failure
    #[cfg(feature = "sqlx")]
    #[error("Ledger database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Config file unreadable or unparseable, or a required setting missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// No stored record with the requested id
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored row that no longer decodes into its type
    #[error("Corrupt ledger record: {0}")]
    CorruptRecord(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_source() {
        let err = Error::Config("CLICKUP_LIST_ID not set".into());
        assert_eq!(err.to_string(), "Configuration error: CLICKUP_LIST_ID not set");

        let err = Error::CorruptRecord("unknown sync mode 'merge'".into());
        assert_eq!(err.to_string(), "Corrupt ledger record: unknown sync mode 'merge'");
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_sqlx_errors_convert() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::Database(_)));
        assert!(err.to_string().starts_with("Ledger database error"));
    }
}
