use thiserror::Error;
use tokio_postgres::error::SqlState;

/// All errors coming from the schema engine.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any PostgreSQL driver error not classified below.
    #[error("PostgreSQL error: {0}")]
    Postgres(tokio_postgres::Error),

    /// The object being created is already there.
    #[error("{0}")]
    AlreadyExists(String),

    /// A referenced relation or column is missing.
    #[error("{0}")]
    DoesNotExist(String),

    /// The connection to the engine failed or was dropped.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The engine cannot express the requested change.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl DbError {
    /// True when the failure means the change is already in place.
    pub fn is_already_exists(&self) -> bool {
        match self {
            DbError::AlreadyExists(_) => true,
            other => other.to_string().contains("already exists"),
        }
    }

    /// True for connectivity failures worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            DbError::Connection(_) => true,
            DbError::Postgres(err) => {
                if err.is_closed() {
                    return true;
                }
                match err.code() {
                    Some(code) => {
                        code.code().starts_with("08")
                            || *code == SqlState::ADMIN_SHUTDOWN
                            || *code == SqlState::CRASH_SHUTDOWN
                            || *code == SqlState::CANNOT_CONNECT_NOW
                    }
                    // No server-side error: the failure happened on the wire.
                    None => true,
                }
            }
            _ => false,
        }
    }
}

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        let Some(db_err) = err.as_db_error() else {
            return DbError::Postgres(err);
        };

        let code = db_err.code();
        let message = db_err.message().to_string();

        if *code == SqlState::DUPLICATE_TABLE
            || *code == SqlState::DUPLICATE_COLUMN
            || *code == SqlState::DUPLICATE_OBJECT
            || (*code == SqlState::INVALID_TABLE_DEFINITION
                && message.contains("multiple primary keys"))
        {
            return DbError::AlreadyExists(message);
        }

        if *code == SqlState::UNDEFINED_TABLE || *code == SqlState::UNDEFINED_COLUMN {
            return DbError::DoesNotExist(message);
        }

        DbError::Postgres(err)
    }
}

/// Errors happening during adapter or connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("PostgreSQL connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}
