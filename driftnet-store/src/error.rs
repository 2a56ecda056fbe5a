use driftnet_core::Error;

/// Extension trait for converting `sqlx::Error` into the shared [`Error`]
/// taxonomy. Due to Rust's orphan rules, `From<sqlx::Error> for Error`
/// can't be implemented directly in this crate (neither type is local).
pub trait SqlxErrorExt {
    fn into_driftnet_error(self) -> Error;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_driftnet_error(self) -> Error {
        match &self {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::UniqueConflict(db_err.message().to_string())
            }
            _ => Error::database(self),
        }
    }
}

pub type SqlxResult<T> = Result<T, Error>;
