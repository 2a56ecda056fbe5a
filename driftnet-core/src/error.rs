/// The error taxonomy shared across every driftnet crate.
///
/// Variants map directly to the abstract kinds described by the system's
/// error handling design: callers match on these, never on a wrapped
/// driver error.
#[derive(Debug)]
pub enum Error {
    /// Caller violated a contract (both `source`/`q` given, bad URL scheme,
    /// malformed timestamp, ...).
    InvalidArgument(String),
    /// A runtime operation was attempted before `configure`.
    NotConfigured,
    /// No provider is registered under the requested name.
    NotRegistered(String),
    /// A provider is already registered under this name and `override` was
    /// not requested.
    AlreadyRegistered(String),
    /// A registered factory did not produce a valid provider implementation.
    TypeMismatch(String),
    /// Authentication was required or the supplied credentials were invalid.
    AuthError(String),
    /// The provider rejected the request semantically.
    InvalidQuery(String),
    /// The provider is throttling requests.
    RateLimited { retry_after_s: Option<u64> },
    /// A transport failure or 5xx response.
    TemporaryNetworkError(String),
    /// The provider signaled a maintenance/outage condition.
    ProviderUnavailable(String),
    /// An opaque keyset token could not be decoded.
    InvalidToken(String),
    /// A malformed timestamp was supplied to `parse_utc`.
    InvalidTimestamp(String),
    /// A `(provider, external_id)` uniqueness constraint was violated.
    ///
    /// Never surfaced from `collect` (counted as a conflict instead); only
    /// raised from direct model writes.
    UniqueConflict(String),
    /// An underlying database driver error.
    Database(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Database(Box::new(err))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::NotConfigured => write!(f, "runtime not configured"),
            Error::NotRegistered(name) => write!(f, "provider not registered: {name}"),
            Error::AlreadyRegistered(name) => write!(f, "provider already registered: {name}"),
            Error::TypeMismatch(msg) => write!(f, "provider type mismatch: {msg}"),
            Error::AuthError(msg) => write!(f, "authentication error: {msg}"),
            Error::InvalidQuery(msg) => write!(f, "invalid query: {msg}"),
            Error::RateLimited { retry_after_s } => match retry_after_s {
                Some(secs) => write!(f, "rate limited; retry after {secs}s"),
                None => write!(f, "rate limited"),
            },
            Error::TemporaryNetworkError(msg) => write!(f, "temporary network error: {msg}"),
            Error::ProviderUnavailable(msg) => write!(f, "provider unavailable: {msg}"),
            Error::InvalidToken(msg) => write!(f, "invalid keyset token: {msg}"),
            Error::InvalidTimestamp(msg) => write!(f, "invalid timestamp: {msg}"),
            Error::UniqueConflict(msg) => write!(f, "unique constraint violated: {msg}"),
            Error::Database(err) => write!(f, "database error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
