//! Provider abstraction, process-wide registry, and injectable HTTP
//! transport that concrete providers (e.g. `driftnet-bluesky`) implement
//! against.

pub mod provider;
pub mod registry;
pub mod testing;
pub mod transport;
pub mod types;

pub use provider::{Provider, ProviderFactory};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{
    AuthState, AuthorFilter, Batch, Capabilities, Filters, NormalizedEntities, NormalizedPost,
    ProviderOptions, Session, SessionDefaults, TimeBoundsSupport,
};
