use trustgate_cache::CacheError;
use trustgate_domain::{GraphError, MalformedExpressionError};
use trustgate_store::StoreError;

/// Errors returned by construction paths and mutations.
///
/// Evaluation never returns one of these; it converts failures into a deny decision.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Malformed(#[from] MalformedExpressionError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The mutation was committed but stale cache entries could not be removed.
    #[error("cache invalidation failed: {0}")]
    Cache(#[from] CacheError),
}
