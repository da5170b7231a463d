use crate::id::ResourceKey;
use crate::kind::ResourceKind;
use std::path::PathBuf;

/// Errors reported by the resource manager.
///
/// Every variant is recoverable: the manager logs the failure where it is
/// detected and leaves its state consistent, so callers may simply retry or
/// ignore the result.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// A record already exists under this id. The first registration is kept.
    #[error("resource id '{id}' is already registered (path: {registered_path})")]
    DuplicateId { id: String, registered_path: String },

    /// No record exists under this id.
    #[error("unknown resource: {0}")]
    UnknownId(String),

    /// Neither the explicit hint, the extension table, nor the custom
    /// factories could produce a resource for this record.
    #[error("could not resolve a resource type for '{id}'")]
    UnresolvedType { id: String },

    /// A datasheet parent chain loops back onto one of its ancestors.
    #[error("datasheet ancestors create an infinite loop: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    /// Listeners can only be attached to loaded, tracked resources.
    #[error("resource '{0}' is not tracked by the dependency graph")]
    ListenerOnUntrackedResource(String),

    /// The destination id of a move is already taken.
    #[error("cannot move resource to '{id}': a resource already exists there")]
    MoveTargetCollision { id: String },

    /// The locator does not produce a usable resource id.
    #[error("invalid resource name: '{0}'")]
    InvalidName(String),

    /// The resource already has a dependency record.
    #[error("resource '{0}' is already tracked")]
    AlreadyTracked(String),

    /// The resource-specific load failed.
    #[error("failed to load '{id}': {detail}")]
    Load { id: String, detail: String },

    /// The resource-specific save failed.
    #[error("failed to save '{id}': {detail}")]
    Save { id: String, detail: String },

    /// The resource kind does not implement the requested capability.
    #[error("{operation} is not supported by {kind} resources")]
    Unsupported {
        operation: &'static str,
        kind: ResourceKind,
    },

    /// A configuration file could not be read or parsed.
    #[error("config error in {file}: {detail}")]
    Config { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by [`DependencyGraph`](crate::dependency::DependencyGraph)
/// operations. The manager maps these to [`ResourceError`] with ids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyError {
    #[error("resource {0:?} is already tracked")]
    AlreadyTracked(ResourceKey),
    #[error("resource {0:?} is not tracked")]
    Untracked(ResourceKey),
}
