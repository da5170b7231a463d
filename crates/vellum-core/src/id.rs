use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a resource record in the manager's arena. Stable across
    /// `move_resource`, invalidated by removal.
    pub struct ResourceKey;
}

/// Opaque owner handle for listener registrations. One subsystem (an editor
/// panel, a preview window) uses the same handle for every listener it
/// registers, so it can drop all of them at once on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListenerHandle(pub u64);
