//! Vellum Core -- the resource manager behind a data-driven game engine.
//!
//! Content files (textures, sound cues, datasheets, ...) are registered by
//! id, loaded lazily, and linked into a live dependency graph so that edits
//! ripple out to every resource and external observer that reads them.
//!
//! # Resource Lifecycle
//!
//! 1. **Register** -- [`ResourceManager::init`] or
//!    [`ResourceManager::parse_directory`] assign an id to every file.
//! 2. **Load** -- the first [`ResourceManager::get`] resolves the resource
//!    kind, builds the payload through a registered factory and parses it.
//! 3. **Track** -- the payload's declared dependencies are captured into the
//!    [`DependencyGraph`](dependency::DependencyGraph).
//! 4. **Update / Remove** -- editor operations notify referencers first and
//!    listeners second, keeping graph edges symmetric at every step.
//!
//! ```rust,ignore
//! let mut manager = ResourceManager::init(ResourceConfig::with_root("assets"))?;
//! manager.register_factory(ResourceKind::Custom("stub".into()), StubResource::constructor());
//! let key = manager.load("Fireball.skill", None)?;
//! manager.register_listener("Fireball.skill", ListenerHandle(1), Box::new(|event| {
//!     println!("{event:?}");
//! }))?;
//! ```
//!
//! # Key Types
//!
//! - [`registry::ResourceManager`] -- id→record registry and lifecycle.
//! - [`loader::ResourceFactories`] -- kind resolution and constructors.
//! - [`dependency::DependencyGraph`] -- dependency/referencer sets and
//!   listener fan-out.
//! - [`resource::Resource`] -- the capability contract of every payload.
//! - [`locator::FileLocator`] -- normalized file paths and extensions.

pub mod config;
pub mod dependency;
pub mod error;
pub mod event;
pub mod id;
pub mod kind;
pub mod loader;
pub mod locator;
pub mod registry;
pub mod resource;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::ResourceConfig;
pub use dependency::{DependencyGraph, DependencyHost, DependencyRecord};
pub use error::{DependencyError, ResourceError};
pub use event::{ResourceEvent, ResourceEventKind, ResourceListener};
pub use id::{ListenerHandle, ResourceKey};
pub use kind::ResourceKind;
pub use loader::{LoadContext, ResourceConstructor, ResourceFactories};
pub use locator::FileLocator;
pub use registry::{ResourceManager, ResourceRecord};
pub use resource::{Resource, ResourceInfo};
