//! Vellum Data -- data-driven datasheet resources.
//!
//! A datasheet is an XML document that describes one typed object. It may
//! name a `parent` datasheet; the object is then built from the whole
//! ancestor chain, base first, with each document overlaying only the
//! members it declares.
//!
//! ```rust,ignore
//! let mut types = DatasheetTypes::new();
//! types.register_default::<Unit>("unit")?;
//! types.register_enum("rank", &["recruit", "veteran", "elite"])?;
//! let types = Rc::new(types);
//!
//! let mut manager = ResourceManager::init(ResourceConfig::with_root("assets"))?;
//! vellum_data::install(&mut manager, &types);
//! let orc = vellum_data::datasheet_object::<Unit>(&mut manager, "Orc.unit");
//! ```
//!
//! # Key Types
//!
//! - [`Datasheet`] -- the resource kind; owns the document and root object.
//! - [`DataReader`] -- typed member reads that never fail.
//! - [`DatasheetTypes`] -- object constructors and named enums.
//! - [`DatasheetDocument`] -- the parsed XML tree.

pub mod datasheet;
pub mod document;
pub mod error;
pub mod inheritance;
pub mod object;
pub mod reader;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use datasheet::{Datasheet, datasheet_object};
pub use document::{DataNode, DatasheetDocument};
pub use error::DatasheetError;
pub use inheritance::AncestorStack;
pub use object::{DatasheetObject, DatasheetRef};
pub use reader::{DataReader, DataValue, DatasheetEnumValue};
pub use types::{DatasheetEnum, DatasheetTypes, ObjectConstructor, install};
