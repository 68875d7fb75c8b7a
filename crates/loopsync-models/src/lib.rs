#![deny(missing_docs)]

//! # loopsync models
//!
//! Pure data types for the Loopio → Oracle Content Management bridge.
//! Nothing in this crate performs I/O.
//!
//! ## Data flow
//!
//! ```text
//! Loopio library entry (serde_json::Value)
//! └── FieldMap::transform(record, AssetTarget)
//!     └── DestinationAsset
//!         ├── fields  ← FieldRule::{Text, Structured, Projected}
//!         └── tags    ← TagSet { data: [Tag { name }] }
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`path`] | `FieldPath`, a safe evaluator for nested JSON access |
//! | [`filter`] | `SourceFilter`, the Loopio query filter expression |
//! | [`mapping`] | `FieldMap` and `FieldRule`, the declarative field map |
//! | [`asset`] | `DestinationAsset`, `TagSet`, `AssetTarget` |

pub mod asset;
pub mod error;
pub mod filter;
pub mod mapping;
pub mod path;

// Re-export all public types at crate root for convenience.
pub use asset::*;
pub use error::*;
pub use filter::*;
pub use mapping::*;
pub use path::*;
