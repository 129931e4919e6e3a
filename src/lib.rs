//! Exoview - read Exodus II simulation output as per-element fields.
//!
//! Exoview reads finite-element results stored in Exodus II files, either a
//! single file or the set of shards written by a distributed run, and
//! reconstructs a variable at a given simulation time as element node
//! positions plus one value per element.
//!
//! # Features
//!
//! - Nodal variables averaged onto elements through the connectivity table
//! - Elemental variables read per element block
//! - Variable catalogs and time axes merged across shards
//! - Shards selected by inclusive time-range membership
//! - Glob patterns dispatch to a multi-file reader automatically
//!
//! # Example
//!
//! ```ignore
//! use exoview::{ExodusReader, FieldReader};
//!
//! // Open every shard of a run
//! let mut reader = ExodusReader::open("results/out.e.*")?;
//!
//! // Reconstruct a field
//! let field = reader.get_data_at_time("c_Cr", 1.0, None)?;
//! println!("{} elements, mean {:?}", field.len(), field.stats().mean);
//! reader.close()?;
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod error;
pub mod time_index;

pub use aggregate::MultiMeshReader;
pub use catalog::{VariableCatalog, VariableKind};
pub use config::{ReaderConfig, TimeTolerance};
pub use data::{FieldData, FieldStats, MeshFile, MeshSource, MemoryMeshFile, NetcdfMeshFile, TimeStep};
pub use dispatch::{ExodusReader, FieldReader};
pub use error::{ExoviewError, Result};
pub use time_index::{TimeIndex, TimeRange};
