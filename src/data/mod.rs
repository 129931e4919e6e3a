//! Data reading and representation.
//!
//! This module handles access to Exodus II files and the per-element fields
//! reconstructed from them.

mod field;
mod file;
mod memory;
mod source;

pub use field::{FieldData, FieldStats};
pub use file::{ConnectivityBlock, MeshFile, NetcdfMeshFile};
pub use memory::MemoryMeshFile;
pub use source::{ElementBlock, MeshSource, TimeStep};
