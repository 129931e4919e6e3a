//! In-memory mesh container.
//!
//! Useful for synthetic meshes and for exercising the readers without a
//! netCDF file on disk.

use super::file::{ConnectivityBlock, MeshFile};
use crate::catalog::VariableKind;
use crate::error::{ExoviewError, Result};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mesh file held entirely in memory.
///
/// Storage variables are `time × entries` tables keyed by their Exodus
/// storage name (`vals_nod_var1`, `vals_elem_var2eb1`, ...).
#[derive(Debug, Clone, Default)]
pub struct MemoryMeshFile {
    axes: HashMap<String, Vec<f64>>,
    blocks: Vec<ConnectivityBlock>,
    times: Vec<f64>,
    nodal_names: Option<Vec<String>>,
    elemental_names: Option<Vec<String>>,
    variables: HashMap<String, Array2<f64>>,
    closes: Arc<AtomicUsize>,
    fail_on_close: bool,
}

impl MemoryMeshFile {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a coordinate axis (`coordx`, `coordy` or `coordz`).
    pub fn with_axis(mut self, name: &str, values: Vec<f64>) -> Self {
        self.axes.insert(name.to_string(), values);
        self
    }

    /// Add an element block with 1-based node ids.
    pub fn with_block(mut self, id: usize, table: Array2<i64>) -> Self {
        self.blocks.push(ConnectivityBlock { id, table });
        self.blocks.sort_by_key(|b| b.id);
        self
    }

    /// Set the recorded times.
    pub fn with_times(mut self, times: Vec<f64>) -> Self {
        self.times = times;
        self
    }

    /// Set the name table for one kind of variable.
    pub fn with_names(mut self, kind: VariableKind, names: &[&str]) -> Self {
        let names = Some(names.iter().map(|n| n.to_string()).collect());
        match kind {
            VariableKind::Nodal => self.nodal_names = names,
            VariableKind::Elemental => self.elemental_names = names,
        }
        self
    }

    /// Add a storage variable as a `time × entries` table.
    pub fn with_variable(mut self, storage_name: &str, values: Array2<f64>) -> Self {
        self.variables.insert(storage_name.to_string(), values);
        self
    }

    /// Make [`MeshFile::close`] report an error after releasing.
    pub fn failing_close(mut self) -> Self {
        self.fail_on_close = true;
        self
    }

    /// Shared counter of how many times this container has been closed.
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

impl MeshFile for MemoryMeshFile {
    fn read_coordinate_axis(&self, name: &str) -> Result<Option<Vec<f64>>> {
        Ok(self.axes.get(name).cloned())
    }

    fn read_connectivity_blocks(&self) -> Result<Vec<ConnectivityBlock>> {
        Ok(self.blocks.clone())
    }

    fn read_time_axis(&self) -> Result<Vec<f64>> {
        Ok(self.times.clone())
    }

    fn read_name_table(&self, kind: VariableKind) -> Result<Option<Vec<String>>> {
        Ok(match kind {
            VariableKind::Nodal => self.nodal_names.clone(),
            VariableKind::Elemental => self.elemental_names.clone(),
        })
    }

    fn read_raw_variable(&self, name: &str, timestep: usize) -> Result<Option<Array1<f64>>> {
        let Some(table) = self.variables.get(name) else {
            return Ok(None);
        };
        if timestep >= table.nrows() {
            return Err(ExoviewError::TimeStepOutOfRange {
                step: timestep as i64,
                len: table.nrows(),
            });
        }
        Ok(Some(table.row(timestep).to_owned()))
    }

    fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_close {
            return Err(ExoviewError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected close failure",
            )));
        }
        Ok(())
    }
}
