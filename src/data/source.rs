//! A single Exodus output file.

use super::field::FieldData;
use super::file::{MeshFile, NetcdfMeshFile};
use crate::catalog::VariableKind;
use crate::config::ReaderConfig;
use crate::error::{ExoviewError, Result};
use crate::time_index::{locate_time, TimeRange};
use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const AXES: [&str; 3] = ["coordx", "coordy", "coordz"];

/// Which recorded timestep to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    /// One local timestep index.
    At(usize),
    /// Average over every recorded timestep.
    AllTime,
}

impl TryFrom<i64> for TimeStep {
    type Error = ExoviewError;

    /// `-1` selects the time average; other negative steps are rejected.
    fn try_from(step: i64) -> Result<Self> {
        match step {
            -1 => Ok(TimeStep::AllTime),
            s if s >= 0 => Ok(TimeStep::At(s as usize)),
            s => Err(ExoviewError::TimeStepOutOfRange { step: s, len: 0 }),
        }
    }
}

/// Elements of one block with their node positions.
#[derive(Debug, Clone)]
pub struct ElementBlock {
    /// Block id, the suffix of `connect<N>`.
    pub id: usize,
    /// Elements × nodes-per-element table of 1-based node ids.
    pub connectivity: Array2<usize>,
    /// X position of every element node.
    pub x: Array2<f64>,
    /// Y position of every element node.
    pub y: Array2<f64>,
    /// Z position of every element node.
    pub z: Array2<f64>,
}

impl ElementBlock {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.connectivity.nrows()
    }

    /// Check whether the block has no elements.
    pub fn is_empty(&self) -> bool {
        self.connectivity.nrows() == 0
    }

    /// Nodes per element.
    pub fn nodes_per_element(&self) -> usize {
        self.connectivity.ncols()
    }
}

/// Reader over one Exodus file.
///
/// Geometry, times and names are loaded when the file is opened and stay
/// readable after [`MeshSource::close`]; only variable values need the handle.
/// Dropping the source releases the handle.
#[derive(Debug)]
pub struct MeshSource<F: MeshFile = NetcdfMeshFile> {
    path: PathBuf,
    file: Option<F>,
    config: ReaderConfig,
    blocks: Vec<ElementBlock>,
    x: Array2<f64>,
    y: Array2<f64>,
    z: Array2<f64>,
    connectivity: Array2<usize>,
    num_nodes: usize,
    dim: usize,
    times: Vec<f64>,
    nodal_names: Vec<String>,
    elemental_names: Vec<String>,
}

impl MeshSource<NetcdfMeshFile> {
    /// Open an Exodus II file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path.as_ref(), NetcdfMeshFile::open)
    }
}

impl<F: MeshFile> MeshSource<F> {
    /// Open a file through a custom container opener.
    pub fn open_with<O>(path: &Path, opener: O) -> Result<Self>
    where
        O: FnOnce(&Path) -> Result<F>,
    {
        if !path.exists() {
            return Err(ExoviewError::not_found(path.display().to_string()));
        }
        let file = opener(path)?;
        Self::from_file(path, file)
    }

    /// Load geometry, times and names from an already open container.
    ///
    /// The container is released again if loading fails.
    pub fn from_file(path: impl Into<PathBuf>, mut file: F) -> Result<Self> {
        let path = path.into();
        match Layout::load(&path, &file) {
            Ok(layout) => {
                let source = Self::assemble(path, file, layout);
                info!(
                    path = %source.path.display(),
                    elements = source.num_elements(),
                    steps = source.times.len(),
                    dim = source.dim,
                    "opened mesh file"
                );
                Ok(source)
            }
            Err(err) => {
                if let Err(close_err) = file.close() {
                    warn!(path = %path.display(), error = %close_err, "failed to release file");
                }
                Err(err)
            }
        }
    }

    fn assemble(path: PathBuf, file: F, layout: Layout) -> Self {
        Self {
            path,
            file: Some(file),
            config: ReaderConfig::default(),
            blocks: layout.blocks,
            x: layout.x,
            y: layout.y,
            z: layout.z,
            connectivity: layout.connectivity,
            num_nodes: layout.num_nodes,
            dim: layout.dim,
            times: layout.times,
            nodal_names: layout.nodal_names,
            elemental_names: layout.elemental_names,
        }
    }

    /// Replace the reader configuration.
    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name, for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Number of coordinate axes present in the file.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of mesh nodes.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of elements over all blocks.
    pub fn num_elements(&self) -> usize {
        self.connectivity.nrows()
    }

    /// Recorded times, in file order.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Inclusive range of the recorded times.
    pub fn time_range(&self) -> Option<TimeRange> {
        TimeRange::of(&self.times)
    }

    /// Variable names of one kind; empty if the file has no name table.
    pub fn variable_names(&self, kind: VariableKind) -> &[String] {
        match kind {
            VariableKind::Nodal => &self.nodal_names,
            VariableKind::Elemental => &self.elemental_names,
        }
    }

    /// Element blocks in id order.
    pub fn blocks(&self) -> &[ElementBlock] {
        &self.blocks
    }

    /// One element block.
    pub fn block(&self, id: usize) -> Result<&ElementBlock> {
        self.blocks
            .iter()
            .find(|b| b.id == id)
            .ok_or(ExoviewError::UnknownBlock { id })
    }

    /// Connectivity of every block, stacked.
    pub fn connectivity(&self) -> &Array2<usize> {
        &self.connectivity
    }

    /// Per-element-node coordinates of one block, or of all blocks stacked.
    pub fn coordinates(&self, block: Option<usize>) -> Result<[ArrayView2<'_, f64>; 3]> {
        match block {
            Some(id) => {
                let b = self.block(id)?;
                Ok([b.x.view(), b.y.view(), b.z.view()])
            }
            None => Ok([self.x.view(), self.y.view(), self.z.view()]),
        }
    }

    /// Check whether the handle has been released.
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Per-element values of a variable.
    ///
    /// Nodal variables are averaged over each element's nodes; elemental
    /// variables are returned as stored. `block` restricts the result to one
    /// element block, otherwise all blocks are concatenated in id order.
    pub fn value_at(&self, name: &str, step: TimeStep, block: Option<usize>) -> Result<Array1<f64>> {
        let file = self
            .file
            .as_ref()
            .ok_or_else(|| ExoviewError::closed(&self.path))?;
        let (index, kind) = self.kind_of(name)?;
        if let TimeStep::At(i) = step {
            if i >= self.times.len() {
                return Err(ExoviewError::TimeStepOutOfRange {
                    step: i as i64,
                    len: self.times.len(),
                });
            }
        } else if self.times.is_empty() {
            return Err(ExoviewError::TimeStepOutOfRange { step: -1, len: 0 });
        }

        let blocks: Vec<&ElementBlock> = match block {
            Some(id) => vec![self.block(id)?],
            None => self.blocks.iter().collect(),
        };
        debug!(path = %self.path.display(), name, ?step, ?block, %kind, "reading variable");

        let parts = match kind {
            VariableKind::Nodal => {
                let storage = format!("vals_nod_var{}", index + 1);
                let nodal = self
                    .read_storage(file, &storage, step)?
                    .ok_or_else(|| {
                        ExoviewError::format(&self.path, format!("{} is missing", storage))
                    })?;
                blocks
                    .iter()
                    .map(|b| average_onto_elements(&nodal, &b.connectivity, &self.path))
                    .collect::<Result<Vec<_>>>()?
            }
            VariableKind::Elemental => {
                // Elemental storage is never averaged; the sentinel reads the last step.
                let step = match step {
                    TimeStep::AllTime => TimeStep::At(self.times.len() - 1),
                    at => at,
                };
                let mut parts = Vec::with_capacity(blocks.len());
                for b in &blocks {
                    let storage = format!("vals_elem_var{}eb{}", index + 1, b.id);
                    let values = match self.read_storage(file, &storage, step)? {
                        Some(values) if values.len() == b.len() => values,
                        Some(values) => {
                            return Err(ExoviewError::format(
                                &self.path,
                                format!(
                                    "{} has {} entries for {} elements",
                                    storage,
                                    values.len(),
                                    b.len()
                                ),
                            ))
                        }
                        // Not defined on this block.
                        None => Array1::from_elem(b.len(), f64::NAN),
                    };
                    parts.push(values);
                }
                parts
            }
        };

        let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
        Ok(concatenate(Axis(0), &views)?)
    }

    /// Field of a variable at a simulation time.
    pub fn get_data_at_time(&self, name: &str, time: f64, block: Option<usize>) -> Result<FieldData> {
        self.kind_of(name)?;
        let covered = self
            .time_range()
            .is_some_and(|r| r.contains(time, self.config.range_tolerance));
        if !covered {
            return Err(ExoviewError::TimeNotCovered { time });
        }
        let step = locate_time(&self.times, time, &self.config.time_tolerance).ok_or_else(|| {
            ExoviewError::TimeNotSampled {
                time,
                path: self.path.clone(),
            }
        })?;

        let values = self.value_at(name, TimeStep::At(step), block)?;
        let [x, y, z] = self.coordinates(block)?;
        FieldData::new(x.to_owned(), y.to_owned(), z.to_owned(), values)
    }

    /// Release the file handle. Calling it again does nothing.
    pub fn close(&mut self) -> Result<()> {
        match self.file.take() {
            Some(mut file) => {
                debug!(path = %self.path.display(), "closing mesh file");
                file.close()
            }
            None => Ok(()),
        }
    }

    fn kind_of(&self, name: &str) -> Result<(usize, VariableKind)> {
        if let Some(i) = self.nodal_names.iter().position(|n| n == name) {
            Ok((i, VariableKind::Nodal))
        } else if let Some(i) = self.elemental_names.iter().position(|n| n == name) {
            Ok((i, VariableKind::Elemental))
        } else {
            Err(ExoviewError::unknown_variable(name))
        }
    }

    fn read_storage(&self, file: &F, storage: &str, step: TimeStep) -> Result<Option<Array1<f64>>> {
        match step {
            TimeStep::At(i) => file.read_raw_variable(storage, i),
            TimeStep::AllTime => {
                let mut sum: Option<Array1<f64>> = None;
                for i in 0..self.times.len() {
                    let Some(row) = file.read_raw_variable(storage, i)? else {
                        return Ok(None);
                    };
                    match sum.as_mut() {
                        Some(acc) if acc.len() == row.len() => *acc += &row,
                        Some(_) => {
                            return Err(ExoviewError::format(
                                &self.path,
                                format!("{} changes length between timesteps", storage),
                            ))
                        }
                        None => sum = Some(row),
                    }
                }
                let steps = self.times.len() as f64;
                Ok(sum.map(|s| s / steps))
            }
        }
    }
}

impl<F: MeshFile> Drop for MeshSource<F> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(path = %self.path.display(), error = %err, "failed to close mesh file");
        }
    }
}

/// Average node-centered values onto elements.
///
/// `connectivity` holds 1-based node ids; each element's value is the
/// arithmetic mean over its nodes.
pub(crate) fn average_onto_elements(
    nodal: &Array1<f64>,
    connectivity: &Array2<usize>,
    path: &Path,
) -> Result<Array1<f64>> {
    let per_element = connectivity.ncols() as f64;
    connectivity
        .outer_iter()
        .map(|element| {
            let mut sum = 0.0;
            for &id in element.iter() {
                let value = id
                    .checked_sub(1)
                    .and_then(|offset| nodal.get(offset))
                    .ok_or_else(|| {
                        ExoviewError::format(
                            path,
                            format!("node id {} outside {} stored values", id, nodal.len()),
                        )
                    })?;
                sum += value;
            }
            Ok(sum / per_element)
        })
        .collect()
}

/// Geometry, times and names read from a container before assembly.
struct Layout {
    blocks: Vec<ElementBlock>,
    x: Array2<f64>,
    y: Array2<f64>,
    z: Array2<f64>,
    connectivity: Array2<usize>,
    num_nodes: usize,
    dim: usize,
    times: Vec<f64>,
    nodal_names: Vec<String>,
    elemental_names: Vec<String>,
}

impl Layout {
    fn load<F: MeshFile>(path: &Path, file: &F) -> Result<Self> {
        let x = file.read_coordinate_axis(AXES[0])?.ok_or_else(|| {
            ExoviewError::format(
                path,
                "X dimension empty. Mesh must have at least one non-empty dimension",
            )
        })?;
        let num_nodes = x.len();
        let mut dim = 1;
        let mut axes = vec![x];
        for name in &AXES[1..] {
            match file.read_coordinate_axis(name)? {
                Some(values) if values.len() == num_nodes => {
                    dim += 1;
                    axes.push(values);
                }
                Some(values) => {
                    return Err(ExoviewError::format(
                        path,
                        format!("{} has {} nodes, coordx has {}", name, values.len(), num_nodes),
                    ))
                }
                None => axes.push(vec![0.0; num_nodes]),
            }
        }

        let raw_blocks = file.read_connectivity_blocks()?;
        if raw_blocks.is_empty() {
            return Err(ExoviewError::format(path, "no element connectivity found"));
        }
        let mut blocks = Vec::with_capacity(raw_blocks.len());
        for raw in raw_blocks {
            let connectivity = raw.table.mapv(|id| usize::try_from(id).unwrap_or(0));
            if let Some(bad) = raw.table.iter().find(|&&id| id < 1 || id as usize > num_nodes) {
                return Err(ExoviewError::format(
                    path,
                    format!(
                        "connect{} references node {} of {}",
                        raw.id, bad, num_nodes
                    ),
                ));
            }
            let gather = |axis: &[f64]| connectivity.mapv(|id| axis[id - 1]);
            blocks.push(ElementBlock {
                id: raw.id,
                x: gather(&axes[0]),
                y: gather(&axes[1]),
                z: gather(&axes[2]),
                connectivity,
            });
        }

        let stack = |pick: fn(&ElementBlock) -> ArrayView2<'_, f64>| {
            let views: Vec<_> = blocks.iter().map(pick).collect();
            concatenate(Axis(0), &views).map_err(|_| {
                let widths: Vec<_> = blocks.iter().map(|b| b.nodes_per_element()).collect();
                ExoviewError::format(
                    path,
                    format!("element blocks have different nodes per element {:?}", widths),
                )
            })
        };
        let x = stack(|b| b.x.view())?;
        let y = stack(|b| b.y.view())?;
        let z = stack(|b| b.z.view())?;
        let conn_views: Vec<_> = blocks.iter().map(|b| b.connectivity.view()).collect();
        let connectivity = concatenate(Axis(0), &conn_views)?;

        let times = file.read_time_axis()?;
        let nodal_names = file.read_name_table(VariableKind::Nodal)?.unwrap_or_default();
        let elemental_names = file
            .read_name_table(VariableKind::Elemental)?
            .unwrap_or_default();
        debug!(
            path = %path.display(),
            nodal = nodal_names.len(),
            elemental = elemental_names.len(),
            "read variable names"
        );

        Ok(Self {
            blocks,
            x,
            y,
            z,
            connectivity,
            num_nodes,
            dim,
            times,
            nodal_names,
            elemental_names,
        })
    }
}
