//! Reading a sharded run as one dataset.
//!
//! A distributed simulation writes one file per shard. Shards may cover
//! different time spans, different mesh partitions, or both. The
//! [`MultiMeshReader`] opens every shard once, merges their variable catalogs
//! and time axes, and answers each query from the shards whose time range
//! contains the requested time.

use crate::catalog::VariableCatalog;
use crate::config::ReaderConfig;
use crate::data::{FieldData, MeshFile, MeshSource, NetcdfMeshFile, TimeStep};
use crate::error::{ExoviewError, Result};
use crate::time_index::TimeIndex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Check whether a path contains glob wildcard syntax.
pub fn has_magic(pattern: &str) -> bool {
    pattern.contains(&['*', '?', '['][..])
}

/// Every existing file matching a glob pattern, in lexicographic order.
pub fn discover_shards(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in glob::glob(pattern)? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "skipping unreadable path"),
        }
    }
    debug!(pattern, matches = paths.len(), "expanded file pattern");
    Ok(paths)
}

/// Reader over the shards of one simulation run.
#[derive(Debug)]
pub struct MultiMeshReader<F: MeshFile = NetcdfMeshFile> {
    pattern: String,
    sources: Vec<MeshSource<F>>,
    catalog: VariableCatalog,
    time_index: TimeIndex,
    config: ReaderConfig,
    dim: usize,
}

impl MultiMeshReader<NetcdfMeshFile> {
    /// Open every file matching `pattern`.
    pub fn open(pattern: &str) -> Result<Self> {
        Self::open_with(pattern, ReaderConfig::default(), NetcdfMeshFile::open)
    }
}

impl<F: MeshFile> MultiMeshReader<F> {
    /// Open every file matching `pattern` through a custom container opener.
    pub fn open_with<O>(pattern: &str, config: ReaderConfig, opener: O) -> Result<Self>
    where
        O: FnMut(&Path) -> Result<F>,
    {
        let paths = discover_shards(pattern)?;
        Self::from_paths(pattern, &paths, config, opener)
    }

    pub(crate) fn from_paths<O>(
        pattern: &str,
        paths: &[PathBuf],
        config: ReaderConfig,
        mut opener: O,
    ) -> Result<Self>
    where
        O: FnMut(&Path) -> Result<F>,
    {
        if paths.is_empty() {
            return Err(ExoviewError::not_found(pattern));
        }
        // Sources opened before a failure are released when the vector drops.
        let sources = paths
            .iter()
            .map(|p| MeshSource::open_with(p, &mut opener))
            .collect::<Result<Vec<_>>>()?;
        Self::build(pattern.to_string(), sources, config)
    }

    /// Aggregate sources that are already open, keeping their order.
    pub fn from_sources(sources: Vec<MeshSource<F>>, config: ReaderConfig) -> Result<Self> {
        let pattern = sources
            .iter()
            .map(|s| s.path().display().to_string())
            .collect::<Vec<_>>()
            .join(",");
        if sources.is_empty() {
            return Err(ExoviewError::not_found(pattern));
        }
        Self::build(pattern, sources, config)
    }

    fn build(pattern: String, sources: Vec<MeshSource<F>>, config: ReaderConfig) -> Result<Self> {
        let dim = sources[0].dim();
        if let Some(odd) = sources.iter().find(|s| s.dim() != dim) {
            return Err(ExoviewError::format(
                odd.path(),
                format!(
                    "mesh is {}-dimensional but {} is {}-dimensional",
                    odd.dim(),
                    sources[0].path().display(),
                    dim
                ),
            ));
        }

        let catalog = VariableCatalog::merge(&sources);
        let time_index = TimeIndex::build(&sources, config.time_tolerance);
        info!(
            pattern = %pattern,
            files = sources.len(),
            steps = time_index.global_times().len(),
            nodal = catalog.nodal().len(),
            elemental = catalog.elemental().len(),
            "opened sharded run"
        );

        Ok(Self {
            pattern,
            sources: sources.into_iter().map(|s| s.with_config(config)).collect(),
            catalog,
            time_index,
            config,
            dim,
        })
    }

    /// Pattern the reader was built from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Shards in discovery order.
    pub fn sources(&self) -> &[MeshSource<F>] {
        &self.sources
    }

    /// Merged variable catalog.
    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    /// Merged time index.
    pub fn time_index(&self) -> &TimeIndex {
        &self.time_index
    }

    /// Nodal variable names present in at least one shard, sorted.
    pub fn nodal_var_names(&self) -> &[String] {
        self.catalog.nodal()
    }

    /// Elemental variable names present in at least one shard, sorted.
    pub fn elemental_var_names(&self) -> &[String] {
        self.catalog.elemental()
    }

    /// Sorted union of every shard's times.
    pub fn global_times(&self) -> &[f64] {
        self.time_index.global_times()
    }

    /// Spatial dimension shared by all shards.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Field of a variable at a simulation time, stitched across shards.
    ///
    /// Every shard whose time range contains `time` contributes its elements,
    /// in discovery order. With `block` set, covering shards without that
    /// block are skipped.
    pub fn get_data_at_time(&self, name: &str, time: f64, block: Option<usize>) -> Result<FieldData> {
        if !self.catalog.validate(name) {
            return Err(ExoviewError::unknown_variable(name));
        }
        let mut hits = self
            .time_index
            .sources_containing(time, self.config.range_tolerance);
        if hits.is_empty() {
            return Err(ExoviewError::TimeNotCovered { time });
        }
        if let Some(id) = block {
            // Partitioned runs spread blocks over shards.
            hits.retain(|&i| self.sources[i].block(id).is_ok());
            if hits.is_empty() {
                return Err(ExoviewError::UnknownBlock { id });
            }
        }
        debug!(name, time, shards = ?hits, "reading field");

        let mut parts = Vec::with_capacity(hits.len());
        for i in hits {
            parts.push(self.get_data_from_source(name, time, i, block)?);
        }
        FieldData::concatenate(&parts)
    }

    /// Field of a variable at a simulation time, from one shard only.
    pub fn get_data_from_source(
        &self,
        name: &str,
        time: f64,
        source: usize,
        block: Option<usize>,
    ) -> Result<FieldData> {
        if !self.catalog.validate(name) {
            return Err(ExoviewError::unknown_variable(name));
        }
        let shard = self
            .sources
            .get(source)
            .ok_or(ExoviewError::TimeNotCovered { time })?;
        let step = self.time_index.locate_within_source(source, time)?;
        let values = shard.value_at(name, TimeStep::At(step), block)?;
        let [x, y, z] = shard.coordinates(block)?;
        FieldData::new(x.to_owned(), y.to_owned(), z.to_owned(), values)
    }

    /// Close every shard.
    ///
    /// All shards are attempted even if some fail; the first failure is
    /// returned afterwards. Closing again does nothing.
    pub fn close(&mut self) -> Result<()> {
        let mut first_err = None;
        for source in &mut self.sources {
            if let Err(err) = source.close() {
                warn!(path = %source.path().display(), error = %err, "failed to close shard");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
