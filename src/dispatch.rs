//! Choosing between a single-file and a multi-file reader.

use crate::aggregate::{discover_shards, has_magic, MultiMeshReader};
use crate::config::ReaderConfig;
use crate::data::{FieldData, MeshFile, MeshSource, NetcdfMeshFile};
use crate::error::Result;
use std::path::Path;
use tracing::debug;

/// Operations shared by every reader.
pub trait FieldReader {
    /// Nodal variable names, sorted for multi-file readers.
    fn nodal_var_names(&self) -> &[String];

    /// Elemental variable names, sorted for multi-file readers.
    fn elemental_var_names(&self) -> &[String];

    /// Recorded times.
    fn times(&self) -> &[f64];

    /// Field of a variable at a simulation time.
    fn get_data_at_time(&self, name: &str, time: f64, block: Option<usize>) -> Result<FieldData>;

    /// Release every file handle. Calling it again does nothing.
    fn close(&mut self) -> Result<()>;
}

impl<F: MeshFile> FieldReader for MeshSource<F> {
    fn nodal_var_names(&self) -> &[String] {
        self.variable_names(crate::catalog::VariableKind::Nodal)
    }

    fn elemental_var_names(&self) -> &[String] {
        self.variable_names(crate::catalog::VariableKind::Elemental)
    }

    fn times(&self) -> &[f64] {
        MeshSource::times(self)
    }

    fn get_data_at_time(&self, name: &str, time: f64, block: Option<usize>) -> Result<FieldData> {
        MeshSource::get_data_at_time(self, name, time, block)
    }

    fn close(&mut self) -> Result<()> {
        MeshSource::close(self)
    }
}

impl<F: MeshFile> FieldReader for MultiMeshReader<F> {
    fn nodal_var_names(&self) -> &[String] {
        MultiMeshReader::nodal_var_names(self)
    }

    fn elemental_var_names(&self) -> &[String] {
        MultiMeshReader::elemental_var_names(self)
    }

    fn times(&self) -> &[f64] {
        self.global_times()
    }

    fn get_data_at_time(&self, name: &str, time: f64, block: Option<usize>) -> Result<FieldData> {
        MultiMeshReader::get_data_at_time(self, name, time, block)
    }

    fn close(&mut self) -> Result<()> {
        MultiMeshReader::close(self)
    }
}

/// Reader for a path or a glob pattern.
///
/// ```ignore
/// use exoview::{ExodusReader, FieldReader};
///
/// let mut reader = ExodusReader::open("out/run.e.*")?;
/// println!("{:?}", reader.nodal_var_names());
/// let field = reader.get_data_at_time("c_Cr", 1.0, None)?;
/// reader.close()?;
/// ```
#[derive(Debug)]
pub enum ExodusReader<F: MeshFile = NetcdfMeshFile> {
    /// One file.
    Single(MeshSource<F>),
    /// Several shards of one run.
    Multi(MultiMeshReader<F>),
}

impl ExodusReader<NetcdfMeshFile> {
    /// Open a file, or every file matching a pattern.
    pub fn open(path_or_pattern: &str) -> Result<Self> {
        Self::open_with(path_or_pattern, ReaderConfig::default(), NetcdfMeshFile::open)
    }
}

impl<F: MeshFile> ExodusReader<F> {
    /// Open through a custom container opener.
    ///
    /// A pattern with wildcards gives a multi-file reader, even if only one
    /// file matches. A plain path gives a single-file reader.
    pub fn open_with<O>(path_or_pattern: &str, config: ReaderConfig, opener: O) -> Result<Self>
    where
        O: FnMut(&Path) -> Result<F>,
    {
        if has_magic(path_or_pattern) {
            let matches = discover_shards(path_or_pattern)?;
            debug!(pattern = path_or_pattern, files = matches.len(), "using multi-file reader");
            MultiMeshReader::from_paths(path_or_pattern, &matches, config, opener).map(Self::Multi)
        } else {
            debug!(path = path_or_pattern, "using single-file reader");
            MeshSource::open_with(Path::new(path_or_pattern), opener)
                .map(|s| Self::Single(s.with_config(config)))
        }
    }

    /// Check whether this reader spans several files.
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// Spatial dimension of the mesh.
    pub fn dim(&self) -> usize {
        match self {
            Self::Single(s) => s.dim(),
            Self::Multi(m) => m.dim(),
        }
    }

    /// Number of open files.
    pub fn file_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi(m) => m.sources().len(),
        }
    }

    fn reader(&self) -> &dyn FieldReader {
        match self {
            Self::Single(s) => s,
            Self::Multi(m) => m,
        }
    }
}

impl<F: MeshFile> FieldReader for ExodusReader<F> {
    fn nodal_var_names(&self) -> &[String] {
        self.reader().nodal_var_names()
    }

    fn elemental_var_names(&self) -> &[String] {
        self.reader().elemental_var_names()
    }

    fn times(&self) -> &[f64] {
        self.reader().times()
    }

    fn get_data_at_time(&self, name: &str, time: f64, block: Option<usize>) -> Result<FieldData> {
        self.reader().get_data_at_time(name, time, block)
    }

    fn close(&mut self) -> Result<()> {
        match self {
            Self::Single(s) => s.close(),
            Self::Multi(m) => m.close(),
        }
    }
}
