//! Access to the Exodus II container.
//!
//! [`MeshFile`] is the narrow interface the readers consume. Everything above
//! it works on plain vectors and `ndarray` arrays and never sees netCDF.

use crate::catalog::VariableKind;
use crate::error::{ExoviewError, Result};
use ndarray::{Array1, Array2};
use netcdf::types::{FloatType, IntType, NcVariableType};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Legacy Exodus files store every axis in one `coord` variable.
const STACKED_COORDINATES: &str = "coord";
const TIME_AXIS: &str = "time_whole";
const CONNECTIVITY_PREFIX: &str = "connect";

/// Connectivity of one element block.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityBlock {
    /// Block id, the numeric suffix of the `connect<N>` variable.
    pub id: usize,
    /// Elements × nodes-per-element table of 1-based node ids.
    pub table: Array2<i64>,
}

/// Raw reads against one mesh output file.
pub trait MeshFile {
    /// Read a coordinate axis (`coordx`, `coordy`, `coordz`).
    fn read_coordinate_axis(&self, name: &str) -> Result<Option<Vec<f64>>>;

    /// Read every element block's connectivity, ordered by block id.
    fn read_connectivity_blocks(&self) -> Result<Vec<ConnectivityBlock>>;

    /// Read the recorded simulation times.
    fn read_time_axis(&self) -> Result<Vec<f64>>;

    /// Read the variable name table for one kind, if the file has one.
    fn read_name_table(&self, kind: VariableKind) -> Result<Option<Vec<String>>>;

    /// Read one timestep of a storage variable such as `vals_nod_var1`.
    fn read_raw_variable(&self, name: &str, timestep: usize) -> Result<Option<Array1<f64>>>;

    /// Release the underlying handle.
    fn close(&mut self) -> Result<()>;
}

/// Parse the block id out of a `connect<N>` variable name.
pub(crate) fn connectivity_block_id(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(CONNECTIVITY_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Decode a fixed-width character table: one row per name, NUL padded.
pub(crate) fn decode_name_table(raw: &[u8], width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    raw.chunks(width)
        .map(|row| {
            let end = row.iter().position(|&b| b == 0).unwrap_or(row.len());
            // Latin-1 maps every byte to the code point of the same value.
            let name: String = row[..end].iter().map(|&b| b as char).collect();
            name.trim_end().to_string()
        })
        .collect()
}

/// Exodus II file read through the `netcdf` crate.
pub struct NetcdfMeshFile {
    path: PathBuf,
    file: Option<netcdf::File>,
}

impl fmt::Debug for NetcdfMeshFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetcdfMeshFile")
            .field("path", &self.path)
            .field("open", &self.file.is_some())
            .finish()
    }
}

impl NetcdfMeshFile {
    /// Open an Exodus II file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ExoviewError::not_found(path.display().to_string()));
        }
        let file = netcdf::open(path).map_err(|e| {
            ExoviewError::NetCDF(format!("Failed to open {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "opened netCDF container");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&self) -> Result<&netcdf::File> {
        self.file
            .as_ref()
            .ok_or_else(|| ExoviewError::closed(&self.path))
    }

    fn shape(var: &netcdf::Variable<'_>) -> Vec<usize> {
        var.dimensions().iter().map(|d| d.len()).collect()
    }
}

impl MeshFile for NetcdfMeshFile {
    fn read_coordinate_axis(&self, name: &str) -> Result<Option<Vec<f64>>> {
        let file = self.file()?;
        if let Some(var) = file.variable(name) {
            let shape = Self::shape(&var);
            let extents: Vec<Range<usize>> = shape.iter().map(|&n| 0..n).collect();
            return read_as_f64(&var, &extents).map(Some);
        }

        let row = match name {
            "coordx" => 0,
            "coordy" => 1,
            "coordz" => 2,
            _ => return Ok(None),
        };
        let Some(var) = file.variable(STACKED_COORDINATES) else {
            return Ok(None);
        };
        let shape = Self::shape(&var);
        if shape.len() != 2 || row >= shape[0] {
            return Ok(None);
        }
        read_as_f64(&var, &[row..row + 1, 0..shape[1]]).map(Some)
    }

    fn read_connectivity_blocks(&self) -> Result<Vec<ConnectivityBlock>> {
        let file = self.file()?;
        let mut blocks = Vec::new();
        for var in file.variables() {
            let name = var.name();
            let Some(id) = connectivity_block_id(&name) else {
                continue;
            };
            let shape = Self::shape(&var);
            if shape.len() != 2 {
                return Err(ExoviewError::format(
                    &self.path,
                    format!("{} must be two-dimensional, found shape {:?}", name, shape),
                ));
            }
            let ids = read_ids(&var, &self.path)?;
            let table = Array2::from_shape_vec((shape[0], shape[1]), ids)?;
            blocks.push(ConnectivityBlock { id, table });
        }
        blocks.sort_by_key(|b| b.id);
        Ok(blocks)
    }

    fn read_time_axis(&self) -> Result<Vec<f64>> {
        let file = self.file()?;
        match file.variable(TIME_AXIS) {
            Some(var) => {
                let len = Self::shape(&var).first().copied().unwrap_or(0);
                read_as_f64(&var, &[0..len])
            }
            None => Ok(Vec::new()),
        }
    }

    fn read_name_table(&self, kind: VariableKind) -> Result<Option<Vec<String>>> {
        let file = self.file()?;
        let Some(var) = file.variable(kind.name_table()) else {
            return Ok(None);
        };
        let shape = Self::shape(&var);
        if shape.len() != 2 {
            return Ok(None);
        }
        let raw: Vec<u8> = var.get_raw_values(..)?;
        Ok(Some(decode_name_table(&raw, shape[1])))
    }

    fn read_raw_variable(&self, name: &str, timestep: usize) -> Result<Option<Array1<f64>>> {
        let file = self.file()?;
        let Some(var) = file.variable(name) else {
            return Ok(None);
        };
        let shape = Self::shape(&var);
        if shape.len() != 2 {
            return Err(ExoviewError::format(
                &self.path,
                format!("{} must be (time, entries), found shape {:?}", name, shape),
            ));
        }
        if timestep >= shape[0] {
            return Err(ExoviewError::TimeStepOutOfRange {
                step: timestep as i64,
                len: shape[0],
            });
        }
        let values = read_as_f64(&var, &[timestep..timestep + 1, 0..shape[1]])?;
        Ok(Some(Array1::from_vec(values)))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            drop(file);
            debug!(path = %self.path.display(), "closed netCDF container");
        }
        Ok(())
    }
}

/// Read a numeric hyperslab as `f64`, whatever the storage type.
fn read_as_f64(var: &netcdf::Variable<'_>, extents: &[Range<usize>]) -> Result<Vec<f64>> {
    let vartype = var.vartype();
    let failed = |e: netcdf::Error| {
        ExoviewError::NetCDF(format!("Failed to read {}: {}", var.name(), e))
    };

    let values = match vartype {
        NcVariableType::Float(FloatType::F64) => var.get_values::<f64, _>(extents).map_err(failed)?,
        NcVariableType::Float(FloatType::F32) => var
            .get_values::<f32, _>(extents)
            .map_err(failed)?
            .into_iter()
            .map(f64::from)
            .collect(),
        NcVariableType::Int(IntType::I64) => var
            .get_values::<i64, _>(extents)
            .map_err(failed)?
            .into_iter()
            .map(|x| x as f64)
            .collect(),
        NcVariableType::Int(IntType::I32) => var
            .get_values::<i32, _>(extents)
            .map_err(failed)?
            .into_iter()
            .map(f64::from)
            .collect(),
        NcVariableType::Int(IntType::I16) => var
            .get_values::<i16, _>(extents)
            .map_err(failed)?
            .into_iter()
            .map(f64::from)
            .collect(),
        NcVariableType::Int(IntType::U32) => var
            .get_values::<u32, _>(extents)
            .map_err(failed)?
            .into_iter()
            .map(f64::from)
            .collect(),
        _ => {
            return Err(ExoviewError::NetCDF(format!(
                "Unsupported type {:?} for {}",
                vartype,
                var.name()
            )))
        }
    };
    Ok(values)
}

/// Read a connectivity table as signed ids.
fn read_ids(var: &netcdf::Variable<'_>, path: &Path) -> Result<Vec<i64>> {
    match var.vartype() {
        NcVariableType::Int(IntType::I32) => Ok(var
            .get_values::<i32, _>(..)?
            .into_iter()
            .map(i64::from)
            .collect()),
        NcVariableType::Int(IntType::I64) => Ok(var.get_values::<i64, _>(..)?),
        other => Err(ExoviewError::format(
            path,
            format!("{} has non-integer type {:?}", var.name(), other),
        )),
    }
}
