//! Shared fixtures for integration tests.

#![allow(dead_code)]

use exoview::{MemoryMeshFile, VariableKind};
use ndarray::{array, Array2};
use std::path::Path;

/// Two-element line mesh: nodes at x = 0, 1, 2, elements [1, 2] and [2, 3].
pub fn line_mesh(offset: f64) -> MemoryMeshFile {
    MemoryMeshFile::new()
        .with_axis("coordx", vec![offset, offset + 1.0, offset + 2.0])
        .with_block(1, array![[1, 2], [2, 3]])
}

/// Shard covering t = 0, 1 with nodal {c_Cr, a} and elemental {e1}.
pub fn shard_one() -> MemoryMeshFile {
    line_mesh(0.0)
        .with_times(vec![0.0, 1.0])
        .with_names(VariableKind::Nodal, &["c_Cr", "a"])
        .with_names(VariableKind::Elemental, &["e1"])
        // c_Cr
        .with_variable("vals_nod_var1", array![[0.0, 2.0, 4.0], [10.0, 20.0, 30.0]])
        // a
        .with_variable("vals_nod_var2", Array2::zeros((2, 3)))
        .with_variable("vals_elem_var1eb1", array![[1.0, 2.0], [3.0, 4.0]])
}

/// Shard covering t = 2, 3 with nodal {b, c_Cr} and elemental {e2}.
pub fn shard_two() -> MemoryMeshFile {
    line_mesh(10.0)
        .with_times(vec![2.0, 3.0])
        .with_names(VariableKind::Nodal, &["b", "c_Cr"])
        .with_names(VariableKind::Elemental, &["e2"])
        .with_variable("vals_nod_var1", Array2::ones((2, 3)))
        // c_Cr
        .with_variable("vals_nod_var2", array![[1.0, 1.0, 1.0], [5.0, 7.0, 9.0]])
        .with_variable("vals_elem_var1eb1", array![[0.5, 0.5], [0.5, 0.5]])
}

/// Shard starting where `shard_one` ends, at t = 1.
pub fn shard_from_one() -> MemoryMeshFile {
    line_mesh(20.0)
        .with_times(vec![1.0, 1.5])
        .with_names(VariableKind::Nodal, &["c_Cr"])
        .with_variable("vals_nod_var1", array![[100.0, 100.0, 100.0], [0.0, 0.0, 0.0]])
}

/// Pick a fixture by file name, standing in for a real container opener.
pub fn fixture_for(path: &Path) -> exoview::Result<MemoryMeshFile> {
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    if name.contains("shard1") {
        Ok(shard_one())
    } else if name.contains("shard2") {
        Ok(shard_two())
    } else if name.contains("shard3") {
        Ok(shard_from_one())
    } else {
        Err(exoview::ExoviewError::format(path, "no fixture"))
    }
}

/// Write a small two-block Exodus file with `netcdf::create`.
///
/// Quad mesh of four nodes in block 1, one extra quad in block 2; no name
/// tables, times 0.0 and 0.5, one nodal storage variable.
pub fn write_exodus(path: &Path, with_coordx: bool) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    file.add_dimension("num_nodes", 6)?;
    file.add_dimension("num_el_in_blk1", 1)?;
    file.add_dimension("num_el_in_blk2", 1)?;
    file.add_dimension("num_nod_per_el1", 4)?;
    file.add_dimension("num_nod_per_el2", 4)?;
    file.add_dimension("time_step", 2)?;

    if with_coordx {
        let mut x = file.add_variable::<f64>("coordx", &["num_nodes"])?;
        x.put_values(&[0.0, 1.0, 1.0, 0.0, 2.0, 2.0], ..)?;
    }
    let mut y = file.add_variable::<f64>("coordy", &["num_nodes"])?;
    y.put_values(&[0.0, 0.0, 1.0, 1.0, 0.0, 1.0], ..)?;

    let mut c1 = file.add_variable::<i32>("connect1", &["num_el_in_blk1", "num_nod_per_el1"])?;
    c1.put_values(&[1, 2, 3, 4], ..)?;
    let mut c2 = file.add_variable::<i32>("connect2", &["num_el_in_blk2", "num_nod_per_el2"])?;
    c2.put_values(&[2, 5, 6, 3], ..)?;

    let mut t = file.add_variable::<f64>("time_whole", &["time_step"])?;
    t.put_values(&[0.0, 0.5], ..)?;

    let mut v = file.add_variable::<f32>("vals_nod_var1", &["time_step", "num_nodes"])?;
    v.put_values(
        &[
            0.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, //
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0,
        ],
        ..,
    )?;
    Ok(())
}
