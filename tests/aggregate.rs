mod common;

use common::{line_mesh, shard_from_one, shard_one, shard_two};
use exoview::{
    ExoviewError, MemoryMeshFile, MeshSource, MultiMeshReader, ReaderConfig, VariableKind,
};
use ndarray::array;
use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

fn source(name: &str, file: MemoryMeshFile) -> MeshSource<MemoryMeshFile> {
    MeshSource::from_file(name, file).unwrap()
}

fn two_shards() -> MultiMeshReader<MemoryMeshFile> {
    MultiMeshReader::from_sources(
        vec![source("out.e.2.0", shard_one()), source("out.e.2.1", shard_two())],
        ReaderConfig::default(),
    )
    .unwrap()
}

#[test]
fn catalog_is_sorted_union_of_shards() {
    let reader = two_shards();
    assert_eq!(reader.nodal_var_names(), &["a", "b", "c_Cr"]);
    assert_eq!(reader.elemental_var_names(), &["e1", "e2"]);
    assert_eq!(reader.global_times(), &[0.0, 1.0, 2.0, 3.0]);
    assert_eq!(reader.dim(), 1);
}

#[test]
fn catalog_does_not_depend_on_shard_order() {
    let reversed = MultiMeshReader::from_sources(
        vec![source("out.e.2.1", shard_two()), source("out.e.2.0", shard_one())],
        ReaderConfig::default(),
    )
    .unwrap();
    assert_eq!(reversed.catalog(), two_shards().catalog());
}

#[test]
fn query_reads_only_the_covering_shard() {
    let reader = two_shards();

    let field = reader.get_data_at_time("c_Cr", 1.0, None).unwrap();
    assert_eq!(field.values, array![15.0, 25.0]);
    assert_eq!(field.x, array![[0.0, 1.0], [1.0, 2.0]]);
    assert_eq!(field.y.dim(), (2, 2));
    assert_eq!(field.z.dim(), (2, 2));

    // c_Cr is the second nodal variable of the second shard.
    let field = reader.get_data_at_time("c_Cr", 3.0, None).unwrap();
    assert_eq!(field.values, array![6.0, 8.0]);
    assert_eq!(field.x, array![[10.0, 11.0], [11.0, 12.0]]);
}

#[test]
fn time_between_shards_is_not_covered() {
    let err = two_shards().get_data_at_time("c_Cr", 1.5, None).unwrap_err();
    assert!(err.is_time_not_covered());
    assert!(matches!(err, ExoviewError::TimeNotCovered { .. }));
}

#[test]
fn unknown_name_wins_over_bad_time() {
    let reader = two_shards();
    for t in [1.0, 1.5, 99.0] {
        let err = reader.get_data_at_time("missing", t, None).unwrap_err();
        assert!(err.is_name_error(), "t = {}: {}", t, err);
    }
}

#[test]
fn elemental_variables_are_not_averaged() {
    let field = two_shards().get_data_at_time("e1", 0.0, None).unwrap();
    assert_eq!(field.values, array![1.0, 2.0]);
}

#[test]
fn variable_missing_from_covering_shard_is_a_name_error() {
    // b is only defined in the second shard.
    let err = two_shards().get_data_at_time("b", 1.0, None).unwrap_err();
    assert!(err.is_name_error());
}

#[test]
fn shared_boundary_concatenates_every_covering_shard() {
    let reader = MultiMeshReader::from_sources(
        vec![source("a.e", shard_one()), source("b.e", shard_from_one())],
        ReaderConfig::default(),
    )
    .unwrap();

    assert_eq!(reader.time_index().sources_containing(1.0, 0.0), vec![0, 1]);

    let field = reader.get_data_at_time("c_Cr", 1.0, None).unwrap();
    assert_eq!(field.len(), 4);
    assert_eq!(field.values, array![15.0, 25.0, 100.0, 100.0]);
    assert_eq!(field.x.nrows(), 4);
    assert_eq!(field.x[[2, 0]], 20.0);

    let field = reader.get_data_at_time("c_Cr", 1.5, None).unwrap();
    assert_eq!(field.len(), 2);
}

#[test]
fn sparse_shard_sampling_is_surfaced() {
    let sparse = line_mesh(0.0)
        .with_times(vec![0.0, 2.0])
        .with_names(VariableKind::Nodal, &["c_Cr"])
        .with_variable("vals_nod_var1", ndarray::Array2::zeros((2, 3)));
    let reader = MultiMeshReader::from_sources(
        vec![source("sparse.e", sparse)],
        ReaderConfig::default(),
    )
    .unwrap();

    let err = reader.get_data_at_time("c_Cr", 1.0, None).unwrap_err();
    assert!(matches!(err, ExoviewError::TimeNotSampled { .. }));
    assert!(err.to_string().contains("sparse.e"));
}

#[test]
fn range_tolerance_admits_times_just_outside() {
    let config = ReaderConfig {
        range_tolerance: 1e-6,
        ..ReaderConfig::default()
    };
    let reader = MultiMeshReader::from_sources(vec![source("a.e", shard_one())], config).unwrap();

    let field = reader.get_data_at_time("c_Cr", 1.0 + 1e-7, None).unwrap();
    assert_eq!(field.values, array![15.0, 25.0]);
}

#[test]
fn close_is_idempotent_and_closes_each_shard_once() {
    let (one, two) = (shard_one(), shard_two());
    let counters = [one.close_counter(), two.close_counter()];
    let mut reader = MultiMeshReader::from_sources(
        vec![source("a.e", one), source("b.e", two)],
        ReaderConfig::default(),
    )
    .unwrap();

    reader.close().unwrap();
    reader.close().unwrap();
    for c in &counters {
        assert_eq!(c.load(Ordering::SeqCst), 1);
    }

    let err = reader.get_data_at_time("c_Cr", 1.0, None).unwrap_err();
    assert!(matches!(err, ExoviewError::Closed { .. }));
    // Catalogs stay available after close.
    assert_eq!(reader.nodal_var_names().len(), 3);

    drop(reader);
    for c in &counters {
        assert_eq!(c.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn close_attempts_every_shard_and_reports_first_failure() {
    let failing = shard_one().failing_close();
    let healthy = shard_two();
    let counters = [failing.close_counter(), healthy.close_counter()];
    let mut reader = MultiMeshReader::from_sources(
        vec![source("bad.e", failing), source("good.e", healthy)],
        ReaderConfig::default(),
    )
    .unwrap();

    assert!(matches!(reader.close(), Err(ExoviewError::Io(_))));
    for c in &counters {
        assert_eq!(c.load(Ordering::SeqCst), 1);
    }
    assert!(reader.close().is_ok());
}

#[test]
fn mixed_dimensionality_is_rejected() {
    let flat = line_mesh(0.0).with_axis("coordy", vec![0.0, 1.0, 0.0]);
    let err = MultiMeshReader::from_sources(
        vec![source("a.e", shard_one()), source("b.e", flat)],
        ReaderConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ExoviewError::Format { .. }));
}

#[test]
fn empty_source_list_is_not_found() {
    let err = MultiMeshReader::<MemoryMeshFile>::from_sources(Vec::new(), ReaderConfig::default())
        .unwrap_err();
    assert!(matches!(err, ExoviewError::NotFound { .. }));
}

#[test]
fn block_restriction_applies_to_every_shard() {
    let reader = two_shards();
    let field = reader.get_data_at_time("c_Cr", 0.0, Some(1)).unwrap();
    assert_eq!(field.values, array![1.0, 3.0]);

    let err = reader.get_data_at_time("c_Cr", 0.0, Some(7)).unwrap_err();
    assert!(matches!(err, ExoviewError::UnknownBlock { id: 7 }));
}

#[test]
fn block_restriction_skips_shards_without_the_block() {
    // Same times, block 1 in one shard and block 2 in the other.
    let left = shard_one();
    let right = MemoryMeshFile::new()
        .with_axis("coordx", vec![5.0, 6.0])
        .with_block(2, array![[1, 2]])
        .with_times(vec![0.0, 1.0])
        .with_names(VariableKind::Nodal, &["c_Cr"])
        .with_variable("vals_nod_var1", array![[4.0, 8.0], [0.0, 0.0]]);
    let reader = MultiMeshReader::from_sources(
        vec![source("left.e", left), source("right.e", right)],
        ReaderConfig::default(),
    )
    .unwrap();

    let field = reader.get_data_at_time("c_Cr", 0.0, Some(2)).unwrap();
    assert_eq!(field.values, array![6.0]);
    assert_eq!(field.x, array![[5.0, 6.0]]);

    let field = reader.get_data_at_time("c_Cr", 0.0, Some(1)).unwrap();
    assert_eq!(field.values, array![1.0, 3.0]);

    let field = reader.get_data_at_time("c_Cr", 0.0, None).unwrap();
    assert_eq!(field.len(), 3);

    let err = reader.get_data_at_time("c_Cr", 0.0, Some(3)).unwrap_err();
    assert!(matches!(err, ExoviewError::UnknownBlock { id: 3 }));
}

#[test]
fn failed_open_releases_shards_already_opened() {
    let dir = TempDir::new().unwrap();
    for name in ["a.e", "b.e"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }
    let first = shard_one();
    let counter = first.close_counter();
    let mut first = Some(first);

    let pattern = dir.path().join("*.e").to_string_lossy().to_string();
    let err = MultiMeshReader::open_with(&pattern, ReaderConfig::default(), |path: &Path| {
        match first.take() {
            Some(file) => Ok(file),
            None => Err(ExoviewError::format(path, "unreadable shard")),
        }
    })
    .unwrap_err();

    assert!(matches!(err, ExoviewError::Format { .. }));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}
