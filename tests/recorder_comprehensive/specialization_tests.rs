//! Tabular Specialization Tests
//!
//! A bound closure over `[c1, .., cn]` called with `[v1, .., vn]` and extra
//! pairs records the same row as `record_row` with the paired cells followed
//! by the extras, all stamped with the call's timestamp.

use crate::test_utils::*;
use strata_ingest::{
    create_recorder, Cell, CellValue, ColumnPath, FlatRow, MemoryDatasets, Path, Recorder,
    RecorderConfig, StrataError, TabularSchema,
};

fn columns(names: &[&str]) -> Vec<ColumnPath> {
    names.iter().map(|n| Path::new(*n)).collect()
}

#[test]
fn positional_values_then_extra_columns() {
    let ctx = fresh_context();
    let specialized = create_recorder(
        &ctx,
        &RecorderConfig::new("memory").with_param("dataset", "specialized"),
        None,
    )
    .unwrap();
    let plain = create_recorder(
        &ctx,
        &RecorderConfig::new("memory").with_param("dataset", "plain"),
        None,
    )
    .unwrap();

    let t = ts(5);
    {
        let mut record = specialized.specialize_record_tabular(&columns(&["c1", "c2", "c3"]));
        record(
            Path::new("r"),
            t,
            vec![CellValue::Int(1), CellValue::from("two"), CellValue::Float(3.0)],
            vec![(Path::new("c4"), CellValue::Bool(true))],
        )
        .unwrap();
    }
    plain
        .record_row(FlatRow::new(
            "r",
            vec![
                Cell::new("c1", 1i64, t),
                Cell::new("c2", "two", t),
                Cell::new("c3", 3.0, t),
                Cell::new("c4", true, t),
            ],
        ))
        .unwrap();

    let datasets = ctx.extension::<MemoryDatasets>().unwrap();
    let a = datasets.get("specialized").unwrap().snapshot();
    let b = datasets.get("plain").unwrap().snapshot();
    assert_eq!(a, b);
    assert_eq!(a[0].column_count(), 4);
}

#[test]
fn default_specialization_goes_through_record_row() {
    let tree = TreeRecorder::default();
    let schema = TabularSchema::new(columns(&["x", "y"]));
    {
        let mut record = schema.bind(&tree);
        record(
            Path::new("p"),
            ts(1),
            vec![CellValue::Int(1), CellValue::Int(2)],
            vec![],
        )
        .unwrap();
    }

    let rows = tree.rows.lock();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1.leaf_count(), 2);
}

#[test]
fn wrong_value_count_fails_and_records_nothing() {
    let ctx = fresh_context();
    let recorder = create_recorder(
        &ctx,
        &RecorderConfig::new("memory").with_param("dataset", "arity"),
        None,
    )
    .unwrap();

    {
        let mut record = recorder.specialize_record_tabular(&columns(&["a", "b", "c"]));
        for values in [vec![], vec![CellValue::Int(1)], vec![CellValue::Null; 4]] {
            let actual = values.len();
            let err = record(Path::new("r"), ts(0), values, vec![]).unwrap_err();
            assert!(
                matches!(err, StrataError::ArityMismatch { expected: 3, actual: a } if a == actual)
            );
        }
    }

    assert_eq!(recorder.status()["rows"], 0);
}

#[test]
fn closure_records_many_rows() {
    let ctx = fresh_context();
    let recorder = create_recorder(
        &ctx,
        &RecorderConfig::new("memory").with_param("dataset", "many"),
        None,
    )
    .unwrap();
    let schema = TabularSchema::new(columns(&["seq"]));

    {
        let mut record = schema.bind(recorder.as_ref());
        for i in 0..100i64 {
            record(
                Path::new(format!("row{:03}", i)),
                ts(i as u64),
                vec![CellValue::Int(i)],
                vec![],
            )
            .unwrap();
        }
    }

    let dataset = ctx
        .extension::<MemoryDatasets>()
        .unwrap()
        .get("many")
        .unwrap();
    assert_eq!(dataset.row_count(), 100);
    assert_eq!(
        dataset.get(&Path::new("row042"), &Path::new("seq")),
        Some((CellValue::Int(42), ts(42)))
    );
}
