//! Recorder Contract Tests
//!
//! Owned and borrowing forms agree, batches agree with row-by-row
//! recording, and tree rows reach flat backends (and flat rows reach tree
//! backends) through the default conversions.

use crate::test_utils::*;
use proptest::prelude::*;
use std::sync::Arc;
use strata_ingest::{
    Cell, CellValue, ExpressionValue, FlatRow, MemoryDataset, MemoryRecorder, Path, Recorder,
    StrataError,
};

fn memory() -> MemoryRecorder {
    MemoryRecorder::new(Arc::new(MemoryDataset::new("contract")), None)
}

#[test]
fn borrowed_row_matches_owned_row() {
    let owned = memory();
    let borrowed = memory();
    let row = flat("r", &[("a", 1), ("b", 2), ("a", 3)], ts(1));

    owned.record_row(row.clone()).unwrap();
    borrowed.record_row_ref(&row).unwrap();

    assert_eq!(owned.dataset().snapshot(), borrowed.dataset().snapshot());
    // Caller still owns its row
    assert_eq!(row.column_count(), 3);
}

#[test]
fn borrowed_expr_batch_matches_owned_batch() {
    let owned = memory();
    let borrowed = memory();
    let rows = vec![
        (
            Path::new("r1"),
            ExpressionValue::row_of([("x", 1i64), ("y", 2i64)], ts(1)),
        ),
        (
            Path::new("r2"),
            ExpressionValue::object([(
                "nested",
                ExpressionValue::array([
                    ExpressionValue::atom("a", ts(2)),
                    ExpressionValue::atom("b", ts(3)),
                ]),
            )]),
        ),
    ];

    owned.record_rows_expr(rows.clone()).unwrap();
    borrowed.record_rows_expr_ref(&rows).unwrap();

    assert_eq!(owned.dataset().snapshot(), borrowed.dataset().snapshot());
    assert_eq!(
        owned
            .dataset()
            .get(&Path::new("r2"), &Path::new("nested").with(1usize)),
        Some((CellValue::from("b"), ts(3)))
    );
}

#[test]
fn expr_row_equals_flattened_row() {
    let via_expr = memory();
    let via_flat = memory();
    let expr = ExpressionValue::object([
        ("a", ExpressionValue::atom(1i64, ts(1))),
        (
            "b",
            ExpressionValue::object([("c", ExpressionValue::atom(true, ts(2)))]),
        ),
    ]);

    via_expr.record_row_expr(Path::new("r"), expr.clone()).unwrap();
    via_flat
        .record_row(FlatRow::new(
            "r",
            vec![
                Cell::new("a", 1i64, ts(1)),
                Cell::new(Path::new("b").with("c"), true, ts(2)),
            ],
        ))
        .unwrap();

    assert_eq!(via_expr.dataset().snapshot(), via_flat.dataset().snapshot());
}

#[test]
fn tree_backend_receives_flat_rows_as_trees() {
    let tree = TreeRecorder::default();
    tree.record_rows(vec![
        FlatRow::new(
            "r",
            vec![
                Cell::new(Path::new("pos").with("x"), 1i64, ts(1)),
                Cell::new(Path::new("pos").with("y"), 2i64, ts(1)),
                Cell::new("id", "p1", ts(1)),
            ],
        ),
        flat("s", &[("v", 9)], ts(2)),
    ])
    .unwrap();

    let rows = tree.rows.lock();
    assert_eq!(rows.len(), 2);
    let (name, expr) = &rows[0];
    assert_eq!(name, &Path::new("r"));
    assert_eq!(
        expr,
        &ExpressionValue::object([
            (
                "pos",
                ExpressionValue::row_of([("x", 1i64), ("y", 2i64)], ts(1)),
            ),
            ("id", ExpressionValue::atom("p1", ts(1))),
        ])
    );
}

#[test]
fn tree_backend_rejects_root_cell_beside_named_cells() {
    let tree = TreeRecorder::default();
    let err = tree
        .record_row(FlatRow::new(
            "r",
            vec![
                Cell::new(Path::root(), 1i64, ts(1)),
                Cell::new("a", 2i64, ts(1)),
            ],
        ))
        .unwrap_err();

    assert!(matches!(err, StrataError::MixedRootColumn { others: 1 }));
    assert!(tree.rows.lock().is_empty());
}

#[test]
fn chunks_and_status_through_trait_object() {
    let recorder: Arc<dyn Recorder> = Arc::new(memory());
    recorder.record_row(flat("r", &[("a", 1)], ts(0))).unwrap();
    recorder.finished_chunk().unwrap();
    assert_eq!(recorder.kind(), "memory");
    assert_eq!(recorder.status()["chunks"], 1);
    assert_eq!(recorder.status()["cells"], 1);
}

proptest! {
    #[test]
    fn batch_equals_rows_one_by_one(rows in strategies::flat_rows()) {
        let batched = memory();
        let single = memory();

        batched.record_rows(rows.clone()).unwrap();
        for row in rows {
            single.record_row(row).unwrap();
        }

        prop_assert_eq!(batched.dataset().snapshot(), single.dataset().snapshot());
    }

    #[test]
    fn borrowed_batch_equals_owned_batch(rows in strategies::flat_rows()) {
        let owned = memory();
        let borrowed = memory();

        owned.record_rows(rows.clone()).unwrap();
        borrowed.record_rows_ref(&rows).unwrap();

        prop_assert_eq!(owned.dataset().snapshot(), borrowed.dataset().snapshot());
    }

    #[test]
    fn expr_batch_equals_flattened_batch(rows in strategies::expr_rows()) {
        let via_expr = memory();
        let via_flat = memory();

        via_expr.record_rows_expr(rows.clone()).unwrap();
        let flat: Vec<FlatRow> = rows
            .into_iter()
            .map(|(row, expr)| FlatRow::from_expr(row, expr))
            .collect();
        via_flat.record_rows(flat).unwrap();

        prop_assert_eq!(via_expr.dataset().snapshot(), via_flat.dataset().snapshot());
    }
}
