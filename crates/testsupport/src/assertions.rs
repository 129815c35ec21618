//! Assertion helpers shared across integration tests.

use common::{EngineResult, RowMap};
use types::Value;

/// Drain a query's rows, panicking on any mid-stream error.
pub fn collect_rows(rows: engine::Rows<'_>) -> Vec<RowMap> {
    rows.map(|r| r.expect("query row should succeed"))
        .collect()
}

/// Assert a result failed with a message containing `needle`.
pub fn assert_error_contains<T: std::fmt::Debug>(result: EngineResult<T>, needle: &str) {
    match result {
        Ok(value) => panic!("expected error containing '{needle}', got Ok({value:?})"),
        Err(e) => {
            let message = e.to_string();
            assert!(
                message.contains(needle),
                "expected error containing '{needle}', got: {message}"
            );
        }
    }
}

/// Pull one named column out of each row, in row order.
pub fn column_values(rows: &[RowMap], column: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| {
            row.get(column)
                .unwrap_or_else(|| panic!("column '{column}' missing from {row:?}"))
                .clone()
        })
        .collect()
}

/// Text values of one column, for compact sequence assertions.
pub fn text_column(rows: &[RowMap], column: &str) -> Vec<String> {
    column_values(rows, column)
        .into_iter()
        .map(|v| match v {
            Value::Text(s) => s,
            other => panic!("expected text in '{column}', got {other:?}"),
        })
        .collect()
}

/// Multiset equality: both row sets contain the same rows, order aside.
pub fn assert_same_multiset(mut a: Vec<RowMap>, mut b: Vec<RowMap>) {
    let sort_key = |row: &RowMap| {
        let mut entries: Vec<String> = row
            .iter()
            .map(|(k, v)| format!("{k}={v:?}"))
            .collect();
        entries.sort();
        entries.join("|")
    };
    a.sort_by_key(&sort_key);
    b.sort_by_key(&sort_key);
    assert_eq!(a, b, "row multisets differ");
}
