//! Scan operator: streams a registered producer, qualifying and pruning.

use crate::filter::eval_resolved_expr;
use crate::{ExecutionContext, Executor};
use common::{EngineError, EngineResult, ExecutionStats, Row, RowMap};
use planner::ResolvedExpr;
use source::SourceIter;
use std::time::Instant;
use types::Value;

/// Streams rows from a table's producer.
///
/// Each emitted row carries exactly the scan's projected columns in
/// schema order; columns absent from a producer row come out as Null.
/// The pushed predicate (if any) runs before a row leaves the scan, so
/// dropped rows never travel up the pipeline. O(1) memory per row.
pub struct ScanExec {
    table: String,
    columns: Vec<String>,
    schema: Vec<String>,
    predicate: Option<ResolvedExpr>,
    rows: Option<SourceIter>,
    stats: ExecutionStats,
}

impl ScanExec {
    pub fn new(
        table: String,
        columns: Vec<String>,
        schema: Vec<String>,
        predicate: Option<ResolvedExpr>,
    ) -> Self {
        Self {
            table,
            columns,
            schema,
            predicate,
            rows: None,
            stats: ExecutionStats::default(),
        }
    }
}

/// Build a positional row from a producer map, in projected-column order.
pub(crate) fn project_row(columns: &[String], map: &RowMap) -> Row {
    Row::new(
        columns
            .iter()
            .map(|col| map.get(col).cloned().unwrap_or(Value::Null))
            .collect(),
    )
}

/// Predicate gate: a row survives only on a definite `true`.
pub(crate) fn passes(predicate: &Option<ResolvedExpr>, row: &Row) -> EngineResult<bool> {
    match predicate {
        None => Ok(true),
        Some(p) => Ok(matches!(eval_resolved_expr(p, row)?, Value::Bool(true))),
    }
}

impl Executor for ScanExec {
    fn open(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.stats = ExecutionStats::default();

        // A fresh producer run per open keeps the restartable contract.
        self.rows = Some(ctx.registry.get(&self.table)?.rows());

        self.stats.open_time = start.elapsed();
        Ok(())
    }

    fn next(&mut self, _ctx: &mut ExecutionContext) -> EngineResult<Option<Row>> {
        let start = Instant::now();

        let rows = self
            .rows
            .as_mut()
            .ok_or_else(|| EngineError::Exec("scan used before open".into()))?;

        loop {
            let item = match rows.next() {
                None => {
                    self.stats.total_next_time += start.elapsed();
                    return Ok(None);
                }
                Some(item) => item,
            };

            let map = item.map_err(|e| EngineError::Source {
                table: self.table.clone(),
                message: e.to_string(),
            })?;

            let row = project_row(&self.columns, &map);
            if passes(&self.predicate, &row)? {
                self.stats.rows_produced += 1;
                self.stats.total_next_time += start.elapsed();
                return Ok(Some(row));
            }
            self.stats.rows_filtered += 1;
        }
    }

    fn close(&mut self, _ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.rows = None;
        self.stats.close_time = start.elapsed();
        Ok(())
    }

    fn schema(&self) -> &[String] {
        &self.schema
    }

    fn stats(&self) -> Option<&ExecutionStats> {
        Some(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::{
        assert_exhausted, assert_next_row, fixture_registry, row, rows_producer,
    };
    use crate::HashColumnarBackend;
    use planner::ResolvedExpr;
    use source::{SourceRegistry, TableSource};

    fn scan_users() -> ScanExec {
        ScanExec::new(
            "users".into(),
            vec!["id".into(), "name".into()],
            vec!["users.id".into(), "users.name".into()],
            None,
        )
    }

    #[test]
    fn scan_qualifies_and_projects() {
        let registry = fixture_registry();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        let mut scan = scan_users();
        scan.open(&mut ctx).unwrap();
        assert_next_row(
            &mut scan,
            &mut ctx,
            Row::new(vec![Value::Int(1), Value::Text("Alice".into())]),
        );
        assert_next_row(
            &mut scan,
            &mut ctx,
            Row::new(vec![Value::Int(2), Value::Text("Bob".into())]),
        );
        assert_exhausted(&mut scan, &mut ctx);
        scan.close(&mut ctx).unwrap();
    }

    #[test]
    fn scan_reopen_restarts_the_producer() {
        let registry = fixture_registry();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        let mut scan = scan_users();
        scan.open(&mut ctx).unwrap();
        assert_next_row(
            &mut scan,
            &mut ctx,
            Row::new(vec![Value::Int(1), Value::Text("Alice".into())]),
        );

        scan.open(&mut ctx).unwrap();
        assert_next_row(
            &mut scan,
            &mut ctx,
            Row::new(vec![Value::Int(1), Value::Text("Alice".into())]),
        );
        scan.close(&mut ctx).unwrap();
    }

    #[test]
    fn scan_missing_columns_become_null() {
        let mut registry = SourceRegistry::new();
        registry.register(TableSource::new(
            "sparse",
            rows_producer(vec![
                row(&[("id", Value::Int(1)), ("extra", Value::Bool(true))]),
                row(&[("id", Value::Int(2))]),
            ]),
        ));
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        let mut scan = ScanExec::new(
            "sparse".into(),
            vec!["id".into(), "extra".into()],
            vec!["sparse.id".into(), "sparse.extra".into()],
            None,
        );
        scan.open(&mut ctx).unwrap();
        assert_next_row(
            &mut scan,
            &mut ctx,
            Row::new(vec![Value::Int(1), Value::Bool(true)]),
        );
        assert_next_row(&mut scan, &mut ctx, Row::new(vec![Value::Int(2), Value::Null]));
        assert_exhausted(&mut scan, &mut ctx);
    }

    #[test]
    fn scan_applies_pushed_predicate() {
        let registry = fixture_registry();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        // id > 1
        let predicate = ResolvedExpr::Binary {
            left: Box::new(ResolvedExpr::Column(0)),
            op: expr::BinaryOp::Gt,
            right: Box::new(ResolvedExpr::Literal(Value::Int(1))),
        };
        let mut scan = ScanExec::new(
            "users".into(),
            vec!["id".into(), "name".into()],
            vec!["users.id".into(), "users.name".into()],
            Some(predicate),
        );

        scan.open(&mut ctx).unwrap();
        assert_next_row(
            &mut scan,
            &mut ctx,
            Row::new(vec![Value::Int(2), Value::Text("Bob".into())]),
        );
        assert_next_row(
            &mut scan,
            &mut ctx,
            Row::new(vec![Value::Int(3), Value::Text("Charlie".into())]),
        );
        assert_next_row(
            &mut scan,
            &mut ctx,
            Row::new(vec![Value::Int(4), Value::Text("Diana".into())]),
        );
        assert_exhausted(&mut scan, &mut ctx);
        assert_eq!(scan.stats().unwrap().rows_filtered, 1);
    }

    #[test]
    fn scan_wraps_producer_errors_with_the_table_name() {
        let mut registry = SourceRegistry::new();
        registry.register(TableSource::new("flaky", || {
            Box::new(std::iter::once(Err("connection reset".into())))
        }));
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        let mut scan = ScanExec::new("flaky".into(), vec!["id".into()], vec!["flaky.id".into()], None);
        scan.open(&mut ctx).unwrap();
        let err = scan.next(&mut ctx).unwrap_err();
        assert!(matches!(err, EngineError::Source { .. }));
        assert!(err.to_string().contains("flaky"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn scan_unknown_table_fails_at_open() {
        let registry = SourceRegistry::new();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        let mut scan = ScanExec::new("ghost".into(), vec![], vec![], None);
        assert!(scan.open(&mut ctx).is_err());
    }
}
