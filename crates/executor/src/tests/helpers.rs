//! Shared operator-test scaffolding: a scripted executor, row and
//! expression shorthand, and a small fixture registry.

use crate::{ExecutionContext, Executor};
use common::{EngineError, EngineResult, Row, RowMap};
use expr::BinaryOp;
use planner::ResolvedExpr;
use source::{SourceIter, SourceRegistry, TableSource};
use types::Value;

/// Executor that replays a fixed row list; stands in for real children.
pub struct MockExecutor {
    rows: Vec<Row>,
    schema: Vec<String>,
    cursor: usize,
    next_error: Option<EngineError>,
}

impl MockExecutor {
    pub fn new(rows: Vec<Row>, schema: Vec<String>) -> Self {
        Self {
            rows,
            schema,
            cursor: 0,
            next_error: None,
        }
    }

    /// A mock whose first `next()` fails with the given error.
    pub fn with_next_error(error: EngineError) -> Self {
        Self {
            rows: Vec::new(),
            schema: Vec::new(),
            cursor: 0,
            next_error: Some(error),
        }
    }
}

impl Executor for MockExecutor {
    fn open(&mut self, _ctx: &mut ExecutionContext) -> EngineResult<()> {
        self.cursor = 0;
        Ok(())
    }

    fn next(&mut self, _ctx: &mut ExecutionContext) -> EngineResult<Option<Row>> {
        if let Some(err) = self.next_error.take() {
            return Err(err);
        }
        let row = self.rows.get(self.cursor).cloned();
        if row.is_some() {
            self.cursor += 1;
        }
        Ok(row)
    }

    fn close(&mut self, _ctx: &mut ExecutionContext) -> EngineResult<()> {
        Ok(())
    }

    fn schema(&self) -> &[String] {
        &self.schema
    }
}

pub fn assert_next_row(exec: &mut dyn Executor, ctx: &mut ExecutionContext, expected: Row) {
    let row = exec
        .next(ctx)
        .expect("next should succeed")
        .expect("expected another row");
    assert_eq!(row, expected);
}

pub fn assert_exhausted(exec: &mut dyn Executor, ctx: &mut ExecutionContext) {
    let row = exec.next(ctx).expect("next should succeed");
    assert!(row.is_none(), "expected exhaustion, got {row:?}");
}

pub fn row(pairs: &[(&str, Value)]) -> RowMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Restartable producer over fixed rows.
pub fn rows_producer(rows: Vec<RowMap>) -> impl Fn() -> SourceIter + Send + Sync + 'static {
    move || {
        let rows = rows.clone();
        Box::new(rows.into_iter().map(Ok)) as SourceIter
    }
}

/// Registry with a small `users` table.
pub fn fixture_registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register(TableSource::new(
        "users",
        rows_producer(vec![
            row(&[("id", Value::Int(1)), ("name", Value::Text("Alice".into()))]),
            row(&[("id", Value::Int(2)), ("name", Value::Text("Bob".into()))]),
            row(&[("id", Value::Int(3)), ("name", Value::Text("Charlie".into()))]),
            row(&[("id", Value::Int(4)), ("name", Value::Text("Diana".into()))]),
        ]),
    ));
    registry
}

/// The classic two-users/three-orders join inputs used across join tests.
pub fn users_orders_join() -> (Box<MockExecutor>, Box<MockExecutor>) {
    let int_row = |values: &[i64]| Row::new(values.iter().map(|&v| Value::Int(v)).collect());
    let left = Box::new(MockExecutor::new(
        vec![int_row(&[1, 100]), int_row(&[2, 200])],
        vec!["u.id".into(), "u.value".into()],
    ));
    let right = Box::new(MockExecutor::new(
        vec![
            int_row(&[101, 1]),
            int_row(&[102, 2]),
            int_row(&[103, 1]),
        ],
        vec!["o.order_id".into(), "o.user_id".into()],
    ));
    (left, right)
}

pub fn lit(value: Value) -> ResolvedExpr {
    ResolvedExpr::Literal(value)
}

pub fn col(idx: usize) -> ResolvedExpr {
    ResolvedExpr::Column(idx)
}

pub fn binary(left: ResolvedExpr, op: BinaryOp, right: ResolvedExpr) -> ResolvedExpr {
    ResolvedExpr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}
