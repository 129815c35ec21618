//! Columnar join: materialize both sides and delegate to a backend.
//!
//! The backend boundary is deliberately narrow - two column batches, a
//! join spec, a row stream back - so the engine core never depends on a
//! specific columnar library. A vectorized hash implementation ships as
//! the default.

use super::{concat_rows, key_from, null_padded, residual_passes, JoinKey};
use crate::{ExecutionContext, Executor};
use common::{ColumnId, EngineError, EngineResult, ExecutionStats, Row};
use hashbrown::HashMap;
use planner::JoinKind;
use planner::ResolvedExpr;
use std::time::Instant;
use types::Value;

/// Column-major batch: one value vector per column.
#[derive(Clone, Debug)]
pub struct ColumnBatch {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Value>>,
}

impl ColumnBatch {
    /// Transpose a row stream into columns.
    pub fn from_rows(columns: Vec<String>, rows: &[Row]) -> Self {
        let mut data: Vec<Vec<Value>> = columns
            .iter()
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for row in rows {
            for (col, value) in data.iter_mut().zip(&row.values) {
                col.push(value.clone());
            }
        }
        Self { columns, data }
    }

    pub fn num_rows(&self) -> usize {
        self.data.first().map(|col| col.len()).unwrap_or(0)
    }

    /// Gather one row back out of the columns.
    pub fn row(&self, idx: usize) -> Row {
        Row::new(self.data.iter().map(|col| col[idx].clone()).collect())
    }
}

/// What the backend must compute: an equi join with residual and kind.
#[derive(Clone, Debug)]
pub struct ColumnarJoinSpec {
    pub kind: JoinKind,
    pub left_keys: Vec<ColumnId>,
    pub right_keys: Vec<ColumnId>,
    /// Residual over the combined row (left columns then right columns).
    pub residual: Option<ResolvedExpr>,
}

/// Pluggable columnar execution boundary.
///
/// Implementations receive fully materialized inputs and return the
/// joined rows (left values then right values). No output ordering is
/// required of implementations.
pub trait ColumnarBackend: Send + Sync {
    fn join(
        &self,
        left: &ColumnBatch,
        right: &ColumnBatch,
        spec: &ColumnarJoinSpec,
    ) -> EngineResult<Vec<Row>>;
}

/// Default backend: hash index over the right key columns, probed with
/// one pass over the left columns.
pub struct HashColumnarBackend;

impl ColumnarBackend for HashColumnarBackend {
    fn join(
        &self,
        left: &ColumnBatch,
        right: &ColumnBatch,
        spec: &ColumnarJoinSpec,
    ) -> EngineResult<Vec<Row>> {
        let mut index: HashMap<JoinKey, Vec<usize>> = HashMap::new();
        for row_idx in 0..right.num_rows() {
            let key = key_from(spec.right_keys.iter().map(|col| &right.data[*col][row_idx]));
            if let Some(key) = key {
                index.entry(key).or_default().push(row_idx);
            }
        }

        let right_width = right.columns.len();
        let mut out = Vec::new();
        for row_idx in 0..left.num_rows() {
            let left_row = left.row(row_idx);
            let key = key_from(spec.left_keys.iter().map(|col| &left.data[*col][row_idx]));
            let mut matched = false;
            if let Some(key) = key {
                if let Some(matches) = index.get(&key) {
                    for &right_idx in matches {
                        let combined = concat_rows(&left_row, &right.row(right_idx));
                        if residual_passes(&spec.residual, &combined)? {
                            matched = true;
                            out.push(combined);
                        }
                    }
                }
            }
            if spec.kind == JoinKind::Left && !matched {
                out.push(null_padded(&left_row, right_width));
            }
        }
        Ok(out)
    }
}

/// Operator wrapper: drains both children, hands the batches to the
/// context's backend, then streams the returned rows.
pub struct ColumnarJoinExec {
    left: Box<dyn Executor>,
    right: Box<dyn Executor>,
    spec: ColumnarJoinSpec,
    schema: Vec<String>,
    output: Option<std::vec::IntoIter<Row>>,
    stats: ExecutionStats,
}

impl ColumnarJoinExec {
    pub fn new(
        left: Box<dyn Executor>,
        right: Box<dyn Executor>,
        spec: ColumnarJoinSpec,
        schema: Vec<String>,
    ) -> Self {
        Self {
            left,
            right,
            spec,
            schema,
            output: None,
            stats: ExecutionStats::default(),
        }
    }

    fn drain(
        child: &mut Box<dyn Executor>,
        ctx: &mut ExecutionContext,
    ) -> EngineResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = child.next(ctx)? {
            rows.push(row);
        }
        Ok(rows)
    }
}

impl Executor for ColumnarJoinExec {
    fn open(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.stats = ExecutionStats::default();

        self.left.open(ctx)?;
        self.right.open(ctx)?;

        let left_rows = Self::drain(&mut self.left, ctx)?;
        let right_rows = Self::drain(&mut self.right, ctx)?;
        let left_batch = ColumnBatch::from_rows(self.left.schema().to_vec(), &left_rows);
        let right_batch = ColumnBatch::from_rows(self.right.schema().to_vec(), &right_rows);

        let joined = ctx.backend.join(&left_batch, &right_batch, &self.spec)?;
        self.output = Some(joined.into_iter());

        self.stats.open_time = start.elapsed();
        Ok(())
    }

    fn next(&mut self, _ctx: &mut ExecutionContext) -> EngineResult<Option<Row>> {
        let start = Instant::now();
        let output = self
            .output
            .as_mut()
            .ok_or_else(|| EngineError::Exec("columnar join used before open".into()))?;
        let row = output.next();
        if row.is_some() {
            self.stats.rows_produced += 1;
        }
        self.stats.total_next_time += start.elapsed();
        Ok(row)
    }

    fn close(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.output = None;
        self.left.close(ctx)?;
        self.right.close(ctx)?;
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
