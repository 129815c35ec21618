//! Lookup (hash) join: drain the right side once, stream the left.

use super::{concat_rows, join_key, null_padded, residual_passes, JoinKey};
use crate::{ExecutionContext, Executor};
use common::{ColumnId, EngineResult, ExecutionStats, Row};
use hashbrown::HashMap;
use planner::JoinKind;
use planner::ResolvedExpr;
use std::time::Instant;

/// Hash join over the equi-key.
///
/// `open()` drains the right input exactly once into a key → rows table;
/// `next()` then streams the left input, emitting one output row per
/// match (N right matches produce N rows). Memory is O(|right|), output
/// order follows the left input.
pub struct LookupJoinExec {
    left: Box<dyn Executor>,
    right: Box<dyn Executor>,
    kind: JoinKind,
    left_keys: Vec<ColumnId>,
    right_keys: Vec<ColumnId>,
    residual: Option<ResolvedExpr>,
    schema: Vec<String>,
    right_width: usize,

    table: HashMap<JoinKey, Vec<Row>>,
    current_left: Option<Row>,
    current_key: Option<JoinKey>,
    match_cursor: usize,
    matched: bool,
    stats: ExecutionStats,
}

impl LookupJoinExec {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        left: Box<dyn Executor>,
        right: Box<dyn Executor>,
        kind: JoinKind,
        left_keys: Vec<ColumnId>,
        right_keys: Vec<ColumnId>,
        residual: Option<ResolvedExpr>,
        schema: Vec<String>,
    ) -> Self {
        let right_width = right.schema().len();
        Self {
            left,
            right,
            kind,
            left_keys,
            right_keys,
            residual,
            schema,
            right_width,
            table: HashMap::new(),
            current_left: None,
            current_key: None,
            match_cursor: 0,
            matched: false,
            stats: ExecutionStats::default(),
        }
    }

    fn advance_left(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        self.current_left = self.left.next(ctx)?;
        self.current_key = self
            .current_left
            .as_ref()
            .and_then(|row| join_key(row, &self.left_keys));
        self.match_cursor = 0;
        self.matched = false;
        Ok(())
    }
}

impl Executor for LookupJoinExec {
    fn open(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.stats = ExecutionStats::default();

        self.left.open(ctx)?;
        self.right.open(ctx)?;

        // Build side: right rows without a key can never match and are
        // dropped here (inner and left joins both discard them).
        self.table.clear();
        while let Some(row) = self.right.next(ctx)? {
            if let Some(key) = join_key(&row, &self.right_keys) {
                self.table.entry(key).or_default().push(row);
            }
        }

        self.advance_left(ctx)?;

        self.stats.open_time = start.elapsed();
        Ok(())
    }

    fn next(&mut self, ctx: &mut ExecutionContext) -> EngineResult<Option<Row>> {
        let start = Instant::now();

        loop {
            let left_row = match &self.current_left {
                Some(r) => r.clone(),
                None => {
                    self.stats.total_next_time += start.elapsed();
                    return Ok(None);
                }
            };

            if let Some(key) = &self.current_key {
                while let Some(right_row) = self
                    .table
                    .get(key)
                    .and_then(|rows| rows.get(self.match_cursor))
                {
                    self.match_cursor += 1;
                    let combined = concat_rows(&left_row, right_row);
                    if residual_passes(&self.residual, &combined)? {
                        self.matched = true;
                        self.stats.rows_produced += 1;
                        self.stats.total_next_time += start.elapsed();
                        return Ok(Some(combined));
                    }
                }
            }

            // Matches exhausted for this left row.
            let pad = (self.kind == JoinKind::Left && !self.matched)
                .then(|| null_padded(&left_row, self.right_width));
            self.advance_left(ctx)?;
            if let Some(row) = pad {
                self.stats.rows_produced += 1;
                self.stats.total_next_time += start.elapsed();
                return Ok(Some(row));
            }
        }
    }

    fn close(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.table.clear();
        self.current_left = None;
        self.current_key = None;
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
