//! Sort-merge join: lockstep cursors over pre-sorted inputs.

use super::{concat_rows, null_padded, residual_passes};
use crate::{ExecutionContext, Executor};
use common::{ColumnId, EngineResult, ExecutionStats, Row};
use planner::JoinKind;
use planner::ResolvedExpr;
use std::cmp::Ordering;
use std::time::Instant;
use types::Value;

/// Merge join over inputs pre-sorted non-descending on the join key (the
/// planner only selects this strategy when both sources declare it).
///
/// Advances two cursors in lockstep. On a key match the right-side run of
/// equal keys is buffered once and crossed with every consecutive left
/// row carrying the same key, so memory is O(longest right run). Rows
/// whose key sorts as null never match; for a LEFT join they are emitted
/// null-padded. Unsorted input yields undefined results but never a
/// panic or hang.
pub struct MergeJoinExec {
    left: Box<dyn Executor>,
    right: Box<dyn Executor>,
    kind: JoinKind,
    left_keys: Vec<ColumnId>,
    right_keys: Vec<ColumnId>,
    residual: Option<ResolvedExpr>,
    schema: Vec<String>,
    right_width: usize,

    current_left: Option<Row>,
    left_matched: bool,
    next_right: Option<Row>,
    run: Vec<Row>,
    run_key: Option<Vec<Value>>,
    run_cursor: usize,
    stats: ExecutionStats,
}

impl MergeJoinExec {
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
            current_left: None,
            left_matched: false,
            next_right: None,
            run: Vec::new(),
            run_key: None,
            run_cursor: 0,
            stats: ExecutionStats::default(),
        }
    }

    fn advance_left(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        self.current_left = self.left.next(ctx)?;
        self.left_matched = false;
        self.run_cursor = 0;
        Ok(())
    }

    /// Null-pad the current left row if it ended up unmatched, then move on.
    fn finish_left(&mut self, ctx: &mut ExecutionContext, left_row: &Row) -> EngineResult<Option<Row>> {
        let pad = (self.kind == JoinKind::Left && !self.left_matched)
            .then(|| null_padded(left_row, self.right_width));
        self.advance_left(ctx)?;
        Ok(pad)
    }

    /// Buffer the run of right rows equal to `key`, leaving the first
    /// non-equal row as the lookahead.
    fn buffer_run(&mut self, ctx: &mut ExecutionContext, key: Vec<Value>) -> EngineResult<()> {
        let Some(first) = self.next_right.take() else {
            return Ok(());
        };
        let mut run = vec![first];
        loop {
            match self.right.next(ctx)? {
                Some(row) if merge_cmp(&key_values(&row, &self.right_keys), &key) == Ordering::Equal => {
                    run.push(row);
                }
                other => {
                    self.next_right = other;
                    break;
                }
            }
        }
        self.run = run;
        self.run_key = Some(key);
        self.run_cursor = 0;
        Ok(())
    }
}

impl Executor for MergeJoinExec {
    fn open(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.stats = ExecutionStats::default();

        self.left.open(ctx)?;
        self.right.open(ctx)?;

        self.run.clear();
        self.run_key = None;
        self.run_cursor = 0;
        self.next_right = self.right.next(ctx)?;
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
            let left_key = key_values(&left_row, &self.left_keys);

            // Emit from the buffered run while the left key stays on it.
            if let Some(run_key) = self.run_key.clone() {
                if merge_cmp(&left_key, &run_key) == Ordering::Equal
                    && keys_match(&left_key, &run_key)
                {
                    while self.run_cursor < self.run.len() {
                        let right_row = &self.run[self.run_cursor];
                        self.run_cursor += 1;
                        let combined = concat_rows(&left_row, right_row);
                        if residual_passes(&self.residual, &combined)? {
                            self.left_matched = true;
                            self.stats.rows_produced += 1;
                            self.stats.total_next_time += start.elapsed();
                            return Ok(Some(combined));
                        }
                    }
                    // Run exhausted for this left row; the run stays
                    // buffered for the next left row with the same key.
                    if let Some(pad) = self.finish_left(ctx, &left_row)? {
                        self.stats.rows_produced += 1;
                        self.stats.total_next_time += start.elapsed();
                        return Ok(Some(pad));
                    }
                    continue;
                }
                // Left moved past the run (or keys cannot match).
                self.run.clear();
                self.run_key = None;
                self.run_cursor = 0;
            }

            let Some(right_row) = &self.next_right else {
                // Right exhausted: inner joins are done, LEFT flushes the
                // remaining left rows null-padded.
                if self.kind == JoinKind::Inner {
                    self.current_left = None;
                    self.stats.total_next_time += start.elapsed();
                    return Ok(None);
                }
                if let Some(pad) = self.finish_left(ctx, &left_row)? {
                    self.stats.rows_produced += 1;
                    self.stats.total_next_time += start.elapsed();
                    return Ok(Some(pad));
                }
                continue;
            };

            let right_key = key_values(right_row, &self.right_keys);
            match merge_cmp(&left_key, &right_key) {
                Ordering::Less => {
                    // No right row can match this left row any more.
                    if let Some(pad) = self.finish_left(ctx, &left_row)? {
                        self.stats.rows_produced += 1;
                        self.stats.total_next_time += start.elapsed();
                        return Ok(Some(pad));
                    }
                }
                Ordering::Greater => {
                    self.next_right = self.right.next(ctx)?;
                }
                Ordering::Equal => {
                    if keys_match(&left_key, &right_key) {
                        self.buffer_run(ctx, right_key)?;
                    } else {
                        // Keys collide in sort order (nulls) but never
                        // match; treat the left row as unmatched.
                        if let Some(pad) = self.finish_left(ctx, &left_row)? {
                            self.stats.rows_produced += 1;
                            self.stats.total_next_time += start.elapsed();
                            return Ok(Some(pad));
                        }
                    }
                }
            }
        }
    }

    fn close(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.run.clear();
        self.run_key = None;
        self.current_left = None;
        self.next_right = None;
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

fn key_values(row: &Row, keys: &[ColumnId]) -> Vec<Value> {
    keys.iter().map(|idx| row.values[*idx].clone()).collect()
}

/// Componentwise merge ordering. Nulls sort first (a row missing its
/// declared order column reads as null and therefore sorts first), both
/// numeric kinds compare under f64 total order, and cross-kind pairs
/// fall back to a fixed kind rank so malformed inputs cannot hang the
/// cursor advance.
fn merge_cmp(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = value_merge_cmp(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn value_merge_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => kind_rank(a).cmp(&kind_rank(b)),
        },
    }
}

fn kind_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Text(_) => 3,
    }
}

/// True equality per engine comparison rules; null components never match.
fn keys_match(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.sql_eq(y) == Some(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::{assert_exhausted, assert_next_row, MockExecutor};
    use crate::HashColumnarBackend;
    use source::SourceRegistry;

    fn int_row(values: &[i64]) -> Row {
        Row::new(values.iter().map(|&v| Value::Int(v)).collect())
    }

    fn make_join(
        left_rows: Vec<Row>,
        right_rows: Vec<Row>,
        kind: JoinKind,
    ) -> MergeJoinExec {
        let left = Box::new(MockExecutor::new(
            left_rows,
            vec!["u.id".into(), "u.value".into()],
        ));
        let right = Box::new(MockExecutor::new(
            right_rows,
            vec!["o.user_id".into(), "o.amount".into()],
        ));
        MergeJoinExec::new(
            left,
            right,
            kind,
            vec![0],
            vec![0],
            None,
            vec![
                "u.id".into(),
                "u.value".into(),
                "o.user_id".into(),
                "o.amount".into(),
            ],
        )
    }

    #[test]
    fn merge_join_crosses_equal_runs() {
        // Left id=1 twice, right user_id=1 twice: 2x2 cross per key.
        let mut join = make_join(
            vec![int_row(&[1, 10]), int_row(&[1, 11]), int_row(&[2, 20])],
            vec![int_row(&[1, 100]), int_row(&[1, 101]), int_row(&[2, 200])],
            JoinKind::Inner,
        );

        let registry = SourceRegistry::new();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        join.open(&mut ctx).unwrap();
        assert_next_row(&mut join, &mut ctx, int_row(&[1, 10, 1, 100]));
        assert_next_row(&mut join, &mut ctx, int_row(&[1, 10, 1, 101]));
        assert_next_row(&mut join, &mut ctx, int_row(&[1, 11, 1, 100]));
        assert_next_row(&mut join, &mut ctx, int_row(&[1, 11, 1, 101]));
        assert_next_row(&mut join, &mut ctx, int_row(&[2, 20, 2, 200]));
        assert_exhausted(&mut join, &mut ctx);
        join.close(&mut ctx).unwrap();
    }

    #[test]
    fn merge_join_skips_unmatched_keys_on_both_sides() {
        let mut join = make_join(
            vec![int_row(&[1, 10]), int_row(&[3, 30]), int_row(&[5, 50])],
            vec![int_row(&[2, 200]), int_row(&[3, 300]), int_row(&[4, 400])],
            JoinKind::Inner,
        );

        let registry = SourceRegistry::new();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        join.open(&mut ctx).unwrap();
        assert_next_row(&mut join, &mut ctx, int_row(&[3, 30, 3, 300]));
        assert_exhausted(&mut join, &mut ctx);
    }

    #[test]
    fn left_merge_join_pads_and_flushes_tail() {
        let mut join = make_join(
            vec![int_row(&[1, 10]), int_row(&[2, 20]), int_row(&[9, 90])],
            vec![int_row(&[2, 200])],
            JoinKind::Left,
        );

        let registry = SourceRegistry::new();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        join.open(&mut ctx).unwrap();
        assert_next_row(
            &mut join,
            &mut ctx,
            Row::new(vec![Value::Int(1), Value::Int(10), Value::Null, Value::Null]),
        );
        assert_next_row(&mut join, &mut ctx, int_row(&[2, 20, 2, 200]));
        // Right exhausted: tail flush
        assert_next_row(
            &mut join,
            &mut ctx,
            Row::new(vec![Value::Int(9), Value::Int(90), Value::Null, Value::Null]),
        );
        assert_exhausted(&mut join, &mut ctx);
    }

    #[test]
    fn null_order_keys_sort_first_and_never_match() {
        let mut join = make_join(
            vec![
                Row::new(vec![Value::Null, Value::Int(0)]),
                int_row(&[1, 10]),
            ],
            vec![
                Row::new(vec![Value::Null, Value::Int(0)]),
                int_row(&[1, 100]),
            ],
            JoinKind::Left,
        );

        let registry = SourceRegistry::new();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        join.open(&mut ctx).unwrap();
        assert_next_row(
            &mut join,
            &mut ctx,
            Row::new(vec![Value::Null, Value::Int(0), Value::Null, Value::Null]),
        );
        assert_next_row(&mut join, &mut ctx, int_row(&[1, 10, 1, 100]));
        assert_exhausted(&mut join, &mut ctx);
    }

    #[test]
    fn inner_merge_stops_when_right_exhausts() {
        let mut join = make_join(
            vec![int_row(&[1, 10]), int_row(&[2, 20]), int_row(&[3, 30])],
            vec![int_row(&[1, 100])],
            JoinKind::Inner,
        );

        let registry = SourceRegistry::new();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        join.open(&mut ctx).unwrap();
        assert_next_row(&mut join, &mut ctx, int_row(&[1, 10, 1, 100]));
        assert_exhausted(&mut join, &mut ctx);
    }

    #[test]
    fn merge_join_matches_promoted_numeric_keys() {
        let left = Box::new(MockExecutor::new(
            vec![Row::new(vec![Value::Int(1)])],
            vec!["l.k".into()],
        ));
        let right = Box::new(MockExecutor::new(
            vec![Row::new(vec![Value::Float(1.0)])],
            vec!["r.k".into()],
        ));
        let mut join = MergeJoinExec::new(
            left,
            right,
            JoinKind::Inner,
            vec![0],
            vec![0],
            None,
            vec!["l.k".into(), "r.k".into()],
        );

        let registry = SourceRegistry::new();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        join.open(&mut ctx).unwrap();
        assert_next_row(
            &mut join,
            &mut ctx,
            Row::new(vec![Value::Int(1), Value::Float(1.0)]),
        );
        assert_exhausted(&mut join, &mut ctx);
    }
}
