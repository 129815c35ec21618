//! Memory-mapped join: index the right table's file by key and offset.
//!
//! Semantically identical to the lookup join; only the memory profile
//! differs. Instead of materializing right rows, `open()` maps the
//! table's JSON-lines file and records `key → [(offset, len)]` per line.
//! Matching rows are parsed on demand from the mapping, so resident
//! memory is the index plus one row buffer. When the file is absent or a
//! line is not a flat JSON object, the operator degrades to lookup
//! behavior by draining the right producer instead.

use super::{concat_rows, join_key, key_from, null_padded, residual_passes, JoinKey};
use crate::scan::{passes, project_row};
use crate::{ExecutionContext, Executor};
use common::{ColumnId, EngineError, EngineResult, ExecutionStats, Row};
use hashbrown::HashMap;
use memmap2::Mmap;
use planner::JoinKind;
use planner::ResolvedExpr;
use source::row_from_json;
use std::path::Path;
use std::time::Instant;
use types::Value;

enum RightSide {
    Closed,
    /// File-backed: offsets into the mapping, rows parsed per probe.
    Mapped {
        map: Mmap,
        index: HashMap<JoinKey, Vec<(usize, usize)>>,
    },
    /// Lookup fallback: right producer drained into memory.
    Drained {
        table: HashMap<JoinKey, Vec<Row>>,
    },
}

/// File-backed join over the right table's registered `filename`.
pub struct MmapJoinExec {
    left: Box<dyn Executor>,
    right_table: String,
    /// The right scan's projection, pushed predicate, and width, applied
    /// here because file rows bypass the scan operator.
    right_columns: Vec<String>,
    right_predicate: Option<ResolvedExpr>,
    right_width: usize,
    right_keys: Vec<ColumnId>,
    /// Unqualified key column names as they appear in file rows.
    right_key_names: Vec<String>,
    kind: JoinKind,
    left_keys: Vec<ColumnId>,
    residual: Option<ResolvedExpr>,
    schema: Vec<String>,

    right: RightSide,
    current_left: Option<Row>,
    current_key: Option<JoinKey>,
    match_cursor: usize,
    matched: bool,
    stats: ExecutionStats,
}

#[bon::bon]
impl MmapJoinExec {
    #[builder]
    pub fn new(
        left: Box<dyn Executor>,
        right_table: String,
        right_columns: Vec<String>,
        right_predicate: Option<ResolvedExpr>,
        right_width: usize,
        right_keys: Vec<ColumnId>,
        right_key_names: Vec<String>,
        kind: JoinKind,
        left_keys: Vec<ColumnId>,
        residual: Option<ResolvedExpr>,
        schema: Vec<String>,
    ) -> Self {
        Self {
            left,
            right_table,
            right_columns,
            right_predicate,
            right_width,
            right_keys,
            right_key_names,
            kind,
            left_keys,
            residual,
            schema,
            right: RightSide::Closed,
            current_left: None,
            current_key: None,
            match_cursor: 0,
            matched: false,
            stats: ExecutionStats::default(),
        }
    }

    /// Map the file and record each line's key and byte range. Row
    /// contents are parsed for the key and immediately discarded.
    fn build_index(
        path: &Path,
        key_names: &[String],
    ) -> EngineResult<(Mmap, HashMap<JoinKey, Vec<(usize, usize)>>)> {
        let file = std::fs::File::open(path)?;
        // Read-only mapping; the registered file is not expected to be
        // truncated while a query runs.
        let map = unsafe { Mmap::map(&file)? };

        let mut index: HashMap<JoinKey, Vec<(usize, usize)>> = HashMap::new();
        let mut offset = 0usize;
        for line in map.split(|b| *b == b'\n') {
            let len = line.len();
            if !line.iter().all(u8::is_ascii_whitespace) {
                let row = row_from_json(line)?;
                let key = key_from(key_names.iter().map(|name| {
                    row.get(name).unwrap_or(&Value::Null)
                }));
                if let Some(key) = key {
                    index.entry(key).or_default().push((offset, len));
                }
            }
            offset += len + 1;
        }
        Ok((map, index))
    }

    /// Lookup-style fallback: drain the right producer, applying the
    /// right scan's projection and predicate.
    fn build_drained(&self, ctx: &ExecutionContext) -> EngineResult<RightSide> {
        let source = ctx.registry.get(&self.right_table)?;
        let mut table: HashMap<JoinKey, Vec<Row>> = HashMap::new();
        for item in source.rows() {
            let map = item.map_err(|e| EngineError::Source {
                table: self.right_table.clone(),
                message: e.to_string(),
            })?;
            let row = project_row(&self.right_columns, &map);
            if !passes(&self.right_predicate, &row)? {
                continue;
            }
            if let Some(key) = join_key(&row, &self.right_keys) {
                table.entry(key).or_default().push(row);
            }
        }
        Ok(RightSide::Drained { table })
    }

    /// Parse the row at a byte range and run it through the right scan's
    /// projection and predicate; `None` when the predicate drops it.
    fn fetch(&self, map: &Mmap, offset: usize, len: usize) -> EngineResult<Option<Row>> {
        let row = row_from_json(&map[offset..offset + len])?;
        let row = project_row(&self.right_columns, &row);
        Ok(passes(&self.right_predicate, &row)?.then_some(row))
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

    /// Next surviving right row for the current key, advancing the cursor.
    fn next_candidate(&mut self, key: &JoinKey) -> EngineResult<Option<Row>> {
        loop {
            match &self.right {
                RightSide::Mapped { map, index } => {
                    let Some(&(offset, len)) = index
                        .get(key)
                        .and_then(|ranges| ranges.get(self.match_cursor))
                    else {
                        return Ok(None);
                    };
                    self.match_cursor += 1;
                    match self.fetch(map, offset, len)? {
                        Some(row) => return Ok(Some(row)),
                        // Dropped by the pushed predicate; keep probing.
                        None => continue,
                    }
                }
                RightSide::Drained { table } => {
                    let row = table
                        .get(key)
                        .and_then(|rows| rows.get(self.match_cursor))
                        .cloned();
                    if row.is_some() {
                        self.match_cursor += 1;
                    }
                    return Ok(row);
                }
                RightSide::Closed => {
                    return Err(EngineError::Exec("mmap join used before open".into()))
                }
            }
        }
    }
}

impl Executor for MmapJoinExec {
    fn open(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.stats = ExecutionStats::default();

        self.left.open(ctx)?;

        let filename = ctx.registry.get(&self.right_table)?.filename.clone();
        self.right = match filename {
            Some(path) => match Self::build_index(&path, &self.right_key_names) {
                Ok((map, index)) => RightSide::Mapped { map, index },
                Err(e) => {
                    log::debug!(
                        "mmap index for '{}' unavailable ({e}); using lookup fallback",
                        self.right_table
                    );
                    self.build_drained(ctx)?
                }
            },
            None => self.build_drained(ctx)?,
        };

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

            if let Some(key) = self.current_key.clone() {
                while let Some(right_row) = self.next_candidate(&key)? {
                    let combined = concat_rows(&left_row, &right_row);
                    if residual_passes(&self.residual, &combined)? {
                        self.matched = true;
                        self.stats.rows_produced += 1;
                        self.stats.total_next_time += start.elapsed();
                        return Ok(Some(combined));
                    }
                }
            }

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
        self.right = RightSide::Closed;
        self.current_left = None;
        self.current_key = None;
        self.left.close(ctx)?;
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
