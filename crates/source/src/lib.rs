//! Source registry: binds table names to restartable row producers.
//!
//! The engine never opens connections or files on its own (the
//! memory-mapped join strategy, which receives an explicit filename, is
//! the one exception). Callers register a producer per table: a factory
//! that returns a fresh iteration of the table's rows each time it is
//! invoked. Registration is eager, iteration is lazy, and producers may
//! be invoked several times per query.

use common::{EngineError, EngineResult, RowMap};
use hashbrown::HashMap;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

/// Error type producers are allowed to yield mid-iteration.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// One fresh iteration over a table's rows.
pub type SourceIter = Box<dyn Iterator<Item = Result<RowMap, SourceError>>>;

/// Restartable row factory: each invocation restarts from the beginning.
pub type Producer = Arc<dyn Fn() -> SourceIter + Send + Sync>;

/// A registered table: producer plus optional execution metadata.
pub struct TableSource {
    pub name: String,
    producer: Producer,
    /// Caller's promise that rows are non-descending on this column.
    pub ordered_by: Option<String>,
    /// JSON-lines file mirroring the producer's output.
    pub filename: Option<PathBuf>,
}

impl std::fmt::Debug for TableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSource")
            .field("name", &self.name)
            .field("ordered_by", &self.ordered_by)
            .field("filename", &self.filename)
            .finish()
    }
}

impl TableSource {
    pub fn new(
        name: impl Into<String>,
        producer: impl Fn() -> SourceIter + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            producer: Arc::new(producer),
            ordered_by: None,
            filename: None,
        }
    }

    /// Start a fresh iteration.
    pub fn rows(&self) -> SourceIter {
        (self.producer)()
    }
}

/// Name → source bindings for one engine instance.
///
/// Mutation happens only through [`register`](Self::register); queries
/// hold a shared borrow for their whole lifetime, so the borrow checker
/// enforces the registry's external-serialization contract.
#[derive(Default)]
pub struct SourceRegistry {
    tables: HashMap<String, TableSource>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a source under its name; an existing binding is replaced.
    pub fn register(&mut self, source: TableSource) {
        self.tables.insert(source.name.clone(), source);
    }

    pub fn get(&self, name: &str) -> EngineResult<&TableSource> {
        self.tables
            .get(name)
            .ok_or_else(|| EngineError::Config(format!("unknown table '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Discover a table's column shape from the first row of a fresh run.
    ///
    /// Sources are schema-less; this is the only shape information the
    /// planner has for resolving bare column references. An empty source
    /// has an empty shape.
    pub fn peek_columns(&self, name: &str) -> EngineResult<Vec<String>> {
        let table = self.get(name)?;
        match table.rows().next() {
            None => Ok(Vec::new()),
            Some(Ok(row)) => {
                let mut cols: Vec<String> = row.keys().cloned().collect();
                cols.sort();
                Ok(cols)
            }
            Some(Err(e)) => Err(EngineError::Source {
                table: name.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// Decode one JSON-lines row into a `RowMap`.
///
/// Only flat objects of JSON scalars are mappable; nested values or
/// non-object lines are a data error (the memory-mapped join falls back
/// to the lookup strategy when it sees one).
pub fn row_from_json(bytes: &[u8]) -> EngineResult<RowMap> {
    serde_json::from_slice::<RowMap>(bytes)
        .map_err(|e| EngineError::Data(format!("not a flat JSON object row: {e}")))
}

/// Producer over a JSON-lines file: one object per line, blank lines
/// skipped. Each invocation reopens the file and streams it from the
/// start, one row in memory at a time.
pub fn json_lines(path: impl Into<PathBuf>) -> impl Fn() -> SourceIter + Send + Sync + 'static {
    let path = path.into();
    move || {
        let file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                let err: SourceError = Box::new(e);
                return Box::new(std::iter::once(Err(err))) as SourceIter;
            }
        };
        let rows = BufRead::lines(std::io::BufReader::new(file)).filter_map(|line| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(
                row_from_json(line.as_bytes()).map_err(|e| -> SourceError { e.to_string().into() }),
            ),
            Err(e) => Some(Err(Box::new(e) as SourceError)),
        });
        Box::new(rows) as SourceIter
    }
}
