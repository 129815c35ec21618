//! Engine facade: register row sources, run SELECT queries, stream rows.
//!
//! The engine joins and filters heterogeneous, externally supplied row
//! sources (files, service feeds, database cursors) without
//! materializing the inputs. Callers register a restartable producer per
//! table and iterate query results lazily:
//!
//! ```no_run
//! use engine::Engine;
//! use source::{json_lines, SourceIter};
//!
//! let mut engine = Engine::new();
//! engine
//!     .register()
//!     .name("users")
//!     .producer(json_lines("users.jsonl"))
//!     .call();
//! engine
//!     .register()
//!     .name("orders")
//!     .producer(json_lines("orders.jsonl"))
//!     .call();
//!
//! let rows = engine
//!     .query("SELECT users.name, orders.product FROM users JOIN orders ON users.id = orders.user_id")
//!     .unwrap();
//! for row in rows {
//!     println!("{:?}", row.unwrap());
//! }
//! ```

pub use common::{EngineResult, Row, RowMap};
use executor::{
    build_executor, ColumnarBackend, ExecutionContext, Executor, HashColumnarBackend,
};
use planner::{PlanOptions, Planner};
use source::{SourceIter, SourceRegistry, TableSource};
use std::path::PathBuf;
use std::sync::Arc;

pub use common::prelude::*;
pub use executor::{ColumnBatch, ColumnarJoinSpec};
pub use planner::JoinStrategy;

/// Engine-wide configuration.
///
/// # Example
/// ```
/// use engine::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .use_columnar(true)
///     .debug(true)
///     .build();
/// ```
#[derive(Clone, Debug, bon::Builder)]
pub struct EngineConfig {
    /// Route every join through the columnar backend.
    #[builder(default = false)]
    pub use_columnar: bool,
    /// Permit the memory-mapped join strategy for file-backed tables.
    #[builder(default = true)]
    pub use_mmap: bool,
    /// Log each query's SQL and physical plan at debug level.
    #[builder(default = false)]
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_columnar: false,
            use_mmap: true,
            debug: false,
        }
    }
}

/// A streaming SQL engine over registered row sources.
///
/// Stateless across queries: each `query` call parses, plans, and builds
/// a fresh operator tree. The only mutable state is the source registry,
/// and `register` requires `&mut self`, so concurrent queries cannot race
/// a registration.
pub struct Engine {
    config: EngineConfig,
    registry: SourceRegistry,
    backend: Arc<dyn ColumnarBackend>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[bon::bon]
impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            registry: SourceRegistry::new(),
            backend: Arc::new(HashColumnarBackend),
        }
    }

    /// Replace the columnar backend the columnar join strategy delegates
    /// to. The default is the built-in hash backend.
    pub fn set_columnar_backend(&mut self, backend: Arc<dyn ColumnarBackend>) {
        self.backend = backend;
    }

    /// Bind a table name to a restartable producer.
    ///
    /// Registration is idempotent - the last binding for a name wins.
    /// `ordered_by` promises non-descending producer output on a column
    /// (enables the sort-merge strategy); `filename` points at a
    /// JSON-lines file mirroring the producer (enables the memory-mapped
    /// strategy).
    ///
    /// ```no_run
    /// # use engine::Engine;
    /// # use source::SourceIter;
    /// # let mut engine = Engine::new();
    /// # let producer = || -> SourceIter { Box::new(std::iter::empty()) };
    /// engine
    ///     .register()
    ///     .name("orders")
    ///     .producer(producer)
    ///     .ordered_by("user_id")
    ///     .call();
    /// ```
    #[builder]
    pub fn register(
        &mut self,
        #[builder(into)] name: String,
        producer: impl Fn() -> SourceIter + Send + Sync + 'static,
        #[builder(into)] ordered_by: Option<String>,
        #[builder(into)] filename: Option<PathBuf>,
    ) {
        let mut table = TableSource::new(name, producer);
        table.ordered_by = ordered_by;
        table.filename = filename;
        self.registry.register(table);
    }

    /// Plan a SELECT and return its lazy result rows.
    ///
    /// Parsing and planning failures (unsupported SQL, unknown tables,
    /// unresolved columns) surface here, before any row is produced.
    /// Producer failures surface from the iterator at the pull that hit
    /// them.
    pub fn query(&self, sql: &str) -> EngineResult<Rows<'_>> {
        let stmt = parser::parse_select(sql)?;
        let options = PlanOptions {
            use_columnar: self.config.use_columnar,
            use_mmap: self.config.use_mmap,
        };
        let plan = Planner::new(&self.registry).plan(stmt, &options)?;

        if self.config.debug {
            log::debug!("query: {sql}");
            log::debug!("plan:\n{plan}");
        }

        let schema = plan.schema();
        let exec = build_executor(plan)?;
        Ok(Rows {
            exec,
            ctx: ExecutionContext::new(&self.registry, self.backend.as_ref()),
            schema,
            started: false,
            done: false,
        })
    }
}

/// Lazy query results: alias-keyed row maps, one per pull.
///
/// The operator tree opens on the first pull and closes on exhaustion or
/// error; after either the iterator is fused. Dropping it early simply
/// abandons the pipeline (producers see no further pulls).
pub struct Rows<'a> {
    exec: Box<dyn Executor>,
    ctx: ExecutionContext<'a>,
    schema: Vec<String>,
    started: bool,
    done: bool,
}

impl Rows<'_> {
    /// Output column names, in select-list order.
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    fn to_map(&self, row: Row) -> RowMap {
        self.schema
            .iter()
            .cloned()
            .zip(row.into_values())
            .collect()
    }
}

impl Iterator for Rows<'_> {
    type Item = EngineResult<RowMap>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            if let Err(e) = self.exec.open(&mut self.ctx) {
                self.done = true;
                return Some(Err(e));
            }
        }
        match self.exec.next(&mut self.ctx) {
            Ok(Some(row)) => Some(Ok(self.to_map(row))),
            Ok(None) => {
                self.done = true;
                match self.exec.close(&mut self.ctx) {
                    Ok(()) => None,
                    Err(e) => Some(Err(e)),
                }
            }
            Err(e) => {
                self.done = true;
                let _ = self.exec.close(&mut self.ctx);
                Some(Err(e))
            }
        }
    }
}
