//! Streaming executor: runs physical plans with a Volcano-style pull model.
//!
//! Every operator is a lazy row producer implementing [`Executor`]. The
//! consumer of the root operator drives the whole pipeline: each `next`
//! call pulls from the operator's children as needed, so rows flow one at
//! a time and nothing is materialized beyond what the chosen join
//! strategy requires.
//!
//! ```text
//! Physical Plan
//!     ↓
//! build_executor()
//!     ↓
//! open() → start producers
//!     ↓
//! next() → pull rows one at a time
//!     ↓
//! close() → drop producer state
//! ```

mod builder;
mod filter;
pub mod join;
mod project;
mod scan;


pub use builder::build_executor;
pub use filter::{eval_resolved_expr, FilterExec};
pub use join::columnar::{ColumnBatch, ColumnarBackend, ColumnarJoinSpec, HashColumnarBackend};
pub use join::{ColumnarJoinExec, LookupJoinExec, MergeJoinExec, MmapJoinExec};
pub use project::ProjectExec;
pub use scan::ScanExec;

use common::{EngineResult, ExecutionStats, Row};
use planner::PhysicalPlan;
use source::SourceRegistry;

/// Pull-based iterator interface shared by all operators.
///
/// Operators start their inputs in `open()`, produce rows via `next()`
/// until it returns `None`, and release state in `close()`. Calling
/// `open()` again restarts the operator from the beginning (scans restart
/// their producer).
pub trait Executor {
    /// Start the operator (invoke producers, build join state, etc.).
    fn open(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()>;

    /// Fetch the next row, or None when exhausted.
    fn next(&mut self, ctx: &mut ExecutionContext) -> EngineResult<Option<Row>>;

    /// Drop per-query state (join tables, producer iterators, buffers).
    fn close(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()>;

    /// Qualified column names of the rows this operator produces.
    fn schema(&self) -> &[String];

    /// Execution statistics, when the operator collects them.
    fn stats(&self) -> Option<&ExecutionStats> {
        None
    }
}

/// Shared execution context passed to all operators.
///
/// Holds the source registry (scans resolve their producer through it)
/// and the columnar backend the columnar join strategy delegates to.
pub struct ExecutionContext<'a> {
    pub registry: &'a SourceRegistry,
    pub backend: &'a dyn ColumnarBackend,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(registry: &'a SourceRegistry, backend: &'a dyn ColumnarBackend) -> Self {
        Self { registry, backend }
    }
}

/// Execute a plan to completion and collect every row.
///
/// Streaming consumers should drive the operator tree themselves; this
/// is the convenience entry point for tests and small results.
pub fn execute(plan: PhysicalPlan, ctx: &mut ExecutionContext) -> EngineResult<Vec<Row>> {
    let mut executor = build_executor(plan)?;

    executor.open(ctx)?;

    let mut results = Vec::new();
    while let Some(row) = executor.next(ctx)? {
        results.push(row);
    }

    executor.close(ctx)?;

    Ok(results)
}
