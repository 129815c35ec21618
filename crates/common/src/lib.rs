use serde::{Deserialize, Serialize};
use std::{collections::HashMap, io, time::Duration};
use thiserror::Error;
use types::Value;

/// Ordinal of a column within an operator's output schema.
pub type ColumnId = usize;

/// Positional row representation backed by `types::Value`.
///
/// A row's meaning is given by the schema (qualified column names) of the
/// operator that produced it; the row itself carries only values.
///
/// Examples:
/// - `let row = Row::new(vec![Value::Int(1)]);`
/// - `let row = Row::new(vec![Value::Text("alice".into()), Value::Null]);`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// Named row representation used at the engine boundary.
///
/// Producers yield `RowMap`s keyed by unqualified column name; `query`
/// yields `RowMap`s keyed by select alias. Columns absent from a map
/// evaluate to Null.
pub type RowMap = HashMap<String, Value>;

/// Canonical error type shared across engine subsystems.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("parse: {0}")]
    Parse(String),
    #[error("plan: {0}")]
    Plan(String),
    #[error("config: {0}")]
    Config(String),
    #[error("exec: {0}")]
    Exec(String),
    #[error("source '{table}': {message}")]
    Source { table: String, message: String },
    #[error("data: {0}")]
    Data(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries an `EngineError`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Per-operator execution statistics, collected while a query runs.
#[derive(Clone, Debug, Default)]
pub struct ExecutionStats {
    /// Time spent in open()
    pub open_time: Duration,
    /// Cumulative time spent across all next() calls
    pub total_next_time: Duration,
    /// Time spent in close()
    pub close_time: Duration,
    /// Number of rows returned by this operator
    pub rows_produced: u64,
    /// Number of rows dropped by a predicate (scan and filter only)
    pub rows_filtered: u64,
}

impl ExecutionStats {
    /// Total time across open, next, and close.
    pub fn total_time(&self) -> Duration {
        self.open_time + self.total_next_time + self.close_time
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{ColumnId, EngineError, EngineResult, ExecutionStats, Row, RowMap};
    pub use types::Value;
}
