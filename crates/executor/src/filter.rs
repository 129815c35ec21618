//! Filter operator and the resolved-expression evaluator.

use crate::{ExecutionContext, Executor};
use common::{EngineError, EngineResult, ExecutionStats, Row};
use expr::{BinaryOp, UnaryOp};
use planner::ResolvedExpr;
use std::time::Instant;
use types::Value;

/// Applies a predicate to rows from a child operator.
///
/// A row survives only when the predicate evaluates to a definite
/// `true`; both `false` and Null drop it (SQL WHERE semantics).
pub struct FilterExec {
    input: Box<dyn Executor>,
    predicate: ResolvedExpr,
    stats: ExecutionStats,
}

impl FilterExec {
    pub fn new(input: Box<dyn Executor>, predicate: ResolvedExpr) -> Self {
        Self {
            input,
            predicate,
            stats: ExecutionStats::default(),
        }
    }
}

impl Executor for FilterExec {
    fn open(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.stats = ExecutionStats::default();
        self.input.open(ctx)?;
        self.stats.open_time = start.elapsed();
        Ok(())
    }

    fn next(&mut self, ctx: &mut ExecutionContext) -> EngineResult<Option<Row>> {
        let start = Instant::now();

        loop {
            let row = match self.input.next(ctx)? {
                Some(r) => r,
                None => {
                    self.stats.total_next_time += start.elapsed();
                    return Ok(None);
                }
            };

            if matches!(eval_resolved_expr(&self.predicate, &row)?, Value::Bool(true)) {
                self.stats.rows_produced += 1;
                self.stats.total_next_time += start.elapsed();
                return Ok(Some(row));
            }
            self.stats.rows_filtered += 1;
        }
    }

    fn close(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.input.close(ctx)?;
        self.stats.close_time = start.elapsed();
        Ok(())
    }

    fn schema(&self) -> &[String] {
        self.input.schema()
    }

    fn stats(&self) -> Option<&ExecutionStats> {
        Some(&self.stats)
    }
}

/// Evaluate a resolved expression against a row.
///
/// Three-valued semantics throughout: Null operands propagate through
/// arithmetic and comparisons, logical operators follow Kleene logic,
/// and kind mismatches (Text vs Int, arithmetic on Bool) yield Null
/// rather than an error - schema-less sources make them a data
/// condition, not a programming one.
pub fn eval_resolved_expr(expr: &ResolvedExpr, row: &Row) -> EngineResult<Value> {
    match expr {
        ResolvedExpr::Literal(v) => Ok(v.clone()),
        ResolvedExpr::Column(idx) => row.values.get(*idx).cloned().ok_or_else(|| {
            EngineError::Exec(format!(
                "column index {} out of bounds (row has {} columns)",
                idx,
                row.values.len()
            ))
        }),
        ResolvedExpr::Unary { op, expr } => {
            let val = eval_resolved_expr(expr, row)?;
            Ok(match op {
                UnaryOp::Not => match truth(&val) {
                    Some(b) => Value::Bool(!b),
                    None => Value::Null,
                },
                UnaryOp::Neg => val.neg(),
            })
        }
        ResolvedExpr::Binary { left, op, right } => {
            let lhs = eval_resolved_expr(left, row)?;
            let rhs = eval_resolved_expr(right, row)?;
            Ok(eval_binary(&lhs, *op, &rhs))
        }
        ResolvedExpr::InList {
            expr,
            list,
            negated,
        } => {
            let val = eval_resolved_expr(expr, row)?;
            Ok(eval_in_list(&val, list, *negated))
        }
        ResolvedExpr::IsNull { expr, negated } => {
            let val = eval_resolved_expr(expr, row)?;
            Ok(Value::Bool(val.is_null() != *negated))
        }
    }
}

fn eval_binary(lhs: &Value, op: BinaryOp, rhs: &Value) -> Value {
    match op {
        BinaryOp::Add => lhs.add(rhs),
        BinaryOp::Sub => lhs.sub(rhs),
        BinaryOp::Mul => lhs.mul(rhs),
        BinaryOp::Div => lhs.div(rhs),
        BinaryOp::Eq => bool3(lhs.sql_eq(rhs)),
        BinaryOp::Ne => bool3(lhs.sql_eq(rhs).map(|b| !b)),
        BinaryOp::Lt => bool3(lhs.compare(rhs).map(|o| o == std::cmp::Ordering::Less)),
        BinaryOp::Le => bool3(lhs.compare(rhs).map(|o| o != std::cmp::Ordering::Greater)),
        BinaryOp::Gt => bool3(lhs.compare(rhs).map(|o| o == std::cmp::Ordering::Greater)),
        BinaryOp::Ge => bool3(lhs.compare(rhs).map(|o| o != std::cmp::Ordering::Less)),
        BinaryOp::And => match (truth(lhs), truth(rhs)) {
            (Some(false), _) | (_, Some(false)) => Value::Bool(false),
            (Some(true), Some(true)) => Value::Bool(true),
            _ => Value::Null,
        },
        BinaryOp::Or => match (truth(lhs), truth(rhs)) {
            (Some(true), _) | (_, Some(true)) => Value::Bool(true),
            (Some(false), Some(false)) => Value::Bool(false),
            _ => Value::Null,
        },
    }
}

/// IN: true on any match, Null when no match but some comparison was
/// unknown, false otherwise. NOT IN negates through three-valued logic.
fn eval_in_list(val: &Value, list: &[Value], negated: bool) -> Value {
    let mut saw_unknown = val.is_null();
    let mut found = false;
    if !val.is_null() {
        for member in list {
            match val.sql_eq(member) {
                Some(true) => {
                    found = true;
                    break;
                }
                Some(false) => {}
                None => saw_unknown = true,
            }
        }
    }
    if found {
        Value::Bool(!negated)
    } else if saw_unknown {
        Value::Null
    } else {
        Value::Bool(negated)
    }
}

fn bool3(b: Option<bool>) -> Value {
    match b {
        Some(b) => Value::Bool(b),
        None => Value::Null,
    }
}

/// Kleene truth value: definite booleans only, everything else unknown.
fn truth(v: &Value) -> Option<bool> {
    v.as_bool()
}
