//! Project operator: evaluates the select list.

use crate::filter::eval_resolved_expr;
use crate::{ExecutionContext, Executor};
use common::{EngineResult, ExecutionStats, Row};
use planner::ResolvedExpr;
use std::time::Instant;

/// Evaluates each select-list expression against input rows.
///
/// The output schema is the alias (or canonical expression text) of each
/// item. Row order is preserved.
pub struct ProjectExec {
    input: Box<dyn Executor>,
    items: Vec<(String, ResolvedExpr)>,
    schema: Vec<String>,
    stats: ExecutionStats,
}

impl ProjectExec {
    pub fn new(input: Box<dyn Executor>, items: Vec<(String, ResolvedExpr)>) -> Self {
        let schema = items.iter().map(|(name, _)| name.clone()).collect();
        Self {
            input,
            items,
            schema,
            stats: ExecutionStats::default(),
        }
    }
}

impl Executor for ProjectExec {
    fn open(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.stats = ExecutionStats::default();
        self.input.open(ctx)?;
        self.stats.open_time = start.elapsed();
        Ok(())
    }

    fn next(&mut self, ctx: &mut ExecutionContext) -> EngineResult<Option<Row>> {
        let start = Instant::now();

        let row = match self.input.next(ctx)? {
            Some(r) => r,
            None => {
                self.stats.total_next_time += start.elapsed();
                return Ok(None);
            }
        };

        let mut values = Vec::with_capacity(self.items.len());
        for (_, expr) in &self.items {
            values.push(eval_resolved_expr(expr, &row)?);
        }

        self.stats.rows_produced += 1;
        self.stats.total_next_time += start.elapsed();
        Ok(Some(Row::new(values)))
    }

    fn close(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        let start = Instant::now();
        self.input.close(ctx)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::{assert_exhausted, assert_next_row, binary, col, lit, MockExecutor};
    use crate::HashColumnarBackend;
    use expr::BinaryOp;
    use source::SourceRegistry;
    use types::Value;

    #[test]
    fn project_evaluates_expressions_with_aliases() {
        let rows = vec![Row::new(vec![Value::Float(2.0), Value::Int(3)])];
        let input = Box::new(MockExecutor::new(
            rows,
            vec!["orders.price".into(), "orders.quantity".into()],
        ));

        let items = vec![
            ("cost".to_string(), col(0)),
            (
                "total".to_string(),
                binary(col(0), BinaryOp::Mul, col(1)),
            ),
        ];
        let mut project = ProjectExec::new(input, items);
        assert_eq!(project.schema(), &["cost", "total"]);

        let registry = SourceRegistry::new();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        project.open(&mut ctx).unwrap();
        assert_next_row(
            &mut project,
            &mut ctx,
            Row::new(vec![Value::Float(2.0), Value::Float(6.0)]),
        );
        assert_exhausted(&mut project, &mut ctx);
        project.close(&mut ctx).unwrap();
    }

    #[test]
    fn project_duplicates_and_reorders() {
        let rows = vec![Row::new(vec![Value::Int(1), Value::Text("a".into())])];
        let input = Box::new(MockExecutor::new(rows, vec!["t.id".into(), "t.v".into()]));

        let items = vec![
            ("v".to_string(), col(1)),
            ("id1".to_string(), col(0)),
            ("id2".to_string(), col(0)),
        ];
        let mut project = ProjectExec::new(input, items);

        let registry = SourceRegistry::new();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        project.open(&mut ctx).unwrap();
        assert_next_row(
            &mut project,
            &mut ctx,
            Row::new(vec![Value::Text("a".into()), Value::Int(1), Value::Int(1)]),
        );
        assert_exhausted(&mut project, &mut ctx);
    }

    #[test]
    fn project_constant_expression() {
        let rows = vec![Row::new(vec![Value::Int(1)]), Row::new(vec![Value::Int(2)])];
        let input = Box::new(MockExecutor::new(rows, vec!["t.id".into()]));

        let items = vec![("tag".to_string(), lit(Value::Text("x".into())))];
        let mut project = ProjectExec::new(input, items);

        let registry = SourceRegistry::new();
        let backend = HashColumnarBackend;
        let mut ctx = ExecutionContext::new(&registry, &backend);

        project.open(&mut ctx).unwrap();
        assert_next_row(&mut project, &mut ctx, Row::new(vec![Value::Text("x".into())]));
        assert_next_row(&mut project, &mut ctx, Row::new(vec![Value::Text("x".into())]));
        assert_exhausted(&mut project, &mut ctx);
    }
}
