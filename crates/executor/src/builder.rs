//! Maps physical plan nodes onto operator instances.

use crate::join::{ColumnarJoinExec, LookupJoinExec, MergeJoinExec, MmapJoinExec};
use crate::{ColumnarJoinSpec, Executor, FilterExec, ProjectExec, ScanExec};
use common::{EngineError, EngineResult};
use planner::{JoinStrategy, PhysicalPlan};

/// Build the operator tree for a physical plan.
pub fn build_executor(plan: PhysicalPlan) -> EngineResult<Box<dyn Executor>> {
    Ok(match plan {
        PhysicalPlan::Scan {
            table,
            columns,
            schema,
            predicate,
        } => Box::new(ScanExec::new(table, columns, schema, predicate)),
        PhysicalPlan::Filter { input, predicate } => {
            Box::new(FilterExec::new(build_executor(*input)?, predicate))
        }
        PhysicalPlan::Project { input, items } => {
            Box::new(ProjectExec::new(build_executor(*input)?, items))
        }
        PhysicalPlan::Join {
            strategy,
            kind,
            left,
            right,
            left_keys,
            right_keys,
            residual,
            schema,
        } => match strategy {
            JoinStrategy::Lookup => Box::new(LookupJoinExec::new(
                build_executor(*left)?,
                build_executor(*right)?,
                kind,
                left_keys,
                right_keys,
                residual,
                schema,
            )),
            JoinStrategy::SortMerge => Box::new(MergeJoinExec::new(
                build_executor(*left)?,
                build_executor(*right)?,
                kind,
                left_keys,
                right_keys,
                residual,
                schema,
            )),
            JoinStrategy::Columnar => {
                let spec = ColumnarJoinSpec {
                    kind,
                    left_keys,
                    right_keys,
                    residual,
                };
                Box::new(ColumnarJoinExec::new(
                    build_executor(*left)?,
                    build_executor(*right)?,
                    spec,
                    schema,
                ))
            }
            JoinStrategy::Mmap => {
                // The planner only selects mmap when the right child is a
                // scan; the file path replaces that scan at execution.
                let PhysicalPlan::Scan {
                    table,
                    columns,
                    schema: right_schema,
                    predicate,
                } = *right
                else {
                    return Err(EngineError::Plan(
                        "internal: mmap join requires a scan on its right side".into(),
                    ));
                };
                let right_key_names = right_keys
                    .iter()
                    .map(|idx| columns[*idx].clone())
                    .collect();
                Box::new(
                    MmapJoinExec::builder()
                        .left(build_executor(*left)?)
                        .right_table(table)
                        .right_columns(columns)
                        .maybe_right_predicate(predicate)
                        .right_width(right_schema.len())
                        .right_keys(right_keys)
                        .right_key_names(right_key_names)
                        .kind(kind)
                        .left_keys(left_keys)
                        .maybe_residual(residual)
                        .schema(schema)
                        .build(),
                )
            }
        },
    })
}
