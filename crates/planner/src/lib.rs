//! Query planner: lowers a parsed SELECT into a streaming operator tree.
//!
//! Planning runs in three phases:
//!
//! 1. **Qualify** - every bare column is bound to its owning FROM table
//!    using the shape of each source's first row (sources are schema-less,
//!    so the first row is the only shape information available).
//! 2. **Lower + optimize** - build a left-deep join tree in FROM order,
//!    sink WHERE conjuncts into scans or just above the lowest join that
//!    covers them, and prune each scan down to the demanded columns.
//! 3. **Bind** - resolve column names to ordinals, extract equi-join keys
//!    from each ON clause, and select a join strategy per join node.
//!
//! ```text
//! Parser AST
//!     ↓ qualify
//! Qualified AST
//!     ↓ lower (pushdown while building)
//! LogicalPlan (names)
//!     ↓ prune
//! LogicalPlan (pruned scans)
//!     ↓ bind (ordinals, keys, strategies)
//! PhysicalPlan
//!     ↓
//! Executor
//! ```


use common::{ColumnId, EngineError, EngineResult};
use expr::{BinaryOp, Expr, UnaryOp};
use hashbrown::HashMap;
use parser::SelectStatement;
use source::SourceRegistry;
use types::Value;

pub use parser::JoinKind;

/// Logical plan node - optimizer-friendly representation with names.
#[derive(Clone, Debug, PartialEq)]
pub enum LogicalPlan {
    Scan {
        table: String,
        /// Unqualified columns the scan keeps; filled in by pruning.
        columns: Vec<String>,
        /// Predicate sunk into the scan, evaluated before rows leave it.
        predicate: Option<Expr>,
    },
    Filter {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        kind: JoinKind,
        on: Expr,
    },
    Project {
        input: Box<LogicalPlan>,
        items: Vec<(String, Expr)>,
    },
}

/// Join strategy selected at bind time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinStrategy {
    /// Hash table over the fully drained right input.
    Lookup,
    /// Lockstep cursors over inputs pre-sorted on the join key.
    SortMerge,
    /// Both inputs materialized into column batches, join delegated to
    /// the configured columnar backend.
    Columnar,
    /// Offset index over the right table's JSON-lines file.
    Mmap,
}

impl std::fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinStrategy::Lookup => write!(f, "lookup"),
            JoinStrategy::SortMerge => write!(f, "sort_merge"),
            JoinStrategy::Columnar => write!(f, "columnar"),
            JoinStrategy::Mmap => write!(f, "mmap"),
        }
    }
}

/// Expression with column references bound to ordinals.
///
/// Unlike `expr::Expr`, which names columns, `ResolvedExpr` indexes into
/// the producing operator's schema so the executor's hot loop never does
/// name lookups.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedExpr {
    Literal(Value),
    Column(ColumnId),
    Unary {
        op: UnaryOp,
        expr: Box<ResolvedExpr>,
    },
    Binary {
        left: Box<ResolvedExpr>,
        op: BinaryOp,
        right: Box<ResolvedExpr>,
    },
    InList {
        expr: Box<ResolvedExpr>,
        list: Vec<Value>,
        negated: bool,
    },
    IsNull {
        expr: Box<ResolvedExpr>,
        negated: bool,
    },
}

/// Physical plan node - executor-ready with ordinals and strategies.
#[derive(Clone, Debug, PartialEq)]
pub enum PhysicalPlan {
    Scan {
        table: String,
        /// Unqualified producer keys to keep, in schema order.
        columns: Vec<String>,
        /// Qualified output schema (`table.column` per kept column).
        schema: Vec<String>,
        predicate: Option<ResolvedExpr>,
    },
    Filter {
        input: Box<PhysicalPlan>,
        predicate: ResolvedExpr,
    },
    Project {
        input: Box<PhysicalPlan>,
        /// Output name (alias or canonical text) and value expression.
        items: Vec<(String, ResolvedExpr)>,
    },
    Join {
        strategy: JoinStrategy,
        kind: JoinKind,
        left: Box<PhysicalPlan>,
        right: Box<PhysicalPlan>,
        /// Equi-key ordinals into the left schema.
        left_keys: Vec<ColumnId>,
        /// Equi-key ordinals into the right schema, pairwise with `left_keys`.
        right_keys: Vec<ColumnId>,
        /// Non-equi ON residual, bound against the combined schema and
        /// evaluated after each key match.
        residual: Option<ResolvedExpr>,
        /// Combined schema: left columns then right columns.
        schema: Vec<String>,
    },
}

impl PhysicalPlan {
    /// Qualified output columns of this node.
    pub fn schema(&self) -> Vec<String> {
        match self {
            PhysicalPlan::Scan { schema, .. } | PhysicalPlan::Join { schema, .. } => {
                schema.clone()
            }
            PhysicalPlan::Filter { input, .. } => input.schema(),
            PhysicalPlan::Project { items, .. } => {
                items.iter().map(|(name, _)| name.clone()).collect()
            }
        }
    }

    fn fmt_indent(&self, f: &mut std::fmt::Formatter<'_>, indent: usize) -> std::fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            PhysicalPlan::Scan {
                table,
                columns,
                schema,
                predicate,
            } => {
                write!(f, "{pad}Scan {table} [{}]", columns.join(", "))?;
                if let Some(p) = predicate {
                    write!(f, " predicate: {}", render_expr(p, schema))?;
                }
                writeln!(f)
            }
            PhysicalPlan::Filter { input, predicate } => {
                writeln!(f, "{pad}Filter {}", render_expr(predicate, &input.schema()))?;
                input.fmt_indent(f, indent + 1)
            }
            PhysicalPlan::Project { input, items } => {
                let names: Vec<&str> = items.iter().map(|(name, _)| name.as_str()).collect();
                writeln!(f, "{pad}Project [{}]", names.join(", "))?;
                input.fmt_indent(f, indent + 1)
            }
            PhysicalPlan::Join {
                strategy,
                kind,
                left,
                right,
                left_keys,
                right_keys,
                ..
            } => {
                let left_schema = left.schema();
                let right_schema = right.schema();
                let keys: Vec<String> = left_keys
                    .iter()
                    .zip(right_keys)
                    .map(|(l, r)| format!("{} = {}", left_schema[*l], right_schema[*r]))
                    .collect();
                writeln!(f, "{pad}Join [{strategy}, {kind}, {}]", keys.join(" AND "))?;
                left.fmt_indent(f, indent + 1)?;
                right.fmt_indent(f, indent + 1)
            }
        }
    }
}

/// `EXPLAIN`-style rendering, one operator per line.
impl std::fmt::Display for PhysicalPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_indent(f, 0)
    }
}

/// Render a resolved expression using the given schema for column names.
pub fn render_expr(expr: &ResolvedExpr, schema: &[String]) -> String {
    match expr {
        ResolvedExpr::Literal(v) => v.to_string(),
        ResolvedExpr::Column(idx) => schema
            .get(*idx)
            .cloned()
            .unwrap_or_else(|| format!("#{idx}")),
        ResolvedExpr::Unary { op, expr } => match op {
            UnaryOp::Not => format!("NOT {}", render_expr(expr, schema)),
            UnaryOp::Neg => format!("-{}", render_expr(expr, schema)),
        },
        ResolvedExpr::Binary { left, op, right } => format!(
            "{} {} {}",
            render_expr(left, schema),
            op.symbol(),
            render_expr(right, schema)
        ),
        ResolvedExpr::InList {
            expr,
            list,
            negated,
        } => {
            let items: Vec<String> = list.iter().map(|v| v.to_string()).collect();
            format!(
                "{} {}IN ({})",
                render_expr(expr, schema),
                if *negated { "NOT " } else { "" },
                items.join(", ")
            )
        }
        ResolvedExpr::IsNull { expr, negated } => format!(
            "{} IS {}NULL",
            render_expr(expr, schema),
            if *negated { "NOT " } else { "" }
        ),
    }
}

/// Engine-level switches consulted during strategy selection.
#[derive(Clone, Copy, Debug)]
pub struct PlanOptions {
    /// Route every join through the columnar backend.
    pub use_columnar: bool,
    /// Permit the memory-mapped strategy for file-backed tables.
    pub use_mmap: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            use_columnar: false,
            use_mmap: true,
        }
    }
}

/// Main planner entry point. Borrows the registry for shape peeking and
/// join-strategy metadata.
pub struct Planner<'a> {
    registry: &'a SourceRegistry,
}

impl<'a> Planner<'a> {
    pub fn new(registry: &'a SourceRegistry) -> Self {
        Self { registry }
    }

    /// Plan a SELECT statement into an executable physical tree.
    pub fn plan(
        &self,
        stmt: SelectStatement,
        options: &PlanOptions,
    ) -> EngineResult<PhysicalPlan> {
        let tables = self.from_tables(&stmt)?;
        let shapes = self.peek_shapes(&tables)?;
        let stmt = qualify_statement(stmt, &tables, &shapes)?;
        let logical = lower(stmt, &tables)?;
        let logical = prune_columns(logical);
        let physical = self.bind(logical, options)?;
        log::debug!("planned:\n{physical}");
        Ok(physical)
    }

    /// FROM-order table list; every table must be registered and unique.
    fn from_tables(&self, stmt: &SelectStatement) -> EngineResult<Vec<String>> {
        let mut tables = Vec::with_capacity(1 + stmt.joins.len());
        tables.push(stmt.from.clone());
        for join in &stmt.joins {
            tables.push(join.table.clone());
        }
        for (i, table) in tables.iter().enumerate() {
            self.registry.get(table)?;
            if tables[..i].contains(table) {
                return Err(EngineError::Plan(format!(
                    "table '{table}' appears more than once in FROM"
                )));
            }
        }
        Ok(tables)
    }

    /// First-row shapes per table, with `ordered_by` sanity checking.
    fn peek_shapes(&self, tables: &[String]) -> EngineResult<HashMap<String, Vec<String>>> {
        let mut shapes = HashMap::new();
        for table in tables {
            let columns = self.registry.peek_columns(table)?;
            if let Some(key) = &self.registry.get(table)?.ordered_by
                && !columns.is_empty()
                && !columns.contains(key)
            {
                return Err(EngineError::Config(format!(
                    "table '{table}' declares ordered_by='{key}' but its rows have no such column"
                )));
            }
            shapes.insert(table.clone(), columns);
        }
        Ok(shapes)
    }

    /// Bind names to ordinals and select join strategies, bottom-up.
    fn bind(&self, plan: LogicalPlan, options: &PlanOptions) -> EngineResult<PhysicalPlan> {
        match plan {
            LogicalPlan::Scan {
                table,
                columns,
                predicate,
            } => {
                let schema: Vec<String> =
                    columns.iter().map(|c| format!("{table}.{c}")).collect();
                let predicate = predicate.map(|p| bind_expr(&schema, p)).transpose()?;
                Ok(PhysicalPlan::Scan {
                    table,
                    columns,
                    schema,
                    predicate,
                })
            }
            LogicalPlan::Filter { input, predicate } => {
                let input = self.bind(*input, options)?;
                let predicate = bind_expr(&input.schema(), predicate)?;
                Ok(PhysicalPlan::Filter {
                    input: Box::new(input),
                    predicate,
                })
            }
            LogicalPlan::Project { input, items } => {
                let input = self.bind(*input, options)?;
                let schema = input.schema();
                let items = items
                    .into_iter()
                    .map(|(name, e)| Ok((name, bind_expr(&schema, e)?)))
                    .collect::<EngineResult<Vec<_>>>()?;
                Ok(PhysicalPlan::Project {
                    input: Box::new(input),
                    items,
                })
            }
            LogicalPlan::Join {
                left,
                right,
                kind,
                on,
            } => {
                let left = self.bind(*left, options)?;
                let right = self.bind(*right, options)?;
                let left_schema = left.schema();
                let right_schema = right.schema();

                let mut left_keys = Vec::new();
                let mut right_keys = Vec::new();
                let mut residual_parts = Vec::new();
                for conjunct in on.conjuncts() {
                    match split_equi_pair(&conjunct, &left_schema, &right_schema) {
                        Some((l, r)) => {
                            left_keys.push(l);
                            right_keys.push(r);
                        }
                        None => residual_parts.push(conjunct),
                    }
                }
                if left_keys.is_empty() {
                    return Err(EngineError::Plan(
                        "join ON clause requires at least one equality between its inputs".into(),
                    ));
                }

                let mut schema = left_schema.clone();
                schema.extend(right_schema.iter().cloned());
                let residual = Expr::conjoin(residual_parts)
                    .map(|e| bind_expr(&schema, e))
                    .transpose()?;

                let strategy =
                    self.select_strategy(&left, &right, &left_keys, &right_keys, options)?;

                Ok(PhysicalPlan::Join {
                    strategy,
                    kind,
                    left: Box::new(left),
                    right: Box::new(right),
                    left_keys,
                    right_keys,
                    residual,
                    schema,
                })
            }
        }
    }

    /// Pick the join strategy for one join node.
    ///
    /// Precedence: columnar override, then sort-merge when both sides are
    /// scans declared ordered on their join key, then mmap when both
    /// sides are file-backed scans and the engine permits it, then lookup.
    fn select_strategy(
        &self,
        left: &PhysicalPlan,
        right: &PhysicalPlan,
        left_keys: &[ColumnId],
        right_keys: &[ColumnId],
        options: &PlanOptions,
    ) -> EngineResult<JoinStrategy> {
        if options.use_columnar {
            return Ok(JoinStrategy::Columnar);
        }

        let (
            PhysicalPlan::Scan {
                table: left_table,
                schema: left_schema,
                ..
            },
            PhysicalPlan::Scan {
                table: right_table,
                schema: right_schema,
                ..
            },
        ) = (left, right)
        else {
            return Ok(JoinStrategy::Lookup);
        };

        let left_source = self.registry.get(left_table)?;
        let right_source = self.registry.get(right_table)?;

        if let [lk] = left_keys
            && let [rk] = right_keys
        {
            let left_key = unqualify(&left_schema[*lk], left_table);
            let right_key = unqualify(&right_schema[*rk], right_table);
            if left_source.ordered_by.as_deref() == Some(left_key)
                && right_source.ordered_by.as_deref() == Some(right_key)
            {
                return Ok(JoinStrategy::SortMerge);
            }
        }

        if options.use_mmap
            && left_source.filename.is_some()
            && right_source.filename.is_some()
        {
            return Ok(JoinStrategy::Mmap);
        }

        Ok(JoinStrategy::Lookup)
    }
}

fn unqualify<'e>(qualified: &'e str, table: &str) -> &'e str {
    qualified
        .strip_prefix(table)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(qualified)
}

/// Rewrite every bare column in the statement to `table.column` form.
fn qualify_statement(
    stmt: SelectStatement,
    tables: &[String],
    shapes: &HashMap<String, Vec<String>>,
) -> EngineResult<SelectStatement> {
    let mut resolve = |table: Option<String>, name: String| -> EngineResult<Expr> {
        match table {
            Some(t) => {
                if !tables.contains(&t) {
                    return Err(EngineError::Plan(format!(
                        "unknown table '{t}' in column reference '{t}.{name}'"
                    )));
                }
                Ok(Expr::Column {
                    table: Some(t),
                    name,
                })
            }
            None => {
                let owners: Vec<&String> = tables
                    .iter()
                    .filter(|t| shapes.get(*t).is_some_and(|cols| cols.contains(&name)))
                    .collect();
                match owners.as_slice() {
                    [] => Err(EngineError::Plan(format!("unresolved column '{name}'"))),
                    [owner] => Ok(Expr::Column {
                        table: Some((*owner).clone()),
                        name,
                    }),
                    _ => Err(EngineError::Plan(format!(
                        "ambiguous column '{name}' (exists in multiple tables)"
                    ))),
                }
            }
        }
    };

    let items = stmt
        .items
        .into_iter()
        .map(|item| {
            // Canonical text names come from the pre-qualification form,
            // so `SELECT name FROM products` yields a `name` key.
            let output_name = item.output_name();
            let expr = item.expr.map_columns(&mut resolve)?;
            Ok(parser::SelectItem {
                expr,
                alias: Some(output_name),
            })
        })
        .collect::<EngineResult<Vec<_>>>()?;

    let joins = stmt
        .joins
        .into_iter()
        .map(|join| {
            let parser::JoinClause { table, kind, on } = join;
            Ok(parser::JoinClause {
                table,
                kind,
                on: on.map_columns(&mut resolve)?,
            })
        })
        .collect::<EngineResult<Vec<_>>>()?;

    let selection = stmt
        .selection
        .map(|e| e.map_columns(&mut resolve))
        .transpose()?;

    Ok(SelectStatement {
        items,
        from: stmt.from,
        joins,
        selection,
    })
}

/// Build the left-deep logical tree, sinking WHERE conjuncts while
/// lowering.
///
/// A conjunct referencing a single table is pushed into that table's scan
/// unless the table sits on the nullable side of a LEFT join (pushing it
/// below would turn non-matches into dropped rows instead of null-padded
/// ones); it then stays as a filter just above that join. A conjunct
/// spanning several tables becomes a filter above the lowest join whose
/// output covers them all.
fn lower(stmt: SelectStatement, tables: &[String]) -> EngineResult<LogicalPlan> {
    let mut scan_predicates: Vec<Vec<Expr>> = vec![Vec::new(); tables.len()];
    let mut join_filters: Vec<Vec<Expr>> = vec![Vec::new(); stmt.joins.len()];

    if let Some(selection) = stmt.selection {
        for conjunct in selection.conjuncts() {
            let referenced = conjunct.referenced_tables();
            let positions: Vec<usize> = referenced
                .iter()
                .map(|t| {
                    tables
                        .iter()
                        .position(|table| table == t)
                        .expect("qualified to a FROM table")
                })
                .collect();

            match positions.as_slice() {
                // Constant conjunct: evaluate at the base scan.
                [] => scan_predicates[0].push(conjunct),
                [p] => {
                    let nullable_side =
                        *p >= 1 && stmt.joins[*p - 1].kind == JoinKind::Left;
                    if nullable_side {
                        join_filters[*p - 1].push(conjunct);
                    } else {
                        scan_predicates[*p].push(conjunct);
                    }
                }
                many => {
                    let deepest = many.iter().copied().max().expect("non-empty");
                    join_filters[deepest - 1].push(conjunct);
                }
            }
        }
    }

    let mut scan_predicates: Vec<Option<Expr>> =
        scan_predicates.into_iter().map(Expr::conjoin).collect();
    let mut plan = LogicalPlan::Scan {
        table: stmt.from.clone(),
        columns: Vec::new(),
        predicate: scan_predicates[0].take(),
    };
    for (idx, (join, filters)) in stmt.joins.into_iter().zip(join_filters).enumerate() {
        let right = LogicalPlan::Scan {
            table: join.table.clone(),
            columns: Vec::new(),
            predicate: scan_predicates[idx + 1].take(),
        };
        plan = LogicalPlan::Join {
            left: Box::new(plan),
            right: Box::new(right),
            kind: join.kind,
            on: join.on,
        };
        if let Some(predicate) = Expr::conjoin(filters) {
            plan = LogicalPlan::Filter {
                input: Box::new(plan),
                predicate,
            };
        }
    }

    let items = stmt
        .items
        .into_iter()
        .map(|item| {
            let name = item.alias.clone().unwrap_or_else(|| item.expr.to_string());
            (name, item.expr)
        })
        .collect();

    Ok(LogicalPlan::Project {
        input: Box::new(plan),
        items,
    })
}

/// Demand-driven column pruning: each scan keeps only the columns that
/// some ancestor expression (projection, filter, pushed predicate, or
/// join key) actually references.
fn prune_columns(plan: LogicalPlan) -> LogicalPlan {
    let mut demanded: Vec<(String, String)> = Vec::new();
    collect_demands(&plan, &mut demanded);
    assign_scan_columns(plan, &demanded)
}

fn collect_demands(plan: &LogicalPlan, out: &mut Vec<(String, String)>) {
    let mut note = |expr: &Expr| {
        expr.visit_columns(&mut |table, name| {
            if let Some(t) = table {
                let pair = (t.to_string(), name.to_string());
                if !out.contains(&pair) {
                    out.push(pair);
                }
            }
        });
    };

    match plan {
        LogicalPlan::Scan { predicate, .. } => {
            if let Some(p) = predicate {
                note(p);
            }
        }
        LogicalPlan::Filter { input, predicate } => {
            note(predicate);
            collect_demands(input, out);
        }
        LogicalPlan::Join { left, right, on, .. } => {
            note(on);
            collect_demands(left, out);
            collect_demands(right, out);
        }
        LogicalPlan::Project { input, items } => {
            for (_, expr) in items {
                note(expr);
            }
            collect_demands(input, out);
        }
    }
}

fn assign_scan_columns(plan: LogicalPlan, demanded: &[(String, String)]) -> LogicalPlan {
    match plan {
        LogicalPlan::Scan {
            table, predicate, ..
        } => {
            let columns = demanded
                .iter()
                .filter(|(t, _)| *t == table)
                .map(|(_, c)| c.clone())
                .collect();
            LogicalPlan::Scan {
                table,
                columns,
                predicate,
            }
        }
        LogicalPlan::Filter { input, predicate } => LogicalPlan::Filter {
            input: Box::new(assign_scan_columns(*input, demanded)),
            predicate,
        },
        LogicalPlan::Join {
            left,
            right,
            kind,
            on,
        } => LogicalPlan::Join {
            left: Box::new(assign_scan_columns(*left, demanded)),
            right: Box::new(assign_scan_columns(*right, demanded)),
            kind,
            on,
        },
        LogicalPlan::Project { input, items } => LogicalPlan::Project {
            input: Box::new(assign_scan_columns(*input, demanded)),
            items,
        },
    }
}

/// Detect `left.col = right.col` (either orientation) between the two
/// sides of a join; anything else stays in the residual.
fn split_equi_pair(
    conjunct: &Expr,
    left_schema: &[String],
    right_schema: &[String],
) -> Option<(ColumnId, ColumnId)> {
    let Expr::Binary {
        left,
        op: BinaryOp::Eq,
        right,
    } = conjunct
    else {
        return None;
    };

    let a = qualified_name(left)?;
    let b = qualified_name(right)?;

    let position = |schema: &[String], name: &str| schema.iter().position(|c| c == name);

    if let (Some(l), Some(r)) = (position(left_schema, &a), position(right_schema, &b)) {
        return Some((l, r));
    }
    if let (Some(l), Some(r)) = (position(left_schema, &b), position(right_schema, &a)) {
        return Some((l, r));
    }
    None
}

fn qualified_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Column {
            table: Some(t),
            name,
        } => Some(format!("{t}.{name}")),
        _ => None,
    }
}

/// Bind an expression against an operator's qualified output schema.
fn bind_expr(schema: &[String], e: Expr) -> EngineResult<ResolvedExpr> {
    match e {
        Expr::Literal(v) => Ok(ResolvedExpr::Literal(v)),
        Expr::Column { table, name } => {
            let qualified = match &table {
                Some(t) => format!("{t}.{name}"),
                None => {
                    return Err(EngineError::Plan(format!(
                        "internal: unqualified column '{name}' survived planning"
                    )))
                }
            };
            schema
                .iter()
                .position(|c| c == &qualified)
                .map(ResolvedExpr::Column)
                .ok_or_else(|| {
                    EngineError::Plan(format!(
                        "column '{qualified}' is not available at this point in the plan"
                    ))
                })
        }
        Expr::Unary { op, expr } => Ok(ResolvedExpr::Unary {
            op,
            expr: Box::new(bind_expr(schema, *expr)?),
        }),
        Expr::Binary { left, op, right } => Ok(ResolvedExpr::Binary {
            left: Box::new(bind_expr(schema, *left)?),
            op,
            right: Box::new(bind_expr(schema, *right)?),
        }),
        Expr::InList {
            expr,
            list,
            negated,
        } => {
            let list = list
                .into_iter()
                .map(|item| match item {
                    Expr::Literal(v) => Ok(v),
                    other => Err(EngineError::Plan(format!(
                        "IN list members must be literals, got: {other}"
                    ))),
                })
                .collect::<EngineResult<Vec<_>>>()?;
            Ok(ResolvedExpr::InList {
                expr: Box::new(bind_expr(schema, *expr)?),
                list,
                negated,
            })
        }
        Expr::IsNull { expr, negated } => Ok(ResolvedExpr::IsNull {
            expr: Box::new(bind_expr(schema, *expr)?),
            negated,
        }),
    }
}
