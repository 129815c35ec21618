mod ast;

pub use ast::*;

use common::{EngineError, EngineResult};
use expr::{BinaryOp, Expr, UnaryOp};
use sqlparser::ast as sqlast;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser as SqlParser;
use types::Value;

/// Parse SQL text into the internal SELECT representation.
///
/// Exactly one statement is accepted, and it must be a SELECT over a base
/// table with optional INNER/LEFT joins and a WHERE clause. Anything else
/// is rejected up front so planning never sees unsupported shapes.
pub fn parse_select(sql: &str) -> EngineResult<SelectStatement> {
    let dialect = GenericDialect {};
    let mut stmts = SqlParser::parse_sql(&dialect, sql)
        .map_err(|e| EngineError::Parse(format!("SQL parse error: {e}")))?;

    if stmts.len() != 1 {
        return Err(EngineError::Parse(format!(
            "expected a single statement, got {}",
            stmts.len()
        )));
    }

    match stmts.remove(0) {
        sqlast::Statement::Query(query) => map_query(*query),
        other => Err(EngineError::Parse(format!(
            "only SELECT is supported, got: {}",
            statement_kind(&other)
        ))),
    }
}

fn statement_kind(stmt: &sqlast::Statement) -> &'static str {
    use sqlast::Statement::*;
    match stmt {
        Insert { .. } => "INSERT",
        Update { .. } => "UPDATE",
        Delete { .. } => "DELETE",
        CreateTable { .. } => "CREATE TABLE",
        Drop { .. } => "DROP",
        _ => "non-SELECT statement",
    }
}

fn map_query(query: sqlast::Query) -> EngineResult<SelectStatement> {
    if query.with.is_some() {
        return Err(EngineError::Parse("WITH (CTEs) not supported".into()));
    }
    if !query.order_by.is_empty() {
        return Err(EngineError::Parse("ORDER BY not supported".into()));
    }
    if query.limit.is_some() || query.offset.is_some() || query.fetch.is_some() {
        return Err(EngineError::Parse("LIMIT/OFFSET not supported".into()));
    }

    let select = match *query.body {
        sqlast::SetExpr::Select(select) => select,
        sqlast::SetExpr::Values(_) => {
            return Err(EngineError::Parse("standalone VALUES not supported".into()))
        }
        _ => return Err(EngineError::Parse("set operations not supported".into())),
    };

    if select.distinct.is_some() {
        return Err(EngineError::Parse("SELECT DISTINCT not supported".into()));
    }
    if select.having.is_some() {
        return Err(EngineError::Parse("HAVING not supported".into()));
    }
    if let sqlast::GroupByExpr::Expressions(exprs) = &select.group_by {
        if !exprs.is_empty() {
            return Err(EngineError::Parse("GROUP BY not supported".into()));
        }
    }

    let sqlast::Select {
        projection,
        from,
        selection,
        ..
    } = *select;

    if from.is_empty() {
        return Err(EngineError::Parse("SELECT requires a FROM clause".into()));
    }
    if from.len() > 1 {
        return Err(EngineError::Parse(
            "comma-separated FROM lists not supported; use explicit JOIN".into(),
        ));
    }

    let sqlast::TableWithJoins { relation, joins } = from.into_iter().next().expect("non-empty");
    let base = table_name(&relation)?;

    let joins = joins
        .into_iter()
        .map(map_join)
        .collect::<EngineResult<Vec<_>>>()?;

    let items = projection
        .into_iter()
        .map(map_select_item)
        .collect::<EngineResult<Vec<_>>>()?;
    if items.is_empty() {
        return Err(EngineError::Parse("empty select list".into()));
    }

    let selection = selection.map(map_expr).transpose()?;

    Ok(SelectStatement {
        items,
        from: base,
        joins,
        selection,
    })
}

fn map_join(join: sqlast::Join) -> EngineResult<JoinClause> {
    let table = table_name(&join.relation)?;

    let (kind, constraint) = match join.join_operator {
        sqlast::JoinOperator::Inner(c) => (JoinKind::Inner, c),
        sqlast::JoinOperator::LeftOuter(c) => (JoinKind::Left, c),
        other => {
            return Err(EngineError::Parse(format!(
                "unsupported join type: {other:?}"
            )))
        }
    };

    let on = match constraint {
        sqlast::JoinConstraint::On(expr) => map_expr(expr)?,
        sqlast::JoinConstraint::Using(_) => {
            return Err(EngineError::Parse("JOIN USING not supported".into()))
        }
        sqlast::JoinConstraint::Natural => {
            return Err(EngineError::Parse("NATURAL JOIN not supported".into()))
        }
        sqlast::JoinConstraint::None => {
            return Err(EngineError::Parse("JOIN requires an ON clause".into()))
        }
    };

    Ok(JoinClause { table, kind, on })
}

fn table_name(factor: &sqlast::TableFactor) -> EngineResult<String> {
    match factor {
        sqlast::TableFactor::Table { name, alias, .. } => {
            if alias.is_some() {
                return Err(EngineError::Parse("table aliases not supported".into()));
            }
            name.0
                .first()
                .map(|ident| ident.value.clone())
                .ok_or_else(|| EngineError::Parse("invalid table name".into()))
        }
        _ => Err(EngineError::Parse(
            "FROM supports plain table names only".into(),
        )),
    }
}

fn map_select_item(item: sqlast::SelectItem) -> EngineResult<SelectItem> {
    match item {
        sqlast::SelectItem::UnnamedExpr(expr) => Ok(SelectItem {
            expr: map_expr(expr)?,
            alias: None,
        }),
        sqlast::SelectItem::ExprWithAlias { expr, alias } => Ok(SelectItem {
            expr: map_expr(expr)?,
            alias: Some(alias.value),
        }),
        sqlast::SelectItem::Wildcard(_) | sqlast::SelectItem::QualifiedWildcard(_, _) => Err(
            EngineError::Parse("wildcard projections not supported".into()),
        ),
    }
}

fn map_expr(expr: sqlast::Expr) -> EngineResult<Expr> {
    use sqlast::Expr as SqlExpr;

    match expr {
        SqlExpr::Identifier(ident) => Ok(Expr::Column {
            table: None,
            name: ident.value,
        }),
        SqlExpr::CompoundIdentifier(idents) => {
            if idents.len() != 2 {
                return Err(EngineError::Parse(format!(
                    "expected table.column, got {} identifier parts",
                    idents.len()
                )));
            }
            let mut parts = idents.into_iter();
            let table = parts.next().expect("len checked").value;
            let name = parts.next().expect("len checked").value;
            Ok(Expr::Column {
                table: Some(table),
                name,
            })
        }
        SqlExpr::Value(value) => Ok(Expr::Literal(map_value(value)?)),
        SqlExpr::BinaryOp { left, op, right } => Ok(Expr::Binary {
            left: Box::new(map_expr(*left)?),
            op: map_binary_op(op)?,
            right: Box::new(map_expr(*right)?),
        }),
        SqlExpr::UnaryOp { op, expr } => {
            let op = match op {
                sqlast::UnaryOperator::Not => UnaryOp::Not,
                sqlast::UnaryOperator::Minus => UnaryOp::Neg,
                sqlast::UnaryOperator::Plus => return map_expr(*expr),
                other => {
                    return Err(EngineError::Parse(format!(
                        "unsupported unary operator: {other:?}"
                    )))
                }
            };
            Ok(Expr::Unary {
                op,
                expr: Box::new(map_expr(*expr)?),
            })
        }
        SqlExpr::Nested(expr) => map_expr(*expr),
        SqlExpr::InList {
            expr,
            list,
            negated,
        } => {
            let list = list
                .into_iter()
                .map(|e| match map_expr(e)? {
                    lit @ Expr::Literal(_) => Ok(lit),
                    other => Err(EngineError::Parse(format!(
                        "IN list members must be literals, got: {other}"
                    ))),
                })
                .collect::<EngineResult<Vec<_>>>()?;
            Ok(Expr::InList {
                expr: Box::new(map_expr(*expr)?),
                list,
                negated,
            })
        }
        SqlExpr::IsNull(expr) => Ok(Expr::IsNull {
            expr: Box::new(map_expr(*expr)?),
            negated: false,
        }),
        SqlExpr::IsNotNull(expr) => Ok(Expr::IsNull {
            expr: Box::new(map_expr(*expr)?),
            negated: true,
        }),
        other => Err(EngineError::Parse(format!(
            "unsupported expression: {other}"
        ))),
    }
}

fn map_value(value: sqlast::Value) -> EngineResult<Value> {
    use sqlast::Value as SqlValue;

    match value {
        SqlValue::Number(num, _) => {
            if let Ok(i) = num.parse::<i64>() {
                return Ok(Value::Int(i));
            }
            num.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| EngineError::Parse(format!("invalid numeric literal: {num}")))
        }
        SqlValue::SingleQuotedString(s) => Ok(Value::Text(s)),
        SqlValue::Boolean(b) => Ok(Value::Bool(b)),
        SqlValue::Null => Ok(Value::Null),
        other => Err(EngineError::Parse(format!("unsupported literal: {other}"))),
    }
}

fn map_binary_op(op: sqlast::BinaryOperator) -> EngineResult<BinaryOp> {
    use sqlast::BinaryOperator as SqlBinary;

    Ok(match op {
        SqlBinary::Plus => BinaryOp::Add,
        SqlBinary::Minus => BinaryOp::Sub,
        SqlBinary::Multiply => BinaryOp::Mul,
        SqlBinary::Divide => BinaryOp::Div,
        SqlBinary::Eq => BinaryOp::Eq,
        SqlBinary::NotEq => BinaryOp::Ne,
        SqlBinary::Lt => BinaryOp::Lt,
        SqlBinary::LtEq => BinaryOp::Le,
        SqlBinary::Gt => BinaryOp::Gt,
        SqlBinary::GtEq => BinaryOp::Ge,
        SqlBinary::And => BinaryOp::And,
        SqlBinary::Or => BinaryOp::Or,
        other => {
            return Err(EngineError::Parse(format!(
                "unsupported operator: {other:?}"
            )))
        }
    })
}
