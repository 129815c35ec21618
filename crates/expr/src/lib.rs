
use std::fmt;
use types::Value;

/// Binary arithmetic, comparison, and logical operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt
            | BinaryOp::Ge => 3,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Mul | BinaryOp::Div => 5,
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Expression abstract syntax tree.
///
/// Column references may be bare (`Column { table: None, name: "id" }`)
/// as written in SQL, or qualified (`table: Some("users")`). The planner
/// qualifies every bare reference before lowering, so plans only ever
/// carry qualified columns.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expr {
    Literal(Value),
    Column {
        table: Option<String>,
        name: String,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// `expr [NOT] IN (lit, ...)` — members are restricted to literals.
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    /// `expr IS [NOT] NULL`
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
}

impl Expr {
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Expr {
        Expr::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn bare(name: impl Into<String>) -> Expr {
        Expr::Column {
            table: None,
            name: name.into(),
        }
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Split a top-level AND tree into its conjuncts.
    pub fn conjuncts(self) -> Vec<Expr> {
        match self {
            Expr::Binary {
                left,
                op: BinaryOp::And,
                right,
            } => {
                let mut out = left.conjuncts();
                out.extend(right.conjuncts());
                out
            }
            other => vec![other],
        }
    }

    /// Rebuild an AND tree from conjuncts; `None` when the list is empty.
    pub fn conjoin(parts: Vec<Expr>) -> Option<Expr> {
        parts
            .into_iter()
            .reduce(|acc, e| Expr::binary(acc, BinaryOp::And, e))
    }

    /// Visit every column reference in evaluation order.
    pub fn visit_columns<'a>(&'a self, f: &mut impl FnMut(Option<&'a str>, &'a str)) {
        match self {
            Expr::Literal(_) => {}
            Expr::Column { table, name } => f(table.as_deref(), name),
            Expr::Unary { expr, .. } => expr.visit_columns(f),
            Expr::Binary { left, right, .. } => {
                left.visit_columns(f);
                right.visit_columns(f);
            }
            Expr::InList { expr, list, .. } => {
                expr.visit_columns(f);
                for item in list {
                    item.visit_columns(f);
                }
            }
            Expr::IsNull { expr, .. } => expr.visit_columns(f),
        }
    }

    /// Rewrite every column reference through `f` (used by the planner to
    /// bind bare columns to their owning table).
    pub fn map_columns<E>(
        self,
        f: &mut impl FnMut(Option<String>, String) -> Result<Expr, E>,
    ) -> Result<Expr, E> {
        Ok(match self {
            Expr::Literal(v) => Expr::Literal(v),
            Expr::Column { table, name } => f(table, name)?,
            Expr::Unary { op, expr } => Expr::Unary {
                op,
                expr: Box::new(expr.map_columns(f)?),
            },
            Expr::Binary { left, op, right } => Expr::Binary {
                left: Box::new(left.map_columns(f)?),
                op,
                right: Box::new(right.map_columns(f)?),
            },
            Expr::InList {
                expr,
                list,
                negated,
            } => Expr::InList {
                expr: Box::new(expr.map_columns(f)?),
                list: list
                    .into_iter()
                    .map(|e| e.map_columns(f))
                    .collect::<Result<_, E>>()?,
                negated,
            },
            Expr::IsNull { expr, negated } => Expr::IsNull {
                expr: Box::new(expr.map_columns(f)?),
                negated,
            },
        })
    }

    /// Distinct tables referenced by qualified columns, in first-use order.
    pub fn referenced_tables(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        self.visit_columns(&mut |table, _| {
            if let Some(t) = table
                && !out.iter().any(|seen| seen == t)
            {
                out.push(t.to_string());
            }
        });
        out
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Column { table, name } => match table {
                Some(t) => write!(f, "{t}.{name}"),
                None => write!(f, "{name}"),
            },
            Expr::Unary { op, expr } => {
                match op {
                    UnaryOp::Not => write!(f, "NOT ")?,
                    UnaryOp::Neg => write!(f, "-")?,
                }
                expr.fmt_prec(f, 6)
            }
            Expr::Binary { left, op, right } => {
                let prec = op.precedence();
                let parens = prec < parent;
                if parens {
                    write!(f, "(")?;
                }
                left.fmt_prec(f, prec)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_prec(f, prec + 1)?;
                if parens {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                expr.fmt_prec(f, 6)?;
                write!(f, " {}IN (", if *negated { "NOT " } else { "" })?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_prec(f, 0)?;
                }
                write!(f, ")")
            }
            Expr::IsNull { expr, negated } => {
                expr.fmt_prec(f, 6)?;
                write!(f, " IS {}NULL", if *negated { "NOT " } else { "" })
            }
        }
    }
}

/// Canonical text rendering, used as the output column name for select
/// items without an alias.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}
