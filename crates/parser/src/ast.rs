use expr::Expr;

/// The single statement kind the engine accepts.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectStatement {
    pub items: Vec<SelectItem>,
    /// Base table of the FROM clause.
    pub from: String,
    /// JOIN clauses in source order.
    pub joins: Vec<JoinClause>,
    /// WHERE predicate.
    pub selection: Option<Expr>,
}

/// One select-list entry: an expression with an optional `AS` alias.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    /// Output column name: the alias, or the expression's canonical text.
    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expr.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JoinClause {
    pub table: String,
    pub kind: JoinKind,
    pub on: Expr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "inner"),
            JoinKind::Left => write!(f, "left"),
        }
    }
}
