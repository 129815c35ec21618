//! Join operators: four strategies behind one pull contract.
//!
//! All four take a left and right input, pairwise equi-key ordinals, a
//! join kind (inner or left), and an optional non-equi residual evaluated
//! after each key match. Output rows are the left values followed by the
//! right values; a LEFT join emits unmatched left rows once with the
//! right side null-padded. Lookup, sort-merge, and mmap preserve left
//! input order; columnar makes no ordering guarantee.

pub mod columnar;
mod lookup;
mod merge;
mod mmap;

pub use columnar::ColumnarJoinExec;
pub use lookup::LookupJoinExec;
pub use merge::MergeJoinExec;
pub use mmap::MmapJoinExec;

use crate::filter::eval_resolved_expr;
use common::{ColumnId, EngineResult, Row};
use planner::ResolvedExpr;
use types::Value;

/// Hashable canonical form of an equi-join key.
///
/// Promoted equality must agree with hashing, so integral floats fold
/// into the Int atom (`Int(1)` and `Float(1.0)` probe the same bucket).
/// Null and NaN components produce no key at all - rows carrying them
/// can never match.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct JoinKey(Vec<KeyAtom>);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum KeyAtom {
    Int(i64),
    Float(u64),
    Text(String),
    Bool(bool),
}

fn key_atom(value: &Value) -> Option<KeyAtom> {
    match value {
        Value::Int(i) => Some(KeyAtom::Int(*i)),
        Value::Float(f) if f.is_nan() => None,
        Value::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                Some(KeyAtom::Int(*f as i64))
            } else {
                Some(KeyAtom::Float(f.to_bits()))
            }
        }
        Value::Text(s) => Some(KeyAtom::Text(s.clone())),
        Value::Bool(b) => Some(KeyAtom::Bool(*b)),
        Value::Null => None,
    }
}

/// Key atoms from arbitrary values; `None` when any component is unkeyable.
pub(crate) fn key_from<'v>(values: impl Iterator<Item = &'v Value>) -> Option<JoinKey> {
    values
        .map(key_atom)
        .collect::<Option<Vec<_>>>()
        .map(JoinKey)
}

/// Key of a row under the given key ordinals.
pub(crate) fn join_key(row: &Row, keys: &[ColumnId]) -> Option<JoinKey> {
    key_from(keys.iter().map(|idx| &row.values[*idx]))
}

/// Merged output row: left values then right values.
pub(crate) fn concat_rows(left: &Row, right: &Row) -> Row {
    let mut values = left.values.clone();
    values.extend(right.values.iter().cloned());
    Row::new(values)
}

/// Left row padded with nulls for the right side (LEFT join non-match).
pub(crate) fn null_padded(left: &Row, right_width: usize) -> Row {
    let mut values = left.values.clone();
    values.extend(std::iter::repeat(Value::Null).take(right_width));
    Row::new(values)
}

/// Residual gate over a combined row: a match survives only on `true`.
pub(crate) fn residual_passes(
    residual: &Option<ResolvedExpr>,
    combined: &Row,
) -> EngineResult<bool> {
    match residual {
        None => Ok(true),
        Some(expr) => Ok(matches!(
            eval_resolved_expr(expr, combined)?,
            Value::Bool(true)
        )),
    }
}
