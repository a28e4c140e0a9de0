//! The minimal consumed surface of "expression evaluation used by scans":
//! not a general expression AST, just enough to filter a sequential scan.

use std::cmp::Ordering;

use common::DbResult;

use crate::record::Record;
use crate::schema::Schema;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A predicate evaluated against one decoded [`Record`].
#[derive(Clone, Debug)]
pub enum Predicate {
    /// Matches every record; used for an unfiltered scan.
    True,
    Compare {
        attr_idx: usize,
        op: CompareOp,
        value: Value,
    },
}

impl Predicate {
    pub fn eval(&self, record: &Record, schema: &Schema) -> DbResult<bool> {
        match self {
            Predicate::True => Ok(true),
            Predicate::Compare {
                attr_idx,
                op,
                value,
            } => {
                let actual = record.get_attr(schema, *attr_idx)?;
                Ok(compare(&actual, *op, value))
            }
        }
    }
}

fn compare(a: &Value, op: CompareOp, b: &Value) -> bool {
    let ordering = match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => x.partial_cmp(y),
        _ => None,
    };
    match op {
        CompareOp::Eq => a == b,
        CompareOp::Ne => a != b,
        CompareOp::Lt => ordering == Some(Ordering::Less),
        CompareOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => ordering == Some(Ordering::Greater),
        CompareOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
    }
}
