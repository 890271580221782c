//! Filter text for keyed table stores.
//!
//! Renders predicates in the OData-style syntax accepted by partition/row
//! keyed table services: `City eq 'Berlin'`, `(a) and (b)`.

use relmodel_core::Value;

use crate::expression::ComparisonOp;
use crate::translator::{PredicateExpr, QueryableConstant};

/// Renders [`PredicateExpr`] trees as table filter strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableFilterGenerator;

impl TableFilterGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, predicate: &PredicateExpr) -> String {
        let mut out = String::new();
        self.write_predicate(&mut out, predicate);
        out
    }

    fn write_predicate(&self, out: &mut String, predicate: &PredicateExpr) {
        match predicate {
            PredicateExpr::Comparison {
                op,
                property,
                constant,
            } => {
                out.push_str(property.column_name());
                out.push(' ');
                out.push_str(Self::operator(*op));
                out.push(' ');
                Self::write_constant(out, constant);
            }
            PredicateExpr::And(left, right) => self.write_combined(out, left, "and", right),
            PredicateExpr::Or(left, right) => self.write_combined(out, left, "or", right),
        }
    }

    fn write_combined(
        &self,
        out: &mut String,
        left: &PredicateExpr,
        operator: &str,
        right: &PredicateExpr,
    ) {
        out.push('(');
        self.write_predicate(out, left);
        out.push_str(") ");
        out.push_str(operator);
        out.push_str(" (");
        self.write_predicate(out, right);
        out.push(')');
    }

    const fn operator(op: ComparisonOp) -> &'static str {
        match op {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Ne => "ne",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Le => "le",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Ge => "ge",
        }
    }

    fn write_constant(out: &mut String, constant: &QueryableConstant) {
        let value = constant.value();
        if constant.is_string_property() {
            Self::write_quoted(out, &value.to_string());
            return;
        }
        match value {
            Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            Value::TinyInt(v) => out.push_str(&v.to_string()),
            Value::SmallInt(v) => out.push_str(&v.to_string()),
            Value::Int(v) => out.push_str(&v.to_string()),
            Value::BigInt(v) => out.push_str(&format!("{v}L")),
            Value::Float(v) => out.push_str(&format!("{v:?}")),
            Value::Double(v) => out.push_str(&format!("{v:?}")),
            Value::Uuid(_) => {
                out.push_str("guid");
                Self::write_quoted(out, &value.to_string());
            }
            Value::Bytes(bytes) => {
                out.push_str("X'");
                for b in bytes {
                    out.push_str(&format!("{b:02x}"));
                }
                out.push('\'');
            }
            other => Self::write_quoted(out, &other.to_string()),
        }
    }

    fn write_quoted(out: &mut String, text: &str) {
        out.push('\'');
        out.push_str(&text.replace('\'', "''"));
        out.push('\'');
    }
}
