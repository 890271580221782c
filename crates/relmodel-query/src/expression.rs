//! The query expression tree.
//!
//! Parsed queries arrive as a closed set of node kinds; translation walks
//! them with exhaustive matches.

use std::fmt;

use relmodel_core::Value;

use crate::query_model::{QueryModel, QuerySourceId};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
}

impl ComparisonOp {
    /// Get the SQL representation of this operator.
    pub const fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }

    /// The operator that gives the same result with operands swapped.
    pub const fn mirror(self) -> Self {
        match self {
            ComparisonOp::Lt => ComparisonOp::Gt,
            ComparisonOp::Le => ComparisonOp::Ge,
            ComparisonOp::Gt => ComparisonOp::Lt,
            ComparisonOp::Ge => ComparisonOp::Le,
            other => other,
        }
    }

    pub const fn is_equality(self) -> bool {
        matches!(self, ComparisonOp::Eq | ComparisonOp::Ne)
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a constant node.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// A single literal.
    Scalar(Value),
    /// A tuple of sub-expressions, e.g. one side of a composite key
    /// comparison.
    Composite(Vec<Expression>),
}

/// A node of a query expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Direct reference to a query source (`c` in `from c in Customers`).
    QuerySourceRef(QuerySourceId),

    /// Member access on `target`.
    Member {
        target: Box<Expression>,
        name: String,
    },

    /// Literal value or tuple.
    Constant(ConstantValue),

    /// Binary comparison.
    Comparison {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Short-circuit logical AND
    And(Box<Expression>, Box<Expression>),

    /// Short-circuit logical OR
    Or(Box<Expression>, Box<Expression>),

    /// Logical NOT
    Not(Box<Expression>),

    /// Nested query.
    SubQuery(Box<QueryModel>),

    /// Method call.
    Call {
        method: String,
        arguments: Vec<Expression>,
    },
}

impl Expression {
    // ==================== Constructors ====================

    /// Reference a query source.
    pub fn source(id: QuerySourceId) -> Self {
        Expression::QuerySourceRef(id)
    }

    /// `source.name` for the given query source.
    pub fn property(id: QuerySourceId, name: impl Into<String>) -> Self {
        Expression::source(id).member(name)
    }

    /// Member access on this expression.
    pub fn member(self, name: impl Into<String>) -> Self {
        Expression::Member {
            target: Box::new(self),
            name: name.into(),
        }
    }

    /// Create a literal value expression.
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant(ConstantValue::Scalar(value.into()))
    }

    /// Create a NULL literal.
    pub fn null() -> Self {
        Expression::constant(Value::Null)
    }

    /// Create a tuple of sub-expressions.
    pub fn composite(parts: Vec<Expression>) -> Self {
        Expression::Constant(ConstantValue::Composite(parts))
    }

    /// Create a method call.
    pub fn call(method: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::Call {
            method: method.into(),
            arguments,
        }
    }

    /// Create a nested query.
    pub fn subquery(model: QueryModel) -> Self {
        Expression::SubQuery(Box::new(model))
    }

    // ==================== Comparison Operators ====================

    /// Compare with `other` using `op`.
    pub fn compare(self, op: ComparisonOp, other: impl Into<Expression>) -> Self {
        Expression::Comparison {
            op,
            left: Box::new(self),
            right: Box::new(other.into()),
        }
    }

    /// Equal to (=)
    pub fn eq(self, other: impl Into<Expression>) -> Self {
        self.compare(ComparisonOp::Eq, other)
    }

    /// Not equal to (<>)
    pub fn ne(self, other: impl Into<Expression>) -> Self {
        self.compare(ComparisonOp::Ne, other)
    }

    /// Less than (<)
    pub fn lt(self, other: impl Into<Expression>) -> Self {
        self.compare(ComparisonOp::Lt, other)
    }

    /// Less than or equal to (<=)
    pub fn le(self, other: impl Into<Expression>) -> Self {
        self.compare(ComparisonOp::Le, other)
    }

    /// Greater than (>)
    pub fn gt(self, other: impl Into<Expression>) -> Self {
        self.compare(ComparisonOp::Gt, other)
    }

    /// Greater than or equal to (>=)
    pub fn ge(self, other: impl Into<Expression>) -> Self {
        self.compare(ComparisonOp::Ge, other)
    }

    // ==================== Logical Operators ====================

    /// Logical AND
    pub fn and(self, other: impl Into<Expression>) -> Self {
        Expression::And(Box::new(self), Box::new(other.into()))
    }

    /// Logical OR
    pub fn or(self, other: impl Into<Expression>) -> Self {
        Expression::Or(Box::new(self), Box::new(other.into()))
    }

    /// Logical NOT
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expression::Not(Box::new(self))
    }

    /// Short name of the node kind, used in diagnostics.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Expression::QuerySourceRef(_) => "QuerySourceReference",
            Expression::Member { .. } => "Member",
            Expression::Constant(_) => "Constant",
            Expression::Comparison { .. } => "Comparison",
            Expression::And(..) => "AndAlso",
            Expression::Or(..) => "OrElse",
            Expression::Not(_) => "Not",
            Expression::SubQuery(_) => "SubQuery",
            Expression::Call { .. } => "MethodCall",
        }
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::constant(value)
    }
}

impl From<bool> for Expression {
    fn from(value: bool) -> Self {
        Expression::constant(value)
    }
}

impl From<i32> for Expression {
    fn from(value: i32) -> Self {
        Expression::constant(value)
    }
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Expression::constant(value)
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Expression::constant(value)
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Expression::constant(value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::QuerySourceRef(id) => write!(f, "[{}]", id),
            Expression::Member { target, name } => write!(f, "{}.{}", target, name),
            Expression::Constant(ConstantValue::Scalar(value)) => match value {
                Value::Text(s) => write!(f, "\"{}\"", s),
                other => write!(f, "{}", other),
            },
            Expression::Constant(ConstantValue::Composite(parts)) => {
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", part)?;
                }
                f.write_str(")")
            }
            Expression::Comparison { op, left, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
            Expression::And(left, right) => write!(f, "({} AndAlso {})", left, right),
            Expression::Or(left, right) => write!(f, "({} OrElse {})", left, right),
            Expression::Not(inner) => write!(f, "Not({})", inner),
            Expression::SubQuery(model) => write!(f, "{{{}}}", model),
            Expression::Call { method, arguments } => {
                write!(f, "{}(", method)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                f.write_str(")")
            }
        }
    }
}
