//! Translation of filter expressions into store predicates.
//!
//! The output vocabulary is comparisons with the
//! property on the left and a constant on the right, combined by AND and
//! OR. Anything else is reported as untranslatable (`Ok(None)`) and left
//! for evaluation after materialization.

use std::fmt;

use relmodel_core::{Property, Result, TranslationError, Value, ValueType};

use crate::context::QueryCompilationContext;
use crate::expression::{ComparisonOp, ConstantValue, Expression};
use crate::query_model::QuerySourceId;

/// A constant operand of a store predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryableConstant {
    value: Value,
    is_string_property: bool,
}

impl QueryableConstant {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            is_string_property: false,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether the paired property is a key column that the store only
    /// accepts as a string, whatever the constant's own type.
    pub fn is_string_property(&self) -> bool {
        self.is_string_property
    }

    pub fn set_string_property(&mut self, is_string_property: bool) {
        self.is_string_property = is_string_property;
    }
}

/// A translated, store-neutral predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateExpr {
    /// `property op constant`
    Comparison {
        op: ComparisonOp,
        property: Property,
        constant: QueryableConstant,
    },
    And(Box<PredicateExpr>, Box<PredicateExpr>),
    Or(Box<PredicateExpr>, Box<PredicateExpr>),
}

impl PredicateExpr {
    pub fn comparison(op: ComparisonOp, property: Property, constant: QueryableConstant) -> Self {
        PredicateExpr::Comparison {
            op,
            property,
            constant,
        }
    }

    /// Logical AND
    #[must_use]
    pub fn and(self, other: PredicateExpr) -> Self {
        PredicateExpr::And(Box::new(self), Box::new(other))
    }

    /// Logical OR
    #[must_use]
    pub fn or(self, other: PredicateExpr) -> Self {
        PredicateExpr::Or(Box::new(self), Box::new(other))
    }

    /// Visit every comparison left to right.
    pub fn for_each_comparison<'a>(
        &'a self,
        visit: &mut impl FnMut(ComparisonOp, &'a Property, &'a QueryableConstant),
    ) {
        match self {
            PredicateExpr::Comparison {
                op,
                property,
                constant,
            } => visit(*op, property, constant),
            PredicateExpr::And(left, right) | PredicateExpr::Or(left, right) => {
                left.for_each_comparison(visit);
                right.for_each_comparison(visit);
            }
        }
    }
}

impl fmt::Display for PredicateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateExpr::Comparison {
                op,
                property,
                constant,
            } => write!(f, "{} {} {}", property.name(), op, constant.value),
            PredicateExpr::And(left, right) => write!(f, "({} AND {})", left, right),
            PredicateExpr::Or(left, right) => write!(f, "({} OR {})", left, right),
        }
    }
}

/// A comparison operand after binding.
enum Operand {
    Property(Property),
    Constant(QueryableConstant),
}

/// Translates one filter expression for one query source.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use relmodel_core::{EntityType, Model, Property};
/// use relmodel_query::{FilteringTranslator, QueryCompilationContext, QuerySource};
///
/// let mut customer = EntityType::new("Customer");
/// customer.add_property(Property::typed::<i32>("Age")).unwrap();
/// let mut model = Model::new();
/// model.add_entity_type(customer);
///
/// let c = QuerySource::named("c", "Customer");
/// let mut context = QueryCompilationContext::new(Arc::new(model));
/// context.add_query_source(&c).unwrap();
///
/// let filter = relmodel_query::Expression::constant(5).lt(c.property("Age"));
/// let predicate = FilteringTranslator::new(&context, Some(c.id()))
///     .translate(&filter)
///     .unwrap()
///     .unwrap();
/// assert_eq!(predicate.to_string(), "Age > 5");
/// ```
pub struct FilteringTranslator<'a> {
    context: &'a QueryCompilationContext,
    query_source: Option<QuerySourceId>,
}

impl<'a> FilteringTranslator<'a> {
    /// Bind members of `query_source` only, or of any registered source
    /// when `None`.
    pub fn new(context: &'a QueryCompilationContext, query_source: Option<QuerySourceId>) -> Self {
        Self {
            context,
            query_source,
        }
    }

    /// Translate `expression`.
    ///
    /// Returns `Ok(None)` when the expression (or a required part of it)
    /// cannot be expressed as a store predicate. A bare query source
    /// reference in predicate position is a defect in the caller and fails
    /// with [`TranslationError::Unhandled`].
    pub fn translate(&self, expression: &Expression) -> Result<Option<PredicateExpr>> {
        match expression {
            Expression::Comparison { op, left, right } if op.is_equality() => {
                self.translate_equality(*op, left, right)
            }
            Expression::Comparison { op, left, right } => {
                Ok(self.translate_comparison(*op, left, right))
            }
            Expression::And(left, right) => {
                let left = self.translate(left)?;
                let right = self.translate(right)?;
                Ok(match (left, right) {
                    (Some(left), Some(right)) => Some(left.and(right)),
                    (Some(kept), None) | (None, Some(kept)) => {
                        tracing::debug!(kept = %kept, "Narrowed AND to its translatable side");
                        Some(kept)
                    }
                    (None, None) => None,
                })
            }
            Expression::Or(left, right) => {
                let left = self.translate(left)?;
                let right = self.translate(right)?;
                Ok(match (left, right) {
                    (Some(left), Some(right)) => Some(left.or(right)),
                    _ => None,
                })
            }
            Expression::Not(operand) => {
                self.translate_equality(ComparisonOp::Eq, operand, &Expression::constant(false))
            }
            Expression::Member { .. } => {
                let is_bool = self
                    .context
                    .bind_member_expression(expression, self.query_source, |property, _| {
                        property.value_type() == ValueType::Bool
                    })
                    .unwrap_or(false);
                if is_bool {
                    Ok(self.translate_comparison(
                        ComparisonOp::Eq,
                        expression,
                        &Expression::constant(true),
                    ))
                } else {
                    Ok(None)
                }
            }
            Expression::Constant(_) | Expression::SubQuery(_) | Expression::Call { .. } => {
                Ok(None)
            }
            Expression::QuerySourceRef(_) => Err(TranslationError::Unhandled {
                node: format!("{} {}", expression.kind_name(), expression),
            }
            .into()),
        }
    }

    /// `=` and `<>` unfold tuple comparisons of equal arity into one
    /// comparison per position, joined by AND (`=`) or OR (`<>`).
    fn translate_equality(
        &self,
        op: ComparisonOp,
        left: &Expression,
        right: &Expression,
    ) -> Result<Option<PredicateExpr>> {
        if let (
            Expression::Constant(ConstantValue::Composite(lefts)),
            Expression::Constant(ConstantValue::Composite(rights)),
        ) = (left, right)
        {
            if lefts.len() == rights.len() {
                let unfolded = lefts
                    .iter()
                    .zip(rights)
                    .map(|(l, r)| l.clone().compare(op, r.clone()))
                    .reduce(|acc, next| {
                        if op == ComparisonOp::Eq {
                            acc.and(next)
                        } else {
                            acc.or(next)
                        }
                    });
                return match unfolded {
                    Some(unfolded) => {
                        tracing::trace!(unfolded = %unfolded, "Unfolded structural comparison");
                        self.translate(&unfolded)
                    }
                    None => Ok(None),
                };
            }
        }
        Ok(self.translate_comparison(op, left, right))
    }

    /// Exactly one side must bind to a property and the other to a
    /// non-null constant. The property always ends up on the left.
    fn translate_comparison(
        &self,
        op: ComparisonOp,
        left: &Expression,
        right: &Expression,
    ) -> Option<PredicateExpr> {
        let left = self.bind_operand(left)?;
        let right = self.bind_operand(right)?;
        let (op, property, mut constant) = match (left, right) {
            (Operand::Property(property), Operand::Constant(constant)) => (op, property, constant),
            (Operand::Constant(constant), Operand::Property(property)) => {
                (op.mirror(), property, constant)
            }
            _ => return None,
        };
        if property.store_key().is_some() {
            constant.set_string_property(true);
        }
        Some(PredicateExpr::comparison(op, property, constant))
    }

    fn bind_operand(&self, expression: &Expression) -> Option<Operand> {
        match expression {
            Expression::Member { .. } => self.context.bind_member_expression(
                expression,
                self.query_source,
                |property, _| Operand::Property(property.clone()),
            ),
            Expression::Constant(ConstantValue::Scalar(value)) if !value.is_null() => {
                Some(Operand::Constant(QueryableConstant::new(value.clone())))
            }
            _ => None,
        }
    }
}
