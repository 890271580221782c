//! Parsed query structure: sources, clauses and the selector.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use relmodel_core::{ClrType, EntityType, MetadataProvider};

use crate::expression::Expression;

static NEXT_SOURCE_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of one query source.
///
/// Two sources over the same entity type (a self join) are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuerySourceId(u32);

impl QuerySourceId {
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    fn next() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for QuerySourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The element type a query source ranges over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemType {
    /// A native type, resolved through the model's type lookup.
    Native(ClrType),
    /// An entity type referenced by name (shadow-only types).
    Named(String),
}

impl ItemType {
    /// Resolve to an entity type. `None` if the model does not map it.
    pub fn resolve(&self, metadata: &dyn MetadataProvider) -> Option<Arc<EntityType>> {
        match self {
            ItemType::Native(clr_type) => metadata.entity_type_by_type(clr_type.type_id),
            ItemType::Named(name) => metadata.entity_type_by_name(name),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Native(clr_type) => f.write_str(clr_type.type_name),
            ItemType::Named(name) => f.write_str(name),
        }
    }
}

/// A named origin of tuples, e.g. `c` in `from c in Customers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySource {
    id: QuerySourceId,
    item_name: String,
    item_type: ItemType,
}

impl QuerySource {
    /// A source over the native type `T`.
    pub fn of<T: Any>(item_name: impl Into<String>) -> Self {
        Self {
            id: QuerySourceId::next(),
            item_name: item_name.into(),
            item_type: ItemType::Native(ClrType::of::<T>()),
        }
    }

    /// A source over the entity type called `entity_type`.
    pub fn named(item_name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: QuerySourceId::next(),
            item_name: item_name.into(),
            item_type: ItemType::Named(entity_type.into()),
        }
    }

    pub fn id(&self) -> QuerySourceId {
        self.id
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn item_type(&self) -> &ItemType {
        &self.item_type
    }

    /// Reference this source in an expression.
    pub fn reference(&self) -> Expression {
        Expression::source(self.id)
    }

    /// `self.name` as an expression.
    pub fn property(&self, name: impl Into<String>) -> Expression {
        Expression::property(self.id, name)
    }
}

/// What a query returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Whole entities of one source.
    Entity(QuerySourceId),
    /// A list of member expressions.
    Members(Vec<Expression>),
}

/// A clause following the main `from`.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyClause {
    AdditionalFrom(QuerySource),
    Where(Expression),
}

/// A parsed query: main source, body clauses in order, and the selector.
///
/// # Example
///
/// ```
/// use relmodel_query::{QueryModel, QuerySource};
///
/// let c = QuerySource::named("c", "Customer");
/// let city = c.property("City");
/// let query = QueryModel::new(c).filter(city.eq("London"));
/// assert_eq!(query.where_clauses().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryModel {
    main_from: QuerySource,
    body: Vec<BodyClause>,
    selector: Selector,
}

impl QueryModel {
    /// A query selecting whole entities of `main_from`.
    pub fn new(main_from: QuerySource) -> Self {
        let selector = Selector::Entity(main_from.id);
        Self {
            main_from,
            body: Vec::new(),
            selector,
        }
    }

    /// Add another `from` clause.
    #[must_use]
    pub fn from(mut self, source: QuerySource) -> Self {
        self.body.push(BodyClause::AdditionalFrom(source));
        self
    }

    /// Add a `where` clause.
    #[must_use]
    pub fn filter(mut self, predicate: Expression) -> Self {
        self.body.push(BodyClause::Where(predicate));
        self
    }

    /// Replace the selector.
    #[must_use]
    pub fn select(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn main_from(&self) -> &QuerySource {
        &self.main_from
    }

    pub fn body(&self) -> &[BodyClause] {
        &self.body
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Every source, main first, then additional sources in clause order.
    pub fn query_sources(&self) -> impl Iterator<Item = &QuerySource> {
        std::iter::once(&self.main_from).chain(self.body.iter().filter_map(|clause| match clause {
            BodyClause::AdditionalFrom(source) => Some(source),
            BodyClause::Where(_) => None,
        }))
    }

    /// Predicates of every `where` clause in clause order.
    pub fn where_clauses(&self) -> impl Iterator<Item = &Expression> {
        self.body.iter().filter_map(|clause| match clause {
            BodyClause::Where(predicate) => Some(predicate),
            BodyClause::AdditionalFrom(_) => None,
        })
    }
}

impl fmt::Display for QueryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "from {} {} in {}",
            self.main_from.item_type, self.main_from.item_name, self.main_from.id
        )?;
        for clause in &self.body {
            match clause {
                BodyClause::AdditionalFrom(source) => write!(
                    f,
                    " from {} {} in {}",
                    source.item_type, source.item_name, source.id
                )?,
                BodyClause::Where(predicate) => write!(f, " where {}", predicate)?,
            }
        }
        match &self.selector {
            Selector::Entity(id) => write!(f, " select [{}]", id),
            Selector::Members(members) => {
                f.write_str(" select (")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                f.write_str(")")
            }
        }
    }
}
