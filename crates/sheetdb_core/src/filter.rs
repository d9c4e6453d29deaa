//! Filter rules and their translation into entity predicates.
//!
//! The row store only builds [`FilterRule`] values (e.g. "key = 5" or
//! "key In [1, 2]"); turning a rule into a boolean test is the job of a
//! [`FilterService`]. [`DefaultFilterService`] evaluates rules against the
//! mapped property values.

use crate::entity::{ColumnDescriptor, EntityDescriptor};
use crate::error::{CoreError, CoreResult};
use sheetdb_codec::CellValue;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Comparison applied by a [`FilterRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `In`
    In,
    /// `NotIn`
    NotIn,
}

impl FilterOperator {
    /// Textual form of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::In => "In",
            Self::NotIn => "NotIn",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "=" | "==" => Ok(Self::Equal),
            "!=" | "<>" => Ok(Self::NotEqual),
            _ if s.eq_ignore_ascii_case("in") => Ok(Self::In),
            _ if s.eq_ignore_ascii_case("notin") || s.eq_ignore_ascii_case("not in") => {
                Ok(Self::NotIn)
            }
            _ => Err(CoreError::invalid_filter(format!("unknown operator `{s}`"))),
        }
    }
}

/// Right-hand side of a [`FilterRule`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// One value, for `=` and `!=`.
    Single(CellValue),
    /// A set of values, for `In` and `NotIn`.
    List(Vec<CellValue>),
}

impl From<CellValue> for FilterValue {
    fn from(value: CellValue) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<CellValue>> for FilterValue {
    fn from(values: Vec<CellValue>) -> Self {
        Self::List(values)
    }
}

/// A `{field, operator, value}` filter.
///
/// `field` names a property, or failing that a column.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRule {
    /// Property or column the rule tests.
    pub field: String,
    /// The comparison.
    pub operator: FilterOperator,
    /// The operand.
    pub value: FilterValue,
}

impl FilterRule {
    /// Creates a rule.
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// `field = value`.
    pub fn eq(field: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self::new(field, FilterOperator::Equal, FilterValue::Single(value.into()))
    }

    /// `field In values`.
    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        Self::new(
            field,
            FilterOperator::In,
            FilterValue::List(values.into_iter().map(Into::into).collect()),
        )
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.field, self.operator)?;
        match &self.value {
            FilterValue::Single(v) => write!(f, "{v}"),
            FilterValue::List(vs) => {
                f.write_str("[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A compiled boolean test over entities.
pub struct Predicate<E> {
    rule: Option<FilterRule>,
    test: Arc<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<E> Predicate<E> {
    /// Wraps an arbitrary closure.
    pub fn new(test: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self {
            rule: None,
            test: Arc::new(test),
        }
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn matches(&self, entity: &E) -> bool {
        (self.test)(entity)
    }

    /// The rule this predicate was compiled from, if any.
    #[must_use]
    pub fn rule(&self) -> Option<&FilterRule> {
        self.rule.as_ref()
    }
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        Self {
            rule: self.rule.clone(),
            test: Arc::clone(&self.test),
        }
    }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Some(rule) => write!(f, "Predicate({rule})"),
            None => f.write_str("Predicate(<closure>)"),
        }
    }
}

/// Translates filter rules into predicates.
pub trait FilterService {
    /// Compiles `rule` for entities described by `descriptor`.
    ///
    /// # Errors
    ///
    /// Implementations fail when the rule cannot apply to the entity.
    fn compile<E: 'static>(
        &self,
        rule: &FilterRule,
        descriptor: &EntityDescriptor<E>,
    ) -> CoreResult<Predicate<E>>;
}

/// Evaluates rules by comparing normalized property values.
///
/// The rule operand is normalized to the property's declared type first,
/// so `id = "5"` matches an integer id of 5.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFilterService;

impl FilterService for DefaultFilterService {
    fn compile<E: 'static>(
        &self,
        rule: &FilterRule,
        descriptor: &EntityDescriptor<E>,
    ) -> CoreResult<Predicate<E>> {
        let column = descriptor.find(&rule.field).cloned().ok_or_else(|| {
            CoreError::invalid_filter(format!(
                "`{}` is not a mapped property of `{}`",
                rule.field,
                descriptor.entity_name()
            ))
        })?;
        let table = descriptor.table_name();

        let test: Arc<dyn Fn(&E) -> bool + Send + Sync> = match (rule.operator, &rule.value) {
            (FilterOperator::Equal | FilterOperator::NotEqual, FilterValue::Single(value)) => {
                let expected = normalize_operand(&column, table, value)?;
                let negate = rule.operator == FilterOperator::NotEqual;
                Arc::new(move |entity| (column.get(entity) == expected) != negate)
            }
            (FilterOperator::In | FilterOperator::NotIn, value) => {
                let values = match value {
                    FilterValue::Single(v) => std::slice::from_ref(v),
                    FilterValue::List(vs) => vs.as_slice(),
                };
                let set = values
                    .iter()
                    .map(|v| normalize_operand(&column, table, v))
                    .collect::<CoreResult<HashSet<_>>>()?;
                let negate = rule.operator == FilterOperator::NotIn;
                Arc::new(move |entity| set.contains(&column.get(entity)) != negate)
            }
            (op, FilterValue::List(_)) => {
                return Err(CoreError::invalid_filter(format!(
                    "operator `{op}` needs a single value, got a list"
                )));
            }
        };

        Ok(Predicate {
            rule: Some(rule.clone()),
            test,
        })
    }
}

fn normalize_operand<E>(
    column: &ColumnDescriptor<E>,
    table: &str,
    value: &CellValue,
) -> CoreResult<CellValue> {
    column
        .normalize(value)
        .map_err(|e| CoreError::conversion(table, column.column_name(), 0, e))
}
