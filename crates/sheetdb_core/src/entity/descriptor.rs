//! Entity descriptors: how an entity type maps onto a table.

use super::field::{normalize, FieldValue};
use crate::error::{CoreError, CoreResult};
use crate::types::{ConvertError, ValueType};
use sheetdb_codec::CellValue;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type Getter<E> = Arc<dyn Fn(&E) -> CellValue + Send + Sync>;
type Setter<E> = Arc<dyn Fn(&mut E, &CellValue) -> Result<(), ConvertError> + Send + Sync>;
type Normalizer = fn(&CellValue) -> Result<CellValue, ConvertError>;
type Constructor<E> = Arc<dyn Fn() -> Result<E, String> + Send + Sync>;

/// One mapped property: its column, declared type and accessors.
///
/// Accessors are resolved once when the descriptor is built and reused
/// for every row.
pub struct ColumnDescriptor<E> {
    property: String,
    column: String,
    value_type: ValueType,
    nullable: bool,
    default_value: CellValue,
    get: Getter<E>,
    set: Setter<E>,
    normalize: Normalizer,
}

impl<E> ColumnDescriptor<E> {
    fn new<T, G, S>(property: String, column: String, get: G, set: S) -> Self
    where
        T: FieldValue,
        G: Fn(&E) -> T + Send + Sync + 'static,
        S: Fn(&mut E, T) + Send + Sync + 'static,
    {
        let set: Setter<E> = Arc::new(move |entity, raw| {
            let coerced = T::VALUE_TYPE.coerce(raw)?;
            set(entity, T::from_cell(coerced)?);
            Ok(())
        });
        Self {
            property,
            column,
            value_type: T::VALUE_TYPE,
            nullable: T::NULLABLE,
            default_value: T::default().to_cell(),
            get: Arc::new(move |entity| get(entity).to_cell()),
            set,
            normalize: normalize::<T>,
        }
    }

    /// Name of the property.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Name of the header column.
    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column
    }

    /// Declared type.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Whether the property is an `Option`.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Cell form of the property type's default value.
    #[must_use]
    pub fn default_value(&self) -> &CellValue {
        &self.default_value
    }

    /// Reads the property from an entity as a cell.
    #[must_use]
    pub fn get(&self, entity: &E) -> CellValue {
        (self.get)(entity)
    }

    /// Coerces a raw cell and stores it in the property.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError`] when the cell has no representation in the
    /// declared type.
    pub fn set(&self, entity: &mut E, raw: &CellValue) -> Result<(), ConvertError> {
        (self.set)(entity, raw)
    }

    /// Canonical cell form of `raw` for this property, as [`Self::get`]
    /// would return it after a [`Self::set`].
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError`] when the cell has no representation in the
    /// declared type.
    pub fn normalize(&self, raw: &CellValue) -> Result<CellValue, ConvertError> {
        (self.normalize)(raw)
    }

    /// True when `value` is empty or equals the type's default.
    #[must_use]
    pub fn is_default(&self, value: &CellValue) -> bool {
        value.is_empty() || *value == self.default_value
    }
}

impl<E> Clone for ColumnDescriptor<E> {
    fn clone(&self) -> Self {
        Self {
            property: self.property.clone(),
            column: self.column.clone(),
            value_type: self.value_type,
            nullable: self.nullable,
            default_value: self.default_value.clone(),
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
            normalize: self.normalize,
        }
    }
}

impl<E> fmt::Debug for ColumnDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("property", &self.property)
            .field("column", &self.column)
            .field("value_type", &self.value_type)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

/// Mapping of an entity type onto a table.
///
/// Holds the ordered list of mapped columns, exactly one key column and a
/// constructor for fresh instances. Cloning is cheap: columns and
/// accessors are shared.
///
/// # Example
///
/// ```
/// use sheetdb_core::EntityDescriptor;
///
/// #[derive(Default)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// let descriptor = EntityDescriptor::<User>::builder("users")
///     .identity_key("id", |u: &User| u.id, |u, v| u.id = v)
///     .column("name", |u: &User| u.name.clone(), |u, v| u.name = v)
///     .build()
///     .unwrap();
///
/// assert_eq!(descriptor.table_name(), "users");
/// assert_eq!(descriptor.key().column_name(), "id");
/// assert!(descriptor.is_identity());
/// ```
pub struct EntityDescriptor<E> {
    entity_name: String,
    table_name: String,
    origin_table_name: String,
    columns: Arc<[ColumnDescriptor<E>]>,
    key: usize,
    is_identity: bool,
    constructor: Constructor<E>,
}

impl<E: Default + 'static> EntityDescriptor<E> {
    /// Starts a descriptor for a type constructed with `Default`.
    pub fn builder(table: impl Into<String>) -> EntityDescriptorBuilder<E> {
        EntityDescriptorBuilder::new(table.into(), Arc::new(|| Ok(E::default())))
    }
}

impl<E: 'static> EntityDescriptor<E> {
    /// Starts a descriptor for a type built by a fallible constructor.
    ///
    /// A constructor error surfaces as [`CoreError::Construction`] from
    /// every read that needs a fresh instance.
    pub fn builder_with<F, M>(table: impl Into<String>, constructor: F) -> EntityDescriptorBuilder<E>
    where
        F: Fn() -> Result<E, M> + Send + Sync + 'static,
        M: fmt::Display,
    {
        EntityDescriptorBuilder::new(
            table.into(),
            Arc::new(move || constructor().map_err(|e| e.to_string())),
        )
    }
}

impl<E> EntityDescriptor<E> {
    /// Short name of the entity type.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Table the descriptor currently points at.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Table the descriptor was built for.
    #[must_use]
    pub fn origin_table_name(&self) -> &str {
        &self.origin_table_name
    }

    /// Mapped columns in declared order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor<E>] {
        &self.columns
    }

    /// Column names in declared order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(ColumnDescriptor::column_name)
    }

    /// Finds a column by property name, then by column name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ColumnDescriptor<E>> {
        self.columns
            .iter()
            .find(|c| c.property == name)
            .or_else(|| self.columns.iter().find(|c| c.column == name))
    }

    /// The key column.
    #[must_use]
    pub fn key(&self) -> &ColumnDescriptor<E> {
        &self.columns[self.key]
    }

    /// Whether the key is assigned on insert.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.is_identity
    }

    /// Creates a fresh instance.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Construction`] if the constructor fails.
    pub fn new_entity(&self) -> CoreResult<E> {
        (self.constructor)().map_err(|message| CoreError::Construction {
            entity: self.entity_name.clone(),
            message,
        })
    }

    /// Copy of this descriptor pointing at another table.
    #[must_use]
    pub fn with_table(&self, table: impl Into<String>) -> Self {
        Self {
            table_name: table.into(),
            ..self.clone()
        }
    }

    /// Copy of this descriptor pointing back at the table it was built for.
    #[must_use]
    pub fn origin(&self) -> Self {
        self.with_table(self.origin_table_name.clone())
    }
}

impl<E> Clone for EntityDescriptor<E> {
    fn clone(&self) -> Self {
        Self {
            entity_name: self.entity_name.clone(),
            table_name: self.table_name.clone(),
            origin_table_name: self.origin_table_name.clone(),
            columns: Arc::clone(&self.columns),
            key: self.key,
            is_identity: self.is_identity,
            constructor: Arc::clone(&self.constructor),
        }
    }
}

impl<E> fmt::Debug for EntityDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("entity_name", &self.entity_name)
            .field("table_name", &self.table_name)
            .field("origin_table_name", &self.origin_table_name)
            .field("columns", &self.columns)
            .field("key", &self.key().column_name())
            .field("is_identity", &self.is_identity)
            .finish()
    }
}

/// Builder for [`EntityDescriptor`].
pub struct EntityDescriptorBuilder<E> {
    entity_name: String,
    table: String,
    columns: Vec<ColumnDescriptor<E>>,
    keys: Vec<(usize, bool)>,
    constructor: Constructor<E>,
}

impl<E: 'static> EntityDescriptorBuilder<E> {
    fn new(table: String, constructor: Constructor<E>) -> Self {
        let type_name = std::any::type_name::<E>();
        let short = type_name
            .split('<')
            .next()
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or(type_name);
        Self {
            entity_name: short.to_string(),
            table,
            columns: Vec::new(),
            keys: Vec::new(),
            constructor,
        }
    }

    /// Overrides the entity name used in errors and logs.
    #[must_use]
    pub fn entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = name.into();
        self
    }

    /// Maps a property to a column of the same name.
    #[must_use]
    pub fn column<T, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        T: FieldValue,
        G: Fn(&E) -> T + Send + Sync + 'static,
        S: Fn(&mut E, T) + Send + Sync + 'static,
    {
        self.column_as(name, name, get, set)
    }

    /// Maps a property to a differently named column.
    #[must_use]
    pub fn column_as<T, G, S>(mut self, property: &str, column: &str, get: G, set: S) -> Self
    where
        T: FieldValue,
        G: Fn(&E) -> T + Send + Sync + 'static,
        S: Fn(&mut E, T) + Send + Sync + 'static,
    {
        self.columns.push(ColumnDescriptor::new(
            property.to_string(),
            column.to_string(),
            get,
            set,
        ));
        self
    }

    /// Maps the key property; its value is supplied by the caller.
    #[must_use]
    pub fn key<T, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        T: FieldValue,
        G: Fn(&E) -> T + Send + Sync + 'static,
        S: Fn(&mut E, T) + Send + Sync + 'static,
    {
        self.push_key(name, false, get, set)
    }

    /// Maps an integer key property assigned on insert when left at its
    /// default.
    #[must_use]
    pub fn identity_key<T, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        T: FieldValue,
        G: Fn(&E) -> T + Send + Sync + 'static,
        S: Fn(&mut E, T) + Send + Sync + 'static,
    {
        self.push_key(name, true, get, set)
    }

    fn push_key<T, G, S>(mut self, name: &str, identity: bool, get: G, set: S) -> Self
    where
        T: FieldValue,
        G: Fn(&E) -> T + Send + Sync + 'static,
        S: Fn(&mut E, T) + Send + Sync + 'static,
    {
        self.keys.push((self.columns.len(), identity));
        self.column(name, get, set)
    }

    /// Validates and builds the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDescriptor`] when the table name is empty,
    /// a column name is blank or repeated, the key is missing or declared
    /// twice, or an identity key is not an integer.
    pub fn build(self) -> CoreResult<EntityDescriptor<E>> {
        let invalid = |message: String| CoreError::invalid_descriptor(&self.entity_name, message);

        if self.table.trim().is_empty() {
            return Err(invalid("table name is empty".into()));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.column.trim().is_empty() {
                return Err(invalid(format!(
                    "property `{}` has a blank column name",
                    column.property
                )));
            }
            if !seen.insert(column.column.as_str()) {
                return Err(invalid(format!("column `{}` is mapped twice", column.column)));
            }
        }

        let (key, is_identity) = match self.keys.as_slice() {
            [single] => *single,
            [] => return Err(invalid("no key property".into())),
            _ => return Err(invalid("more than one key property".into())),
        };
        if is_identity && self.columns[key].value_type != ValueType::Int {
            return Err(invalid(format!(
                "identity key `{}` must be an integer, found {}",
                self.columns[key].property, self.columns[key].value_type
            )));
        }

        Ok(EntityDescriptor {
            entity_name: self.entity_name.clone(),
            origin_table_name: self.table.clone(),
            table_name: self.table,
            columns: self.columns.into(),
            key,
            is_identity,
            constructor: self.constructor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Order {
        id: i64,
        customer: String,
        total: f64,
        shipped: Option<NaiveDateTime>,
    }

    fn order_descriptor() -> EntityDescriptor<Order> {
        EntityDescriptor::<Order>::builder("orders")
            .identity_key("id", |o: &Order| o.id, |o, v| o.id = v)
            .column_as(
                "customer",
                "Customer Name",
                |o: &Order| o.customer.clone(),
                |o, v| o.customer = v,
            )
            .column("total", |o: &Order| o.total, |o, v| o.total = v)
            .column("shipped", |o: &Order| o.shipped, |o, v| o.shipped = v)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_records_columns_in_order() {
        let d = order_descriptor();
        assert_eq!(d.entity_name(), "Order");
        assert_eq!(
            d.column_names().collect::<Vec<_>>(),
            vec!["id", "Customer Name", "total", "shipped"]
        );
        assert_eq!(d.key().property(), "id");
        assert!(d.is_identity());
        assert!(d.find("shipped").unwrap().is_nullable());
        assert!(!d.find("total").unwrap().is_nullable());
    }

    #[test]
    fn find_by_property_or_column() {
        let d = order_descriptor();
        assert_eq!(d.find("customer").unwrap().column_name(), "Customer Name");
        assert_eq!(d.find("Customer Name").unwrap().property(), "customer");
        assert!(d.find("missing").is_none());
    }

    #[test]
    fn accessors_coerce_on_set() {
        let d = order_descriptor();
        let mut order = Order::default();
        d.find("total").unwrap().set(&mut order, &CellValue::from("12.5")).unwrap();
        d.key().set(&mut order, &CellValue::Float(7.0)).unwrap();
        assert_eq!(order.total, 12.5);
        assert_eq!(order.id, 7);
        assert_eq!(d.key().get(&order), CellValue::Int(7));

        let err = d.key().set(&mut order, &CellValue::from("seven")).unwrap_err();
        assert_eq!(err.expected, ValueType::Int);
    }

    #[test]
    fn default_detection() {
        let d = order_descriptor();
        assert!(d.key().is_default(&CellValue::Int(0)));
        assert!(d.key().is_default(&CellValue::Empty));
        assert!(!d.key().is_default(&CellValue::Int(3)));
    }

    #[test]
    fn with_table_and_origin() {
        let d = order_descriptor();
        let archived = d.with_table("orders_2020");
        assert_eq!(archived.table_name(), "orders_2020");
        assert_eq!(archived.origin_table_name(), "orders");
        assert_eq!(archived.origin().table_name(), "orders");
    }

    #[test]
    fn build_requires_exactly_one_key() {
        let none = EntityDescriptor::<Order>::builder("orders")
            .column("total", |o: &Order| o.total, |o, v| o.total = v)
            .build();
        assert!(matches!(none, Err(CoreError::InvalidDescriptor { .. })));

        let two = EntityDescriptor::<Order>::builder("orders")
            .key("id", |o: &Order| o.id, |o, v| o.id = v)
            .key("customer", |o: &Order| o.customer.clone(), |o, v| o.customer = v)
            .build();
        assert!(matches!(two, Err(CoreError::InvalidDescriptor { .. })));
    }

    #[test]
    fn build_rejects_duplicate_or_blank_columns() {
        let dup = EntityDescriptor::<Order>::builder("orders")
            .key("id", |o: &Order| o.id, |o, v| o.id = v)
            .column_as("total", "id", |o: &Order| o.total, |o, v| o.total = v)
            .build();
        assert!(dup.is_err());

        let blank = EntityDescriptor::<Order>::builder("orders")
            .key("id", |o: &Order| o.id, |o, v| o.id = v)
            .column_as("total", " ", |o: &Order| o.total, |o, v| o.total = v)
            .build();
        assert!(blank.is_err());
    }

    #[test]
    fn identity_key_must_be_integer() {
        let result = EntityDescriptor::<Order>::builder("orders")
            .identity_key("customer", |o: &Order| o.customer.clone(), |o, v| o.customer = v)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn failing_constructor_is_reported() {
        let d = EntityDescriptor::<Order>::builder_with("orders", || {
            Err::<Order, _>("no default customer")
        })
        .key("id", |o: &Order| o.id, |o, v| o.id = v)
        .build()
        .unwrap();

        match d.new_entity() {
            Err(CoreError::Construction { entity, message }) => {
                assert_eq!(entity, "Order");
                assert_eq!(message, "no default customer");
            }
            other => panic!("expected construction error, got {other:?}"),
        }
    }
}
