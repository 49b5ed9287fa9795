use serde::{Deserialize, Serialize};

/// Locates the target of one operation.
///
/// Which fields are set decides what schema operations act on; see the
/// individual drivers for their priority order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRef {
    pub database: String,
    /// Collection or table.
    pub namespace: String,
    #[serde(default)]
    pub schema: Option<String>,
    /// Tablespace-like grouping.
    #[serde(default)]
    pub field_set_ref: Option<String>,
    /// Raw statement that replaces condition compilation for relational reads.
    #[serde(default)]
    pub sql: Option<String>,
}

impl DataRef {
    pub fn new(database: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn database(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_field_set(mut self, field_set_ref: impl Into<String>) -> Self {
        self.field_set_ref = Some(field_set_ref.into());
        self
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    pub fn has_namespace(&self) -> bool {
        !self.namespace.is_empty()
    }

    pub fn has_database(&self) -> bool {
        !self.database.is_empty()
    }

    pub(crate) fn schema_name(&self) -> Option<&str> {
        self.schema.as_deref().filter(|s| !s.is_empty())
    }

    pub(crate) fn field_set_name(&self) -> Option<&str> {
        self.field_set_ref.as_deref().filter(|s| !s.is_empty())
    }

    pub(crate) fn raw_sql(&self) -> Option<&str> {
        self.sql.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Column descriptor for inserts, updates and table creation. Not enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub precision: i64,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    pub fn with_precision(mut self, precision: i64) -> Self {
        self.precision = precision;
        self
    }
}
