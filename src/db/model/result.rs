use base64::Engine;
use chrono::NaiveDateTime;
use std::fmt;

use super::data_ref::DataRef;

/// Native type a column's cells are materialized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeType {
    UInt8,
    Int32,
    Int64,
    Float64,
    Text,
    Timestamp,
    /// Raw bytes, presented as text.
    Bytes,
}

impl RuntimeType {
    /// Initial holder value for a cell of this type.
    pub fn zero_value(self) -> Datum {
        match self {
            RuntimeType::UInt8 => Datum::UInt(0),
            RuntimeType::Int32 | RuntimeType::Int64 => Datum::Int(0),
            RuntimeType::Float64 => Datum::Float(0.0),
            RuntimeType::Text | RuntimeType::Bytes => Datum::Text(String::new()),
            RuntimeType::Timestamp => Datum::DateTime(NaiveDateTime::default()),
        }
    }
}

/// One output column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    /// Backend type name, e.g. `VARCHAR`.
    pub type_name: String,
    pub runtime_type: RuntimeType,
    pub length: i64,
    pub precision: i64,
    pub scale: i64,
}

/// Shape of a result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaData {
    pub entity_ref: DataRef,
    pub columns: Vec<Column>,
}

/// A normalized cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    List(Vec<Datum>),
    Document(Vec<(String, Datum)>),
}

impl Datum {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Datum::Int(n) => Some(*n),
            Datum::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Looks up a field of a `Document` datum.
    pub fn get(&self, name: &str) -> Option<&Datum> {
        match self {
            Datum::Document(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("null"),
            Datum::Bool(b) => write!(f, "{b}"),
            Datum::Int(n) => write!(f, "{n}"),
            Datum::UInt(n) => write!(f, "{n}"),
            Datum::Float(x) => write!(f, "{x}"),
            Datum::Text(s) => f.write_str(s),
            Datum::Bytes(b) => f.write_str(&base64::engine::general_purpose::STANDARD.encode(b)),
            Datum::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            Datum::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Datum::Document(fields) => {
                f.write_str("{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// One row or document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub columns: usize,
    pub values: Vec<Datum>,
    /// Raw BSON bytes of the source document, when the backend has one.
    pub document: Option<Vec<u8>>,
}

impl Record {
    pub fn new(values: Vec<Datum>) -> Self {
        Self {
            columns: values.len(),
            values,
            document: None,
        }
    }

    /// The source document, for callers that need full BSON fidelity.
    #[cfg(feature = "mongodb")]
    pub fn raw_document(&self) -> Option<&mongodb::bson::RawDocument> {
        self.document
            .as_deref()
            .and_then(|bytes| mongodb::bson::RawDocument::from_bytes(bytes).ok())
    }
}

/// Normalized query output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub lines: usize,
    pub metadata: MetaData,
    pub records: Vec<Record>,
}

impl ResultSet {
    pub fn empty(entity_ref: DataRef) -> Self {
        Self {
            lines: 0,
            metadata: MetaData {
                entity_ref,
                columns: Vec::new(),
            },
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
        self.lines = self.records.len();
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of a named column, when the backend reported metadata.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.metadata.columns.iter().position(|c| c.name == name)
    }
}
