//! Turns driver rows into a [`ResultSet`].
//!
//! Column metadata is taken once per query. Every cell is converted into
//! the holder type its declared column type maps to; a cell that does not
//! convert keeps a raw rendering instead of failing the row.

use chrono::{NaiveDate, NaiveDateTime};
use mysql_async::{from_value_opt, FromValueError, Value as SqlValue};

use crate::db::model::{Column, DataRef, Datum, Record, ResultSet, RuntimeType};

/// Column as described by the driver before any row is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    /// Declared type name, e.g. `BIGINT` or `VARCHAR`.
    pub type_name: String,
    pub length: i64,
    pub precision: i64,
    pub scale: i64,
}

/// Raw output of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRows {
    pub columns: Vec<ColumnDescription>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// Maps a declared column type to the runtime type its cells are held in.
pub fn runtime_type_for(type_name: &str) -> RuntimeType {
    match type_name.to_ascii_lowercase().as_str() {
        "tinyint" => RuntimeType::UInt8,
        "integer" | "int" | "smallint" | "mediumint" => RuntimeType::Int32,
        "bigint" => RuntimeType::Int64,
        "float" | "double" | "real" | "decimal" => RuntimeType::Float64,
        "char" | "varchar" | "text" => RuntimeType::Text,
        "date" | "time" | "datetime" | "timestamp" => RuntimeType::Timestamp,
        _ => RuntimeType::Bytes,
    }
}

pub fn describe(columns: &[ColumnDescription]) -> Vec<Column> {
    columns
        .iter()
        .map(|c| Column {
            name: c.name.clone(),
            type_name: c.type_name.clone(),
            runtime_type: runtime_type_for(&c.type_name),
            length: c.length,
            precision: c.precision,
            scale: c.scale,
        })
        .collect()
}

pub fn normalize_rows(entity_ref: &DataRef, rows: SqlRows) -> ResultSet {
    let mut result = ResultSet::empty(entity_ref.clone());
    result.metadata.columns = describe(&rows.columns);

    for row in rows.rows {
        let mut holders: Vec<Datum> = result
            .metadata
            .columns
            .iter()
            .map(|c| c.runtime_type.zero_value())
            .collect();
        for (slot, (column, cell)) in holders
            .iter_mut()
            .zip(result.metadata.columns.iter().zip(row))
        {
            *slot = convert_cell(column.runtime_type, cell);
        }
        result.push(Record::new(holders));
    }
    result
}

/// Scans one cell into its holder type, falling back to the raw value.
pub fn convert_cell(runtime_type: RuntimeType, cell: SqlValue) -> Datum {
    if cell == SqlValue::NULL {
        return Datum::Null;
    }
    let converted = match runtime_type {
        RuntimeType::UInt8 => from_value_opt::<u8>(cell).map(|v| Datum::UInt(v.into())),
        RuntimeType::Int32 => from_value_opt::<i32>(cell).map(|v| Datum::Int(v.into())),
        RuntimeType::Int64 => from_value_opt::<i64>(cell)
            .map(Datum::Int)
            .or_else(|FromValueError(raw)| from_value_opt::<u64>(raw).map(Datum::UInt)),
        RuntimeType::Float64 => from_value_opt::<f64>(cell).map(Datum::Float),
        RuntimeType::Text => from_value_opt::<String>(cell).map(Datum::Text),
        RuntimeType::Timestamp => to_timestamp(cell),
        RuntimeType::Bytes => return raw_datum(cell),
    };
    converted.unwrap_or_else(|FromValueError(raw)| {
        tracing::debug!(?runtime_type, value = ?raw, "cell did not convert, keeping raw value");
        raw_datum(raw)
    })
}

fn to_timestamp(cell: SqlValue) -> Result<Datum, FromValueError> {
    match &cell {
        SqlValue::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt((*year).into(), (*month).into(), (*day).into())
                .and_then(|d| {
                    d.and_hms_micro_opt((*hour).into(), (*minute).into(), (*second).into(), *micros)
                })
                .map(Datum::DateTime)
                .ok_or(FromValueError(cell))
        }
        SqlValue::Bytes(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(parse_timestamp)
            .map(Datum::DateTime)
            .ok_or(FromValueError(cell)),
        _ => Err(FromValueError(cell)),
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Presentation fallback: bytes become text, everything else keeps its kind.
fn raw_datum(cell: SqlValue) -> Datum {
    match cell {
        SqlValue::NULL => Datum::Null,
        SqlValue::Bytes(bytes) => Datum::Text(String::from_utf8_lossy(&bytes).into_owned()),
        SqlValue::Int(n) => Datum::Int(n),
        SqlValue::UInt(n) => Datum::UInt(n),
        SqlValue::Float(x) => Datum::Float(x.into()),
        SqlValue::Double(x) => Datum::Float(x),
        SqlValue::Date(year, month, day, hour, minute, second, micros) => Datum::Text(format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
        )),
        SqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = u32::from(hours) + days * 24;
            Datum::Text(format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}"))
        }
    }
}
