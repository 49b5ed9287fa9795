//! SQL statement and WHERE clause compilation.
//!
//! Identifiers are interpolated verbatim; only values travel as `?`
//! parameters. Callers must not pass untrusted table or column names.

use mysql_async::Value as SqlValue;

use crate::db::connection::check_pairs;
use crate::db::error::{DbError, Result};
use crate::db::model::{Combinator, Condition, DataRef, Field, Operation, Value};

/// Statement text plus its positional parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    fn text(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }
}

/// Converts a value into a statement parameter. Lists and structs travel
/// as JSON text.
pub fn to_sql_param(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::NULL,
        Value::String(s) => SqlValue::Bytes(s.clone().into_bytes()),
        Value::Numeric(n) => SqlValue::Int(*n),
        Value::Decimal(d) => SqlValue::Double(*d),
        Value::Bool(b) => SqlValue::Int(i64::from(*b)),
        Value::List(_) | Value::Struct(_) => {
            SqlValue::Bytes(value.to_json().to_string().into_bytes())
        }
    }
}

/// Compiles one condition into its fragment and the parameters it binds.
pub fn compile_condition(cond: &Condition) -> Result<(String, Vec<SqlValue>)> {
    let field = &cond.field;
    let (op, not) = cond.operation.decode();
    let symbol = match (op, not) {
        (Operation::IsNull, false) => return Ok((format!("{field} IS NULL"), Vec::new())),
        (Operation::IsNull, true) => return Ok((format!("{field} IS NOT NULL"), Vec::new())),
        (Operation::In, _) => {
            let params: Vec<SqlValue> = match &cond.value {
                Value::List(items) if items.is_empty() => {
                    return Err(DbError::translation(format!(
                        "IN on {field} needs at least one value"
                    )));
                }
                Value::List(items) => items.iter().map(to_sql_param).collect(),
                other => vec![to_sql_param(other)],
            };
            let placeholders = vec!["?"; params.len()].join(", ");
            let keyword = if not { "NOT IN" } else { "IN" };
            return Ok((format!("{field} {keyword} ({placeholders})"), params));
        }
        (Operation::LessThan, false) | (Operation::GreaterThan, true) => "<",
        (Operation::LessThan, true) | (Operation::GreaterThan, false) => ">",
        (Operation::LessThanOrEqual, false) | (Operation::GreaterThanOrEqual, true) => "<=",
        (Operation::LessThanOrEqual, true) | (Operation::GreaterThanOrEqual, false) => ">=",
        (Operation::Like, false) => "LIKE",
        (Operation::Like, true) => "NOT LIKE",
        (_, false) => "=",
        (_, true) => "<>",
    };
    Ok((format!("{field} {symbol} ?"), vec![to_sql_param(&cond.value)]))
}

/// Joins fragments with one combinator. An empty list yields no clause.
pub fn compile_where(
    conditions: &[Condition],
    combinator: Combinator,
) -> Result<(String, Vec<SqlValue>)> {
    if conditions.is_empty() {
        return Ok((String::new(), Vec::new()));
    }
    let joiner = match combinator {
        Combinator::And => " AND ",
        Combinator::Or => " OR ",
    };
    let mut fragments = Vec::with_capacity(conditions.len());
    let mut params = Vec::new();
    for cond in conditions {
        let (fragment, mut bound) = compile_condition(cond)?;
        fragments.push(fragment);
        params.append(&mut bound);
    }
    Ok((format!(" WHERE {}", fragments.join(joiner)), params))
}

fn require_namespace(data_ref: &DataRef) -> Result<&str> {
    if data_ref.has_namespace() {
        Ok(&data_ref.namespace)
    } else {
        Err(DbError::translation("a namespace (table) is required"))
    }
}

pub fn select(
    data_ref: &DataRef,
    fields: &[String],
    conditions: &[Condition],
    combinator: Combinator,
) -> Result<Statement> {
    if let Some(sql) = data_ref.raw_sql() {
        return Ok(Statement::text(sql.to_string()));
    }
    let table = require_namespace(data_ref)?;
    let columns = if fields.is_empty() {
        "*".to_string()
    } else {
        fields.join(", ")
    };
    let (clause, params) = compile_where(conditions, combinator)?;
    Ok(Statement {
        sql: format!("SELECT {columns} FROM {table}{clause}"),
        params,
    })
}

pub fn insert(data_ref: &DataRef, fields: &[Field], values: &[Value]) -> Result<Statement> {
    check_pairs(fields, values)?;
    let table = require_namespace(data_ref)?;
    let columns = fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ");
    let placeholders = vec!["?"; fields.len()].join(", ");
    Ok(Statement {
        sql: format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})"),
        params: values.iter().map(to_sql_param).collect(),
    })
}

/// SET parameters come first, then WHERE parameters.
pub fn update(
    data_ref: &DataRef,
    conditions: &[Condition],
    fields: &[Field],
    values: &[Value],
    combinator: Combinator,
) -> Result<Statement> {
    check_pairs(fields, values)?;
    let table = require_namespace(data_ref)?;
    let assignments = fields
        .iter()
        .map(|f| format!("{} = ?", f.name))
        .collect::<Vec<_>>()
        .join(", ");
    let (clause, mut where_params) = compile_where(conditions, combinator)?;
    let mut params: Vec<SqlValue> = values.iter().map(to_sql_param).collect();
    params.append(&mut where_params);
    Ok(Statement {
        sql: format!("UPDATE {table} SET {assignments}{clause}"),
        params,
    })
}

pub fn delete(
    data_ref: &DataRef,
    conditions: &[Condition],
    combinator: Combinator,
) -> Result<Statement> {
    let table = require_namespace(data_ref)?;
    let (clause, params) = compile_where(conditions, combinator)?;
    Ok(Statement {
        sql: format!("DELETE FROM {table}{clause}"),
        params,
    })
}

fn column_definition(field: &Field) -> Result<String> {
    if field.name.is_empty() || field.type_name.is_empty() {
        return Err(DbError::translation(format!(
            "column definitions need a name and a type: {field:?}"
        )));
    }
    let mut def = format!("{} {}", field.name, field.type_name);
    match (field.size, field.precision) {
        (size, precision) if size > 0 && precision > 0 => {
            def.push_str(&format!("({size},{precision})"))
        }
        (size, _) if size > 0 => def.push_str(&format!("({size})")),
        _ => {}
    }
    Ok(def)
}

pub fn create_table(table: &str, fields: &[Field]) -> Result<String> {
    if fields.is_empty() {
        return Err(DbError::translation(format!(
            "Create table {table} needs at least one column"
        )));
    }
    let columns = fields.iter().map(column_definition).collect::<Result<Vec<_>>>()?;
    Ok(format!("CREATE TABLE {table} ({})", columns.join(", ")))
}
