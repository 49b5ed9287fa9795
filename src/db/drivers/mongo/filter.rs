//! Condition lists to MongoDB filter documents.
//!
//! Negation follows the same inversion table as the SQL path, so a
//! condition list selects the same records on either backend.

use mongodb::bson::{doc, Bson, Document, Regex};

use crate::db::error::{DbError, Result};
use crate::db::model::{Combinator, Condition, Operation, Value};

/// Converts a value into BSON. Structs become embedded documents.
pub fn to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::String(s) => Bson::String(s.clone()),
        Value::Numeric(n) => Bson::Int64(*n),
        Value::Decimal(d) => Bson::Double(*d),
        Value::Bool(b) => Bson::Boolean(*b),
        Value::List(items) => Bson::Array(items.iter().map(to_bson).collect()),
        Value::Struct(fields) => Bson::Document(struct_document(fields)),
    }
}

fn struct_document(fields: &[(String, Value)]) -> Document {
    fields.iter().map(|(k, v)| (k.clone(), to_bson(v))).collect()
}

/// A full document for inserts and update modifiers.
pub fn to_document(value: &Value) -> Result<Document> {
    match value {
        Value::Struct(fields) => Ok(struct_document(fields)),
        other => Err(DbError::translation(format!(
            "document store values must be structs, got {:?}",
            other.data_type()
        ))),
    }
}

/// Translates a SQL `LIKE` pattern into an anchored regular expression.
///
/// `\` escapes the next character, so `\%` and `\_` match themselves.
pub fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 2);
    regex.push('^');
    let mut literal = String::new();
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        let wildcard = match ch {
            '%' => ".*",
            '_' => ".",
            '\\' => {
                literal.push(chars.next().unwrap_or('\\'));
                continue;
            }
            _ => {
                literal.push(ch);
                continue;
            }
        };
        regex.push_str(&regex::escape(&literal));
        literal.clear();
        regex.push_str(wildcard);
    }
    regex.push_str(&regex::escape(&literal));
    regex.push('$');
    regex
}

/// `LIKE` as a case-insensitive regex, matching MySQL's default collations.
fn like_regex(pattern: &str) -> Bson {
    Bson::RegularExpression(Regex {
        pattern: like_to_regex(pattern),
        options: "i".to_string(),
    })
}

pub fn compile_term(cond: &Condition) -> Result<Document> {
    let field = cond.field.as_str();
    let (op, not) = cond.operation.decode();
    let term = match (op, not) {
        (Operation::IsNull, false) => doc! { field: Bson::Null },
        (Operation::IsNull, true) => doc! { field: { "$ne": Bson::Null } },
        (Operation::In, not) => {
            let items = match &cond.value {
                Value::List(items) if items.is_empty() => {
                    return Err(DbError::translation(format!(
                        "IN on {field} needs at least one value"
                    )));
                }
                Value::List(items) => items.iter().map(to_bson).collect(),
                other => vec![to_bson(other)],
            };
            let key = if not { "$nin" } else { "$in" };
            doc! { field: { key: items } }
        }
        (Operation::Like, not) => {
            let pattern = cond.value.as_str().ok_or_else(|| {
                DbError::translation(format!("LIKE on {field} needs a string pattern"))
            })?;
            let regex = like_regex(pattern);
            if not {
                doc! { field: { "$not": regex } }
            } else {
                doc! { field: regex }
            }
        }
        (op, not) => {
            let key = match (op, not) {
                (Operation::LessThan, false) | (Operation::GreaterThan, true) => "$lt",
                (Operation::LessThan, true) | (Operation::GreaterThan, false) => "$gt",
                (Operation::LessThanOrEqual, false) | (Operation::GreaterThanOrEqual, true) => {
                    "$lte"
                }
                (Operation::LessThanOrEqual, true) | (Operation::GreaterThanOrEqual, false) => {
                    "$gte"
                }
                (_, true) => "$ne",
                (_, false) => return Ok(doc! { field: to_bson(&cond.value) }),
            };
            doc! { field: { key: to_bson(&cond.value) } }
        }
    };
    Ok(term)
}

/// Builds the filter for a condition list; an empty list matches everything.
pub fn compile_filter(conditions: &[Condition], combinator: Combinator) -> Result<Document> {
    if conditions.is_empty() {
        return Ok(Document::new());
    }
    let terms = conditions
        .iter()
        .map(compile_term)
        .collect::<Result<Vec<_>>>()?;
    let key = match combinator {
        Combinator::And => "$and",
        Combinator::Or => "$or",
    };
    Ok(doc! { key: terms })
}

/// Projection keeping only the requested fields.
pub fn projection(fields: &[String]) -> Option<Document> {
    if fields.is_empty() {
        return None;
    }
    Some(fields.iter().map(|f| (f.clone(), Bson::Int32(1))).collect())
}
