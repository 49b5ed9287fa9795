//! Raw BSON documents to a [`ResultSet`].

use chrono::DateTime;
use mongodb::bson::{RawArray, RawBsonRef, RawDocument, RawDocumentBuf};

use crate::db::model::{DataRef, Datum, Record, ResultSet};

pub fn normalize_documents(entity_ref: &DataRef, documents: Vec<RawDocumentBuf>) -> ResultSet {
    let mut result = ResultSet::empty(entity_ref.clone());
    for document in documents {
        let values = document_fields(&document)
            .into_iter()
            .map(|(_, value)| value)
            .collect();
        let mut record = Record::new(values);
        record.document = Some(document.into_bytes());
        result.push(record);
    }
    result
}

/// Field/value pairs of a document. A field whose value cannot be decoded
/// becomes `Null` and the walk goes on; only a broken element frame ends it.
fn document_fields(document: &RawDocument) -> Vec<(String, Datum)> {
    let mut fields = Vec::new();
    for element in document.iter_elements() {
        let element = match element {
            Ok(element) => element,
            Err(err) => {
                tracing::warn!(error = %err, "malformed BSON document, dropping remaining fields");
                break;
            }
        };
        let value = element.value().map(convert_raw_value).unwrap_or_else(|err| {
            tracing::warn!(
                key = element.key(),
                error = %err,
                "undecodable BSON field, keeping placeholder"
            );
            Datum::Null
        });
        fields.push((element.key().to_string(), value));
    }
    fields
}

fn array_items(array: &RawArray) -> Vec<Datum> {
    array
        .into_iter()
        .map(|item| item.map(convert_raw_value).unwrap_or(Datum::Null))
        .collect()
}

/// Converts one raw BSON value. Kinds without a plain counterpart are
/// rendered as strings.
pub fn convert_raw_value(value: RawBsonRef<'_>) -> Datum {
    match value {
        RawBsonRef::Array(array) => Datum::List(array_items(array)),
        RawBsonRef::Document(document) => Datum::Document(document_fields(document)),
        RawBsonRef::Binary(binary) => Datum::Bytes(binary.bytes.to_vec()),
        RawBsonRef::String(s) => Datum::Text(s.to_string()),
        RawBsonRef::Boolean(b) => Datum::Bool(b),
        RawBsonRef::Int32(n) => Datum::Int(n.into()),
        RawBsonRef::Int64(n) => Datum::Int(n),
        RawBsonRef::Double(x) => Datum::Float(x),
        RawBsonRef::DateTime(dt) => DateTime::from_timestamp_millis(dt.timestamp_millis())
            .map(|dt| Datum::DateTime(dt.naive_utc()))
            .unwrap_or_else(|| Datum::Text(dt.to_string())),
        // Seconds since the epoch; the increment only orders events within a second.
        RawBsonRef::Timestamp(ts) => DateTime::from_timestamp(ts.time.into(), 0)
            .map(|dt| Datum::DateTime(dt.naive_utc()))
            .unwrap_or(Datum::UInt(ts.time.into())),
        RawBsonRef::ObjectId(oid) => Datum::Text(oid.to_hex()),
        RawBsonRef::RegularExpression(regex) => Datum::Text(regex.pattern.to_string()),
        RawBsonRef::Symbol(s) | RawBsonRef::JavaScriptCode(s) => Datum::Text(s.to_string()),
        RawBsonRef::JavaScriptCodeWithScope(code) => Datum::Text(code.code.to_string()),
        RawBsonRef::Decimal128(decimal) => Datum::Text(decimal.to_string()),
        RawBsonRef::DbPointer(pointer) => Datum::Text(format!("{pointer:?}")),
        RawBsonRef::Null | RawBsonRef::Undefined | RawBsonRef::MinKey | RawBsonRef::MaxKey => {
            Datum::Null
        }
        #[allow(unreachable_patterns)]
        _ => Datum::Null,
    }
}
