use super::config::DriverType;
use super::error::{DbError, Result};
use super::model::{Combinator, Condition, DataRef, Field, ResultSet, Value};

/// Uniform data access over one live backend session.
///
/// Every call blocks until the backend answers. A connection is either open
/// or closed; once [`Connection::close`] succeeds every other operation fails
/// with [`DbError::SessionClosed`] without touching the backend.
///
/// Connections drive their own runtime, so they must not be used (or
/// dropped) from inside an async context.
pub trait Connection: Send {
    /// Reads records. An empty condition list matches everything.
    fn query(
        &mut self,
        data_ref: &DataRef,
        fields: &[String],
        conditions: &[Condition],
        combinator: Combinator,
    ) -> Result<ResultSet>;

    fn insert(&mut self, data_ref: &DataRef, fields: &[Field], values: &[Value]) -> Result<()>;

    /// Returns the number of modified records.
    fn update(
        &mut self,
        data_ref: &DataRef,
        conditions: &[Condition],
        fields: &[Field],
        values: &[Value],
        combinator: Combinator,
    ) -> Result<u64>;

    /// Returns the number of removed records. An empty condition list
    /// removes everything; prefer [`Connection::purge`] for that.
    fn delete(
        &mut self,
        data_ref: &DataRef,
        conditions: &[Condition],
        combinator: Combinator,
    ) -> Result<u64>;

    /// Removes every record of the namespace, or of every namespace in the
    /// database when no namespace is given.
    fn purge(&mut self, data_ref: &DataRef) -> Result<u64>;

    fn create(&mut self, data_ref: &DataRef, fields: &[Field]) -> Result<()>;

    fn create_db(&mut self, data_ref: &DataRef) -> Result<()>;

    fn drop_entity(&mut self, data_ref: &DataRef) -> Result<()>;

    fn drop_db(&mut self, data_ref: &DataRef) -> Result<()>;

    fn close(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Most recent failure raised by the session, which may predate the
    /// last call.
    fn last_error(&self) -> Option<DbError>;

    fn driver_type(&self) -> DriverType;
}

/// Fails with a translation error unless fields and values pair up.
pub(crate) fn check_pairs(fields: &[Field], values: &[Value]) -> Result<()> {
    if fields.len() != values.len() {
        return Err(DbError::translation(format!(
            "Columns and values must have same length: {} <> {}",
            fields.len(),
            values.len()
        )));
    }
    if fields.is_empty() {
        return Err(DbError::translation(
            "statement needs a non-empty list of columns and values",
        ));
    }
    Ok(())
}

pub(crate) fn warn_unconditional(
    operation: &'static str,
    data_ref: &DataRef,
    conditions: &[Condition],
) {
    if conditions.is_empty() {
        tracing::warn!(
            operation,
            database = %data_ref.database,
            namespace = %data_ref.namespace,
            "no conditions given, statement targets every record"
        );
    }
}
