//! Backend-agnostic data access over a document store and a relational
//! engine.
//!
//! Open a [`Connection`] through a [`DriverRegistry`], then read and write
//! records with [`DataRef`] targets and [`Condition`] lists:
//!
//! ```no_run
//! use chambers_data::{Combinator, Condition, DataRef, DbConfig, DriverRegistry, DriverType};
//!
//! # fn main() -> chambers_data::Result<()> {
//! let registry = DriverRegistry::with_defaults();
//! let mut conn = registry.connect(&DbConfig::new(DriverType::MongoDb))?;
//! let people = DataRef::new("test", "people");
//! let torellis = [Condition::equals("surname", "Torelli")];
//! let found = conn.query(&people, &[], &torellis, Combinator::And)?;
//! println!("{} records", found.lines);
//! conn.close()?;
//! # Ok(())
//! # }
//! ```

pub mod db;

pub use db::model::{
    Column, Combinator, Condition, DataRef, DataType, Datum, Field, MetaData, OpCode, Operation,
    Record, ResultSet, RuntimeType, Value,
};
pub use db::{Connection, DbConfig, DbError, Driver, DriverRegistry, DriverType, Result};
