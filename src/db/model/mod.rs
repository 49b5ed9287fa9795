//! Backend-neutral request and response types shared by every driver.

mod condition;
mod data_ref;
mod result;
mod value;

pub use condition::{Combinator, Condition, OpCode, Operation};
pub use data_ref::{DataRef, Field};
pub use result::{Column, Datum, MetaData, Record, ResultSet, RuntimeType};
pub use value::{DataType, Value};
