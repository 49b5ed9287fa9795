pub mod config;
pub mod connection;
pub mod driver;
pub mod drivers;
pub mod error;
pub mod model;
pub(crate) mod session;

pub use config::{DbConfig, DriverType};
pub use connection::Connection;
pub use driver::{Driver, DriverRegistry};
pub use error::{DbError, Result};
