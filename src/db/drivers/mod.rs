//! Backend drivers, each compiled only with its cargo feature.

#[cfg(feature = "mongodb")]
pub mod mongo;

#[cfg(feature = "mysql")]
pub mod mysql;
