//! In-memory backend sessions shared by the integration tests.
#![allow(dead_code)]

#[cfg(feature = "mongodb")]
pub mod documents;

#[cfg(feature = "mysql")]
pub mod sql;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub const TIMEOUT: Duration = Duration::from_secs(2);

pub type Shared<T> = Arc<Mutex<T>>;

pub fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
