use std::collections::HashMap;
use std::sync::Arc;

use super::config::{DbConfig, DriverType};
use super::connection::Connection;
use super::error::{DbError, Result};

/// Opens connections for one backend.
pub trait Driver: Send + Sync {
    fn driver_type(&self) -> DriverType;

    /// Establishes a session and returns it as an open connection.
    fn connect(&self, config: &DbConfig) -> Result<Box<dyn Connection>>;
}

/// Maps driver types to drivers. Registries are plain values; nothing is
/// registered process-wide.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<DriverType, Arc<dyn Driver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every driver compiled into this build.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "mongodb")]
        registry.register(Arc::new(super::drivers::mongo::MongoDriver));

        #[cfg(feature = "mysql")]
        registry.register(Arc::new(super::drivers::mysql::MySqlDriver));

        registry
    }

    /// Adds or replaces the driver for its type.
    pub fn register(&mut self, driver: Arc<dyn Driver>) {
        self.drivers.insert(driver.driver_type(), driver);
    }

    pub fn get(&self, driver_type: DriverType) -> Result<Arc<dyn Driver>> {
        self.drivers
            .get(&driver_type)
            .cloned()
            .ok_or(DbError::DriverNotAvailable(driver_type.feature_name()))
    }

    /// Looks a driver up by case-insensitive name, e.g. `mongo` or `MySQL`.
    pub fn get_by_name(&self, name: &str) -> Result<Arc<dyn Driver>> {
        self.get(name.parse()?)
    }

    pub fn connect(&self, config: &DbConfig) -> Result<Box<dyn Connection>> {
        let driver = self.get(config.driver)?;
        tracing::info!(driver = %config.driver, host = %config.host, "opening connection");
        driver.connect(config)
    }

    pub fn driver_types(&self) -> Vec<DriverType> {
        DriverType::all()
            .iter()
            .copied()
            .filter(|t| self.drivers.contains_key(t))
            .collect()
    }
}
