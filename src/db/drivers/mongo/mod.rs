//! MongoDB driver implementation

pub mod filter;
pub mod normalize;
pub mod session;

use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, Credential, ServerAddress, Tls, TlsOptions};
use std::time::Duration;

use crate::db::config::{DbConfig, DriverType};
use crate::db::connection::{check_pairs, warn_unconditional, Connection};
use crate::db::driver::Driver;
use crate::db::error::{DbError, Result};
use crate::db::model::{Combinator, Condition, DataRef, Field, ResultSet, Value};
use crate::db::session::{build_runtime, Session};

pub use session::{DocumentSession, MongoSession};

pub struct MongoDriver;

impl MongoDriver {
    fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("mongodb://") && !url.starts_with("mongodb+srv://") {
            return Err(DbError::InvalidConnectionString(
                "MongoDB connection string must start with mongodb:// or mongodb+srv://".into(),
            ));
        }
        Ok(())
    }

    /// Client options assembled from the individual config fields.
    pub fn options_from_parts(config: &DbConfig) -> Result<ClientOptions> {
        let mut options = ClientOptions::default();
        options.hosts = config
            .host_list()?
            .into_iter()
            .map(|(host, port)| ServerAddress::Tcp { host, port: Some(port) })
            .collect();

        if let Some((username, password)) = config.credentials() {
            let mut credential = Credential::default();
            credential.username = Some(username.to_string());
            credential.password = Some(password.to_string());
            options.credential = Some(credential);
        }

        if config.certificate.is_some() || config.private_key.is_some() {
            let mut tls = TlsOptions::default();
            tls.ca_file_path = config.certificate.clone();
            tls.cert_key_file_path = config.private_key.clone();
            options.tls = Some(Tls::Enabled(tls));
        }

        options.default_database = config.database.clone();
        Self::apply_timeouts(&mut options, config.timeout());
        Ok(options)
    }

    /// Client options from the url override when present, otherwise from parts.
    pub async fn options(config: &DbConfig) -> Result<ClientOptions> {
        let Some(url) = config.url.as_deref().filter(|u| !u.is_empty()) else {
            return Self::options_from_parts(config);
        };
        Self::validate_url(url)?;
        let mut options = ClientOptions::parse(url)
            .await
            .map_err(|e| DbError::InvalidConnectionString(e.to_string()))?;
        Self::apply_timeouts(&mut options, config.timeout());
        Ok(options)
    }

    fn apply_timeouts(options: &mut ClientOptions, timeout: Duration) {
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
    }
}

impl Driver for MongoDriver {
    fn driver_type(&self) -> DriverType {
        DriverType::MongoDb
    }

    fn connect(&self, config: &DbConfig) -> Result<Box<dyn Connection>> {
        if let Some(url) = config.url.as_deref().filter(|u| !u.is_empty()) {
            Self::validate_url(url)?;
        }
        let timeout = config.timeout();
        let runtime = build_runtime()?;

        let session = runtime
            .block_on(async {
                tokio::time::timeout(timeout, async {
                    let options = Self::options(config).await?;
                    MongoSession::open(options)
                        .await
                        .map_err(|e| DbError::Failed(format!("{e:#}")))
                })
                .await
            })
            .map_err(|_| DbError::Failed(format!("connection timeout after {timeout:?}")))??;

        tracing::info!(host = %config.host, "connected to MongoDB");
        Ok(Box::new(MongoConnection {
            session: Session::new(Box::new(session), runtime, timeout),
        }))
    }
}

/// [`Connection`] over a document-store session.
pub struct MongoConnection {
    session: Session<dyn DocumentSession>,
}

/// Database and collection a call targets.
fn collection_target(data_ref: &DataRef) -> Result<(String, String)> {
    if !data_ref.has_database() || !data_ref.has_namespace() {
        return Err(DbError::translation(
            "a database and a collection name are required",
        ));
    }
    Ok((data_ref.database.clone(), data_ref.namespace.clone()))
}

fn documents(values: &[Value]) -> Result<Vec<Document>> {
    if values.is_empty() {
        return Err(DbError::translation("at least one document is required"));
    }
    values.iter().map(filter::to_document).collect()
}

impl MongoConnection {
    /// Wraps an already open session, e.g. one from a custom transport.
    pub fn with_session(session: Box<dyn DocumentSession>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            session: Session::new(session, build_runtime()?, timeout),
        })
    }

    /// Empties one collection and reports how many documents it held.
    fn purge_collection(&mut self, database: String, collection: String) -> Result<u64> {
        let (db, coll) = (database.clone(), collection.clone());
        let count = self
            .session
            .call("purge", move |s| s.count_documents(db, coll, Document::new()))?;
        self.session
            .call("purge", move |s| s.delete_many(database, collection, Document::new()))?;
        Ok(count)
    }
}

impl Connection for MongoConnection {
    fn query(
        &mut self,
        data_ref: &DataRef,
        fields: &[String],
        conditions: &[Condition],
        combinator: Combinator,
    ) -> Result<ResultSet> {
        self.session.ensure_open()?;
        let (database, collection) = collection_target(data_ref)?;
        let filter = filter::compile_filter(conditions, combinator)?;
        let projection = filter::projection(fields);
        tracing::debug!(%filter, ?projection, collection = %collection, "running find");
        let documents = self
            .session
            .call("query", move |s| s.find(database, collection, filter, projection))?;
        Ok(normalize::normalize_documents(data_ref, documents))
    }

    fn insert(&mut self, data_ref: &DataRef, _fields: &[Field], values: &[Value]) -> Result<()> {
        self.session.ensure_open()?;
        let (database, collection) = collection_target(data_ref)?;
        let documents = documents(values)?;
        let inserted = self
            .session
            .call("insert", move |s| s.insert_many(database, collection, documents))?;
        tracing::debug!(inserted, "inserted documents");
        Ok(())
    }

    fn update(
        &mut self,
        data_ref: &DataRef,
        conditions: &[Condition],
        fields: &[Field],
        values: &[Value],
        combinator: Combinator,
    ) -> Result<u64> {
        self.session.ensure_open()?;
        let (database, collection) = collection_target(data_ref)?;
        let updates = if fields.is_empty() {
            documents(values)?
        } else {
            check_pairs(fields, values)?;
            let set: Document = fields
                .iter()
                .zip(values)
                .map(|(field, value)| (field.name.clone(), filter::to_bson(value)))
                .collect();
            vec![doc! { "$set": set }]
        };
        let filter = filter::compile_filter(conditions, combinator)?;
        warn_unconditional("update", data_ref, conditions);

        let mut modified = 0;
        for update in updates {
            tracing::debug!(%filter, %update, "running update");
            let (db, coll, filter) = (database.clone(), collection.clone(), filter.clone());
            modified += self
                .session
                .call("update", move |s| s.update_many(db, coll, filter, update))?;
        }
        Ok(modified)
    }

    fn delete(
        &mut self,
        data_ref: &DataRef,
        conditions: &[Condition],
        combinator: Combinator,
    ) -> Result<u64> {
        self.session.ensure_open()?;
        let (database, collection) = collection_target(data_ref)?;
        let filter = filter::compile_filter(conditions, combinator)?;
        warn_unconditional("delete", data_ref, conditions);
        tracing::debug!(%filter, "running delete");
        self.session
            .call("delete", move |s| s.delete_many(database, collection, filter))
    }

    fn purge(&mut self, data_ref: &DataRef) -> Result<u64> {
        self.session.ensure_open()?;
        if data_ref.has_namespace() {
            let (database, collection) = collection_target(data_ref)?;
            return self.purge_collection(database, collection);
        }
        if !data_ref.has_database() {
            return Err(DbError::translation(
                "Please choose truncate entity between Namespace for Collection \
                 and Database for all Collections",
            ));
        }

        let database = data_ref.database.clone();
        let db = database.clone();
        let collections = self.session.call("purge", move |s| s.list_collections(db))?;
        let mut count = 0;
        for collection in collections {
            tracing::info!(database = %database, collection = %collection, "purging collection");
            count += self.purge_collection(database.clone(), collection)?;
        }
        Ok(count)
    }

    fn create(&mut self, data_ref: &DataRef, _fields: &[Field]) -> Result<()> {
        self.session.ensure_open()?;
        if !data_ref.has_namespace() {
            tracing::info!(database = %data_ref.database, "no collection given, nothing to create");
            return Ok(());
        }
        let (database, collection) = collection_target(data_ref)?;
        self.session
            .call("create", move |s| s.create_collection(database, collection))?;
        tracing::info!(
            database = %data_ref.database,
            collection = %data_ref.namespace,
            "created collection"
        );
        Ok(())
    }

    fn create_db(&mut self, data_ref: &DataRef) -> Result<()> {
        self.session.ensure_open()?;
        tracing::info!(
            database = %data_ref.database,
            "databases are created with their first collection"
        );
        Ok(())
    }

    fn drop_entity(&mut self, data_ref: &DataRef) -> Result<()> {
        self.session.ensure_open()?;
        if !data_ref.has_namespace() {
            return self.drop_db(data_ref);
        }
        let (database, collection) = collection_target(data_ref)?;
        self.session
            .call("drop", move |s| s.drop_collection(database, collection))?;
        tracing::info!(
            database = %data_ref.database,
            collection = %data_ref.namespace,
            "dropped collection"
        );
        Ok(())
    }

    fn drop_db(&mut self, data_ref: &DataRef) -> Result<()> {
        self.session.ensure_open()?;
        if !data_ref.has_database() {
            return Err(DbError::translation("a database name is required"));
        }
        let database = data_ref.database.clone();
        self.session.call("drop_db", move |s| s.drop_database(database))?;
        tracing::info!(database = %data_ref.database, "dropped database");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.session.close(|s| s.close())?;
        tracing::info!("closed MongoDB connection");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.is_open()
    }

    fn last_error(&self) -> Option<DbError> {
        self.session.last_error()
    }

    fn driver_type(&self) -> DriverType {
        DriverType::MongoDb
    }
}
