use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document, RawDocumentBuf};
use mongodb::options::ClientOptions;
use mongodb::Client;

/// The live document-store session a [`super::MongoConnection`] wraps.
///
/// Arguments are owned so implementations can move them into the
/// returned future.
#[async_trait]
pub trait DocumentSession: Send {
    async fn find(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
        projection: Option<Document>,
    ) -> anyhow::Result<Vec<RawDocumentBuf>>;

    /// Returns the number of inserted documents.
    async fn insert_many(
        &mut self,
        database: String,
        collection: String,
        documents: Vec<Document>,
    ) -> anyhow::Result<u64>;

    /// Returns the number of modified documents.
    async fn update_many(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
        update: Document,
    ) -> anyhow::Result<u64>;

    async fn delete_many(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
    ) -> anyhow::Result<u64>;

    async fn count_documents(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
    ) -> anyhow::Result<u64>;

    async fn create_collection(
        &mut self,
        database: String,
        collection: String,
    ) -> anyhow::Result<()>;

    async fn drop_collection(&mut self, database: String, collection: String) -> anyhow::Result<()>;

    async fn drop_database(&mut self, database: String) -> anyhow::Result<()>;

    async fn list_collections(&mut self, database: String) -> anyhow::Result<Vec<String>>;

    async fn close(self: Box<Self>) -> anyhow::Result<()>;
}

/// Session backed by a `mongodb` client.
pub struct MongoSession {
    client: Client,
}

impl MongoSession {
    /// Builds the client and pings the server once, so an unreachable
    /// deployment fails here rather than on the first operation.
    pub async fn open(options: ClientOptions) -> anyhow::Result<Self> {
        let client = Client::with_options(options)?;
        client.database("admin").run_command(doc! { "ping": 1 }).await?;
        Ok(Self { client })
    }

    fn collection<T: Send + Sync>(
        &self,
        database: &str,
        collection: &str,
    ) -> mongodb::Collection<T> {
        self.client.database(database).collection(collection)
    }
}

#[async_trait]
impl DocumentSession for MongoSession {
    async fn find(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
        projection: Option<Document>,
    ) -> anyhow::Result<Vec<RawDocumentBuf>> {
        let collection = self.collection::<RawDocumentBuf>(&database, &collection);
        let mut find = collection.find(filter);
        if let Some(projection) = projection {
            find = find.projection(projection);
        }
        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_many(
        &mut self,
        database: String,
        collection: String,
        documents: Vec<Document>,
    ) -> anyhow::Result<u64> {
        let result = self
            .collection::<Document>(&database, &collection)
            .insert_many(documents)
            .await?;
        Ok(result.inserted_ids.len() as u64)
    }

    async fn update_many(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
        update: Document,
    ) -> anyhow::Result<u64> {
        let result = self
            .collection::<Document>(&database, &collection)
            .update_many(filter, update)
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_many(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
    ) -> anyhow::Result<u64> {
        let result = self
            .collection::<Document>(&database, &collection)
            .delete_many(filter)
            .await?;
        Ok(result.deleted_count)
    }

    async fn count_documents(
        &mut self,
        database: String,
        collection: String,
        filter: Document,
    ) -> anyhow::Result<u64> {
        Ok(self
            .collection::<Document>(&database, &collection)
            .count_documents(filter)
            .await?)
    }

    async fn create_collection(
        &mut self,
        database: String,
        collection: String,
    ) -> anyhow::Result<()> {
        self.client.database(&database).create_collection(collection).await?;
        Ok(())
    }

    async fn drop_collection(
        &mut self,
        database: String,
        collection: String,
    ) -> anyhow::Result<()> {
        self.collection::<Document>(&database, &collection).drop().await?;
        Ok(())
    }

    async fn drop_database(&mut self, database: String) -> anyhow::Result<()> {
        self.client.database(&database).drop().await?;
        Ok(())
    }

    async fn list_collections(&mut self, database: String) -> anyhow::Result<Vec<String>> {
        Ok(self.client.database(&database).list_collection_names().await?)
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        self.client.shutdown().await;
        Ok(())
    }
}
