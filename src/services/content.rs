use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Collection, ContentRecord};

/// Persistence port for the site's content collections. Handlers only see
/// this trait, so the backing store can be swapped or faked in tests.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn insert(
        &self,
        collection: Collection,
        data: serde_json::Value,
        published: bool,
    ) -> anyhow::Result<ContentRecord>;

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        data: Option<serde_json::Value>,
        published: Option<bool>,
    ) -> anyhow::Result<bool>;

    async fn delete(&self, collection: Collection, id: &str) -> anyhow::Result<bool>;

    async fn select(
        &self,
        collection: Collection,
        published_only: bool,
    ) -> anyhow::Result<Vec<ContentRecord>>;

    async fn get(&self, collection: Collection, id: &str) -> anyhow::Result<Option<ContentRecord>>;
}

pub struct SqliteContentStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteContentStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn insert(
        &self,
        collection: Collection,
        data: serde_json::Value,
        published: bool,
    ) -> anyhow::Result<ContentRecord> {
        let db = self.db.lock().unwrap();
        queries::insert_content(&db, collection, &data, published)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        data: Option<serde_json::Value>,
        published: Option<bool>,
    ) -> anyhow::Result<bool> {
        let db = self.db.lock().unwrap();
        queries::update_content(&db, collection, id, data.as_ref(), published)
    }

    async fn delete(&self, collection: Collection, id: &str) -> anyhow::Result<bool> {
        let db = self.db.lock().unwrap();
        queries::delete_content(&db, collection, id)
    }

    async fn select(
        &self,
        collection: Collection,
        published_only: bool,
    ) -> anyhow::Result<Vec<ContentRecord>> {
        let db = self.db.lock().unwrap();
        queries::list_content(&db, collection, published_only)
    }

    async fn get(&self, collection: Collection, id: &str) -> anyhow::Result<Option<ContentRecord>> {
        let db = self.db.lock().unwrap();
        queries::get_content(&db, collection, id)
    }
}
