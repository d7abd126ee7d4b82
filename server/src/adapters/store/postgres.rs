//! PostgreSQL adapter for KeyValueStore
//!
//! Table-backed alternative to the JSON file store; every key is one row of
//! `store_entries`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema, Set};
use serde_json::Value;

use crate::domain::ports::KeyValueStore;
use crate::entity::store_entries;
use crate::error::StoreError;

/// PostgreSQL implementation of KeyValueStore
pub struct PostgresStore {
    db: DatabaseConnection,
    loaded: AtomicBool,
}

impl PostgresStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            loaded: AtomicBool::new(false),
        }
    }

    fn ensure_loaded(&self) -> Result<(), StoreError> {
        if self.loaded.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::NotLoaded)
        }
    }
}

#[async_trait]
impl KeyValueStore for PostgresStore {
    async fn load(&self) -> Result<(), StoreError> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);

        let mut create = schema.create_table_from_entity(store_entries::Entity);
        create.if_not_exists();

        tracing::debug!("Ensuring store_entries table exists");
        self.db.execute(backend.build(&create)).await?;

        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.ensure_loaded()?;

        let row = store_entries::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await?;

        Ok(row.map(|m| m.value))
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.ensure_loaded()?;

        let model = store_entries::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
        };

        store_entries::Entity::insert(model)
            .on_conflict(
                OnConflict::column(store_entries::Column::Key)
                    .update_column(store_entries::Column::Value)
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        // Writes go straight to the table
        self.ensure_loaded()
    }
}
