//! Image repository
//!
//! Keeps uploaded image payloads in memory, indexed by image ID and by owning
//! session so a session's images can be evicted together with it.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::StoredImage;

/// Image repository trait
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Store a batch of images under a single lock acquisition
    async fn insert_batch(&self, images: Vec<StoredImage>) -> Result<Vec<Arc<StoredImage>>>;

    /// Get image by ID
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Arc<StoredImage>>>;

    /// Remove every image owned by a session, returning how many were removed
    async fn delete_by_session(&self, session_id: Uuid) -> Result<usize>;

    /// Sessions that currently own at least one entry
    async fn session_ids(&self) -> Result<Vec<Uuid>>;

    /// Number of stored images
    async fn count(&self) -> Result<usize>;
}

#[derive(Default)]
struct ImageTable {
    images: HashMap<Uuid, Arc<StoredImage>>,
    by_session: HashMap<Uuid, Vec<Uuid>>,
}

/// In-memory image repository
#[derive(Default)]
pub struct MemoryImageRepository {
    table: RwLock<ImageTable>,
}

impl MemoryImageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn ImageRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl ImageRepository for MemoryImageRepository {
    async fn insert_batch(&self, images: Vec<StoredImage>) -> Result<Vec<Arc<StoredImage>>> {
        let mut table = self.table.write().await;
        let mut stored = Vec::with_capacity(images.len());
        for image in images {
            let image = Arc::new(image);
            table
                .by_session
                .entry(image.session_id)
                .or_default()
                .push(image.id);
            table.images.insert(image.id, image.clone());
            stored.push(image);
        }
        Ok(stored)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Arc<StoredImage>>> {
        Ok(self.table.read().await.images.get(&id).cloned())
    }

    async fn delete_by_session(&self, session_id: Uuid) -> Result<usize> {
        let mut table = self.table.write().await;
        let ids = table.by_session.remove(&session_id).unwrap_or_default();
        let mut removed = 0;
        for id in ids {
            if table.images.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn session_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.table.read().await.by_session.keys().copied().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.table.read().await.images.len())
    }
}
