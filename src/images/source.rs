use async_trait::async_trait;
use sqlx::{Pool, Sqlite};

use crate::cache::key::ImageOwnerKind;

/// Collaborator handing the pipeline the raw stored bytes for an owner.
///
/// A missing owner and an owner with no image set are both `None`; neither
/// is an error.
#[async_trait]
pub trait OriginalBytesSource: Send + Sync {
    async fn fetch(&self, kind: ImageOwnerKind, id: &str) -> Result<Option<Vec<u8>>, sqlx::Error>;
}

/// Reads image BLOB columns straight from the entity tables.
#[derive(Clone)]
pub struct DbOriginalBytesSource {
    pool: Pool<Sqlite>,
}

impl DbOriginalBytesSource {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OriginalBytesSource for DbOriginalBytesSource {
    async fn fetch(&self, kind: ImageOwnerKind, id: &str) -> Result<Option<Vec<u8>>, sqlx::Error> {
        let query = match kind {
            ImageOwnerKind::Recipe => "SELECT image FROM recipes WHERE id = ?",
            ImageOwnerKind::Step => "SELECT image FROM steps WHERE id = ?",
            ImageOwnerKind::Avatar => "SELECT avatar FROM users WHERE id = ?",
        };

        let row: Option<Option<Vec<u8>>> = sqlx::query_scalar(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        // Missing row, NULL column, and zero-length blob all mean "no image"
        Ok(row.flatten().filter(|bytes| !bytes.is_empty()))
    }
}
