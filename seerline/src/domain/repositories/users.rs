use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::users::{SyncUserEntity, UserEntity};

#[automock]
#[async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;
    /// Upserts the user row on first contact from the identity
    /// collaborator, creating the role profile alongside it.
    async fn sync_identity(&self, sync_user_entity: SyncUserEntity) -> Result<UserEntity>;

    /// Operators who receive failure notifications from background jobs.
    async fn find_admins(&self) -> Result<Vec<UserEntity>>;
}
