use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::client_profiles::ClientProfileEntity;

#[automock]
#[async_trait]
pub trait ClientProfileRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<ClientProfileEntity>>;
}
