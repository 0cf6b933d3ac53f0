use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::reader_profiles::ReaderProfileEntity;
use crate::domain::value_objects::enums::reader_statuses::ReaderStatus;
use crate::domain::value_objects::presence::OnlineReaderModel;

#[automock]
#[async_trait]
pub trait ReaderProfileRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<ReaderProfileEntity>>;

    async fn list_online(&self) -> Result<Vec<OnlineReaderModel>>;

    /// Compare-and-set on the presence column under a row lock. Returns
    /// false when the observed status was not one of `expected`, which is
    /// how a lost accept race or a stale self-transition surfaces.
    async fn set_status_if(
        &self,
        reader_id: Uuid,
        expected: Vec<ReaderStatus>,
        next: ReaderStatus,
    ) -> Result<bool>;
}
