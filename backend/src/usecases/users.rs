use std::sync::Arc;

use chrono::Utc;
use seerline::domain::entities::users::SyncUserEntity;
use seerline::domain::error::{with_db_retry, CoreResult};
use seerline::domain::repositories::users::UserRepository;
use seerline::domain::value_objects::users::UserModel;
use tracing::info;

use crate::auth::AuthUser;

/// First-contact sync from the identity collaborator: the bearer token is
/// the source of truth for subject, role and display name.
pub struct UserSyncUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
}

impl<U> UserSyncUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn sync(&self, auth: &AuthUser) -> CoreResult<UserModel> {
        let now = Utc::now();
        let sync_user = SyncUserEntity {
            id: auth.user_id,
            identity_subject: auth.user_id.to_string(),
            display_name: auth.display_name.clone(),
            role: auth.role.to_string(),
            created_at: now,
            updated_at: now,
        };
        let user = with_db_retry("users: sync identity", || {
            self.user_repo.sync_identity(sync_user.clone())
        })
        .await?;

        info!(user_id = %user.id, role = %user.role, "users: identity synced");

        Ok(UserModel::from(user))
    }
}
