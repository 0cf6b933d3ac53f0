use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::users::UserEntity;
use crate::domain::value_objects::enums::roles::Role;

#[derive(Debug, Clone, Serialize)]
pub struct UserModel {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for UserModel {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            display_name: entity.display_name,
            role: Role::from_str(&entity.role).unwrap_or(Role::Client),
            created_at: entity.created_at,
        }
    }
}
