pub mod notifications;
pub mod payments;
pub mod presence;
pub mod reviews;
pub mod sessions;
pub mod users;

use seerline::domain::value_objects::enums::roles::Role;
use uuid::Uuid;

use crate::auth::AuthUser;

/// Authenticated caller as the use cases see it.
#[derive(Debug, Clone, Copy)]
pub struct Subject {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<&AuthUser> for Subject {
    fn from(auth: &AuthUser) -> Self {
        Self {
            user_id: auth.user_id,
            role: auth.role,
        }
    }
}
