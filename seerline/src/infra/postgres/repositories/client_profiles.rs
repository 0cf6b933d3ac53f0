use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::client_profiles::ClientProfileEntity;
use crate::domain::repositories::client_profiles::ClientProfileRepository;
use crate::infra::postgres::postgres_connection::PgPoolSquad;
use crate::infra::postgres::schema::client_profiles;

pub struct ClientProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ClientProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ClientProfileRepository for ClientProfilePostgres {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<ClientProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let profile = client_profiles::table
            .find(user_id)
            .first::<ClientProfileEntity>(&mut conn)
            .optional()?;

        Ok(profile)
    }
}
