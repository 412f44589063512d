use tracing::info;

use aula_core::user::{CreateUser, UpdateUser, UserFilter};
use aula_core::User;

use crate::access::require_admin;
use crate::auth::hash_password;
use crate::{AcademicService, ServiceError};

impl AcademicService {
    pub async fn create_user(&self, actor: &User, input: &CreateUser) -> Result<User, ServiceError> {
        require_admin(actor)?;
        self.bootstrap_user(input).await
    }

    /// Create a user with no acting caller. Used by the CLI to seed the
    /// first administrator.
    pub async fn bootstrap_user(&self, input: &CreateUser) -> Result<User, ServiceError> {
        input.validate()?;
        if let Some(site_id) = input.site_id {
            self.db.get_site(site_id).await?;
        }
        let user = self
            .db
            .create_user(input, &hash_password(&input.password))
            .await?;
        info!(user_id = user.id, role = %user.role, "created user");
        Ok(user)
    }

    pub async fn list_users(&self, actor: &User, filter: &UserFilter) -> Result<Vec<User>, ServiceError> {
        require_admin(actor)?;
        Ok(self.db.list_users(filter).await?)
    }

    pub async fn get_user(&self, actor: &User, id: i64) -> Result<User, ServiceError> {
        if actor.id != id {
            require_admin(actor)?;
        }
        Ok(self.db.get_user(id).await?)
    }

    pub async fn update_user(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateUser,
    ) -> Result<User, ServiceError> {
        require_admin(actor)?;
        update.validate()?;
        self.db.get_user(id).await?;
        if let Some(Some(site_id)) = update.site_id {
            self.db.get_site(site_id).await?;
        }
        let hash = update.password.as_deref().map(hash_password);
        Ok(self.db.update_user(id, update, hash.as_deref()).await?)
    }

    pub async fn user_count(&self) -> Result<i64, ServiceError> {
        Ok(self.db.count_users().await?)
    }
}
