//! The single active period, and the lookups other resources make against it.

use tracing::info;

use aula_core::period::UpdatePeriod;
use aula_core::{Period, PeriodActivationPolicy, User};

use crate::access::require_admin;
use crate::{AcademicService, ServiceError};

impl AcademicService {
    pub async fn list_periods(&self) -> Result<Vec<Period>, ServiceError> {
        Ok(self.db.list_periods().await?)
    }

    pub async fn get_period(&self, id: i64) -> Result<Period, ServiceError> {
        Ok(self.db.get_period(id).await?)
    }

    pub async fn active_period(&self) -> Result<Period, ServiceError> {
        self.db
            .get_active_period()
            .await?
            .ok_or_else(|| ServiceError::NotFound("no period is active".into()))
    }

    /// The active period for resources that are stamped with it.
    pub(crate) async fn require_active_period(&self) -> Result<Period, ServiceError> {
        self.db
            .get_active_period()
            .await?
            .ok_or_else(|| ServiceError::Validation("no active period configured".into()))
    }

    pub async fn update_period(
        &self,
        actor: &User,
        id: i64,
        update: &UpdatePeriod,
    ) -> Result<Period, ServiceError> {
        require_admin(actor)?;
        let period = self
            .db
            .update_period(id, update, self.period_policy)
            .await
            .map_err(|e| match (e, self.period_policy) {
                (aula_db::DbError::Conflict(msg), PeriodActivationPolicy::ExclusiveLock) => {
                    ServiceError::Conflict(format!(
                        "{msg}; deactivate the current period first"
                    ))
                }
                (e, _) => e.into(),
            })?;
        if update.active == Some(true) {
            info!(
                period_id = period.id,
                period = %period.name,
                policy = %self.period_policy,
                actor_id = actor.id,
                "activated period"
            );
        }
        Ok(period)
    }
}
