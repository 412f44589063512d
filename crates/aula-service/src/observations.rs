use aula_core::observation::{CreateObservation, Observation, UpdateObservation};
use aula_core::User;

use crate::{AcademicService, ServiceError};

impl AcademicService {
    /// Stamped with the active period's number. One per student, teacher
    /// and period.
    pub async fn create_observation(
        &self,
        actor: &User,
        input: &CreateObservation,
    ) -> Result<Observation, ServiceError> {
        self.db.get_student(input.student_id).await?;
        let period = self.require_active_period().await?;
        let number = period.number().ok_or_else(|| {
            ServiceError::Configuration(format!(
                "active period name '{}' is not a term number 1-4",
                period.name
            ))
        })?;
        self.db
            .create_observation(actor.id, number, input)
            .await
            .map_err(|e| match e {
                aula_db::DbError::Conflict(_) => ServiceError::Conflict(format!(
                    "an observation for student {} in period {number} already exists",
                    input.student_id
                )),
                e => e.into(),
            })
    }

    /// Observations in the active period; empty when none is usable.
    pub async fn current_observations(&self, student_id: i64) -> Result<Vec<Observation>, ServiceError> {
        self.db.get_student(student_id).await?;
        let number = match self.db.get_active_period().await? {
            Some(period) => period.number(),
            None => None,
        };
        match number {
            Some(n) => Ok(self.db.list_observations(student_id, Some(n)).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn observation_history(&self, student_id: i64) -> Result<Vec<Observation>, ServiceError> {
        self.db.get_student(student_id).await?;
        Ok(self.db.list_observations(student_id, None).await?)
    }

    pub async fn get_observation(&self, id: i64) -> Result<Observation, ServiceError> {
        Ok(self.db.get_observation(id).await?)
    }

    pub async fn update_observation(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateObservation,
    ) -> Result<Observation, ServiceError> {
        let observation = self.db.get_observation(id).await?;
        require_author_unless_admin(actor, &observation)?;
        Ok(self.db.update_observation(id, update).await?)
    }

    pub async fn delete_observation(&self, actor: &User, id: i64) -> Result<(), ServiceError> {
        let observation = self.db.get_observation(id).await?;
        require_author_unless_admin(actor, &observation)?;
        Ok(self.db.delete_observation(id).await?)
    }
}

fn require_author_unless_admin(actor: &User, observation: &Observation) -> Result<(), ServiceError> {
    if actor.is_admin() || actor.id == observation.teacher_id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "only the author may change this observation".into(),
        ))
    }
}
