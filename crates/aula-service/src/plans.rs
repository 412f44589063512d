//! Lesson plans, the comments administrators leave on them, and featured plans.

use tracing::info;

use aula_core::featured_plan::{CreateFeaturedPlan, FeaturedPlanDetail, UpdateFeaturedPlan};
use aula_core::lesson_plan::{
    CreateLessonPlan, LessonPlan, LessonPlanFilter, NewLessonPlan, UpdateLessonPlan,
};
use aula_core::plan_comment::{self, CreatePlanComment, PlanComment, PlanCommentFilter};
use aula_core::{AttachmentKind, User};

use crate::access::{
    require_admin, require_author_or_principal, require_owner, require_owner_or_admin,
    require_teacher,
};
use crate::{AcademicService, FileUpload, RemoteCleanup, ServiceError};

impl AcademicService {
    // -- Lesson plans --

    /// Teachers are always restricted to their own plans.
    pub async fn list_lesson_plans(
        &self,
        actor: &User,
        filter: &LessonPlanFilter,
    ) -> Result<Vec<LessonPlan>, ServiceError> {
        let mut filter = filter.clone();
        if actor.is_teacher() {
            filter.teacher_id = Some(actor.id);
        }
        Ok(self.db.list_lesson_plans(&filter).await?)
    }

    pub async fn my_lesson_plans(
        &self,
        actor: &User,
        period_id: Option<i64>,
    ) -> Result<Vec<LessonPlan>, ServiceError> {
        require_teacher(actor)?;
        let filter = LessonPlanFilter {
            teacher_id: Some(actor.id),
            period_id,
            ..Default::default()
        };
        Ok(self.db.list_lesson_plans(&filter).await?)
    }

    pub async fn get_lesson_plan(&self, id: i64) -> Result<LessonPlan, ServiceError> {
        Ok(self.db.get_lesson_plan(id).await?)
    }

    pub async fn create_lesson_plan(
        &self,
        actor: &User,
        input: &CreateLessonPlan,
        file: FileUpload,
    ) -> Result<LessonPlan, ServiceError> {
        require_teacher(actor)?;
        let site_id = actor.site_id.ok_or_else(|| {
            ServiceError::Validation("teacher has no site assigned".into())
        })?;
        self.db.get_subject(input.subject_id).await?;
        let period = self.require_active_period().await?;
        input.validate()?;

        let attachment = self
            .upload_attachment(AttachmentKind::LessonPlan, file)
            .await?;
        let new_plan = NewLessonPlan {
            teacher_id: actor.id,
            subject_id: input.subject_id,
            site_id,
            period_id: period.id,
            title: input.title.trim().to_string(),
            attachment,
        };
        let result = self.db.create_lesson_plan(&new_plan).await;
        let plan = self
            .commit_or_discard(Some(&new_plan.attachment), result)
            .await?;
        info!(plan_id = plan.id, teacher_id = actor.id, period = %period.name, "lesson plan submitted");
        Ok(plan)
    }

    /// Field changes and an optional replacement file. The old object is
    /// removed only after the new one is recorded.
    pub async fn update_lesson_plan(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateLessonPlan,
        file: Option<FileUpload>,
    ) -> Result<LessonPlan, ServiceError> {
        let current = self.db.get_lesson_plan(id).await?;
        require_owner(actor, current.teacher_id, "lesson plan")?;
        update.validate()?;
        if let Some(subject_id) = update.subject_id {
            self.db.get_subject(subject_id).await?;
        }
        if let Some(period_id) = update.period_id {
            self.db.get_period(period_id).await?;
        }

        let fresh = match file {
            Some(file) => Some(
                self.upload_attachment(AttachmentKind::LessonPlan, file)
                    .await?,
            ),
            None => None,
        };
        let result = self.db.update_lesson_plan(id, update, fresh.as_ref()).await;
        let plan = self.commit_or_discard(fresh.as_ref(), result).await?;
        if fresh.is_some() {
            self.remove_remote(&current.attachment.remote_id).await;
        }
        Ok(plan)
    }

    pub async fn delete_lesson_plan(
        &self,
        actor: &User,
        id: i64,
    ) -> Result<RemoteCleanup, ServiceError> {
        let plan = self.db.get_lesson_plan(id).await?;
        require_owner_or_admin(actor, plan.teacher_id, "lesson plan")?;
        let cleanup = self.remove_remote(&plan.attachment.remote_id).await;
        self.db.delete_lesson_plan(id).await?;
        info!(plan_id = id, actor_id = actor.id, "lesson plan deleted");
        Ok(cleanup)
    }

    // -- Plan comments --

    pub async fn list_plan_comments(
        &self,
        actor: &User,
        filter: &PlanCommentFilter,
    ) -> Result<Vec<PlanComment>, ServiceError> {
        let mut filter = filter.clone();
        if actor.is_teacher() {
            filter.plan_teacher_id = Some(actor.id);
        }
        Ok(self.db.list_plan_comments(&filter).await?)
    }

    pub async fn list_comments_for_plan(
        &self,
        actor: &User,
        plan_id: i64,
    ) -> Result<Vec<PlanComment>, ServiceError> {
        self.db.get_lesson_plan(plan_id).await?;
        let filter = PlanCommentFilter {
            plan_id: Some(plan_id),
            ..Default::default()
        };
        self.list_plan_comments(actor, &filter).await
    }

    pub async fn get_plan_comment(&self, id: i64) -> Result<PlanComment, ServiceError> {
        Ok(self.db.get_plan_comment(id).await?)
    }

    pub async fn create_plan_comment(
        &self,
        actor: &User,
        input: &CreatePlanComment,
    ) -> Result<PlanComment, ServiceError> {
        require_admin(actor)?;
        plan_comment::validate_content(&input.content)?;
        self.db.get_lesson_plan(input.plan_id).await?;
        Ok(self.db.create_plan_comment(actor.id, input).await?)
    }

    pub async fn update_plan_comment(
        &self,
        actor: &User,
        id: i64,
        content: &str,
    ) -> Result<PlanComment, ServiceError> {
        let comment = self.db.get_plan_comment(id).await?;
        require_owner(actor, comment.author_id, "comment")?;
        plan_comment::validate_content(content)?;
        Ok(self.db.update_plan_comment(id, content).await?)
    }

    pub async fn delete_plan_comment(&self, actor: &User, id: i64) -> Result<(), ServiceError> {
        let comment = self.db.get_plan_comment(id).await?;
        require_author_or_principal(actor, comment.author_id, "comment")?;
        Ok(self.db.delete_plan_comment(id).await?)
    }

    // -- Featured plans --

    pub async fn list_featured_plans(
        &self,
        only_active: bool,
    ) -> Result<Vec<FeaturedPlanDetail>, ServiceError> {
        Ok(self.db.list_featured_plans(only_active).await?)
    }

    pub async fn get_featured_plan(&self, id: i64) -> Result<FeaturedPlanDetail, ServiceError> {
        Ok(self.db.get_featured_plan(id).await?)
    }

    pub async fn create_featured_plan(
        &self,
        actor: &User,
        input: &CreateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, ServiceError> {
        require_admin(actor)?;
        input.validate()?;
        self.db.get_lesson_plan(input.plan_id).await?;
        let featured = self.db.create_featured_plan(actor.id, input).await?;
        info!(plan_id = input.plan_id, actor_id = actor.id, "plan featured");
        Ok(featured)
    }

    pub async fn update_featured_plan(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, ServiceError> {
        let current = self.db.get_featured_plan(id).await?;
        require_author_or_principal(actor, current.featured.featured_by, "featured plan")?;
        update.validate()?;
        Ok(self.db.update_featured_plan(id, update).await?)
    }

    pub async fn record_featured_view(&self, id: i64) -> Result<FeaturedPlanDetail, ServiceError> {
        Ok(self.db.increment_featured_views(id).await?)
    }

    pub async fn delete_featured_plan(&self, actor: &User, id: i64) -> Result<(), ServiceError> {
        let current = self.db.get_featured_plan(id).await?;
        require_author_or_principal(actor, current.featured.featured_by, "featured plan")?;
        Ok(self.db.delete_featured_plan(id).await?)
    }
}
