pub(crate) mod migrations;
pub mod queries;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use aula_core::announcement::{Announcement, CreateAnnouncement, UpdateAnnouncement};
use aula_core::area::{Area, CreateArea, UpdateArea};
use aula_core::attachment::{Attachment, AttachmentChange};
use aula_core::evidence::{CreateEvidence, Evidence};
use aula_core::featured_plan::{CreateFeaturedPlan, FeaturedPlanDetail, UpdateFeaturedPlan};
use aula_core::grade::{CreateGrade, Grade, UpdateGrade};
use aula_core::group::{CreateGroup, Group, UpdateGroup};
use aula_core::lesson_plan::{LessonPlan, LessonPlanFilter, NewLessonPlan, UpdateLessonPlan};
use aula_core::observation::{CreateObservation, Observation, UpdateObservation};
use aula_core::period::{Period, PeriodActivationPolicy, UpdatePeriod};
use aula_core::plan_comment::{CreatePlanComment, PlanComment, PlanCommentFilter};
use aula_core::project::{CreateProject, Project, ProjectFilter, UpdateProject};
use aula_core::project_comment::{CommentTarget, ProjectComment};
use aula_core::site::{CreateSite, Site, UpdateSite};
use aula_core::student::{CreateStudent, Student, UpdateStudent};
use aula_core::subject::{CreateSubject, Subject, SubjectFilter, UpdateSubject};
use aula_core::user::{CreateUser, UpdateUser, User, UserFilter};

use crate::{Database, DbError};

/// Map a sqlx::Error onto `DbError`, keeping constraint classes apart.
pub(crate) fn pg_err(e: sqlx::Error) -> DbError {
    if let Some(db_err) = e.as_database_error() {
        let message = db_err.message().to_string();
        match db_err.code().as_deref() {
            Some("23505") => return DbError::Conflict(message),
            Some("23503") => return DbError::ForeignKey(message),
            Some("23514") => return DbError::Constraint(message),
            _ => {}
        }
    }
    DbError::Internal(e.to_string())
}

/// Create a DbError::NotFound with the given entity description.
pub(crate) fn pg_not_found(entity: &str) -> DbError {
    DbError::NotFound(entity.to_string())
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pub(crate) pool: PgPool,
}

impl PostgresDatabase {
    /// Connect to a Postgres database and run migrations.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(pg_err)?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        Ok(db)
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    // -- Users --
    async fn create_user(&self, input: &CreateUser, password_hash: &str) -> Result<User, DbError> {
        self.pg_create_user(input, password_hash).await
    }
    async fn get_user(&self, id: i64) -> Result<User, DbError> {
        self.pg_get_user(id).await
    }
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, DbError> {
        self.pg_list_users(filter).await
    }
    async fn update_user(
        &self,
        id: i64,
        update: &UpdateUser,
        password_hash: Option<&str>,
    ) -> Result<User, DbError> {
        self.pg_update_user(id, update, password_hash).await
    }
    async fn find_credentials(
        &self,
        national_id: &str,
    ) -> Result<Option<(User, String)>, DbError> {
        self.pg_find_credentials(national_id).await
    }
    async fn count_users(&self) -> Result<i64, DbError> {
        self.pg_count_users().await
    }

    // -- Sessions --
    async fn create_session(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.pg_create_session(user_id, token_hash, expires_at).await
    }
    async fn find_session_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, DbError> {
        self.pg_find_session_user(token_hash, now).await
    }
    async fn delete_session(&self, token_hash: &str) -> Result<(), DbError> {
        self.pg_delete_session(token_hash).await
    }
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        self.pg_purge_expired_sessions(now).await
    }

    // -- Sites --
    async fn create_site(&self, input: &CreateSite) -> Result<Site, DbError> {
        self.pg_create_site(input).await
    }
    async fn get_site(&self, id: i64) -> Result<Site, DbError> {
        self.pg_get_site(id).await
    }
    async fn list_sites(&self) -> Result<Vec<Site>, DbError> {
        self.pg_list_sites().await
    }
    async fn update_site(&self, id: i64, update: &UpdateSite) -> Result<Site, DbError> {
        self.pg_update_site(id, update).await
    }
    async fn delete_site(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_site(id).await
    }

    // -- Areas --
    async fn create_area(&self, input: &CreateArea) -> Result<Area, DbError> {
        self.pg_create_area(input).await
    }
    async fn get_area(&self, id: i64) -> Result<Area, DbError> {
        self.pg_get_area(id).await
    }
    async fn list_areas(&self) -> Result<Vec<Area>, DbError> {
        self.pg_list_areas().await
    }
    async fn update_area(&self, id: i64, update: &UpdateArea) -> Result<Area, DbError> {
        self.pg_update_area(id, update).await
    }
    async fn delete_area(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_area(id).await
    }

    // -- Subjects --
    async fn create_subject(&self, input: &CreateSubject) -> Result<Subject, DbError> {
        self.pg_create_subject(input).await
    }
    async fn get_subject(&self, id: i64) -> Result<Subject, DbError> {
        self.pg_get_subject(id).await
    }
    async fn list_subjects(&self, filter: &SubjectFilter) -> Result<Vec<Subject>, DbError> {
        self.pg_list_subjects(filter).await
    }
    async fn update_subject(&self, id: i64, update: &UpdateSubject) -> Result<Subject, DbError> {
        self.pg_update_subject(id, update).await
    }
    async fn delete_subject(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_subject(id).await
    }
    async fn assign_subject_teacher(
        &self,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        self.pg_assign_subject_teacher(subject_id, teacher_id).await
    }
    async fn unassign_subject_teacher(
        &self,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        self.pg_unassign_subject_teacher(subject_id, teacher_id).await
    }

    // -- Grades --
    async fn create_grade(&self, input: &CreateGrade) -> Result<Grade, DbError> {
        self.pg_create_grade(input).await
    }
    async fn get_grade(&self, id: i64) -> Result<Grade, DbError> {
        self.pg_get_grade(id).await
    }
    async fn list_grades(&self, site_id: Option<i64>) -> Result<Vec<Grade>, DbError> {
        self.pg_list_grades(site_id).await
    }
    async fn update_grade(&self, id: i64, update: &UpdateGrade) -> Result<Grade, DbError> {
        self.pg_update_grade(id, update).await
    }
    async fn delete_grade(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_grade(id).await
    }

    // -- Groups --
    async fn create_group(&self, input: &CreateGroup) -> Result<Group, DbError> {
        self.pg_create_group(input).await
    }
    async fn get_group(&self, id: i64) -> Result<Group, DbError> {
        self.pg_get_group(id).await
    }
    async fn list_groups(&self, grade_id: Option<i64>) -> Result<Vec<Group>, DbError> {
        self.pg_list_groups(grade_id).await
    }
    async fn update_group(&self, id: i64, update: &UpdateGroup) -> Result<Group, DbError> {
        self.pg_update_group(id, update).await
    }
    async fn delete_group(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_group(id).await
    }
    async fn assign_group_director(&self, group_id: i64, teacher_id: i64) -> Result<(), DbError> {
        self.pg_assign_group_director(group_id, teacher_id).await
    }
    async fn unassign_group_director(
        &self,
        group_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        self.pg_unassign_group_director(group_id, teacher_id).await
    }
    async fn is_group_director(&self, group_id: i64, teacher_id: i64) -> Result<bool, DbError> {
        self.pg_is_group_director(group_id, teacher_id).await
    }

    // -- Students --
    async fn create_student(&self, input: &CreateStudent) -> Result<Student, DbError> {
        self.pg_create_student(input).await
    }
    async fn get_student(&self, id: i64) -> Result<Student, DbError> {
        self.pg_get_student(id).await
    }
    async fn list_students(&self, group_id: Option<i64>) -> Result<Vec<Student>, DbError> {
        self.pg_list_students(group_id).await
    }
    async fn update_student(&self, id: i64, update: &UpdateStudent) -> Result<Student, DbError> {
        self.pg_update_student(id, update).await
    }
    async fn delete_student(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_student(id).await
    }

    // -- Periods --
    async fn list_periods(&self) -> Result<Vec<Period>, DbError> {
        self.pg_list_periods().await
    }
    async fn get_period(&self, id: i64) -> Result<Period, DbError> {
        self.pg_get_period(id).await
    }
    async fn get_active_period(&self) -> Result<Option<Period>, DbError> {
        self.pg_get_active_period().await
    }
    async fn update_period(
        &self,
        id: i64,
        update: &UpdatePeriod,
        policy: PeriodActivationPolicy,
    ) -> Result<Period, DbError> {
        self.pg_update_period(id, update, policy).await
    }

    // -- Lesson plans --
    async fn create_lesson_plan(&self, input: &NewLessonPlan) -> Result<LessonPlan, DbError> {
        self.pg_create_lesson_plan(input).await
    }
    async fn get_lesson_plan(&self, id: i64) -> Result<LessonPlan, DbError> {
        self.pg_get_lesson_plan(id).await
    }
    async fn list_lesson_plans(
        &self,
        filter: &LessonPlanFilter,
    ) -> Result<Vec<LessonPlan>, DbError> {
        self.pg_list_lesson_plans(filter).await
    }
    async fn update_lesson_plan(
        &self,
        id: i64,
        update: &UpdateLessonPlan,
        attachment: Option<&Attachment>,
    ) -> Result<LessonPlan, DbError> {
        self.pg_update_lesson_plan(id, update, attachment).await
    }
    async fn delete_lesson_plan(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_lesson_plan(id).await
    }

    // -- Plan comments --
    async fn create_plan_comment(
        &self,
        author_id: i64,
        input: &CreatePlanComment,
    ) -> Result<PlanComment, DbError> {
        self.pg_create_plan_comment(author_id, input).await
    }
    async fn get_plan_comment(&self, id: i64) -> Result<PlanComment, DbError> {
        self.pg_get_plan_comment(id).await
    }
    async fn list_plan_comments(
        &self,
        filter: &PlanCommentFilter,
    ) -> Result<Vec<PlanComment>, DbError> {
        self.pg_list_plan_comments(filter).await
    }
    async fn update_plan_comment(&self, id: i64, content: &str) -> Result<PlanComment, DbError> {
        self.pg_update_plan_comment(id, content).await
    }
    async fn delete_plan_comment(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_plan_comment(id).await
    }

    // -- Featured plans --
    async fn create_featured_plan(
        &self,
        featured_by: i64,
        input: &CreateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, DbError> {
        self.pg_create_featured_plan(featured_by, input).await
    }
    async fn get_featured_plan(&self, id: i64) -> Result<FeaturedPlanDetail, DbError> {
        self.pg_get_featured_plan(id).await
    }
    async fn list_featured_plans(
        &self,
        only_active: bool,
    ) -> Result<Vec<FeaturedPlanDetail>, DbError> {
        self.pg_list_featured_plans(only_active).await
    }
    async fn update_featured_plan(
        &self,
        id: i64,
        update: &UpdateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, DbError> {
        self.pg_update_featured_plan(id, update).await
    }
    async fn increment_featured_views(&self, id: i64) -> Result<FeaturedPlanDetail, DbError> {
        self.pg_increment_featured_views(id).await
    }
    async fn delete_featured_plan(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_featured_plan(id).await
    }

    // -- Projects --
    async fn create_project(
        &self,
        teacher_id: i64,
        input: &CreateProject,
        attachment: Option<&Attachment>,
    ) -> Result<Project, DbError> {
        self.pg_create_project(teacher_id, input, attachment).await
    }
    async fn get_project(&self, id: i64) -> Result<Project, DbError> {
        self.pg_get_project(id).await
    }
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, DbError> {
        self.pg_list_projects(filter).await
    }
    async fn update_project(
        &self,
        id: i64,
        update: &UpdateProject,
        attachment: &AttachmentChange,
    ) -> Result<Project, DbError> {
        self.pg_update_project(id, update, attachment).await
    }
    async fn delete_project(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_project(id).await
    }

    // -- Evidence --
    async fn create_evidence(
        &self,
        project_id: i64,
        uploaded_by: i64,
        input: &CreateEvidence,
        attachment: &Attachment,
    ) -> Result<Evidence, DbError> {
        self.pg_create_evidence(project_id, uploaded_by, input, attachment)
            .await
    }
    async fn get_evidence(&self, id: i64) -> Result<Evidence, DbError> {
        self.pg_get_evidence(id).await
    }
    async fn list_evidence(&self, project_id: i64) -> Result<Vec<Evidence>, DbError> {
        self.pg_list_evidence(project_id).await
    }
    async fn delete_evidence(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_evidence(id).await
    }

    // -- Project comments --
    async fn create_project_comment(
        &self,
        author_id: i64,
        target: CommentTarget,
        content: &str,
    ) -> Result<ProjectComment, DbError> {
        self.pg_create_project_comment(author_id, target, content)
            .await
    }
    async fn get_project_comment(&self, id: i64) -> Result<ProjectComment, DbError> {
        self.pg_get_project_comment(id).await
    }
    async fn list_project_comments(
        &self,
        target: CommentTarget,
    ) -> Result<Vec<ProjectComment>, DbError> {
        self.pg_list_project_comments(target).await
    }
    async fn update_project_comment(
        &self,
        id: i64,
        content: &str,
    ) -> Result<ProjectComment, DbError> {
        self.pg_update_project_comment(id, content).await
    }
    async fn delete_project_comment(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_project_comment(id).await
    }

    // -- Observations --
    async fn create_observation(
        &self,
        teacher_id: i64,
        period: i64,
        input: &CreateObservation,
    ) -> Result<Observation, DbError> {
        self.pg_create_observation(teacher_id, period, input).await
    }
    async fn get_observation(&self, id: i64) -> Result<Observation, DbError> {
        self.pg_get_observation(id).await
    }
    async fn list_observations(
        &self,
        student_id: i64,
        period: Option<i64>,
    ) -> Result<Vec<Observation>, DbError> {
        self.pg_list_observations(student_id, period).await
    }
    async fn update_observation(
        &self,
        id: i64,
        update: &UpdateObservation,
    ) -> Result<Observation, DbError> {
        self.pg_update_observation(id, update).await
    }
    async fn delete_observation(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_observation(id).await
    }

    // -- Announcements --
    async fn create_announcement(
        &self,
        author_id: i64,
        input: &CreateAnnouncement,
        attachment: Option<&Attachment>,
    ) -> Result<Announcement, DbError> {
        self.pg_create_announcement(author_id, input, attachment)
            .await
    }
    async fn get_announcement(&self, id: i64) -> Result<Announcement, DbError> {
        self.pg_get_announcement(id).await
    }
    async fn list_announcements(&self) -> Result<Vec<Announcement>, DbError> {
        self.pg_list_announcements().await
    }
    async fn update_announcement(
        &self,
        id: i64,
        update: &UpdateAnnouncement,
        attachment: &AttachmentChange,
    ) -> Result<Announcement, DbError> {
        self.pg_update_announcement(id, update, attachment).await
    }
    async fn delete_announcement(&self, id: i64) -> Result<(), DbError> {
        self.pg_delete_announcement(id).await
    }
}
