#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

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

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A foreign key still references the row, or points at nothing.
    #[error("foreign key violation: {0}")]
    ForeignKey(String),

    /// A CHECK constraint rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("database error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        DbError::Internal(e.to_string())
    }
}

/// Where the database lives.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    /// `postgres://…` selects the Postgres backend.
    pub database_url: Option<String>,
    /// SQLite file; defaults to `<data_dir>/aula.db`.
    pub sqlite_path: Option<String>,
}

impl DbConfig {
    pub fn is_postgres(&self) -> bool {
        self.database_url
            .as_deref()
            .is_some_and(|u| u.starts_with("postgres://") || u.starts_with("postgresql://"))
    }
}

/// `$XDG_DATA_HOME/aula`, falling back to `~/.local/share/aula`.
pub fn data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("aula")
}

/// Open whichever backend the configuration names.
pub async fn open(config: &DbConfig) -> Result<Arc<dyn Database>, DbError> {
    if config.is_postgres() {
        #[cfg(feature = "postgres")]
        {
            let url = config.database_url.as_deref().unwrap_or_default();
            return Ok(Arc::new(PostgresDatabase::connect(url).await?));
        }
        #[cfg(not(feature = "postgres"))]
        {
            return Err(DbError::Internal(
                "a postgres URL was given but the 'postgres' feature is not enabled".into(),
            ));
        }
    }
    #[cfg(feature = "sqlite")]
    {
        Ok(Arc::new(SqliteDatabase::open(config)?))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Err(DbError::Internal("no database backend compiled in".into()))
    }
}

/// Persistence boundary for every resource. Implementations enforce the
/// uniqueness, foreign-key and check constraints and report violations
/// through [`DbError`].
#[async_trait]
pub trait Database: Send + Sync {
    // -- Users --
    async fn create_user(&self, input: &CreateUser, password_hash: &str) -> Result<User, DbError>;
    async fn get_user(&self, id: i64) -> Result<User, DbError>;
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, DbError>;
    async fn update_user(
        &self,
        id: i64,
        update: &UpdateUser,
        password_hash: Option<&str>,
    ) -> Result<User, DbError>;
    /// The user and stored password hash for a login name.
    async fn find_credentials(&self, national_id: &str)
        -> Result<Option<(User, String)>, DbError>;
    async fn count_users(&self) -> Result<i64, DbError>;

    // -- Sessions --
    async fn create_session(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError>;
    async fn find_session_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, DbError>;
    async fn delete_session(&self, token_hash: &str) -> Result<(), DbError>;
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DbError>;

    // -- Sites --
    async fn create_site(&self, input: &CreateSite) -> Result<Site, DbError>;
    async fn get_site(&self, id: i64) -> Result<Site, DbError>;
    async fn list_sites(&self) -> Result<Vec<Site>, DbError>;
    async fn update_site(&self, id: i64, update: &UpdateSite) -> Result<Site, DbError>;
    async fn delete_site(&self, id: i64) -> Result<(), DbError>;

    // -- Areas --
    async fn create_area(&self, input: &CreateArea) -> Result<Area, DbError>;
    async fn get_area(&self, id: i64) -> Result<Area, DbError>;
    async fn list_areas(&self) -> Result<Vec<Area>, DbError>;
    async fn update_area(&self, id: i64, update: &UpdateArea) -> Result<Area, DbError>;
    async fn delete_area(&self, id: i64) -> Result<(), DbError>;

    // -- Subjects --
    async fn create_subject(&self, input: &CreateSubject) -> Result<Subject, DbError>;
    async fn get_subject(&self, id: i64) -> Result<Subject, DbError>;
    async fn list_subjects(&self, filter: &SubjectFilter) -> Result<Vec<Subject>, DbError>;
    async fn update_subject(&self, id: i64, update: &UpdateSubject) -> Result<Subject, DbError>;
    async fn delete_subject(&self, id: i64) -> Result<(), DbError>;
    async fn assign_subject_teacher(&self, subject_id: i64, teacher_id: i64)
        -> Result<(), DbError>;
    async fn unassign_subject_teacher(
        &self,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError>;

    // -- Grades --
    async fn create_grade(&self, input: &CreateGrade) -> Result<Grade, DbError>;
    async fn get_grade(&self, id: i64) -> Result<Grade, DbError>;
    async fn list_grades(&self, site_id: Option<i64>) -> Result<Vec<Grade>, DbError>;
    async fn update_grade(&self, id: i64, update: &UpdateGrade) -> Result<Grade, DbError>;
    async fn delete_grade(&self, id: i64) -> Result<(), DbError>;

    // -- Groups --
    async fn create_group(&self, input: &CreateGroup) -> Result<Group, DbError>;
    async fn get_group(&self, id: i64) -> Result<Group, DbError>;
    async fn list_groups(&self, grade_id: Option<i64>) -> Result<Vec<Group>, DbError>;
    async fn update_group(&self, id: i64, update: &UpdateGroup) -> Result<Group, DbError>;
    async fn delete_group(&self, id: i64) -> Result<(), DbError>;
    async fn assign_group_director(&self, group_id: i64, teacher_id: i64) -> Result<(), DbError>;
    async fn unassign_group_director(&self, group_id: i64, teacher_id: i64)
        -> Result<(), DbError>;
    async fn is_group_director(&self, group_id: i64, teacher_id: i64) -> Result<bool, DbError>;

    // -- Students --
    async fn create_student(&self, input: &CreateStudent) -> Result<Student, DbError>;
    async fn get_student(&self, id: i64) -> Result<Student, DbError>;
    async fn list_students(&self, group_id: Option<i64>) -> Result<Vec<Student>, DbError>;
    async fn update_student(&self, id: i64, update: &UpdateStudent) -> Result<Student, DbError>;
    async fn delete_student(&self, id: i64) -> Result<(), DbError>;

    // -- Periods --
    async fn list_periods(&self) -> Result<Vec<Period>, DbError>;
    async fn get_period(&self, id: i64) -> Result<Period, DbError>;
    async fn get_active_period(&self) -> Result<Option<Period>, DbError>;
    /// Apply a partial update in one transaction. Activation follows `policy`;
    /// under `ExclusiveLock` another active period yields `DbError::Conflict`.
    async fn update_period(
        &self,
        id: i64,
        update: &UpdatePeriod,
        policy: PeriodActivationPolicy,
    ) -> Result<Period, DbError>;

    // -- Lesson plans --
    async fn create_lesson_plan(&self, input: &NewLessonPlan) -> Result<LessonPlan, DbError>;
    async fn get_lesson_plan(&self, id: i64) -> Result<LessonPlan, DbError>;
    async fn list_lesson_plans(&self, filter: &LessonPlanFilter)
        -> Result<Vec<LessonPlan>, DbError>;
    /// Field changes and an optional new attachment, written together.
    async fn update_lesson_plan(
        &self,
        id: i64,
        update: &UpdateLessonPlan,
        attachment: Option<&Attachment>,
    ) -> Result<LessonPlan, DbError>;
    async fn delete_lesson_plan(&self, id: i64) -> Result<(), DbError>;

    // -- Plan comments --
    async fn create_plan_comment(
        &self,
        author_id: i64,
        input: &CreatePlanComment,
    ) -> Result<PlanComment, DbError>;
    async fn get_plan_comment(&self, id: i64) -> Result<PlanComment, DbError>;
    async fn list_plan_comments(
        &self,
        filter: &PlanCommentFilter,
    ) -> Result<Vec<PlanComment>, DbError>;
    async fn update_plan_comment(&self, id: i64, content: &str) -> Result<PlanComment, DbError>;
    async fn delete_plan_comment(&self, id: i64) -> Result<(), DbError>;

    // -- Featured plans --
    async fn create_featured_plan(
        &self,
        featured_by: i64,
        input: &CreateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, DbError>;
    async fn get_featured_plan(&self, id: i64) -> Result<FeaturedPlanDetail, DbError>;
    async fn list_featured_plans(&self, only_active: bool)
        -> Result<Vec<FeaturedPlanDetail>, DbError>;
    async fn update_featured_plan(
        &self,
        id: i64,
        update: &UpdateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, DbError>;
    async fn increment_featured_views(&self, id: i64) -> Result<FeaturedPlanDetail, DbError>;
    async fn delete_featured_plan(&self, id: i64) -> Result<(), DbError>;

    // -- Projects --
    async fn create_project(
        &self,
        teacher_id: i64,
        input: &CreateProject,
        attachment: Option<&Attachment>,
    ) -> Result<Project, DbError>;
    async fn get_project(&self, id: i64) -> Result<Project, DbError>;
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, DbError>;
    async fn update_project(
        &self,
        id: i64,
        update: &UpdateProject,
        attachment: &AttachmentChange,
    ) -> Result<Project, DbError>;
    /// Removes the project with its evidence and comments.
    async fn delete_project(&self, id: i64) -> Result<(), DbError>;

    // -- Evidence --
    async fn create_evidence(
        &self,
        project_id: i64,
        uploaded_by: i64,
        input: &CreateEvidence,
        attachment: &Attachment,
    ) -> Result<Evidence, DbError>;
    async fn get_evidence(&self, id: i64) -> Result<Evidence, DbError>;
    async fn list_evidence(&self, project_id: i64) -> Result<Vec<Evidence>, DbError>;
    async fn delete_evidence(&self, id: i64) -> Result<(), DbError>;

    // -- Project comments --
    async fn create_project_comment(
        &self,
        author_id: i64,
        target: CommentTarget,
        content: &str,
    ) -> Result<ProjectComment, DbError>;
    async fn get_project_comment(&self, id: i64) -> Result<ProjectComment, DbError>;
    /// Comments attached directly to `target`.
    async fn list_project_comments(
        &self,
        target: CommentTarget,
    ) -> Result<Vec<ProjectComment>, DbError>;
    async fn update_project_comment(
        &self,
        id: i64,
        content: &str,
    ) -> Result<ProjectComment, DbError>;
    async fn delete_project_comment(&self, id: i64) -> Result<(), DbError>;

    // -- Observations --
    async fn create_observation(
        &self,
        teacher_id: i64,
        period: i64,
        input: &CreateObservation,
    ) -> Result<Observation, DbError>;
    async fn get_observation(&self, id: i64) -> Result<Observation, DbError>;
    async fn list_observations(
        &self,
        student_id: i64,
        period: Option<i64>,
    ) -> Result<Vec<Observation>, DbError>;
    async fn update_observation(
        &self,
        id: i64,
        update: &UpdateObservation,
    ) -> Result<Observation, DbError>;
    async fn delete_observation(&self, id: i64) -> Result<(), DbError>;

    // -- Announcements --
    async fn create_announcement(
        &self,
        author_id: i64,
        input: &CreateAnnouncement,
        attachment: Option<&Attachment>,
    ) -> Result<Announcement, DbError>;
    async fn get_announcement(&self, id: i64) -> Result<Announcement, DbError>;
    async fn list_announcements(&self) -> Result<Vec<Announcement>, DbError>;
    async fn update_announcement(
        &self,
        id: i64,
        update: &UpdateAnnouncement,
        attachment: &AttachmentChange,
    ) -> Result<Announcement, DbError>;
    async fn delete_announcement(&self, id: i64) -> Result<(), DbError>;
}
