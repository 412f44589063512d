pub(crate) mod migrations;
pub mod queries;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode};

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

use crate::{Database, DbConfig, DbError};

/// Extension trait that converts `rusqlite::Result<T>` into `Result<T, DbError>`.
pub(crate) trait SqliteResultExt<T> {
    fn to_db(self) -> Result<T, DbError>;
}

impl<T> SqliteResultExt<T> for rusqlite::Result<T> {
    fn to_db(self) -> Result<T, DbError> {
        self.map_err(map_sqlite_err)
    }
}

#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let path = config
            .sqlite_path
            .as_deref()
            .or_else(|| {
                config
                    .database_url
                    .as_deref()
                    .and_then(|u| u.strip_prefix("sqlite://"))
            })
            .map(PathBuf::from)
            .unwrap_or_else(|| crate::data_dir().join("aula.db"));
        std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
        Self::open_path(&path)
    }

    pub fn open_path(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path).map_err(|e| DbError::Internal(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )
        .map_err(|e| DbError::Internal(e.to_string()))?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(|e| DbError::Internal(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| DbError::Internal(e.to_string()))?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Internal("lock poisoned".into()))?;
        f(&conn)
    }

    fn run_migrations(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            migrations::run(conn)?;
            Ok(())
        })
    }

    /// Run a synchronous query method on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(SqliteDatabase) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(db))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
}

/// Map a `rusqlite::Error` onto the constraint-aware `DbError` variants.
pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> DbError {
    if let rusqlite::Error::SqliteFailure(ref err, ref msg) = e {
        if err.code == ErrorCode::ConstraintViolation {
            let detail = msg.clone().unwrap_or_else(|| err.to_string());
            return match err.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => DbError::Conflict(detail),
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => DbError::ForeignKey(detail),
                _ => DbError::Constraint(detail),
            };
        }
    }
    DbError::Internal(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_returns_working_db() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get(0))
                .map_err(|e| DbError::Internal(e.to_string()))?;
            assert!(count > 0); // migrations created tables
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn open_path_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("test.db");
        assert!(!db_path.exists());

        let _db = SqliteDatabase::open_path(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn reopening_does_not_reseed_periods() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("test.db");
        drop(SqliteDatabase::open_path(&db_path).unwrap());
        let db = SqliteDatabase::open_path(&db_path).unwrap();
        let count: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM periods", [], |row| row.get(0))
                    .to_db()
            })
            .unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let err = db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO periods (name, active, created_at, updated_at)
                     VALUES ('1', 0, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
                    [],
                )
                .to_db()
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)), "got {err:?}");
    }

    #[test]
    fn foreign_key_violation_maps_to_foreign_key() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let err = db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO grades (site_id, name, created_at, updated_at)
                     VALUES (999, 'Sexto', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
                    [],
                )
                .to_db()
            })
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKey(_)), "got {err:?}");
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    // -- Users --
    async fn create_user(&self, input: &CreateUser, password_hash: &str) -> Result<User, DbError> {
        let input = input.clone();
        let hash = password_hash.to_string();
        self.blocking(move |db| db.create_user_sync(&input, &hash))
            .await
    }
    async fn get_user(&self, id: i64) -> Result<User, DbError> {
        self.blocking(move |db| db.get_user_sync(id)).await
    }
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, DbError> {
        let filter = filter.clone();
        self.blocking(move |db| db.list_users_sync(&filter)).await
    }
    async fn update_user(
        &self,
        id: i64,
        update: &UpdateUser,
        password_hash: Option<&str>,
    ) -> Result<User, DbError> {
        let update = update.clone();
        let hash = password_hash.map(str::to_string);
        self.blocking(move |db| db.update_user_sync(id, &update, hash.as_deref()))
            .await
    }
    async fn find_credentials(
        &self,
        national_id: &str,
    ) -> Result<Option<(User, String)>, DbError> {
        let national_id = national_id.to_string();
        self.blocking(move |db| db.find_credentials_sync(&national_id))
            .await
    }
    async fn count_users(&self) -> Result<i64, DbError> {
        self.blocking(|db| db.count_users_sync()).await
    }

    // -- Sessions --
    async fn create_session(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let token_hash = token_hash.to_string();
        self.blocking(move |db| db.create_session_sync(user_id, &token_hash, expires_at))
            .await
    }
    async fn find_session_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, DbError> {
        let token_hash = token_hash.to_string();
        self.blocking(move |db| db.find_session_user_sync(&token_hash, now))
            .await
    }
    async fn delete_session(&self, token_hash: &str) -> Result<(), DbError> {
        let token_hash = token_hash.to_string();
        self.blocking(move |db| db.delete_session_sync(&token_hash))
            .await
    }
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        self.blocking(move |db| db.purge_expired_sessions_sync(now))
            .await
    }

    // -- Sites --
    async fn create_site(&self, input: &CreateSite) -> Result<Site, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_site_sync(&input)).await
    }
    async fn get_site(&self, id: i64) -> Result<Site, DbError> {
        self.blocking(move |db| db.get_site_sync(id)).await
    }
    async fn list_sites(&self) -> Result<Vec<Site>, DbError> {
        self.blocking(|db| db.list_sites_sync()).await
    }
    async fn update_site(&self, id: i64, update: &UpdateSite) -> Result<Site, DbError> {
        let update = update.clone();
        self.blocking(move |db| db.update_site_sync(id, &update))
            .await
    }
    async fn delete_site(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_site_sync(id)).await
    }

    // -- Areas --
    async fn create_area(&self, input: &CreateArea) -> Result<Area, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_area_sync(&input)).await
    }
    async fn get_area(&self, id: i64) -> Result<Area, DbError> {
        self.blocking(move |db| db.get_area_sync(id)).await
    }
    async fn list_areas(&self) -> Result<Vec<Area>, DbError> {
        self.blocking(|db| db.list_areas_sync()).await
    }
    async fn update_area(&self, id: i64, update: &UpdateArea) -> Result<Area, DbError> {
        let update = update.clone();
        self.blocking(move |db| db.update_area_sync(id, &update))
            .await
    }
    async fn delete_area(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_area_sync(id)).await
    }

    // -- Subjects --
    async fn create_subject(&self, input: &CreateSubject) -> Result<Subject, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_subject_sync(&input))
            .await
    }
    async fn get_subject(&self, id: i64) -> Result<Subject, DbError> {
        self.blocking(move |db| db.get_subject_sync(id)).await
    }
    async fn list_subjects(&self, filter: &SubjectFilter) -> Result<Vec<Subject>, DbError> {
        let filter = filter.clone();
        self.blocking(move |db| db.list_subjects_sync(&filter))
            .await
    }
    async fn update_subject(&self, id: i64, update: &UpdateSubject) -> Result<Subject, DbError> {
        let update = update.clone();
        self.blocking(move |db| db.update_subject_sync(id, &update))
            .await
    }
    async fn delete_subject(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_subject_sync(id)).await
    }
    async fn assign_subject_teacher(
        &self,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        self.blocking(move |db| db.assign_subject_teacher_sync(subject_id, teacher_id))
            .await
    }
    async fn unassign_subject_teacher(
        &self,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        self.blocking(move |db| db.unassign_subject_teacher_sync(subject_id, teacher_id))
            .await
    }

    // -- Grades --
    async fn create_grade(&self, input: &CreateGrade) -> Result<Grade, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_grade_sync(&input)).await
    }
    async fn get_grade(&self, id: i64) -> Result<Grade, DbError> {
        self.blocking(move |db| db.get_grade_sync(id)).await
    }
    async fn list_grades(&self, site_id: Option<i64>) -> Result<Vec<Grade>, DbError> {
        self.blocking(move |db| db.list_grades_sync(site_id)).await
    }
    async fn update_grade(&self, id: i64, update: &UpdateGrade) -> Result<Grade, DbError> {
        let update = update.clone();
        self.blocking(move |db| db.update_grade_sync(id, &update))
            .await
    }
    async fn delete_grade(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_grade_sync(id)).await
    }

    // -- Groups --
    async fn create_group(&self, input: &CreateGroup) -> Result<Group, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_group_sync(&input)).await
    }
    async fn get_group(&self, id: i64) -> Result<Group, DbError> {
        self.blocking(move |db| db.get_group_sync(id)).await
    }
    async fn list_groups(&self, grade_id: Option<i64>) -> Result<Vec<Group>, DbError> {
        self.blocking(move |db| db.list_groups_sync(grade_id)).await
    }
    async fn update_group(&self, id: i64, update: &UpdateGroup) -> Result<Group, DbError> {
        let update = update.clone();
        self.blocking(move |db| db.update_group_sync(id, &update))
            .await
    }
    async fn delete_group(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_group_sync(id)).await
    }
    async fn assign_group_director(&self, group_id: i64, teacher_id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.assign_group_director_sync(group_id, teacher_id))
            .await
    }
    async fn unassign_group_director(
        &self,
        group_id: i64,
        teacher_id: i64,
    ) -> Result<(), DbError> {
        self.blocking(move |db| db.unassign_group_director_sync(group_id, teacher_id))
            .await
    }
    async fn is_group_director(&self, group_id: i64, teacher_id: i64) -> Result<bool, DbError> {
        self.blocking(move |db| db.is_group_director_sync(group_id, teacher_id))
            .await
    }

    // -- Students --
    async fn create_student(&self, input: &CreateStudent) -> Result<Student, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_student_sync(&input))
            .await
    }
    async fn get_student(&self, id: i64) -> Result<Student, DbError> {
        self.blocking(move |db| db.get_student_sync(id)).await
    }
    async fn list_students(&self, group_id: Option<i64>) -> Result<Vec<Student>, DbError> {
        self.blocking(move |db| db.list_students_sync(group_id))
            .await
    }
    async fn update_student(&self, id: i64, update: &UpdateStudent) -> Result<Student, DbError> {
        let update = update.clone();
        self.blocking(move |db| db.update_student_sync(id, &update))
            .await
    }
    async fn delete_student(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_student_sync(id)).await
    }

    // -- Periods --
    async fn list_periods(&self) -> Result<Vec<Period>, DbError> {
        self.blocking(|db| db.list_periods_sync()).await
    }
    async fn get_period(&self, id: i64) -> Result<Period, DbError> {
        self.blocking(move |db| db.get_period_sync(id)).await
    }
    async fn get_active_period(&self) -> Result<Option<Period>, DbError> {
        self.blocking(|db| db.get_active_period_sync()).await
    }
    async fn update_period(
        &self,
        id: i64,
        update: &UpdatePeriod,
        policy: PeriodActivationPolicy,
    ) -> Result<Period, DbError> {
        let update = update.clone();
        self.blocking(move |db| db.update_period_sync(id, &update, policy))
            .await
    }

    // -- Lesson plans --
    async fn create_lesson_plan(&self, input: &NewLessonPlan) -> Result<LessonPlan, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_lesson_plan_sync(&input))
            .await
    }
    async fn get_lesson_plan(&self, id: i64) -> Result<LessonPlan, DbError> {
        self.blocking(move |db| db.get_lesson_plan_sync(id)).await
    }
    async fn list_lesson_plans(
        &self,
        filter: &LessonPlanFilter,
    ) -> Result<Vec<LessonPlan>, DbError> {
        let filter = filter.clone();
        self.blocking(move |db| db.list_lesson_plans_sync(&filter))
            .await
    }
    async fn update_lesson_plan(
        &self,
        id: i64,
        update: &UpdateLessonPlan,
        attachment: Option<&Attachment>,
    ) -> Result<LessonPlan, DbError> {
        let update = update.clone();
        let attachment = attachment.cloned();
        self.blocking(move |db| db.update_lesson_plan_sync(id, &update, attachment.as_ref()))
            .await
    }
    async fn delete_lesson_plan(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_lesson_plan_sync(id))
            .await
    }

    // -- Plan comments --
    async fn create_plan_comment(
        &self,
        author_id: i64,
        input: &CreatePlanComment,
    ) -> Result<PlanComment, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_plan_comment_sync(author_id, &input))
            .await
    }
    async fn get_plan_comment(&self, id: i64) -> Result<PlanComment, DbError> {
        self.blocking(move |db| db.get_plan_comment_sync(id)).await
    }
    async fn list_plan_comments(
        &self,
        filter: &PlanCommentFilter,
    ) -> Result<Vec<PlanComment>, DbError> {
        let filter = filter.clone();
        self.blocking(move |db| db.list_plan_comments_sync(&filter))
            .await
    }
    async fn update_plan_comment(&self, id: i64, content: &str) -> Result<PlanComment, DbError> {
        let content = content.to_string();
        self.blocking(move |db| db.update_plan_comment_sync(id, &content))
            .await
    }
    async fn delete_plan_comment(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_plan_comment_sync(id))
            .await
    }

    // -- Featured plans --
    async fn create_featured_plan(
        &self,
        featured_by: i64,
        input: &CreateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_featured_plan_sync(featured_by, &input))
            .await
    }
    async fn get_featured_plan(&self, id: i64) -> Result<FeaturedPlanDetail, DbError> {
        self.blocking(move |db| db.get_featured_plan_sync(id)).await
    }
    async fn list_featured_plans(
        &self,
        only_active: bool,
    ) -> Result<Vec<FeaturedPlanDetail>, DbError> {
        self.blocking(move |db| db.list_featured_plans_sync(only_active))
            .await
    }
    async fn update_featured_plan(
        &self,
        id: i64,
        update: &UpdateFeaturedPlan,
    ) -> Result<FeaturedPlanDetail, DbError> {
        let update = update.clone();
        self.blocking(move |db| db.update_featured_plan_sync(id, &update))
            .await
    }
    async fn increment_featured_views(&self, id: i64) -> Result<FeaturedPlanDetail, DbError> {
        self.blocking(move |db| db.increment_featured_views_sync(id))
            .await
    }
    async fn delete_featured_plan(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_featured_plan_sync(id))
            .await
    }

    // -- Projects --
    async fn create_project(
        &self,
        teacher_id: i64,
        input: &CreateProject,
        attachment: Option<&Attachment>,
    ) -> Result<Project, DbError> {
        let input = input.clone();
        let attachment = attachment.cloned();
        self.blocking(move |db| db.create_project_sync(teacher_id, &input, attachment.as_ref()))
            .await
    }
    async fn get_project(&self, id: i64) -> Result<Project, DbError> {
        self.blocking(move |db| db.get_project_sync(id)).await
    }
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, DbError> {
        let filter = filter.clone();
        self.blocking(move |db| db.list_projects_sync(&filter))
            .await
    }
    async fn update_project(
        &self,
        id: i64,
        update: &UpdateProject,
        attachment: &AttachmentChange,
    ) -> Result<Project, DbError> {
        let update = update.clone();
        let attachment = attachment.clone();
        self.blocking(move |db| db.update_project_sync(id, &update, &attachment))
            .await
    }
    async fn delete_project(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_project_sync(id)).await
    }

    // -- Evidence --
    async fn create_evidence(
        &self,
        project_id: i64,
        uploaded_by: i64,
        input: &CreateEvidence,
        attachment: &Attachment,
    ) -> Result<Evidence, DbError> {
        let input = input.clone();
        let attachment = attachment.clone();
        self.blocking(move |db| {
            db.create_evidence_sync(project_id, uploaded_by, &input, &attachment)
        })
        .await
    }
    async fn get_evidence(&self, id: i64) -> Result<Evidence, DbError> {
        self.blocking(move |db| db.get_evidence_sync(id)).await
    }
    async fn list_evidence(&self, project_id: i64) -> Result<Vec<Evidence>, DbError> {
        self.blocking(move |db| db.list_evidence_sync(project_id))
            .await
    }
    async fn delete_evidence(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_evidence_sync(id)).await
    }

    // -- Project comments --
    async fn create_project_comment(
        &self,
        author_id: i64,
        target: CommentTarget,
        content: &str,
    ) -> Result<ProjectComment, DbError> {
        let content = content.to_string();
        self.blocking(move |db| db.create_project_comment_sync(author_id, target, &content))
            .await
    }
    async fn get_project_comment(&self, id: i64) -> Result<ProjectComment, DbError> {
        self.blocking(move |db| db.get_project_comment_sync(id))
            .await
    }
    async fn list_project_comments(
        &self,
        target: CommentTarget,
    ) -> Result<Vec<ProjectComment>, DbError> {
        self.blocking(move |db| db.list_project_comments_sync(target))
            .await
    }
    async fn update_project_comment(
        &self,
        id: i64,
        content: &str,
    ) -> Result<ProjectComment, DbError> {
        let content = content.to_string();
        self.blocking(move |db| db.update_project_comment_sync(id, &content))
            .await
    }
    async fn delete_project_comment(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_project_comment_sync(id))
            .await
    }

    // -- Observations --
    async fn create_observation(
        &self,
        teacher_id: i64,
        period: i64,
        input: &CreateObservation,
    ) -> Result<Observation, DbError> {
        let input = input.clone();
        self.blocking(move |db| db.create_observation_sync(teacher_id, period, &input))
            .await
    }
    async fn get_observation(&self, id: i64) -> Result<Observation, DbError> {
        self.blocking(move |db| db.get_observation_sync(id)).await
    }
    async fn list_observations(
        &self,
        student_id: i64,
        period: Option<i64>,
    ) -> Result<Vec<Observation>, DbError> {
        self.blocking(move |db| db.list_observations_sync(student_id, period))
            .await
    }
    async fn update_observation(
        &self,
        id: i64,
        update: &UpdateObservation,
    ) -> Result<Observation, DbError> {
        let update = update.clone();
        self.blocking(move |db| db.update_observation_sync(id, &update))
            .await
    }
    async fn delete_observation(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_observation_sync(id))
            .await
    }

    // -- Announcements --
    async fn create_announcement(
        &self,
        author_id: i64,
        input: &CreateAnnouncement,
        attachment: Option<&Attachment>,
    ) -> Result<Announcement, DbError> {
        let input = input.clone();
        let attachment = attachment.cloned();
        self.blocking(move |db| {
            db.create_announcement_sync(author_id, &input, attachment.as_ref())
        })
        .await
    }
    async fn get_announcement(&self, id: i64) -> Result<Announcement, DbError> {
        self.blocking(move |db| db.get_announcement_sync(id)).await
    }
    async fn list_announcements(&self) -> Result<Vec<Announcement>, DbError> {
        self.blocking(|db| db.list_announcements_sync()).await
    }
    async fn update_announcement(
        &self,
        id: i64,
        update: &UpdateAnnouncement,
        attachment: &AttachmentChange,
    ) -> Result<Announcement, DbError> {
        let update = update.clone();
        let attachment = attachment.clone();
        self.blocking(move |db| db.update_announcement_sync(id, &update, &attachment))
            .await
    }
    async fn delete_announcement(&self, id: i64) -> Result<(), DbError> {
        self.blocking(move |db| db.delete_announcement_sync(id))
            .await
    }
}
