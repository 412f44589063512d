// Backend-agnostic integration tests for the Database trait.
//
// Each public async function accepts `&dyn Database` so that the same logic
// can be exercised against both the SQLite and Postgres backends.

use chrono::{Duration, NaiveDate, Utc};

use aula_core::announcement::{CreateAnnouncement, UpdateAnnouncement};
use aula_core::area::{CreateArea, UpdateArea};
use aula_core::attachment::{Attachment, AttachmentChange, FileType};
use aula_core::evidence::CreateEvidence;
use aula_core::featured_plan::{CreateFeaturedPlan, UpdateFeaturedPlan};
use aula_core::grade::{CreateGrade, UpdateGrade};
use aula_core::group::CreateGroup;
use aula_core::lesson_plan::{LessonPlanFilter, NewLessonPlan, UpdateLessonPlan};
use aula_core::observation::{CreateObservation, UpdateObservation};
use aula_core::period::{PeriodActivationPolicy, UpdatePeriod};
use aula_core::plan_comment::{CreatePlanComment, PlanCommentFilter};
use aula_core::project::{CreateProject, ProjectFilter, ProjectStatus, UpdateProject};
use aula_core::project_comment::CommentTarget;
use aula_core::site::{CreateSite, UpdateSite};
use aula_core::student::{CreateStudent, UpdateStudent};
use aula_core::subject::{CreateSubject, SubjectFilter};
use aula_core::user::{CreateUser, UpdateUser, UserFilter};
use aula_core::{Role, User};
use aula_db::{Database, DbError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_user(national_id: &str, role: Role) -> CreateUser {
    CreateUser {
        email: format!("{national_id}@school.test"),
        full_name: format!("User {national_id}"),
        national_id: national_id.to_string(),
        password: "unused".to_string(),
        role,
        active: true,
        phone: None,
        site_id: None,
    }
}

async fn user(db: &dyn Database, national_id: &str, role: Role) -> User {
    db.create_user(&make_user(national_id, role), "hash")
        .await
        .unwrap()
}

fn attachment(remote_id: &str, file_type: FileType) -> Attachment {
    Attachment {
        remote_id: remote_id.to_string(),
        file_name: format!("{remote_id}.{}", file_type.as_str()),
        file_type,
        size_bytes: 1024,
        view_link: format!("https://files.test/{remote_id}/view"),
        embed_link: format!("https://files.test/{remote_id}/embed"),
        download_link: format!("https://files.test/{remote_id}/download"),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn period_id(db: &dyn Database, name: &str) -> i64 {
    db.list_periods()
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.name == name)
        .unwrap()
        .id
}

/// Site, area, subject and teacher ready for planning tests.
struct Fixture {
    site_id: i64,
    subject_id: i64,
    teacher: User,
    coordinator: User,
}

async fn fixture(db: &dyn Database) -> Fixture {
    let site = db
        .create_site(&CreateSite {
            name: "Main campus".into(),
            code: "MAIN".into(),
            address: None,
            active: true,
        })
        .await
        .unwrap();
    let area = db
        .create_area(&CreateArea {
            name: "Sciences".into(),
            description: None,
            active: true,
        })
        .await
        .unwrap();
    let subject = db
        .create_subject(&CreateSubject {
            name: "Biology".into(),
            area_id: area.id,
            code: Some("BIO".into()),
            description: None,
            grades: Some("6,7".into()),
            active: true,
        })
        .await
        .unwrap();
    let teacher = user(db, "1000001", Role::Teacher).await;
    let coordinator = user(db, "2000001", Role::Coordinator).await;
    Fixture {
        site_id: site.id,
        subject_id: subject.id,
        teacher,
        coordinator,
    }
}

async fn plan(db: &dyn Database, fx: &Fixture, remote_id: &str, title: &str) -> i64 {
    db.create_lesson_plan(&NewLessonPlan {
        teacher_id: fx.teacher.id,
        subject_id: fx.subject_id,
        site_id: fx.site_id,
        period_id: period_id(db, "1").await,
        title: title.to_string(),
        attachment: attachment(remote_id, FileType::Pdf),
    })
    .await
    .unwrap()
    .id
}

fn make_project(title: &str) -> CreateProject {
    CreateProject {
        title: title.to_string(),
        description: "A project about growing vegetables at school".into(),
        objectives: None,
        starts_on: date(2026, 2, 1),
        estimated_end: None,
    }
}

// ---------------------------------------------------------------------------
// Users and sessions
// ---------------------------------------------------------------------------

pub async fn test_user_crud(db: &dyn Database) {
    assert_eq!(db.count_users().await.unwrap(), 0);

    let u = user(db, "1234567", Role::Teacher).await;
    assert_eq!(u.national_id, "1234567");
    assert_eq!(u.role, Role::Teacher);
    assert!(u.active);
    assert!(u.phone.is_none());

    let fetched = db.get_user(u.id).await.unwrap();
    assert_eq!(fetched, u);

    let updated = db
        .update_user(
            u.id,
            &UpdateUser {
                full_name: Some("Ana Torres".into()),
                phone: Some(Some("3001234567".into())),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Ana Torres");
    assert_eq!(updated.phone.as_deref(), Some("3001234567"));
    assert_eq!(updated.email, u.email);

    // explicit null clears
    let cleared = db
        .update_user(
            u.id,
            &UpdateUser {
                phone: Some(None),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert!(cleared.phone.is_none());

    user(db, "7654321", Role::Principal).await;
    assert_eq!(db.count_users().await.unwrap(), 2);

    let teachers = db
        .list_users(&UserFilter {
            role: Some(Role::Teacher),
            active: None,
        })
        .await
        .unwrap();
    assert_eq!(teachers.len(), 1);
    assert_eq!(teachers[0].id, u.id);

    let missing = db.get_user(999_999).await;
    assert!(matches!(missing, Err(DbError::NotFound(_))));
}

pub async fn test_user_list_ordering_and_active_filter(db: &dyn Database) {
    let mut zoe = make_user("3000001", Role::Teacher);
    zoe.full_name = "Zoe Zapata".into();
    let mut abel = make_user("3000002", Role::Teacher);
    abel.full_name = "Abel Arias".into();
    abel.active = false;
    db.create_user(&zoe, "h").await.unwrap();
    db.create_user(&abel, "h").await.unwrap();

    let all = db.list_users(&UserFilter::default()).await.unwrap();
    let names: Vec<_> = all.iter().map(|u| u.full_name.as_str()).collect();
    assert_eq!(names, vec!["Abel Arias", "Zoe Zapata"]);

    let active = db
        .list_users(&UserFilter {
            role: None,
            active: Some(true),
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].full_name, "Zoe Zapata");
}

pub async fn test_credentials_and_password_update(db: &dyn Database) {
    let u = db
        .create_user(&make_user("5550001", Role::Coordinator), "sha256$salt$one")
        .await
        .unwrap();

    let (found, hash) = db.find_credentials("5550001").await.unwrap().unwrap();
    assert_eq!(found.id, u.id);
    assert_eq!(hash, "sha256$salt$one");

    db.update_user(u.id, &UpdateUser::default(), Some("sha256$salt$two"))
        .await
        .unwrap();
    let (_, hash) = db.find_credentials("5550001").await.unwrap().unwrap();
    assert_eq!(hash, "sha256$salt$two");

    assert!(db.find_credentials("nobody").await.unwrap().is_none());
}

pub async fn test_sessions(db: &dyn Database) {
    let u = user(db, "8880001", Role::Teacher).await;
    let now = Utc::now();

    db.create_session(u.id, "live", now + Duration::hours(8))
        .await
        .unwrap();
    db.create_session(u.id, "stale", now - Duration::minutes(1))
        .await
        .unwrap();

    let found = db.find_session_user("live", now).await.unwrap().unwrap();
    assert_eq!(found.id, u.id);
    assert!(db.find_session_user("stale", now).await.unwrap().is_none());
    assert!(db.find_session_user("unknown", now).await.unwrap().is_none());

    assert_eq!(db.purge_expired_sessions(now).await.unwrap(), 1);
    assert!(db.find_session_user("live", now).await.unwrap().is_some());

    db.delete_session("live").await.unwrap();
    assert!(db.find_session_user("live", now).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Institutional structure
// ---------------------------------------------------------------------------

pub async fn test_site_and_area_crud(db: &dyn Database) {
    let site = db
        .create_site(&CreateSite {
            name: "North".into(),
            code: "N1".into(),
            address: Some("Calle 1".into()),
            active: true,
        })
        .await
        .unwrap();
    assert_eq!(site.address.as_deref(), Some("Calle 1"));

    let updated = db
        .update_site(
            site.id,
            &UpdateSite {
                address: Some(None),
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.address.is_none());
    assert!(!updated.active);
    assert_eq!(updated.name, "North");

    assert_eq!(db.list_sites().await.unwrap().len(), 1);

    let area = db
        .create_area(&CreateArea {
            name: "Humanities".into(),
            description: Some("Languages and history".into()),
            active: true,
        })
        .await
        .unwrap();
    let area = db
        .update_area(
            area.id,
            &UpdateArea {
                name: Some("Humanidades".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(area.name, "Humanidades");
    assert_eq!(area.description.as_deref(), Some("Languages and history"));

    db.delete_area(area.id).await.unwrap();
    assert!(matches!(
        db.get_area(area.id).await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(
        db.delete_area(area.id).await,
        Err(DbError::NotFound(_))
    ));
    db.delete_site(site.id).await.unwrap();
    assert!(db.list_sites().await.unwrap().is_empty());
}

pub async fn test_subjects_and_teacher_assignment(db: &dyn Database) {
    let fx = fixture(db).await;
    let other = db
        .create_subject(&CreateSubject {
            name: "Chemistry".into(),
            area_id: db.get_subject(fx.subject_id).await.unwrap().area_id,
            code: None,
            description: None,
            grades: None,
            active: false,
        })
        .await
        .unwrap();

    let active = db
        .list_subjects(&SubjectFilter {
            active: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, fx.subject_id);

    db.assign_subject_teacher(other.id, fx.teacher.id)
        .await
        .unwrap();
    // assigning twice is a no-op
    db.assign_subject_teacher(other.id, fx.teacher.id)
        .await
        .unwrap();

    let mine = db
        .list_subjects(&SubjectFilter {
            teacher_id: Some(fx.teacher.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, other.id);

    db.unassign_subject_teacher(other.id, fx.teacher.id)
        .await
        .unwrap();
    assert!(matches!(
        db.unassign_subject_teacher(other.id, fx.teacher.id).await,
        Err(DbError::NotFound(_))
    ));

    // duplicate name within an area
    let dup = db
        .create_subject(&CreateSubject {
            name: "Biology".into(),
            area_id: other.area_id,
            code: None,
            description: None,
            grades: None,
            active: true,
        })
        .await;
    assert!(matches!(dup, Err(DbError::Conflict(_))));
}

pub async fn test_grades_groups_students(db: &dyn Database) {
    let fx = fixture(db).await;
    let grade = db
        .create_grade(&CreateGrade {
            site_id: fx.site_id,
            name: "Sixth".into(),
            code: Some("6".into()),
        })
        .await
        .unwrap();
    assert_eq!(grade.group_count, 0);

    let group = db
        .create_group(&CreateGroup {
            grade_id: grade.id,
            name: "6-A".into(),
            code: None,
        })
        .await
        .unwrap();
    db.create_group(&CreateGroup {
        grade_id: grade.id,
        name: "6-B".into(),
        code: None,
    })
    .await
    .unwrap();
    assert_eq!(db.get_grade(grade.id).await.unwrap().group_count, 2);
    assert_eq!(db.list_groups(Some(grade.id)).await.unwrap().len(), 2);

    let grade = db
        .update_grade(
            grade.id,
            &UpdateGrade {
                code: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(grade.code.is_none());
    assert_eq!(db.list_grades(Some(fx.site_id)).await.unwrap().len(), 1);

    let bravo = db
        .create_student(&CreateStudent {
            group_id: group.id,
            document_number: "1002003".into(),
            first_names: "Bruno".into(),
            last_names: "Zuluaga".into(),
        })
        .await
        .unwrap();
    db.create_student(&CreateStudent {
        group_id: group.id,
        document_number: "1002004".into(),
        first_names: "Alba".into(),
        last_names: "Acosta".into(),
    })
    .await
    .unwrap();

    let roster = db.list_students(Some(group.id)).await.unwrap();
    let last: Vec<_> = roster.iter().map(|s| s.last_names.as_str()).collect();
    assert_eq!(last, vec!["Acosta", "Zuluaga"]);

    let moved = db
        .update_student(
            bravo.id,
            &UpdateStudent {
                first_names: Some("Bruno José".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.first_names, "Bruno José");

    // same document twice in one group
    let dup = db
        .create_student(&CreateStudent {
            group_id: group.id,
            document_number: "1002003".into(),
            first_names: "Other".into(),
            last_names: "Kid".into(),
        })
        .await;
    assert!(matches!(dup, Err(DbError::Conflict(_))));

    // a grade with groups cannot go
    assert!(matches!(
        db.delete_grade(grade.id).await,
        Err(DbError::ForeignKey(_))
    ));

    db.delete_student(bravo.id).await.unwrap();
    assert_eq!(db.list_students(Some(group.id)).await.unwrap().len(), 1);
}

pub async fn test_group_directors(db: &dyn Database) {
    let fx = fixture(db).await;
    let grade = db
        .create_grade(&CreateGrade {
            site_id: fx.site_id,
            name: "Seventh".into(),
            code: None,
        })
        .await
        .unwrap();
    let group = db
        .create_group(&CreateGroup {
            grade_id: grade.id,
            name: "7-A".into(),
            code: None,
        })
        .await
        .unwrap();

    assert!(!db.is_group_director(group.id, fx.teacher.id).await.unwrap());
    db.assign_group_director(group.id, fx.teacher.id)
        .await
        .unwrap();
    db.assign_group_director(group.id, fx.teacher.id)
        .await
        .unwrap();
    assert!(db.is_group_director(group.id, fx.teacher.id).await.unwrap());

    db.unassign_group_director(group.id, fx.teacher.id)
        .await
        .unwrap();
    assert!(!db.is_group_director(group.id, fx.teacher.id).await.unwrap());
    assert!(matches!(
        db.unassign_group_director(group.id, fx.teacher.id).await,
        Err(DbError::NotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

pub async fn test_periods_seeded(db: &dyn Database) {
    let periods = db.list_periods().await.unwrap();
    let names: Vec<_> = periods.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["1", "2", "3", "4"]);
    assert!(periods.iter().all(|p| !p.active));
    assert!(db.get_active_period().await.unwrap().is_none());
}

pub async fn test_period_auto_deactivate(db: &dyn Database) {
    let first = period_id(db, "1").await;
    let second = period_id(db, "2").await;
    let policy = PeriodActivationPolicy::AutoDeactivate;

    let p = db
        .update_period(
            first,
            &UpdatePeriod {
                starts_on: Some(Some(date(2026, 1, 20))),
                ends_on: Some(Some(date(2026, 4, 10))),
                active: Some(true),
            },
            policy,
        )
        .await
        .unwrap();
    assert!(p.active);
    assert_eq!(p.starts_on, Some(date(2026, 1, 20)));

    let p2 = db
        .update_period(
            second,
            &UpdatePeriod {
                active: Some(true),
                ..Default::default()
            },
            policy,
        )
        .await
        .unwrap();
    assert!(p2.active);

    let active = db.get_active_period().await.unwrap().unwrap();
    assert_eq!(active.id, second);
    assert!(!db.get_period(first).await.unwrap().active);

    // dates survive an unrelated update
    let p = db.get_period(first).await.unwrap();
    assert_eq!(p.ends_on, Some(date(2026, 4, 10)));
}

pub async fn test_period_exclusive_lock(db: &dyn Database) {
    let first = period_id(db, "1").await;
    let third = period_id(db, "3").await;
    let policy = PeriodActivationPolicy::ExclusiveLock;

    db.update_period(
        first,
        &UpdatePeriod {
            active: Some(true),
            ..Default::default()
        },
        policy,
    )
    .await
    .unwrap();

    let refused = db
        .update_period(
            third,
            &UpdatePeriod {
                active: Some(true),
                ends_on: Some(Some(date(2026, 11, 30))),
                ..Default::default()
            },
            policy,
        )
        .await;
    assert!(matches!(refused, Err(DbError::Conflict(_))));
    // nothing from the refused update was written
    let third_now = db.get_period(third).await.unwrap();
    assert!(!third_now.active);
    assert!(third_now.ends_on.is_none());

    // re-activating the active one is fine
    db.update_period(
        first,
        &UpdatePeriod {
            active: Some(true),
            ..Default::default()
        },
        policy,
    )
    .await
    .unwrap();

    db.update_period(
        first,
        &UpdatePeriod {
            active: Some(false),
            ..Default::default()
        },
        policy,
    )
    .await
    .unwrap();
    let third_now = db
        .update_period(
            third,
            &UpdatePeriod {
                active: Some(true),
                ..Default::default()
            },
            policy,
        )
        .await
        .unwrap();
    assert!(third_now.active);

    assert!(matches!(
        db.update_period(999, &UpdatePeriod::default(), policy).await,
        Err(DbError::NotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// Lesson plans, comments, featured plans
// ---------------------------------------------------------------------------

pub async fn test_lesson_plans(db: &dyn Database) {
    let fx = fixture(db).await;
    let first = plan(db, &fx, "plan-a", "Cells and tissues").await;
    let second = plan(db, &fx, "plan-b", "Ecosystems overview").await;

    let p = db.get_lesson_plan(first).await.unwrap();
    assert_eq!(p.attachment.remote_id, "plan-a");
    assert_eq!(p.attachment.file_type, FileType::Pdf);

    let mine = db
        .list_lesson_plans(&LessonPlanFilter {
            teacher_id: Some(fx.teacher.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].id, second, "newest first");

    let none = db
        .list_lesson_plans(&LessonPlanFilter {
            teacher_id: Some(fx.coordinator.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());

    // title only
    let renamed = db
        .update_lesson_plan(
            first,
            &UpdateLessonPlan {
                title: Some("Cells, tissues and organs".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(renamed.title, "Cells, tissues and organs");
    assert_eq!(renamed.attachment.remote_id, "plan-a");

    // new file
    let replaced = db
        .update_lesson_plan(
            first,
            &UpdateLessonPlan::default(),
            Some(&attachment("plan-a2", FileType::Docx)),
        )
        .await
        .unwrap();
    assert_eq!(replaced.attachment.remote_id, "plan-a2");
    assert_eq!(replaced.attachment.file_type, FileType::Docx);
    assert!(replaced.uploaded_at >= p.uploaded_at);

    db.delete_lesson_plan(second).await.unwrap();
    assert!(matches!(
        db.get_lesson_plan(second).await,
        Err(DbError::NotFound(_))
    ));
}

pub async fn test_plan_comments(db: &dyn Database) {
    let fx = fixture(db).await;
    let plan_id = plan(db, &fx, "plan-c", "Photosynthesis").await;

    let c = db
        .create_plan_comment(
            fx.coordinator.id,
            &CreatePlanComment {
                plan_id,
                content: "Please add an assessment rubric.".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(c.plan_id, plan_id);
    assert_eq!(c.author_id, fx.coordinator.id);

    let edited = db
        .update_plan_comment(c.id, "Please add a rubric and timings.")
        .await
        .unwrap();
    assert_eq!(edited.content, "Please add a rubric and timings.");

    let for_teacher = db
        .list_plan_comments(&PlanCommentFilter {
            plan_teacher_id: Some(fx.teacher.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(for_teacher.len(), 1);

    let for_other = db
        .list_plan_comments(&PlanCommentFilter {
            plan_teacher_id: Some(fx.coordinator.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(for_other.is_empty());

    // comments go with their plan
    db.delete_lesson_plan(plan_id).await.unwrap();
    assert!(matches!(
        db.get_plan_comment(c.id).await,
        Err(DbError::NotFound(_))
    ));
}

pub async fn test_featured_plans(db: &dyn Database) {
    let fx = fixture(db).await;
    let plan_id = plan(db, &fx, "plan-f", "Water cycle project").await;

    let f = db
        .create_featured_plan(
            fx.coordinator.id,
            &CreateFeaturedPlan {
                plan_id,
                reason: "Excellent use of local context in every lesson".into(),
            },
        )
        .await
        .unwrap();
    assert!(f.featured.active);
    assert_eq!(f.featured.views, 0);
    assert_eq!(f.plan_title, "Water cycle project");
    assert_eq!(f.teacher_name, fx.teacher.full_name);
    assert_eq!(f.subject_name, "Biology");
    assert_eq!(f.site_name, "Main campus");

    let again = db
        .create_featured_plan(
            fx.coordinator.id,
            &CreateFeaturedPlan {
                plan_id,
                reason: "Featured a second time for some reason".into(),
            },
        )
        .await;
    assert!(matches!(again, Err(DbError::Conflict(_))));

    db.increment_featured_views(f.featured.id).await.unwrap();
    let viewed = db.increment_featured_views(f.featured.id).await.unwrap();
    assert_eq!(viewed.featured.views, 2);

    db.update_featured_plan(
        f.featured.id,
        &UpdateFeaturedPlan {
            active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(db.list_featured_plans(true).await.unwrap().is_empty());
    assert_eq!(db.list_featured_plans(false).await.unwrap().len(), 1);

    db.delete_featured_plan(f.featured.id).await.unwrap();
    assert!(matches!(
        db.get_featured_plan(f.featured.id).await,
        Err(DbError::NotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// Projects, evidence, project comments
// ---------------------------------------------------------------------------

pub async fn test_projects(db: &dyn Database) {
    let fx = fixture(db).await;

    let bare = db
        .create_project(fx.teacher.id, &make_project("School garden"), None)
        .await
        .unwrap();
    assert!(bare.attachment.is_none());
    assert_eq!(bare.status, ProjectStatus::Active);

    let with_file = db
        .create_project(
            fx.teacher.id,
            &make_project("Reading club"),
            Some(&attachment("proj-1", FileType::Png)),
        )
        .await
        .unwrap();
    assert_eq!(with_file.attachment.as_ref().unwrap().remote_id, "proj-1");

    let paused = db
        .update_project(
            bare.id,
            &UpdateProject {
                status: Some(ProjectStatus::Paused),
                estimated_end: Some(Some(date(2026, 11, 1))),
                ..Default::default()
            },
            &AttachmentChange::Replace(attachment("proj-2", FileType::Mp4)),
        )
        .await
        .unwrap();
    assert_eq!(paused.status, ProjectStatus::Paused);
    assert_eq!(paused.estimated_end, Some(date(2026, 11, 1)));
    assert_eq!(paused.attachment.unwrap().file_type, FileType::Mp4);

    let removed = db
        .update_project(
            with_file.id,
            &UpdateProject::default(),
            &AttachmentChange::Remove,
        )
        .await
        .unwrap();
    assert!(removed.attachment.is_none());

    let kept = db
        .update_project(
            bare.id,
            &UpdateProject {
                title: Some("School vegetable garden".into()),
                ..Default::default()
            },
            &AttachmentChange::Keep,
        )
        .await
        .unwrap();
    assert_eq!(kept.attachment.unwrap().remote_id, "proj-2");

    let paused_only = db
        .list_projects(&ProjectFilter {
            status: Some(ProjectStatus::Paused),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(paused_only.len(), 1);
    assert_eq!(paused_only[0].id, bare.id);

    let all = db
        .list_projects(&ProjectFilter {
            teacher_id: Some(fx.teacher.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, with_file.id, "newest first");
}

pub async fn test_evidence_and_comments(db: &dyn Database) {
    let fx = fixture(db).await;
    let project = db
        .create_project(fx.teacher.id, &make_project("Recycling"), None)
        .await
        .unwrap();

    let older = db
        .create_evidence(
            project.id,
            fx.teacher.id,
            &CreateEvidence {
                title: "First collection".into(),
                description: None,
                evidence_date: Some(date(2026, 3, 1)),
            },
            &attachment("ev-1", FileType::Jpg),
        )
        .await
        .unwrap();
    let today = db
        .create_evidence(
            project.id,
            fx.teacher.id,
            &CreateEvidence {
                title: "Weekly weigh-in".into(),
                description: Some("12 kg".into()),
                evidence_date: None,
            },
            &attachment("ev-2", FileType::Xlsx),
        )
        .await
        .unwrap();
    assert_eq!(today.evidence_date, Utc::now().date_naive());

    let listed = db.list_evidence(project.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, today.id, "most recent evidence date first");
    assert_eq!(listed[1].id, older.id);

    let on_project = db
        .create_project_comment(
            fx.coordinator.id,
            CommentTarget::Project(project.id),
            "Great start, keep it up!",
        )
        .await
        .unwrap();
    let on_evidence = db
        .create_project_comment(
            fx.teacher.id,
            CommentTarget::Evidence(older.id),
            "Photos from the first day",
        )
        .await
        .unwrap();
    assert_eq!(on_evidence.target, CommentTarget::Evidence(older.id));

    let project_thread = db
        .list_project_comments(CommentTarget::Project(project.id))
        .await
        .unwrap();
    assert_eq!(project_thread.len(), 1);
    assert_eq!(project_thread[0].id, on_project.id);

    let edited = db
        .update_project_comment(on_project.id, "Great start!")
        .await
        .unwrap();
    assert_eq!(edited.content, "Great start!");
    assert_eq!(edited.target, CommentTarget::Project(project.id));

    // deleting evidence takes its comments
    db.delete_evidence(older.id).await.unwrap();
    assert!(matches!(
        db.get_project_comment(on_evidence.id).await,
        Err(DbError::NotFound(_))
    ));

    // deleting the project takes everything else
    db.delete_project(project.id).await.unwrap();
    assert!(matches!(
        db.get_evidence(today.id).await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(
        db.get_project_comment(on_project.id).await,
        Err(DbError::NotFound(_))
    ));
}

pub async fn test_comment_on_missing_target(db: &dyn Database) {
    let u = user(db, "4440001", Role::Principal).await;
    let res = db
        .create_project_comment(u.id, CommentTarget::Project(424_242), "Dangling comment")
        .await;
    assert!(matches!(res, Err(DbError::ForeignKey(_))));
}

// ---------------------------------------------------------------------------
// Observations and announcements
// ---------------------------------------------------------------------------

pub async fn test_observations(db: &dyn Database) {
    let fx = fixture(db).await;
    let grade = db
        .create_grade(&CreateGrade {
            site_id: fx.site_id,
            name: "Eighth".into(),
            code: None,
        })
        .await
        .unwrap();
    let group = db
        .create_group(&CreateGroup {
            grade_id: grade.id,
            name: "8-A".into(),
            code: None,
        })
        .await
        .unwrap();
    let student = db
        .create_student(&CreateStudent {
            group_id: group.id,
            document_number: "99887766".into(),
            first_names: "Carla".into(),
            last_names: "Ruiz".into(),
        })
        .await
        .unwrap();

    let input = CreateObservation {
        student_id: student.id,
        strengths: Some("Leads group work".into()),
        difficulties: None,
        commitments: None,
    };
    let second_term = db
        .create_observation(fx.teacher.id, 2, &input)
        .await
        .unwrap();
    let first_term = db
        .create_observation(fx.teacher.id, 1, &input)
        .await
        .unwrap();
    assert_eq!(first_term.period, 1);

    // one per student, teacher and term
    let dup = db.create_observation(fx.teacher.id, 1, &input).await;
    assert!(matches!(dup, Err(DbError::Conflict(_))));

    // term out of range
    let bad = db.create_observation(fx.teacher.id, 5, &input).await;
    assert!(matches!(bad, Err(DbError::Constraint(_))));

    let all = db.list_observations(student.id, None).await.unwrap();
    let terms: Vec<_> = all.iter().map(|o| o.period).collect();
    assert_eq!(terms, vec![1, 2]);

    let only_second = db.list_observations(student.id, Some(2)).await.unwrap();
    assert_eq!(only_second.len(), 1);
    assert_eq!(only_second[0].id, second_term.id);

    let updated = db
        .update_observation(
            first_term.id,
            &UpdateObservation {
                strengths: Some(None),
                commitments: Some(Some("Read 20 minutes a day".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.strengths.is_none());
    assert_eq!(updated.commitments.as_deref(), Some("Read 20 minutes a day"));

    // student removal takes the observations
    db.delete_student(student.id).await.unwrap();
    assert!(matches!(
        db.get_observation(first_term.id).await,
        Err(DbError::NotFound(_))
    ));
}

pub async fn test_announcements(db: &dyn Database) {
    let author = user(db, "6660001", Role::Principal).await;

    let plain = db
        .create_announcement(
            author.id,
            &CreateAnnouncement {
                title: "Parent meeting".into(),
                content: "Friday at 7am in the main hall.".into(),
            },
            None,
        )
        .await
        .unwrap();
    assert!(plain.attachment.is_none());

    let with_file = db
        .create_announcement(
            author.id,
            &CreateAnnouncement {
                title: "Calendar".into(),
                content: "Attached is the academic calendar.".into(),
            },
            Some(&attachment("ann-1", FileType::Pdf)),
        )
        .await
        .unwrap();

    let listed = db.list_announcements().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, with_file.id, "newest first");

    let attached = db
        .update_announcement(
            plain.id,
            &UpdateAnnouncement {
                title: Some("Parent meeting moved".into()),
                content: None,
            },
            &AttachmentChange::Replace(attachment("ann-2", FileType::Png)),
        )
        .await
        .unwrap();
    assert_eq!(attached.title, "Parent meeting moved");
    assert_eq!(attached.content, "Friday at 7am in the main hall.");
    assert_eq!(attached.attachment.unwrap().remote_id, "ann-2");

    let detached = db
        .update_announcement(
            with_file.id,
            &UpdateAnnouncement::default(),
            &AttachmentChange::Remove,
        )
        .await
        .unwrap();
    assert!(detached.attachment.is_none());

    db.delete_announcement(plain.id).await.unwrap();
    assert!(matches!(
        db.delete_announcement(plain.id).await,
        Err(DbError::NotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// Constraint mapping
// ---------------------------------------------------------------------------

pub async fn test_constraint_errors(db: &dyn Database) {
    user(db, "1110001", Role::Teacher).await;
    let dup = db
        .create_user(&make_user("1110001", Role::Teacher), "hash")
        .await;
    assert!(matches!(dup, Err(DbError::Conflict(_))));

    let orphan = db
        .create_grade(&CreateGrade {
            site_id: 987_654,
            name: "Nowhere".into(),
            code: None,
        })
        .await;
    assert!(matches!(orphan, Err(DbError::ForeignKey(_))));

    let site = db
        .create_site(&CreateSite {
            name: "South".into(),
            code: "S1".into(),
            address: None,
            active: true,
        })
        .await
        .unwrap();
    db.create_grade(&CreateGrade {
        site_id: site.id,
        name: "First".into(),
        code: None,
    })
    .await
    .unwrap();
    // grades still reference the site
    assert!(matches!(
        db.delete_site(site.id).await,
        Err(DbError::ForeignKey(_))
    ));

    let same_code = db
        .create_site(&CreateSite {
            name: "South annex".into(),
            code: "S1".into(),
            address: None,
            active: true,
        })
        .await;
    assert!(matches!(same_code, Err(DbError::Conflict(_))));
}
