//! Sessions, user administration, academic structure, periods and
//! observations.

mod common;

use std::sync::Arc;

use aula_core::area::CreateArea;
use aula_core::group::CreateGroup;
use aula_core::grade::CreateGrade;
use aula_core::observation::{CreateObservation, UpdateObservation};
use aula_core::site::CreateSite;
use aula_core::student::{CreateStudent, UpdateStudent};
use aula_core::subject::{CreateSubject, SubjectFilter, UpdateSubject};
use aula_core::user::{UpdateUser, UserFilter};
use aula_core::{PeriodActivationPolicy, Role};
use aula_db::SqliteDatabase;
use aula_service::ServiceError;

use common::{harness, harness_with_db, harness_with_policy, new_user, Harness, PASSWORD};

// ---- sessions ----

#[tokio::test]
async fn login_authenticate_logout() {
    let h = harness().await;
    let session = h.svc.login("3000001", PASSWORD).await.unwrap();
    assert!(session.token.starts_with("aula_"));
    assert_eq!(session.token_type, "bearer");
    assert_eq!(session.user.id, h.teacher.id);

    let user = h.svc.authenticate(&session.token).await.unwrap();
    assert_eq!(user.id, h.teacher.id);

    h.svc.logout(&session.token).await.unwrap();
    assert!(matches!(
        h.svc.authenticate(&session.token).await,
        Err(ServiceError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn login_failures_do_not_leak_existence() {
    let h = harness().await;
    let wrong_password = h.svc.login("3000001", "not-the-password").await.unwrap_err();
    let unknown = h.svc.login("9999999", PASSWORD).await.unwrap_err();
    match (wrong_password, unknown) {
        (ServiceError::Unauthorized(a), ServiceError::Unauthorized(b)) => assert_eq!(a, b),
        other => panic!("expected two Unauthorized errors, got {other:?}"),
    }
    assert!(matches!(
        h.svc.authenticate("aula_doesnotexist").await,
        Err(ServiceError::Unauthorized(_))
    ));
    assert!(matches!(
        h.svc.authenticate("garbage").await,
        Err(ServiceError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn inactive_users_are_forbidden() {
    let h = harness().await;
    let session = h.svc.login("3000001", PASSWORD).await.unwrap();
    h.svc
        .update_user(
            &h.principal,
            h.teacher.id,
            &UpdateUser {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        h.svc.authenticate(&session.token).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        h.svc.login("3000001", PASSWORD).await,
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn password_change_takes_effect() {
    let h = harness().await;
    h.svc
        .update_user(
            &h.coordinator,
            h.teacher.id,
            &UpdateUser {
                password: Some("a-new-password".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(h.svc.login("3000001", PASSWORD).await.is_err());
    h.svc.login("3000001", "a-new-password").await.unwrap();
}

// ---- users ----

#[tokio::test]
async fn user_administration() {
    let h = harness().await;

    let err = h
        .svc
        .create_user(&h.teacher, &new_user("4000001", Role::Teacher, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = h
        .svc
        .create_user(&h.coordinator, &new_user("3000001", Role::Teacher, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let mut weak = new_user("4000002", Role::Teacher, None);
    weak.password = "short".into();
    assert!(matches!(
        h.svc.create_user(&h.coordinator, &weak).await,
        Err(ServiceError::Validation(_))
    ));

    let teachers = h
        .svc
        .list_users(
            &h.coordinator,
            &UserFilter {
                role: Some(Role::Teacher),
                active: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(teachers.len(), 2);
    assert!(matches!(
        h.svc.list_users(&h.teacher, &UserFilter::default()).await,
        Err(ServiceError::Forbidden(_))
    ));

    assert_eq!(
        h.svc.get_user(&h.teacher, h.teacher.id).await.unwrap().id,
        h.teacher.id
    );
    assert!(matches!(
        h.svc.get_user(&h.teacher, h.other_teacher.id).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert_eq!(h.svc.user_count().await.unwrap(), 4);
}

// ---- structure ----

#[tokio::test]
async fn structure_mutations_check_role_before_existence() {
    let h = harness().await;
    let site = CreateSite {
        name: "North campus".into(),
        code: "NORTH".into(),
        address: None,
        active: true,
    };
    assert!(matches!(
        h.svc.create_site(&h.teacher, &site).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        h.svc.delete_site(&h.teacher, 9999).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        h.svc.delete_site(&h.coordinator, 9999).await,
        Err(ServiceError::NotFound(_))
    ));

    let created = h.svc.create_site(&h.coordinator, &site).await.unwrap();
    assert!(matches!(
        h.svc.create_site(&h.coordinator, &site).await,
        Err(ServiceError::Conflict(_))
    ));
    assert_eq!(h.svc.list_sites().await.unwrap().len(), 2);
    h.svc.delete_site(&h.principal, created.id).await.unwrap();

    assert!(matches!(
        h.svc
            .create_area(
                &h.teacher,
                &CreateArea {
                    name: "Arts".into(),
                    description: None,
                    active: true,
                },
            )
            .await,
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn subjects_and_teacher_assignment() {
    let h = harness().await;

    let missing_area = CreateSubject {
        name: "Chemistry".into(),
        area_id: 9999,
        code: None,
        description: None,
        grades: None,
        active: true,
    };
    assert!(matches!(
        h.svc.create_subject(&h.coordinator, &missing_area).await,
        Err(ServiceError::NotFound(_))
    ));

    h.svc
        .update_subject(
            &h.coordinator,
            h.subject_id,
            &UpdateSubject {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(h
        .svc
        .list_subjects(&SubjectFilter::default())
        .await
        .unwrap()
        .is_empty());
    let inactive = h
        .svc
        .list_subjects(&SubjectFilter {
            active: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(inactive.len(), 1);

    assert!(matches!(
        h.svc
            .assign_subject_teacher(&h.principal, h.subject_id, h.coordinator.id)
            .await,
        Err(ServiceError::Validation(_))
    ));
    h.svc
        .assign_subject_teacher(&h.principal, h.subject_id, h.teacher.id)
        .await
        .unwrap();
    assert!(matches!(
        h.svc
            .assign_subject_teacher(&h.principal, h.subject_id, h.teacher.id)
            .await,
        Err(ServiceError::Conflict(_))
    ));
    h.svc
        .unassign_subject_teacher(&h.principal, h.subject_id, h.teacher.id)
        .await
        .unwrap();
    assert!(matches!(
        h.svc
            .unassign_subject_teacher(&h.principal, h.subject_id, h.teacher.id)
            .await,
        Err(ServiceError::NotFound(_))
    ));
}

async fn make_group(h: &Harness) -> i64 {
    let grade = h
        .svc
        .create_grade(
            &h.coordinator,
            &CreateGrade {
                site_id: h.site_id,
                name: "Sixth".into(),
                code: Some("6".into()),
            },
        )
        .await
        .unwrap();
    h.svc
        .create_group(
            &h.coordinator,
            &CreateGroup {
                grade_id: grade.id,
                name: "6A".into(),
                code: None,
            },
        )
        .await
        .unwrap()
        .id
}

fn student(group_id: i64, doc: &str) -> CreateStudent {
    CreateStudent {
        group_id,
        document_number: doc.into(),
        first_names: "Laura".into(),
        last_names: "Gómez".into(),
    }
}

#[tokio::test]
async fn grades_and_groups() {
    let h = harness().await;
    assert!(matches!(
        h.svc
            .create_grade(
                &h.coordinator,
                &CreateGrade {
                    site_id: 9999,
                    name: "Seventh".into(),
                    code: None,
                },
            )
            .await,
        Err(ServiceError::NotFound(_))
    ));
    let group_id = make_group(&h).await;
    let grades = h.svc.list_grades(Some(h.site_id)).await.unwrap();
    assert_eq!(grades.len(), 1);
    assert_eq!(grades[0].group_count, 1);
    assert_eq!(h.svc.list_groups(Some(grades[0].id)).await.unwrap().len(), 1);

    assert!(matches!(
        h.svc
            .assign_group_director(&h.coordinator, group_id, h.principal.id)
            .await,
        Err(ServiceError::Validation(_))
    ));
    h.svc
        .assign_group_director(&h.coordinator, group_id, h.teacher.id)
        .await
        .unwrap();
    assert!(matches!(
        h.svc
            .assign_group_director(&h.coordinator, group_id, h.teacher.id)
            .await,
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        h.svc
            .unassign_group_director(&h.coordinator, group_id, h.other_teacher.id)
            .await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn students_are_managed_by_admins_and_directors() {
    let h = harness().await;
    let group_id = make_group(&h).await;
    h.svc
        .assign_group_director(&h.coordinator, group_id, h.teacher.id)
        .await
        .unwrap();

    // existence before permission
    assert!(matches!(
        h.svc
            .create_student(&h.other_teacher, &student(9999, "1234567"))
            .await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        h.svc
            .create_student(&h.other_teacher, &student(group_id, "1234567"))
            .await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        h.svc.create_student(&h.teacher, &student(group_id, "123")).await,
        Err(ServiceError::Validation(_))
    ));

    let created = h
        .svc
        .create_student(&h.teacher, &student(group_id, "1234567"))
        .await
        .unwrap();
    assert!(matches!(
        h.svc
            .create_student(&h.coordinator, &student(group_id, "1234567"))
            .await,
        Err(ServiceError::Conflict(_))
    ));

    let update = UpdateStudent {
        first_names: Some("Laura Sofía".into()),
        ..Default::default()
    };
    assert!(matches!(
        h.svc.update_student(&h.other_teacher, created.id, &update).await,
        Err(ServiceError::Forbidden(_))
    ));
    let updated = h
        .svc
        .update_student(&h.teacher, created.id, &update)
        .await
        .unwrap();
    assert_eq!(updated.first_names, "Laura Sofía");
    assert_eq!(h.svc.list_students(Some(group_id)).await.unwrap().len(), 1);

    h.svc.delete_student(&h.principal, created.id).await.unwrap();
    assert!(matches!(
        h.svc.delete_student(&h.principal, created.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

// ---- periods ----

#[tokio::test]
async fn no_active_period_is_not_found() {
    let h = harness().await;
    assert_eq!(h.svc.list_periods().await.unwrap().len(), 4);
    assert!(matches!(
        h.svc.active_period().await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn auto_deactivate_leaves_exactly_one_active() {
    let h = harness().await;
    h.activate("1").await;
    let second = h.activate("2").await;
    h.activate("4").await;
    let third = h.activate("3").await;

    assert_eq!(h.svc.active_period().await.unwrap().id, third.id);
    let active: Vec<_> = h
        .svc
        .list_periods()
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.active)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "3");
    assert!(!h.svc.get_period(second.id).await.unwrap().active);
}

#[tokio::test]
async fn exclusive_lock_refuses_second_activation() {
    let h = harness_with_policy(PeriodActivationPolicy::ExclusiveLock).await;
    let first = h.activate("1").await;

    assert!(matches!(
        h.set_active("2", true).await,
        Err(ServiceError::Conflict(_))
    ));
    assert_eq!(h.svc.active_period().await.unwrap().id, first.id);

    h.set_active("1", false).await.unwrap();
    let second = h.activate("2").await;
    assert_eq!(h.svc.active_period().await.unwrap().id, second.id);
}

#[tokio::test]
async fn only_admins_update_periods() {
    let h = harness().await;
    let period = h.period("1").await;
    let update = aula_core::period::UpdatePeriod {
        active: Some(true),
        ..Default::default()
    };
    assert!(matches!(
        h.svc.update_period(&h.teacher, period.id, &update).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        h.svc.update_period(&h.coordinator, 9999, &update).await,
        Err(ServiceError::NotFound(_))
    ));
}

// ---- observations ----

async fn student_id(h: &Harness) -> i64 {
    let group_id = make_group(h).await;
    h.svc
        .create_student(&h.coordinator, &student(group_id, "7654321"))
        .await
        .unwrap()
        .id
}

fn observation(student_id: i64) -> CreateObservation {
    CreateObservation {
        student_id,
        strengths: Some("Participates actively".into()),
        difficulties: Some("Arrives late".into()),
        commitments: None,
    }
}

#[tokio::test]
async fn observation_creation_rules() {
    let h = harness().await;
    let sid = student_id(&h).await;

    assert!(matches!(
        h.svc.create_observation(&h.teacher, &observation(9999)).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        h.svc.create_observation(&h.teacher, &observation(sid)).await,
        Err(ServiceError::Validation(_))
    ));
    assert!(h.svc.current_observations(sid).await.unwrap().is_empty());

    h.activate("2").await;
    let created = h
        .svc
        .create_observation(&h.teacher, &observation(sid))
        .await
        .unwrap();
    assert_eq!(created.period, 2);
    assert_eq!(created.teacher_id, h.teacher.id);
    assert!(matches!(
        h.svc.create_observation(&h.teacher, &observation(sid)).await,
        Err(ServiceError::Conflict(_))
    ));
    // a different teacher may observe the same student in the same period
    h.svc
        .create_observation(&h.other_teacher, &observation(sid))
        .await
        .unwrap();
    assert_eq!(h.svc.current_observations(sid).await.unwrap().len(), 2);

    h.activate("1").await;
    h.svc
        .create_observation(&h.teacher, &observation(sid))
        .await
        .unwrap();
    assert_eq!(h.svc.current_observations(sid).await.unwrap().len(), 1);

    let history = h.svc.observation_history(sid).await.unwrap();
    let periods: Vec<i64> = history.iter().map(|o| o.period).collect();
    assert_eq!(periods, vec![1, 2, 2]);
}

#[tokio::test]
async fn unnumbered_active_period_blocks_observations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aula.db");
    let db = Arc::new(SqliteDatabase::open_path(&path).unwrap());
    let h = harness_with_db(db, PeriodActivationPolicy::AutoDeactivate).await;
    let sid = student_id(&h).await;
    h.activate("2").await;

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("UPDATE periods SET name = 'first' WHERE active = 1", [])
        .unwrap();

    let active = h.svc.active_period().await.unwrap();
    assert_eq!(active.name, "first");
    assert!(matches!(
        h.svc.create_observation(&h.teacher, &observation(sid)).await,
        Err(ServiceError::Configuration(_))
    ));
    assert!(h.svc.current_observations(sid).await.unwrap().is_empty());
    assert!(h.svc.observation_history(sid).await.unwrap().is_empty());
}

#[tokio::test]
async fn observation_edits_are_author_or_admin() {
    let h = harness().await;
    let sid = student_id(&h).await;
    h.activate("3").await;
    let created = h
        .svc
        .create_observation(&h.teacher, &observation(sid))
        .await
        .unwrap();

    let update = UpdateObservation {
        commitments: Some(Some("Weekly check-in".into())),
        ..Default::default()
    };
    assert!(matches!(
        h.svc
            .update_observation(&h.other_teacher, created.id, &update)
            .await,
        Err(ServiceError::Forbidden(_))
    ));
    let updated = h
        .svc
        .update_observation(&h.coordinator, created.id, &update)
        .await
        .unwrap();
    assert_eq!(updated.commitments.as_deref(), Some("Weekly check-in"));

    assert!(matches!(
        h.svc.delete_observation(&h.other_teacher, created.id).await,
        Err(ServiceError::Forbidden(_))
    ));
    h.svc.delete_observation(&h.teacher, created.id).await.unwrap();
    assert!(matches!(
        h.svc.get_observation(created.id).await,
        Err(ServiceError::NotFound(_))
    ));
}
