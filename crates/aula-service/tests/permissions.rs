//! Role and ownership rules, pinned per resource, including whether a
//! caller sees NotFound or Forbidden first.

mod common;

use aula_core::announcement::{CreateAnnouncement, UpdateAnnouncement};
use aula_core::evidence::CreateEvidence;
use aula_core::featured_plan::{CreateFeaturedPlan, UpdateFeaturedPlan};
use aula_core::lesson_plan::{CreateLessonPlan, LessonPlan, LessonPlanFilter, UpdateLessonPlan};
use aula_core::plan_comment::{CreatePlanComment, PlanCommentFilter};
use aula_core::project::{CreateProject, Project, ProjectFilter, UpdateProject};
use aula_core::project_comment::{CommentTarget, CreateProjectComment};
use aula_core::User;
use aula_service::ServiceError;

use common::{date, file, harness, pdf, Harness};

async fn plan_by(h: &Harness, teacher: &User, title: &str) -> LessonPlan {
    h.svc
        .create_lesson_plan(
            teacher,
            &CreateLessonPlan {
                subject_id: h.subject_id,
                title: title.into(),
            },
            pdf(16),
        )
        .await
        .unwrap()
}

async fn project_by(h: &Harness, teacher: &User) -> Project {
    h.svc
        .create_project(
            teacher,
            &CreateProject {
                title: "Reading club".into(),
                description: "Weekly reading circle for the sixth grade.".into(),
                objectives: Some("Read six books".into()),
                starts_on: date(2026, 3, 1),
                estimated_end: Some(date(2026, 11, 30)),
            },
            None,
        )
        .await
        .unwrap()
}

fn forbidden<T: std::fmt::Debug>(res: Result<T, ServiceError>) {
    match res {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

fn not_found<T: std::fmt::Debug>(res: Result<T, ServiceError>) {
    match res {
        Err(ServiceError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn lesson_plan_ownership() {
    let h = harness().await;
    h.activate("1").await;
    let plan = plan_by(&h, &h.teacher, "Photosynthesis lab").await;

    let update = UpdateLessonPlan {
        title: Some("Hijacked title".into()),
        ..Default::default()
    };
    forbidden(h.svc.update_lesson_plan(&h.other_teacher, plan.id, &update, None).await);
    // administrators can delete but never edit someone else's plan
    forbidden(h.svc.update_lesson_plan(&h.coordinator, plan.id, &update, None).await);
    forbidden(h.svc.delete_lesson_plan(&h.other_teacher, plan.id).await);
    not_found(h.svc.update_lesson_plan(&h.other_teacher, 9999, &update, None).await);

    h.svc.delete_lesson_plan(&h.coordinator, plan.id).await.unwrap();
}

#[tokio::test]
async fn lesson_plan_creation_rules() {
    let h = harness().await;
    h.activate("1").await;
    let input = CreateLessonPlan {
        subject_id: h.subject_id,
        title: "Valid title".into(),
    };

    forbidden(h.svc.create_lesson_plan(&h.coordinator, &input, pdf(5)).await);

    let mut siteless = h.teacher.clone();
    siteless.site_id = None;
    assert!(matches!(
        h.svc.create_lesson_plan(&siteless, &input, pdf(5)).await,
        Err(ServiceError::Validation(_))
    ));

    let missing_subject = CreateLessonPlan {
        subject_id: 4242,
        ..input.clone()
    };
    not_found(h.svc.create_lesson_plan(&h.teacher, &missing_subject, pdf(5)).await);

    let short_title = CreateLessonPlan {
        title: "abc".into(),
        ..input
    };
    assert!(matches!(
        h.svc.create_lesson_plan(&h.teacher, &short_title, pdf(5)).await,
        Err(ServiceError::Validation(_))
    ));
    assert_eq!(h.store.upload_calls(), 0);
}

#[tokio::test]
async fn teachers_only_list_their_own_plans() {
    let h = harness().await;
    h.activate("1").await;
    plan_by(&h, &h.teacher, "Plan by the first").await;
    let other = plan_by(&h, &h.other_teacher, "Plan by the second").await;

    let asked_for_other = LessonPlanFilter {
        teacher_id: Some(h.other_teacher.id),
        ..Default::default()
    };
    let seen = h
        .svc
        .list_lesson_plans(&h.teacher, &asked_for_other)
        .await
        .unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].teacher_id, h.teacher.id);

    let admin_view = h
        .svc
        .list_lesson_plans(&h.coordinator, &asked_for_other)
        .await
        .unwrap();
    assert_eq!(admin_view.len(), 1);
    assert_eq!(admin_view[0].id, other.id);

    forbidden(h.svc.my_lesson_plans(&h.coordinator, None).await);
    let mine = h.svc.my_lesson_plans(&h.other_teacher, None).await.unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn plan_comment_rules() {
    let h = harness().await;
    h.activate("1").await;
    let plan = plan_by(&h, &h.teacher, "Genetics introduction").await;
    let other_plan = plan_by(&h, &h.other_teacher, "Ecology introduction").await;

    let input = CreatePlanComment {
        plan_id: plan.id,
        content: "Good structure overall.".into(),
    };
    forbidden(h.svc.create_plan_comment(&h.teacher, &input).await);
    // role is checked before the plan lookup
    forbidden(
        h.svc
            .create_plan_comment(
                &h.teacher,
                &CreatePlanComment {
                    plan_id: 9999,
                    ..input.clone()
                },
            )
            .await,
    );
    not_found(
        h.svc
            .create_plan_comment(
                &h.coordinator,
                &CreatePlanComment {
                    plan_id: 9999,
                    ..input.clone()
                },
            )
            .await,
    );
    assert!(matches!(
        h.svc
            .create_plan_comment(
                &h.coordinator,
                &CreatePlanComment {
                    plan_id: plan.id,
                    content: "short".into(),
                },
            )
            .await,
        Err(ServiceError::Validation(_))
    ));

    let comment = h.svc.create_plan_comment(&h.coordinator, &input).await.unwrap();
    h.svc
        .create_plan_comment(
            &h.coordinator,
            &CreatePlanComment {
                plan_id: other_plan.id,
                content: "Needs more field work.".into(),
            },
        )
        .await
        .unwrap();

    // teachers only see comments on their own plans
    let seen = h
        .svc
        .list_plan_comments(&h.teacher, &PlanCommentFilter::default())
        .await
        .unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].id, comment.id);
    assert!(h
        .svc
        .list_comments_for_plan(&h.teacher, other_plan.id)
        .await
        .unwrap()
        .is_empty());
    not_found(h.svc.list_comments_for_plan(&h.teacher, 9999).await);
    assert_eq!(
        h.svc
            .list_plan_comments(&h.principal, &PlanCommentFilter::default())
            .await
            .unwrap()
            .len(),
        2
    );

    // only the author edits; the principal may delete
    forbidden(
        h.svc
            .update_plan_comment(&h.principal, comment.id, "Principal rewrite attempt")
            .await,
    );
    let edited = h
        .svc
        .update_plan_comment(&h.coordinator, comment.id, "Good structure, add sources.")
        .await
        .unwrap();
    assert_eq!(edited.content, "Good structure, add sources.");
    h.svc.delete_plan_comment(&h.principal, comment.id).await.unwrap();
}

#[tokio::test]
async fn featured_plan_rules() {
    let h = harness().await;
    h.activate("1").await;
    let plan = plan_by(&h, &h.teacher, "Model ecosystem").await;

    let input = CreateFeaturedPlan {
        plan_id: plan.id,
        reason: "Excellent use of hands-on activities.".into(),
    };
    forbidden(h.svc.create_featured_plan(&h.teacher, &input).await);
    assert!(matches!(
        h.svc
            .create_featured_plan(
                &h.coordinator,
                &CreateFeaturedPlan {
                    plan_id: plan.id,
                    reason: "Too short".into(),
                },
            )
            .await,
        Err(ServiceError::Validation(_))
    ));

    let featured = h.svc.create_featured_plan(&h.coordinator, &input).await.unwrap();
    assert_eq!(featured.plan_title, "Model ecosystem");
    assert_eq!(featured.featured.views, 0);
    assert!(matches!(
        h.svc.create_featured_plan(&h.principal, &input).await,
        Err(ServiceError::Conflict(_))
    ));

    let viewed = h.svc.record_featured_view(featured.featured.id).await.unwrap();
    assert_eq!(viewed.featured.views, 1);

    let deactivate = UpdateFeaturedPlan {
        active: Some(false),
        ..Default::default()
    };
    forbidden(
        h.svc
            .update_featured_plan(&h.teacher, featured.featured.id, &deactivate)
            .await,
    );
    h.svc
        .update_featured_plan(&h.principal, featured.featured.id, &deactivate)
        .await
        .unwrap();
    assert!(h.svc.list_featured_plans(true).await.unwrap().is_empty());
    assert_eq!(h.svc.list_featured_plans(false).await.unwrap().len(), 1);

    h.svc
        .delete_featured_plan(&h.coordinator, featured.featured.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn project_visibility_and_ownership() {
    let h = harness().await;
    let project = project_by(&h, &h.teacher).await;
    project_by(&h, &h.other_teacher).await;

    forbidden(h.svc.get_project(&h.other_teacher, project.id).await);
    not_found(h.svc.get_project(&h.other_teacher, 9999).await);
    h.svc.get_project(&h.coordinator, project.id).await.unwrap();

    let mine = h
        .svc
        .list_projects(&h.teacher, &ProjectFilter::default())
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    let all = h
        .svc
        .list_projects(&h.principal, &ProjectFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let admin_project = CreateProject {
        title: "Admin project".into(),
        description: "Coordinators do not own projects here.".into(),
        objectives: None,
        starts_on: date(2026, 1, 1),
        estimated_end: None,
    };
    forbidden(
        h.svc
            .create_project(&h.coordinator, &admin_project, None)
            .await,
    );

    let update = UpdateProject {
        status: Some(aula_core::project::ProjectStatus::Paused),
        ..Default::default()
    };
    forbidden(h.svc.update_project(&h.coordinator, project.id, &update, None, false).await);
    let paused = h
        .svc
        .update_project(&h.teacher, project.id, &update, None, false)
        .await
        .unwrap();
    assert_eq!(paused.status, aula_core::project::ProjectStatus::Paused);

    forbidden(h.svc.delete_project(&h.other_teacher, project.id).await);
}

#[tokio::test]
async fn evidence_rules() {
    let h = harness().await;
    let project = project_by(&h, &h.teacher).await;
    let other = project_by(&h, &h.other_teacher).await;
    let input = CreateEvidence {
        title: "First harvest".into(),
        description: Some("Tomatoes".into()),
        evidence_date: Some(date(2026, 4, 2)),
    };

    forbidden(
        h.svc
            .create_evidence(&h.other_teacher, project.id, &input, pdf(3))
            .await,
    );
    forbidden(
        h.svc
            .create_evidence(&h.coordinator, project.id, &input, pdf(3))
            .await,
    );
    not_found(h.svc.create_evidence(&h.teacher, 9999, &input, pdf(3)).await);
    assert_eq!(h.store.upload_calls(), 0);

    let evidence = h
        .svc
        .create_evidence(&h.teacher, project.id, &input, file("image/png", 3))
        .await
        .unwrap();
    assert_eq!(evidence.uploaded_by, h.teacher.id);

    forbidden(h.svc.list_evidence(&h.other_teacher, project.id).await);
    assert_eq!(h.svc.list_evidence(&h.coordinator, project.id).await.unwrap().len(), 1);

    // evidence addressed through the wrong project does not exist
    not_found(h.svc.delete_evidence(&h.teacher, other.id, evidence.id).await);
    forbidden(h.svc.delete_evidence(&h.other_teacher, project.id, evidence.id).await);
    h.svc
        .delete_evidence(&h.coordinator, project.id, evidence.id)
        .await
        .unwrap();
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn project_comment_rules() {
    let h = harness().await;
    let project = project_by(&h, &h.teacher).await;
    let other = project_by(&h, &h.other_teacher).await;
    let evidence = h
        .svc
        .create_evidence(
            &h.teacher,
            project.id,
            &CreateEvidence {
                title: "Survey results".into(),
                description: None,
                evidence_date: None,
            },
            pdf(8),
        )
        .await
        .unwrap();

    let on_project = CreateProjectComment {
        evidence_id: None,
        content: "Great progress this month.".into(),
    };
    forbidden(h.svc.create_project_comment(&h.teacher, project.id, &on_project).await);
    not_found(h.svc.create_project_comment(&h.coordinator, 9999, &on_project).await);

    let on_foreign_evidence = CreateProjectComment {
        evidence_id: Some(evidence.id),
        content: "This belongs elsewhere.".into(),
    };
    not_found(
        h.svc
            .create_project_comment(&h.coordinator, other.id, &on_foreign_evidence)
            .await,
    );

    let project_comment = h
        .svc
        .create_project_comment(&h.coordinator, project.id, &on_project)
        .await
        .unwrap();
    assert_eq!(project_comment.target, CommentTarget::Project(project.id));
    let evidence_comment = h
        .svc
        .create_project_comment(&h.coordinator, project.id, &on_foreign_evidence)
        .await
        .unwrap();
    assert_eq!(evidence_comment.target, CommentTarget::Evidence(evidence.id));

    let listed = h.svc.list_project_comments(&h.teacher, project.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, project_comment.id);
    let listed = h
        .svc
        .list_evidence_comments(&h.teacher, evidence.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    forbidden(h.svc.list_project_comments(&h.other_teacher, project.id).await);

    forbidden(
        h.svc
            .update_project_comment(&h.principal, project_comment.id, "Edited by principal")
            .await,
    );
    h.svc
        .update_project_comment(&h.coordinator, project_comment.id, "Great progress, keep going.")
        .await
        .unwrap();
    forbidden(h.svc.delete_project_comment(&h.teacher, project_comment.id).await);
    h.svc
        .delete_project_comment(&h.principal, project_comment.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn announcement_rules() {
    let h = harness().await;
    let input = CreateAnnouncement {
        title: "Holiday schedule".into(),
        content: "School closes on the 24th.".into(),
    };
    forbidden(h.svc.create_announcement(&h.teacher, &input, None).await);

    let announcement = h
        .svc
        .create_announcement(&h.coordinator, &input, None)
        .await
        .unwrap();
    assert_eq!(h.svc.list_announcements().await.unwrap().len(), 1);

    let update = UpdateAnnouncement {
        title: Some("Holiday schedule (updated)".into()),
        ..Default::default()
    };
    // author only, even for the principal
    forbidden(
        h.svc
            .update_announcement(&h.principal, announcement.id, &update, None, false)
            .await,
    );
    forbidden(h.svc.delete_announcement(&h.principal, announcement.id).await);
    not_found(
        h.svc
            .update_announcement(&h.principal, 9999, &update, None, false)
            .await,
    );

    let updated = h
        .svc
        .update_announcement(&h.coordinator, announcement.id, &update, None, false)
        .await
        .unwrap();
    assert_eq!(updated.title, "Holiday schedule (updated)");
}
