// Integration tests that exercise every Database trait method against the
// in-memory SQLite backend.  The actual test logic lives in `common/mod.rs`
// so that the same assertions can be re-used for Postgres.

mod common;

use std::sync::Arc;
use aula_db::Database;

async fn make_db() -> Arc<dyn Database> {
    Arc::new(aula_db::SqliteDatabase::open_in_memory().unwrap())
}

#[tokio::test]
async fn user_crud() {
    let db = make_db().await;
    common::test_user_crud(&*db).await;
}

#[tokio::test]
async fn user_list_ordering_and_active_filter() {
    let db = make_db().await;
    common::test_user_list_ordering_and_active_filter(&*db).await;
}

#[tokio::test]
async fn credentials_and_password_update() {
    let db = make_db().await;
    common::test_credentials_and_password_update(&*db).await;
}

#[tokio::test]
async fn sessions() {
    let db = make_db().await;
    common::test_sessions(&*db).await;
}

#[tokio::test]
async fn site_and_area_crud() {
    let db = make_db().await;
    common::test_site_and_area_crud(&*db).await;
}

#[tokio::test]
async fn subjects_and_teacher_assignment() {
    let db = make_db().await;
    common::test_subjects_and_teacher_assignment(&*db).await;
}

#[tokio::test]
async fn grades_groups_students() {
    let db = make_db().await;
    common::test_grades_groups_students(&*db).await;
}

#[tokio::test]
async fn group_directors() {
    let db = make_db().await;
    common::test_group_directors(&*db).await;
}

#[tokio::test]
async fn periods_seeded() {
    let db = make_db().await;
    common::test_periods_seeded(&*db).await;
}

#[tokio::test]
async fn period_auto_deactivate() {
    let db = make_db().await;
    common::test_period_auto_deactivate(&*db).await;
}

#[tokio::test]
async fn period_exclusive_lock() {
    let db = make_db().await;
    common::test_period_exclusive_lock(&*db).await;
}

#[tokio::test]
async fn lesson_plans() {
    let db = make_db().await;
    common::test_lesson_plans(&*db).await;
}

#[tokio::test]
async fn plan_comments() {
    let db = make_db().await;
    common::test_plan_comments(&*db).await;
}

#[tokio::test]
async fn featured_plans() {
    let db = make_db().await;
    common::test_featured_plans(&*db).await;
}

#[tokio::test]
async fn projects() {
    let db = make_db().await;
    common::test_projects(&*db).await;
}

#[tokio::test]
async fn evidence_and_comments() {
    let db = make_db().await;
    common::test_evidence_and_comments(&*db).await;
}

#[tokio::test]
async fn comment_on_missing_target() {
    let db = make_db().await;
    common::test_comment_on_missing_target(&*db).await;
}

#[tokio::test]
async fn observations() {
    let db = make_db().await;
    common::test_observations(&*db).await;
}

#[tokio::test]
async fn announcements() {
    let db = make_db().await;
    common::test_announcements(&*db).await;
}

#[tokio::test]
async fn constraint_errors() {
    let db = make_db().await;
    common::test_constraint_errors(&*db).await;
}
