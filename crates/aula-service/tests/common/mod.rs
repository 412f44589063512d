// Shared setup for the service integration tests: an in-memory database,
// a MemoryStore, and a small school with one site, one subject and users
// in every role.
#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use chrono::NaiveDate;

use aula_core::area::CreateArea;
use aula_core::period::UpdatePeriod;
use aula_core::site::CreateSite;
use aula_core::subject::CreateSubject;
use aula_core::user::CreateUser;
use aula_core::{Period, PeriodActivationPolicy, Role, User};
use aula_db::{Database, SqliteDatabase};
use aula_service::{AcademicService, FileUpload};
use aula_store::MemoryStore;

pub const PASSWORD: &str = "password123";

pub const PDF: &str = "application/pdf";

pub struct Harness {
    pub svc: AcademicService,
    pub store: Arc<MemoryStore>,
    pub principal: User,
    pub coordinator: User,
    pub teacher: User,
    pub other_teacher: User,
    pub site_id: i64,
    pub subject_id: i64,
}

pub fn new_user(national_id: &str, role: Role, site_id: Option<i64>) -> CreateUser {
    CreateUser {
        email: format!("{national_id}@school.test"),
        full_name: format!("User {national_id}"),
        national_id: national_id.to_string(),
        password: PASSWORD.to_string(),
        role,
        active: true,
        phone: None,
        site_id,
    }
}

pub async fn harness() -> Harness {
    harness_with_policy(PeriodActivationPolicy::AutoDeactivate).await
}

pub async fn harness_with_policy(policy: PeriodActivationPolicy) -> Harness {
    let db: Arc<dyn Database> = Arc::new(SqliteDatabase::open_in_memory().unwrap());
    harness_with_db(db, policy).await
}

pub async fn harness_with_db(db: Arc<dyn Database>, policy: PeriodActivationPolicy) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let svc = AcademicService::new(db, store.clone()).with_period_policy(policy);

    let principal = svc
        .bootstrap_user(&new_user("1000001", Role::Principal, None))
        .await
        .unwrap();
    let site = svc
        .create_site(
            &principal,
            &CreateSite {
                name: "Main campus".into(),
                code: "MAIN".into(),
                address: None,
                active: true,
            },
        )
        .await
        .unwrap();
    let coordinator = svc
        .create_user(&principal, &new_user("2000001", Role::Coordinator, Some(site.id)))
        .await
        .unwrap();
    let teacher = svc
        .create_user(&principal, &new_user("3000001", Role::Teacher, Some(site.id)))
        .await
        .unwrap();
    let other_teacher = svc
        .create_user(&principal, &new_user("3000002", Role::Teacher, Some(site.id)))
        .await
        .unwrap();

    let area = svc
        .create_area(
            &principal,
            &CreateArea {
                name: "Sciences".into(),
                description: None,
                active: true,
            },
        )
        .await
        .unwrap();
    let subject = svc
        .create_subject(
            &principal,
            &CreateSubject {
                name: "Biology".into(),
                area_id: area.id,
                code: Some("BIO".into()),
                description: None,
                grades: None,
                active: true,
            },
        )
        .await
        .unwrap();

    Harness {
        svc,
        store,
        principal,
        coordinator,
        teacher,
        other_teacher,
        site_id: site.id,
        subject_id: subject.id,
    }
}

impl Harness {
    pub async fn period(&self, name: &str) -> Period {
        self.svc
            .list_periods()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.name == name)
            .unwrap()
    }

    pub async fn set_active(&self, name: &str, active: bool) -> Result<Period, aula_service::ServiceError> {
        let period = self.period(name).await;
        self.svc
            .update_period(
                &self.principal,
                period.id,
                &UpdatePeriod {
                    active: Some(active),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn activate(&self, name: &str) -> Period {
        self.set_active(name, true).await.unwrap()
    }
}

pub fn file(content_type: &str, len: usize) -> FileUpload {
    FileUpload {
        filename: "document.bin".into(),
        content_type: content_type.into(),
        data: Bytes::from(vec![b'x'; len]),
    }
}

pub fn pdf(len: usize) -> FileUpload {
    FileUpload {
        filename: "plan.pdf".into(),
        content_type: PDF.into(),
        data: Bytes::from(vec![b'%'; len]),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
