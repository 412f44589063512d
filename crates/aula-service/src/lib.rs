//! Business rules for the academic backend: who may do what, the active
//! period, and keeping attachment rows in step with remote storage.
//!
//! Every operation takes the acting [`User`](aula_core::User) explicitly, so
//! the service is usable from the HTTP layer, the CLI and tests alike.

mod access;
mod announcements;
mod attachments;
pub mod auth;
mod error;
mod observations;
mod periods;
mod plans;
mod projects;
mod structure;
mod users;

pub use attachments::{FileUpload, RemoteCleanup};
pub use auth::LoginSession;
pub use error::ServiceError;

use std::sync::Arc;

use chrono::Duration;

use aula_core::PeriodActivationPolicy;
use aula_db::Database;
use aula_store::ObjectStore;

/// Default bearer token lifetime.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 480;

pub struct AcademicService {
    db: Arc<dyn Database>,
    store: Arc<dyn ObjectStore>,
    period_policy: PeriodActivationPolicy,
    token_ttl: Duration,
}

impl AcademicService {
    pub fn new(db: Arc<dyn Database>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            db,
            store,
            period_policy: PeriodActivationPolicy::default(),
            token_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        }
    }

    pub fn with_period_policy(mut self, policy: PeriodActivationPolicy) -> Self {
        self.period_policy = policy;
        self
    }

    pub fn with_token_ttl_minutes(mut self, minutes: i64) -> Self {
        self.token_ttl = Duration::minutes(minutes.max(1));
        self
    }

    pub fn db(&self) -> &Arc<dyn Database> {
        &self.db
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn period_policy(&self) -> PeriodActivationPolicy {
        self.period_policy
    }
}
