pub mod announcement;
pub mod area;
pub mod attachment;
pub mod error;
pub mod evidence;
pub mod featured_plan;
pub mod grade;
pub mod group;
pub mod lesson_plan;
pub mod nullable;
pub mod observation;
pub mod period;
pub mod plan_comment;
pub mod project;
pub mod project_comment;
pub mod role;
pub mod site;
pub mod student;
pub mod subject;
pub mod user;
pub mod validate;

pub use attachment::{Attachment, AttachmentChange, AttachmentKind, FileType};
pub use error::CoreError;
pub use period::{Period, PeriodActivationPolicy};
pub use role::Role;
pub use user::User;
