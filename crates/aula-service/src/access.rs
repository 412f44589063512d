//! Role and ownership checks shared by every resource.

use aula_core::{Role, User};

use crate::ServiceError;

pub(crate) fn require_admin(actor: &User) -> Result<(), ServiceError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "only coordinators and principals may do this".into(),
        ))
    }
}

pub(crate) fn require_teacher(actor: &User) -> Result<(), ServiceError> {
    if actor.is_teacher() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("only teachers may do this".into()))
    }
}

/// Only the owner, whatever their role.
pub(crate) fn require_owner(actor: &User, owner_id: i64, what: &str) -> Result<(), ServiceError> {
    if actor.id == owner_id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "only the owner may modify this {what}"
        )))
    }
}

pub(crate) fn require_owner_or_admin(
    actor: &User,
    owner_id: i64,
    what: &str,
) -> Result<(), ServiceError> {
    if actor.id == owner_id || actor.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "only the owner or an administrator may remove this {what}"
        )))
    }
}

pub(crate) fn require_author_or_principal(
    actor: &User,
    author_id: i64,
    what: &str,
) -> Result<(), ServiceError> {
    if actor.id == author_id || actor.role == Role::Principal {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "only the author or the principal may do this to a {what}"
        )))
    }
}

/// Teachers may only look at what they own; administrators see everything.
pub(crate) fn require_visible(actor: &User, owner_id: i64, what: &str) -> Result<(), ServiceError> {
    if actor.is_teacher() && actor.id != owner_id {
        Err(ServiceError::Forbidden(format!(
            "this {what} belongs to another teacher"
        )))
    } else {
        Ok(())
    }
}
