//! Sites, areas, subjects, grades, groups and students.

use aula_core::area::{Area, CreateArea, UpdateArea};
use aula_core::grade::{CreateGrade, Grade, UpdateGrade};
use aula_core::group::{CreateGroup, Group, UpdateGroup};
use aula_core::site::{CreateSite, Site, UpdateSite};
use aula_core::student::{CreateStudent, Student, UpdateStudent};
use aula_core::subject::{CreateSubject, Subject, SubjectFilter, UpdateSubject};
use aula_core::validate;
use aula_core::User;

use crate::access::require_admin;
use crate::{AcademicService, ServiceError};

impl AcademicService {
    // -- Sites --

    pub async fn list_sites(&self) -> Result<Vec<Site>, ServiceError> {
        Ok(self.db.list_sites().await?)
    }

    pub async fn get_site(&self, id: i64) -> Result<Site, ServiceError> {
        Ok(self.db.get_site(id).await?)
    }

    pub async fn create_site(&self, actor: &User, input: &CreateSite) -> Result<Site, ServiceError> {
        require_admin(actor)?;
        validate::length("name", &input.name, 2, Some(150))?;
        validate::length("code", &input.code, 1, Some(20))?;
        Ok(self.db.create_site(input).await?)
    }

    pub async fn update_site(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateSite,
    ) -> Result<Site, ServiceError> {
        require_admin(actor)?;
        validate::length_opt("name", update.name.as_deref(), 2, Some(150))?;
        validate::length_opt("code", update.code.as_deref(), 1, Some(20))?;
        Ok(self.db.update_site(id, update).await?)
    }

    pub async fn delete_site(&self, actor: &User, id: i64) -> Result<(), ServiceError> {
        require_admin(actor)?;
        Ok(self.db.delete_site(id).await?)
    }

    // -- Areas --

    pub async fn list_areas(&self) -> Result<Vec<Area>, ServiceError> {
        Ok(self.db.list_areas().await?)
    }

    pub async fn get_area(&self, id: i64) -> Result<Area, ServiceError> {
        Ok(self.db.get_area(id).await?)
    }

    pub async fn create_area(&self, actor: &User, input: &CreateArea) -> Result<Area, ServiceError> {
        require_admin(actor)?;
        validate::length("name", &input.name, 2, Some(150))?;
        Ok(self.db.create_area(input).await?)
    }

    pub async fn update_area(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateArea,
    ) -> Result<Area, ServiceError> {
        require_admin(actor)?;
        validate::length_opt("name", update.name.as_deref(), 2, Some(150))?;
        Ok(self.db.update_area(id, update).await?)
    }

    pub async fn delete_area(&self, actor: &User, id: i64) -> Result<(), ServiceError> {
        require_admin(actor)?;
        Ok(self.db.delete_area(id).await?)
    }

    // -- Subjects --

    /// Only active subjects unless the filter says otherwise.
    pub async fn list_subjects(&self, filter: &SubjectFilter) -> Result<Vec<Subject>, ServiceError> {
        let filter = SubjectFilter {
            active: Some(filter.active.unwrap_or(true)),
            ..filter.clone()
        };
        Ok(self.db.list_subjects(&filter).await?)
    }

    pub async fn get_subject(&self, id: i64) -> Result<Subject, ServiceError> {
        Ok(self.db.get_subject(id).await?)
    }

    pub async fn create_subject(
        &self,
        actor: &User,
        input: &CreateSubject,
    ) -> Result<Subject, ServiceError> {
        require_admin(actor)?;
        validate::length("name", &input.name, 2, Some(150))?;
        self.db.get_area(input.area_id).await?;
        Ok(self.db.create_subject(input).await?)
    }

    pub async fn update_subject(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateSubject,
    ) -> Result<Subject, ServiceError> {
        require_admin(actor)?;
        validate::length_opt("name", update.name.as_deref(), 2, Some(150))?;
        self.db.get_subject(id).await?;
        if let Some(area_id) = update.area_id {
            self.db.get_area(area_id).await?;
        }
        Ok(self.db.update_subject(id, update).await?)
    }

    pub async fn delete_subject(&self, actor: &User, id: i64) -> Result<(), ServiceError> {
        require_admin(actor)?;
        Ok(self.db.delete_subject(id).await?)
    }

    pub async fn assign_subject_teacher(
        &self,
        actor: &User,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<(), ServiceError> {
        require_admin(actor)?;
        self.db.get_subject(subject_id).await?;
        self.require_teacher_account(teacher_id).await?;

        let assigned = self
            .db
            .list_subjects(&SubjectFilter {
                teacher_id: Some(teacher_id),
                ..Default::default()
            })
            .await?;
        if assigned.iter().any(|s| s.id == subject_id) {
            return Err(ServiceError::Conflict(format!(
                "teacher {teacher_id} already teaches subject {subject_id}"
            )));
        }
        Ok(self.db.assign_subject_teacher(subject_id, teacher_id).await?)
    }

    pub async fn unassign_subject_teacher(
        &self,
        actor: &User,
        subject_id: i64,
        teacher_id: i64,
    ) -> Result<(), ServiceError> {
        require_admin(actor)?;
        Ok(self
            .db
            .unassign_subject_teacher(subject_id, teacher_id)
            .await?)
    }

    async fn require_teacher_account(&self, user_id: i64) -> Result<User, ServiceError> {
        let user = self.db.get_user(user_id).await?;
        if !user.is_teacher() {
            return Err(ServiceError::Validation(format!(
                "user {user_id} is not a teacher"
            )));
        }
        Ok(user)
    }

    // -- Grades --

    pub async fn list_grades(&self, site_id: Option<i64>) -> Result<Vec<Grade>, ServiceError> {
        Ok(self.db.list_grades(site_id).await?)
    }

    pub async fn get_grade(&self, id: i64) -> Result<Grade, ServiceError> {
        Ok(self.db.get_grade(id).await?)
    }

    pub async fn create_grade(&self, actor: &User, input: &CreateGrade) -> Result<Grade, ServiceError> {
        require_admin(actor)?;
        validate::length("name", &input.name, 1, Some(50))?;
        self.db.get_site(input.site_id).await?;
        Ok(self.db.create_grade(input).await?)
    }

    pub async fn update_grade(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateGrade,
    ) -> Result<Grade, ServiceError> {
        require_admin(actor)?;
        validate::length_opt("name", update.name.as_deref(), 1, Some(50))?;
        self.db.get_grade(id).await?;
        if let Some(site_id) = update.site_id {
            self.db.get_site(site_id).await?;
        }
        Ok(self.db.update_grade(id, update).await?)
    }

    pub async fn delete_grade(&self, actor: &User, id: i64) -> Result<(), ServiceError> {
        require_admin(actor)?;
        Ok(self.db.delete_grade(id).await?)
    }

    // -- Groups --

    pub async fn list_groups(&self, grade_id: Option<i64>) -> Result<Vec<Group>, ServiceError> {
        Ok(self.db.list_groups(grade_id).await?)
    }

    pub async fn get_group(&self, id: i64) -> Result<Group, ServiceError> {
        Ok(self.db.get_group(id).await?)
    }

    pub async fn create_group(&self, actor: &User, input: &CreateGroup) -> Result<Group, ServiceError> {
        require_admin(actor)?;
        validate::length("name", &input.name, 1, Some(50))?;
        self.db.get_grade(input.grade_id).await?;
        Ok(self.db.create_group(input).await?)
    }

    pub async fn update_group(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateGroup,
    ) -> Result<Group, ServiceError> {
        require_admin(actor)?;
        validate::length_opt("name", update.name.as_deref(), 1, Some(50))?;
        self.db.get_group(id).await?;
        if let Some(grade_id) = update.grade_id {
            self.db.get_grade(grade_id).await?;
        }
        Ok(self.db.update_group(id, update).await?)
    }

    pub async fn delete_group(&self, actor: &User, id: i64) -> Result<(), ServiceError> {
        require_admin(actor)?;
        Ok(self.db.delete_group(id).await?)
    }

    pub async fn assign_group_director(
        &self,
        actor: &User,
        group_id: i64,
        teacher_id: i64,
    ) -> Result<(), ServiceError> {
        require_admin(actor)?;
        self.db.get_group(group_id).await?;
        self.require_teacher_account(teacher_id).await?;
        if self.db.is_group_director(group_id, teacher_id).await? {
            return Err(ServiceError::Conflict(format!(
                "teacher {teacher_id} already directs group {group_id}"
            )));
        }
        Ok(self.db.assign_group_director(group_id, teacher_id).await?)
    }

    pub async fn unassign_group_director(
        &self,
        actor: &User,
        group_id: i64,
        teacher_id: i64,
    ) -> Result<(), ServiceError> {
        require_admin(actor)?;
        Ok(self
            .db
            .unassign_group_director(group_id, teacher_id)
            .await?)
    }

    // -- Students --

    pub async fn list_students(&self, group_id: Option<i64>) -> Result<Vec<Student>, ServiceError> {
        Ok(self.db.list_students(group_id).await?)
    }

    pub async fn get_student(&self, id: i64) -> Result<Student, ServiceError> {
        Ok(self.db.get_student(id).await?)
    }

    pub async fn create_student(
        &self,
        actor: &User,
        input: &CreateStudent,
    ) -> Result<Student, ServiceError> {
        self.db.get_group(input.group_id).await?;
        self.require_group_manager(actor, input.group_id).await?;
        input.validate()?;
        Ok(self.db.create_student(input).await?)
    }

    pub async fn update_student(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateStudent,
    ) -> Result<Student, ServiceError> {
        let student = self.db.get_student(id).await?;
        self.require_group_manager(actor, student.group_id).await?;
        update.validate()?;
        if let Some(group_id) = update.group_id.filter(|g| *g != student.group_id) {
            self.db.get_group(group_id).await?;
            self.require_group_manager(actor, group_id).await?;
        }
        Ok(self.db.update_student(id, update).await?)
    }

    pub async fn delete_student(&self, actor: &User, id: i64) -> Result<(), ServiceError> {
        let student = self.db.get_student(id).await?;
        self.require_group_manager(actor, student.group_id).await?;
        Ok(self.db.delete_student(id).await?)
    }

    /// Administrators, or a director of the group.
    async fn require_group_manager(&self, actor: &User, group_id: i64) -> Result<(), ServiceError> {
        if actor.is_admin() || self.db.is_group_director(group_id, actor.id).await? {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "only administrators or a director of group {group_id} may manage its students"
            )))
        }
    }
}
