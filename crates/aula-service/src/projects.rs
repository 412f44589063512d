//! Projects, their evidence, and comments on either.

use tracing::info;

use aula_core::evidence::{CreateEvidence, Evidence};
use aula_core::project::{CreateProject, Project, ProjectFilter, UpdateProject};
use aula_core::project_comment::{CommentTarget, CreateProjectComment, ProjectComment};
use aula_core::{plan_comment, AttachmentChange, AttachmentKind, User};

use crate::access::{
    require_admin, require_author_or_principal, require_owner, require_owner_or_admin,
    require_teacher, require_visible,
};
use crate::{AcademicService, FileUpload, RemoteCleanup, ServiceError};

impl AcademicService {
    // -- Projects --

    pub async fn list_projects(
        &self,
        actor: &User,
        filter: &ProjectFilter,
    ) -> Result<Vec<Project>, ServiceError> {
        let mut filter = filter.clone();
        if actor.is_teacher() {
            filter.teacher_id = Some(actor.id);
        }
        Ok(self.db.list_projects(&filter).await?)
    }

    pub async fn get_project(&self, actor: &User, id: i64) -> Result<Project, ServiceError> {
        let project = self.db.get_project(id).await?;
        require_visible(actor, project.teacher_id, "project")?;
        Ok(project)
    }

    pub async fn create_project(
        &self,
        actor: &User,
        input: &CreateProject,
        file: Option<FileUpload>,
    ) -> Result<Project, ServiceError> {
        require_teacher(actor)?;
        input.validate()?;
        let attachment = match file {
            Some(file) => Some(self.upload_attachment(AttachmentKind::Project, file).await?),
            None => None,
        };
        let result = self
            .db
            .create_project(actor.id, input, attachment.as_ref())
            .await;
        let project = self.commit_or_discard(attachment.as_ref(), result).await?;
        info!(project_id = project.id, teacher_id = actor.id, "project created");
        Ok(project)
    }

    /// `remove_file` drops the current attachment; `file` replaces it.
    /// Asking for both is rejected.
    pub async fn update_project(
        &self,
        actor: &User,
        id: i64,
        update: &UpdateProject,
        file: Option<FileUpload>,
        remove_file: bool,
    ) -> Result<Project, ServiceError> {
        let current = self.db.get_project(id).await?;
        require_owner(actor, current.teacher_id, "project")?;
        if remove_file && file.is_some() {
            return Err(ServiceError::Validation(
                "send either a new file or remove_file, not both".into(),
            ));
        }
        update.validate()?;

        let change = match file {
            Some(file) => AttachmentChange::Replace(
                self.upload_attachment(AttachmentKind::Project, file).await?,
            ),
            None if remove_file => AttachmentChange::Remove,
            None => AttachmentChange::Keep,
        };
        let fresh = match &change {
            AttachmentChange::Replace(a) => Some(a),
            _ => None,
        };
        let result = self.db.update_project(id, update, &change).await;
        let project = self.commit_or_discard(fresh, result).await?;

        if change != AttachmentChange::Keep {
            if let Some(old) = &current.attachment {
                self.remove_remote(&old.remote_id).await;
            }
        }
        Ok(project)
    }

    /// Removes the project, its evidence and its comments. Every remote
    /// object is deleted best-effort first; the outcomes are returned.
    pub async fn delete_project(
        &self,
        actor: &User,
        id: i64,
    ) -> Result<Vec<RemoteCleanup>, ServiceError> {
        let project = self.db.get_project(id).await?;
        require_owner_or_admin(actor, project.teacher_id, "project")?;

        let mut cleanups = Vec::new();
        for evidence in self.db.list_evidence(id).await? {
            cleanups.push(self.remove_remote(&evidence.attachment.remote_id).await);
        }
        if let Some(attachment) = &project.attachment {
            cleanups.push(self.remove_remote(&attachment.remote_id).await);
        }
        self.db.delete_project(id).await?;
        info!(project_id = id, actor_id = actor.id, "project deleted");
        Ok(cleanups)
    }

    // -- Evidence --

    pub async fn list_evidence(
        &self,
        actor: &User,
        project_id: i64,
    ) -> Result<Vec<Evidence>, ServiceError> {
        let project = self.db.get_project(project_id).await?;
        require_visible(actor, project.teacher_id, "project")?;
        Ok(self.db.list_evidence(project_id).await?)
    }

    pub async fn create_evidence(
        &self,
        actor: &User,
        project_id: i64,
        input: &CreateEvidence,
        file: FileUpload,
    ) -> Result<Evidence, ServiceError> {
        let project = self.db.get_project(project_id).await?;
        require_owner(actor, project.teacher_id, "project")?;
        input.validate()?;
        let attachment = self.upload_attachment(AttachmentKind::Evidence, file).await?;
        let result = self
            .db
            .create_evidence(project_id, actor.id, input, &attachment)
            .await;
        self.commit_or_discard(Some(&attachment), result).await
    }

    pub async fn delete_evidence(
        &self,
        actor: &User,
        project_id: i64,
        evidence_id: i64,
    ) -> Result<RemoteCleanup, ServiceError> {
        let evidence = self.evidence_in_project(project_id, evidence_id).await?;
        let project = self.db.get_project(project_id).await?;
        require_owner_or_admin(actor, project.teacher_id, "evidence")?;
        let cleanup = self.remove_remote(&evidence.attachment.remote_id).await;
        self.db.delete_evidence(evidence_id).await?;
        Ok(cleanup)
    }

    async fn evidence_in_project(
        &self,
        project_id: i64,
        evidence_id: i64,
    ) -> Result<Evidence, ServiceError> {
        let evidence = self.db.get_evidence(evidence_id).await?;
        if evidence.project_id != project_id {
            return Err(ServiceError::NotFound(format!(
                "evidence {evidence_id} in project {project_id}"
            )));
        }
        Ok(evidence)
    }

    // -- Project comments --

    pub async fn list_project_comments(
        &self,
        actor: &User,
        project_id: i64,
    ) -> Result<Vec<ProjectComment>, ServiceError> {
        let project = self.db.get_project(project_id).await?;
        require_visible(actor, project.teacher_id, "project")?;
        Ok(self
            .db
            .list_project_comments(CommentTarget::Project(project_id))
            .await?)
    }

    pub async fn list_evidence_comments(
        &self,
        actor: &User,
        evidence_id: i64,
    ) -> Result<Vec<ProjectComment>, ServiceError> {
        let evidence = self.db.get_evidence(evidence_id).await?;
        let project = self.db.get_project(evidence.project_id).await?;
        require_visible(actor, project.teacher_id, "project")?;
        Ok(self
            .db
            .list_project_comments(CommentTarget::Evidence(evidence_id))
            .await?)
    }

    pub async fn create_project_comment(
        &self,
        actor: &User,
        project_id: i64,
        input: &CreateProjectComment,
    ) -> Result<ProjectComment, ServiceError> {
        require_admin(actor)?;
        plan_comment::validate_content(&input.content)?;
        self.db.get_project(project_id).await?;
        let target = match input.evidence_id {
            Some(evidence_id) => {
                self.evidence_in_project(project_id, evidence_id).await?;
                CommentTarget::Evidence(evidence_id)
            }
            None => CommentTarget::Project(project_id),
        };
        Ok(self
            .db
            .create_project_comment(actor.id, target, input.content.trim())
            .await?)
    }

    pub async fn update_project_comment(
        &self,
        actor: &User,
        id: i64,
        content: &str,
    ) -> Result<ProjectComment, ServiceError> {
        let comment = self.db.get_project_comment(id).await?;
        require_owner(actor, comment.author_id, "comment")?;
        plan_comment::validate_content(content)?;
        Ok(self.db.update_project_comment(id, content.trim()).await?)
    }

    pub async fn delete_project_comment(&self, actor: &User, id: i64) -> Result<(), ServiceError> {
        let comment = self.db.get_project_comment(id).await?;
        require_author_or_principal(actor, comment.author_id, "comment")?;
        Ok(self.db.delete_project_comment(id).await?)
    }
}
