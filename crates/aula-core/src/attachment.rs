//! File attachments embedded in lesson plans, projects, evidence and
//! announcements, and the per-resource upload policy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Type tag derived from the upload's MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Doc,
    Docx,
    Xlsx,
    Xls,
    Jpg,
    Png,
    Mp4,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Doc => "doc",
            FileType::Docx => "docx",
            FileType::Xlsx => "xlsx",
            FileType::Xls => "xls",
            FileType::Jpg => "jpg",
            FileType::Png => "png",
            FileType::Mp4 => "mp4",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "pdf" => Some(FileType::Pdf),
            "doc" => Some(FileType::Doc),
            "docx" => Some(FileType::Docx),
            "xlsx" => Some(FileType::Xlsx),
            "xls" => Some(FileType::Xls),
            "jpg" => Some(FileType::Jpg),
            "png" => Some(FileType::Png),
            "mp4" => Some(FileType::Mp4),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            FileType::Pdf => "application/pdf",
            FileType::Doc => "application/msword",
            FileType::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileType::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            FileType::Xls => "application/vnd.ms-excel",
            FileType::Jpg => "image/jpeg",
            FileType::Png => "image/png",
            FileType::Mp4 => "video/mp4",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        // Ignore parameters such as "; charset=binary".
        let essence = mime.split(';').next().unwrap_or("").trim();
        ALL_TYPES.iter().copied().find(|t| t.mime() == essence)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ALL_TYPES: [FileType; 8] = [
    FileType::Pdf,
    FileType::Doc,
    FileType::Docx,
    FileType::Xlsx,
    FileType::Xls,
    FileType::Jpg,
    FileType::Png,
    FileType::Mp4,
];

const DOCUMENTS: &[FileType] = &[FileType::Pdf, FileType::Doc, FileType::Docx];

const PROJECT_FILES: &[FileType] = &[
    FileType::Pdf,
    FileType::Doc,
    FileType::Docx,
    FileType::Xlsx,
    FileType::Xls,
    FileType::Jpg,
    FileType::Png,
    FileType::Mp4,
];

const ANNOUNCEMENT_FILES: &[FileType] = &[
    FileType::Pdf,
    FileType::Doc,
    FileType::Docx,
    FileType::Xlsx,
    FileType::Xls,
    FileType::Jpg,
    FileType::Png,
];

/// The parent resource an attachment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    LessonPlan,
    Project,
    Evidence,
    Announcement,
}

impl AttachmentKind {
    pub fn allowed_types(&self) -> &'static [FileType] {
        match self {
            AttachmentKind::LessonPlan => DOCUMENTS,
            AttachmentKind::Project | AttachmentKind::Evidence => PROJECT_FILES,
            AttachmentKind::Announcement => ANNOUNCEMENT_FILES,
        }
    }

    /// Logical folder in remote storage.
    pub fn folder(&self) -> &'static str {
        match self {
            AttachmentKind::LessonPlan => "lesson-plans",
            AttachmentKind::Project => "projects",
            AttachmentKind::Evidence => "projects/evidence",
            AttachmentKind::Announcement => "announcements",
        }
    }

    /// Resolve a MIME type against this resource's allow-list.
    pub fn classify(&self, mime: &str) -> Result<FileType, CoreError> {
        FileType::from_mime(mime)
            .filter(|t| self.allowed_types().contains(t))
            .ok_or_else(|| {
                let allowed: Vec<&str> = self.allowed_types().iter().map(|t| t.as_str()).collect();
                CoreError::UnsupportedFileType(format!(
                    "'{mime}' is not accepted here; allowed: {}",
                    allowed.join(", ")
                ))
            })
    }
}

/// Metadata for an object that was successfully uploaded to remote storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub remote_id: String,
    pub file_name: String,
    pub file_type: FileType,
    pub size_bytes: i64,
    pub view_link: String,
    pub embed_link: String,
    pub download_link: String,
}

/// How an update treats the parent's current attachment.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AttachmentChange {
    #[default]
    Keep,
    Remove,
    Replace(Attachment),
}
