//! Multipart bodies for the endpoints that accept a file alongside fields.
//!
//! The file travels in a part named `file`; every other part is a plain
//! text field.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;

use aula_service::FileUpload;

use crate::error::{bad_request, ApiError};

pub const FILE_FIELD: &str = "file";

#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    file: Option<FileUpload>,
}

impl MultipartForm {
    pub async fn parse(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| bad_request(format!("malformed multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == FILE_FIELD {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("could not read file: {e}")))?;
                // A browser sends an empty, unnamed part when no file was picked.
                if data.is_empty() && filename.is_empty() {
                    continue;
                }
                form.file = Some(FileUpload {
                    filename: if filename.is_empty() { "file".into() } else { filename },
                    content_type,
                    data,
                });
            } else if !name.is_empty() {
                let value = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("could not read field '{name}': {e}")))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    pub fn take_file(&mut self) -> Option<FileUpload> {
        self.file.take()
    }

    pub fn require_file(&mut self) -> Result<FileUpload, ApiError> {
        self.take_file()
            .ok_or_else(|| bad_request(format!("a '{FILE_FIELD}' part is required")))
    }

    /// A text field; blank values count as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn require_text(&self, name: &str) -> Result<String, ApiError> {
        self.text(name)
            .ok_or_else(|| bad_request(format!("field '{name}' is required")))
    }

    pub fn field<T: FromStr>(&self, name: &str) -> Result<Option<T>, ApiError>
    where
        T::Err: std::fmt::Display,
    {
        match self.text(name) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| bad_request(format!("field '{name}': {e}"))),
            None => Ok(None),
        }
    }

    pub fn require<T: FromStr>(&self, name: &str) -> Result<T, ApiError>
    where
        T::Err: std::fmt::Display,
    {
        self.field(name)?
            .ok_or_else(|| bad_request(format!("field '{name}' is required")))
    }

    /// Three states for a nullable column: absent leaves it alone, an empty
    /// value clears it, anything else sets it.
    pub fn nullable_text(&self, name: &str) -> Option<Option<String>> {
        self.fields.get(name).map(|v| {
            let v = v.trim();
            (!v.is_empty()).then(|| v.to_string())
        })
    }

    pub fn nullable<T: FromStr>(&self, name: &str) -> Result<Option<Option<T>>, ApiError>
    where
        T::Err: std::fmt::Display,
    {
        match self.nullable_text(name) {
            None => Ok(None),
            Some(None) => Ok(Some(None)),
            Some(Some(raw)) => raw
                .parse::<T>()
                .map(|v| Some(Some(v)))
                .map_err(|e| bad_request(format!("field '{name}': {e}"))),
        }
    }

    /// `true`, `1`, `yes` and `on` are set; anything else is unset.
    pub fn flag(&self, name: &str) -> bool {
        self.text(name).is_some_and(|v| {
            matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
        })
    }
}

#[cfg(test)]
impl MultipartForm {
    fn with_fields(fields: &[(&str, &str)]) -> Self {
        MultipartForm {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: None,
        }
    }
}
