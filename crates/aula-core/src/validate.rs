use crate::CoreError;

/// Check the trimmed character length of a text field.
pub fn length(field: &str, value: &str, min: usize, max: Option<usize>) -> Result<(), CoreError> {
    let len = value.trim().chars().count();
    if len < min {
        return Err(CoreError::InvalidInput(format!(
            "{field} must be at least {min} characters"
        )));
    }
    if let Some(max) = max {
        if len > max {
            return Err(CoreError::InvalidInput(format!(
                "{field} must be at most {max} characters"
            )));
        }
    }
    Ok(())
}

/// Like [`length`] but skips `None`.
pub fn length_opt(
    field: &str,
    value: Option<&str>,
    min: usize,
    max: Option<usize>,
) -> Result<(), CoreError> {
    match value {
        Some(v) => length(field, v, min, max),
        None => Ok(()),
    }
}
