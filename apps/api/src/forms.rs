//! Multipart dashboard forms (text fields plus optional image files).

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::{ApiError, ApiResult};
use crate::images::Upload;

/// A fully read multipart form.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl FormData {
    /// Reads every part. Empty file inputs are ignored.
    pub async fn read(mut multipart: Multipart, max_file_bytes: usize) -> ApiResult<Self> {
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("Malformed form: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::validation(format!("Malformed file part: {}", e)))?;

                    if bytes.is_empty() {
                        continue;
                    }
                    if bytes.len() > max_file_bytes {
                        return Err(ApiError::validation(format!(
                            "{} exceeds the {} byte upload limit",
                            file_name, max_file_bytes
                        )));
                    }
                    if !content_type.starts_with("image/") {
                        return Err(ApiError::validation(format!("{} is not an image", file_name)));
                    }

                    form.files.insert(
                        name,
                        Upload {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(format!("Malformed field {}: {}", name, e)))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// A trimmed, non-empty text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &str) -> ApiResult<&str> {
        self.text(name)
            .ok_or_else(|| ApiError::validation(format!("{} is required", name)))
    }

    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }
}
