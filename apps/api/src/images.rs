//! Image host client.
//!
//! Posts a multipart form (`file`, `upload_preset`, optional `folder`) to the
//! configured endpoint and reads `secure_url` from the JSON reply.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ImageConfig;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image uploads are not configured")]
    NotConfigured,

    #[error("Upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Image host rejected the upload ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// A file received from a dashboard form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Outcome of an upload that must not fail the surrounding save.
#[derive(Debug, Default)]
pub struct OptionalImage {
    pub url: Option<String>,
    /// Shown to the user when the record was saved without its image.
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Client handle for the image host. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ImageHost {
    client: reqwest::Client,
    endpoint: Option<String>,
    upload_preset: String,
    folder: Option<String>,
}

impl ImageHost {
    pub fn new(config: &ImageConfig) -> Self {
        ImageHost {
            client: reqwest::Client::new(),
            endpoint: config.endpoint(),
            upload_preset: config.upload_preset.clone().unwrap_or_default(),
            folder: config.folder.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Uploads one image and returns its public URL.
    pub async fn upload(&self, upload: Upload) -> Result<String, ImageError> {
        let endpoint = self.endpoint.as_deref().ok_or(ImageError::NotConfigured)?;

        debug!(file = %upload.file_name, bytes = upload.bytes.len(), "Uploading image");

        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;

        let mut form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());
        if let Some(folder) = &self.folder {
            form = form.text("folder", folder.clone());
        }

        let response = self.client.post(endpoint).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: UploadResponse = response.json().await?;
        info!(file = %upload.file_name, url = %body.secure_url, "Image uploaded");
        Ok(body.secure_url)
    }

    /// Uploads if a file was given. Failure becomes a warning.
    pub async fn upload_optional(&self, upload: Option<Upload>) -> OptionalImage {
        let Some(upload) = upload else {
            return OptionalImage::default();
        };

        match self.upload(upload).await {
            Ok(url) => OptionalImage {
                url: Some(url),
                warning: None,
            },
            Err(e) => {
                warn!(error = %e, "Saving without image");
                OptionalImage {
                    url: None,
                    warning: Some(format!("Saved without image: {}", e)),
                }
            }
        }
    }
}
