use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use tracing::{debug, error};
use uuid::Uuid;

use crate::supabase::SupabaseClient;

/// File extension for the image content types the panels upload.
pub fn image_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

impl SupabaseClient {
    /// Upload an image into the configured bucket under `folder` and return its public URL.
    pub async fn upload_image(&self, folder: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        if data.is_empty() {
            return Err(anyhow!("Refusing to upload an empty image"));
        }

        let object_path = format!("{}/{}.{}", folder, Uuid::new_v4(), image_extension(content_type));
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, object_path);
        debug!("Uploading {} bytes to {}", data.len(), url);

        let mut headers = self.get_headers()?;
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(content_type).context("invalid image content type")?,
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Storage upload failed ({}): {}", status, error_text);
            return Err(anyhow!("Storage error ({}): {}", status, error_text));
        }

        Ok(self.public_url(&object_path))
    }

    pub fn public_url(&self, object_path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, object_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("image/jpeg"), "jpg");
        assert_eq!(image_extension("image/webp"), "webp");
        assert_eq!(image_extension("application/octet-stream"), "png");
    }
}
