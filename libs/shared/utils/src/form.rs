use std::collections::HashMap;

use axum::extract::Multipart;
use serde::de::DeserializeOwned;
use tracing::debug;

use shared_models::error::AppError;

/// Name of the file field every panel form uses for pictures.
pub const IMAGE_FIELD: &str = "image";

/// Body limit for routes accepting an image upload (multipart overhead included).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Text fields and the optional image of a multipart form, collected up front
/// so services can validate them like a JSON body.
#[derive(Debug, Default, Clone)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    image: Option<UploadedImage>,
}

impl MultipartForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid form data: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == IMAGE_FIELD {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid image upload: {}", e)))?;

                if data.is_empty() {
                    continue;
                }
                if !content_type.starts_with("image/") {
                    return Err(AppError::ValidationError("Uploaded file must be an image".to_string()));
                }

                debug!("Received image {:?} ({} bytes)", file_name, data.len());
                form.image = Some(UploadedImage {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid form field {}: {}", name, e)))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            image: None,
        }
    }

    /// Trimmed value of a text field; blank values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn text_owned(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }

    /// Whether the field was sent at all, even if blank.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Names from `required` that are missing or blank.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.text(name).is_none())
            .collect()
    }

    /// Non-negative amount; a blank field is `None`.
    pub fn amount(&self, name: &str) -> Result<Option<f64>, AppError> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
                _ => Err(AppError::ValidationError(format!("Invalid {} amount", name))),
            },
        }
    }

    /// Checkbox-style flag: "true"/"on"/"1" are true, anything else present is false.
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.fields
            .get(name)
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "on" | "1"))
    }

    pub fn json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AppError> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|_| AppError::ValidationError(format!("Invalid {} format", name))),
        }
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn take_image(&mut self) -> Option<UploadedImage> {
        self.image.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use serde_json::Value;

    #[tokio::test]
    async fn test_from_multipart_collects_fields_and_image() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nDr. Rao\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"fees\"\r\n\r\n500\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"rao.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method("POST")
            .header("content-type", format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();

        let multipart = Multipart::from_request(request, &()).await.unwrap();
        let form = MultipartForm::from_multipart(multipart).await.unwrap();

        assert_eq!(form.text("name"), Some("Dr. Rao"));
        assert_eq!(form.amount("fees").unwrap(), Some(500.0));
        let image = form.image().unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.file_name.as_deref(), Some("rao.png"));
        assert_eq!(image.data, b"PNGDATA".to_vec());
    }

    #[test]
    fn test_missing_treats_blank_as_absent() {
        let form = MultipartForm::from_fields([("name", "Asha"), ("email", "   ")]);
        assert_eq!(form.missing(&["name", "email", "phone"]), vec!["email", "phone"]);
        assert!(form.contains("email"));
    }

    #[test]
    fn test_amount_rejects_negative() {
        let form = MultipartForm::from_fields([("fees", "-5"), ("medicine", "abc"), ("received", "12.5")]);
        assert!(form.amount("fees").is_err());
        assert!(form.amount("medicine").is_err());
        assert_eq!(form.amount("received").unwrap(), Some(12.5));
        assert_eq!(form.amount("absent").unwrap(), None);
    }

    #[test]
    fn test_flag_and_json() {
        let form = MultipartForm::from_fields([
            ("xray", "true"),
            ("other", "false"),
            ("address", r#"{"line1":"MG Road","line2":"Pune"}"#),
            ("broken", "{"),
        ]);
        assert_eq!(form.flag("xray"), Some(true));
        assert_eq!(form.flag("other"), Some(false));
        assert_eq!(form.flag("absent"), None);

        let address: Value = form.json("address").unwrap().unwrap();
        assert_eq!(address["line1"], "MG Road");
        assert!(form.json::<Value>("broken").is_err());
    }
}
