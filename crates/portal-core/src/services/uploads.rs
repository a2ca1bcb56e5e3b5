use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ApiClient, ApiError};

const IMAGE_PATH_MARKER: &str = "/uploads/images/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
}

/// Location of a stored image, as encoded in its public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath<'a> {
    pub year: &'a str,
    pub month: &'a str,
    pub filename: &'a str,
}

/// Extract `<year>/<month>/<file>` from a URL containing
/// `/uploads/images/<year>/<month>/<file>`.
pub fn parse_image_path(url: &str) -> Option<ImagePath<'_>> {
    let start = url.find(IMAGE_PATH_MARKER)? + IMAGE_PATH_MARKER.len();
    let mut parts = url[start..].splitn(3, '/');
    let year = parts.next()?;
    let month = parts.next()?;
    let filename = parts.next()?;

    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !numeric(year) || !numeric(month) || filename.is_empty() {
        return None;
    }
    Some(ImagePath {
        year,
        month,
        filename,
    })
}

pub(crate) fn image_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[derive(Clone)]
pub struct UploadService {
    client: ApiClient,
}

impl UploadService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(image_mime(file_name))?;
        let form = Form::new().part("file", part);
        self.client
            .upload(Method::POST, "/uploads/image", form)
            .await
    }

    pub async fn delete_image(&self, url: &str) -> Result<(), ApiError> {
        let path = parse_image_path(url)
            .ok_or_else(|| ApiError::InvalidInput(format!("Invalid image URL: {url}")))?;
        let _: Value = self
            .client
            .delete(&format!(
                "/uploads/image/{}/{}/{}",
                path.year, path.month, path.filename
            ))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_absolute_and_relative_urls() {
        let path = parse_image_path("https://blog.example.com/uploads/images/2024/05/cat.png").unwrap();
        assert_eq!(
            path,
            ImagePath {
                year: "2024",
                month: "05",
                filename: "cat.png"
            }
        );
        assert!(parse_image_path("/uploads/images/2023/12/a/b.jpg").is_some());
    }

    #[rstest]
    #[case("https://cdn.example.com/gen/cat.png")]
    #[case("/uploads/images/2024/cat.png")]
    #[case("/uploads/images/abcd/05/cat.png")]
    #[case("/uploads/images/2024/05/")]
    fn rejects_other_urls(#[case] url: &str) {
        assert_eq!(parse_image_path(url), None);
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(image_mime("Photo.JPG"), "image/jpeg");
        assert_eq!(image_mime("noext"), "application/octet-stream");
    }
}
