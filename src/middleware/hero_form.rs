use axum::extract::{FromRequest, Multipart, Request};
use tracing::debug;

use crate::error::RegistryError;
use crate::service::image_store::ImageUpload;
use crate::types::HeroSubmission;

/// Multipart create/update form: text fields, `images`/`image` files and
/// the `existingImages` keep list.
pub struct HeroForm(pub HeroSubmission);

impl<S> FromRequest<S> for HeroForm
where
    S: Send + Sync,
{
    type Rejection = RegistryError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| RegistryError::Validation(rejection.body_text()))?;

        let mut sub = HeroSubmission::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "images" | "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await?;
                    // Browsers send an empty part when no file was picked.
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    sub.uploads.push(ImageUpload {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    });
                }
                "existingImages" | "existingImages[]" => {
                    let text = field.text().await?;
                    sub.existing_images.extend(parse_keep_list(&text)?);
                }
                "nickname" => sub.nickname = Some(field.text().await?),
                "real_name" => sub.real_name = Some(field.text().await?),
                "origin_description" => sub.origin_description = Some(field.text().await?),
                "superpowers" => sub.superpowers = Some(field.text().await?),
                "catch_phrase" => sub.catch_phrase = Some(field.text().await?),
                other => debug!(field = %other, "ignoring unknown form field"),
            }
        }

        Ok(HeroForm(sub))
    }
}

/// A keep-list part is either a JSON array of strings or one plain value.
fn parse_keep_list(raw: &str) -> Result<Vec<String>, RegistryError> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        let entries: Vec<String> = serde_json::from_str(raw).map_err(|e| {
            RegistryError::Validation(format!("existingImages must be a JSON array of strings: {e}"))
        })?;
        return Ok(entries);
    }
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![raw.to_string()])
}
