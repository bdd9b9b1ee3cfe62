use serde::{Deserialize, Serialize};

use crate::db::models::{DbSuperhero, SuperheroFields};
use crate::error::RegistryError;
use crate::service::image_store::ImageUpload;

pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_PER_PAGE: u32 = 5;

/// Superhero as returned by the API, with its image URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuperheroView {
    pub id: i64,
    pub nickname: String,
    pub real_name: Option<String>,
    pub origin_description: Option<String>,
    pub superpowers: Option<String>,
    pub catch_phrase: Option<String>,
    pub images: Vec<String>,
}

impl SuperheroView {
    pub fn new(row: DbSuperhero, images: Vec<String>) -> Self {
        Self {
            id: row.id,
            nickname: row.nickname,
            real_name: row.real_name,
            origin_description: row.origin_description,
            superpowers: row.superpowers,
            catch_phrase: row.catch_phrase,
            images,
        }
    }
}

/// `GET /superheroes?page=&per_page=`; no `page` means the full list.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListQuery {
    /// `(limit, offset)` when paging was requested.
    pub fn window(&self) -> Option<(i64, i64)> {
        let page = self.page?.max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let offset = i64::from(page - 1) * i64::from(per_page);
        Some((i64::from(per_page), offset))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A decoded create/update form.
#[derive(Debug, Clone, Default)]
pub struct HeroSubmission {
    pub nickname: Option<String>,
    pub real_name: Option<String>,
    pub origin_description: Option<String>,
    pub superpowers: Option<String>,
    pub catch_phrase: Option<String>,
    /// Identifiers or URLs of stored images the client wants to keep.
    pub existing_images: Vec<String>,
    pub uploads: Vec<ImageUpload>,
}

impl HeroSubmission {
    /// Split into validated columns and the uploaded files.
    pub fn into_parts(self) -> Result<(SuperheroFields, Vec<ImageUpload>), RegistryError> {
        let nickname = non_blank(self.nickname)
            .ok_or_else(|| RegistryError::Validation("nickname is required".to_string()))?;
        let fields = SuperheroFields {
            nickname,
            real_name: non_blank(self.real_name),
            origin_description: non_blank(self.origin_description),
            superpowers: non_blank(self.superpowers),
            catch_phrase: non_blank(self.catch_phrase),
        };
        Ok((fields, self.uploads))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
