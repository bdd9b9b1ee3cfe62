use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbSuperhero {
    pub id: i64,
    pub nickname: String,
    pub real_name: Option<String>,
    pub origin_description: Option<String>,
    pub superpowers: Option<String>,
    pub catch_phrase: Option<String>,
}

/// Image row without its payload; `file_path` is set only for disk-backed images.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbImage {
    pub id: i64,
    pub superhero_id: i64,
    pub file_path: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbImageBlob {
    pub image_data: Vec<u8>,
    pub content_type: Option<String>,
}

/// Mutable superhero columns, written wholesale on create and update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuperheroFields {
    pub nickname: String,
    pub real_name: Option<String>,
    pub origin_description: Option<String>,
    pub superpowers: Option<String>,
    pub catch_phrase: Option<String>,
}

/// An image ready to be inserted, already persisted to its backing if on disk.
#[derive(Debug, Clone, PartialEq)]
pub enum NewImage {
    Path {
        file_path: String,
        content_type: String,
    },
    Blob {
        data: Vec<u8>,
        content_type: String,
    },
}

impl NewImage {
    pub fn file_path(&self) -> Option<&str> {
        match self {
            NewImage::Path { file_path, .. } => Some(file_path),
            NewImage::Blob { .. } => None,
        }
    }
}
