//! SQL DDL for initializing the registry storage.

/// SQLite schema with:
/// - `superheroes`: one row per hero, `nickname` required
/// - `images`: zero or more per hero, cascade-deleted with the owner
/// - an image row carries either `file_path` (disk mode) or `image_data` (blob mode)
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS superheroes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nickname TEXT NOT NULL,
    real_name TEXT NULL,
    origin_description TEXT NULL,
    superpowers TEXT NULL,
    catch_phrase TEXT NULL
);

CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    superhero_id INTEGER NOT NULL REFERENCES superheroes(id) ON DELETE CASCADE,
    file_path TEXT NULL,
    image_data BLOB NULL,
    content_type TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_images_superhero_id ON images(superhero_id);
"#;
