use crate::db::models::{DbImage, DbImageBlob, DbSuperhero, NewImage, SuperheroFields};
use crate::db::schema::SQLITE_INIT;
use crate::error::RegistryError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Open (creating if missing) the database at `database_url` with foreign keys enforced.
pub async fn connect(database_url: &str) -> Result<SqlitePool, RegistryError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct SuperheroStorage {
    pool: SqlitePool,
}

impl SuperheroStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), RegistryError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn list_superheroes(&self) -> Result<Vec<DbSuperhero>, RegistryError> {
        let rows = sqlx::query_as::<_, DbSuperhero>(
            r#"SELECT id, nickname, real_name, origin_description, superpowers, catch_phrase
               FROM superheroes ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_superheroes_page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DbSuperhero>, RegistryError> {
        let rows = sqlx::query_as::<_, DbSuperhero>(
            r#"SELECT id, nickname, real_name, origin_description, superpowers, catch_phrase
               FROM superheroes ORDER BY id LIMIT ? OFFSET ?"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_superhero(&self, id: i64) -> Result<Option<DbSuperhero>, RegistryError> {
        let row = sqlx::query_as::<_, DbSuperhero>(
            r#"SELECT id, nickname, real_name, origin_description, superpowers, catch_phrase
               FROM superheroes WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Every image row across all heroes, ordered by id.
    pub async fn list_all_images(&self) -> Result<Vec<DbImage>, RegistryError> {
        let rows = sqlx::query_as::<_, DbImage>(
            "SELECT id, superhero_id, file_path, content_type FROM images ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Images belonging to any of `superhero_ids`, ordered by id.
    pub async fn list_images_for(
        &self,
        superhero_ids: &[i64],
    ) -> Result<Vec<DbImage>, RegistryError> {
        if superhero_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, superhero_id, file_path, content_type FROM images WHERE superhero_id IN (",
        );
        let mut ids = qb.separated(", ");
        for id in superhero_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY id");

        let rows = qb
            .build_query_as::<DbImage>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_images(&self, superhero_id: i64) -> Result<Vec<DbImage>, RegistryError> {
        let rows = sqlx::query_as::<_, DbImage>(
            r#"SELECT id, superhero_id, file_path, content_type
               FROM images WHERE superhero_id = ? ORDER BY id"#,
        )
        .bind(superhero_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_image_blob(&self, id: i64) -> Result<Option<DbImageBlob>, RegistryError> {
        let row = sqlx::query_as::<_, DbImageBlob>(
            "SELECT image_data, content_type FROM images WHERE id = ? AND image_data IS NOT NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a superhero and its images in a single transaction. Returns the new id.
    pub async fn create(
        &self,
        fields: &SuperheroFields,
        images: &[NewImage],
    ) -> Result<i64, RegistryError> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"INSERT INTO superheroes (
                nickname, real_name, origin_description, superpowers, catch_phrase
            ) VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&fields.nickname)
        .bind(&fields.real_name)
        .bind(&fields.origin_description)
        .bind(&fields.superpowers)
        .bind(&fields.catch_phrase)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for image in images {
            Self::insert_image(&mut *tx, id, image).await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    /// Overwrite all mutable fields, drop `remove_image_ids` and attach `new_images`.
    /// Returns false when no superhero has this id; nothing is written in that case.
    pub async fn update(
        &self,
        id: i64,
        fields: &SuperheroFields,
        remove_image_ids: &[i64],
        new_images: &[NewImage],
    ) -> Result<bool, RegistryError> {
        let mut tx = self.pool.begin().await?;

        let affected = sqlx::query(
            r#"UPDATE superheroes SET
                nickname = ?,
                real_name = ?,
                origin_description = ?,
                superpowers = ?,
                catch_phrase = ?
              WHERE id = ?"#,
        )
        .bind(&fields.nickname)
        .bind(&fields.real_name)
        .bind(&fields.origin_description)
        .bind(&fields.superpowers)
        .bind(&fields.catch_phrase)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if affected == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for image_id in remove_image_ids {
            sqlx::query("DELETE FROM images WHERE id = ? AND superhero_id = ?")
                .bind(image_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        for image in new_images {
            Self::insert_image(&mut *tx, id, image).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Delete image rows then the superhero row. Returns false when absent.
    pub async fn delete(&self, id: i64) -> Result<bool, RegistryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM images WHERE superhero_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let affected = sqlx::query("DELETE FROM superheroes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(affected > 0)
    }

    async fn insert_image(
        conn: &mut SqliteConnection,
        superhero_id: i64,
        image: &NewImage,
    ) -> Result<i64, RegistryError> {
        let query = match image {
            NewImage::Path {
                file_path,
                content_type,
            } => sqlx::query(
                "INSERT INTO images (superhero_id, file_path, content_type) VALUES (?, ?, ?)",
            )
            .bind(superhero_id)
            .bind(file_path)
            .bind(content_type),
            NewImage::Blob { data, content_type } => sqlx::query(
                "INSERT INTO images (superhero_id, image_data, content_type) VALUES (?, ?, ?)",
            )
            .bind(superhero_id)
            .bind(data)
            .bind(content_type),
        };
        let id = query.execute(conn).await?.last_insert_rowid();
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn storage() -> (SuperheroStorage, TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite:{}", dir.path().join("registry.sqlite").display());
        let pool = connect(&url).await.expect("connect");
        let storage = SuperheroStorage::new(pool);
        storage.init_schema().await.expect("schema");
        (storage, dir)
    }

    fn fields(nickname: &str) -> SuperheroFields {
        SuperheroFields {
            nickname: nickname.to_string(),
            ..Default::default()
        }
    }

    fn path_image(name: &str) -> NewImage {
        NewImage::Path {
            file_path: name.to_string(),
            content_type: "image/png".to_string(),
        }
    }

    #[tokio::test]
    async fn create_inserts_hero_and_images() {
        let (storage, _dir) = storage().await;
        let id = storage
            .create(&fields("Superman"), &[path_image("a.png"), path_image("b.png")])
            .await
            .unwrap();

        let hero = storage.get_superhero(id).await.unwrap().unwrap();
        assert_eq!(hero.nickname, "Superman");
        let images = storage.list_images(id).await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].file_path.as_deref(), Some("a.png"));
    }

    #[tokio::test]
    async fn list_images_for_only_returns_requested_heroes() {
        let (storage, _dir) = storage().await;
        let a = storage
            .create(&fields("A"), &[path_image("a1.png"), path_image("a2.png")])
            .await
            .unwrap();
        let b = storage.create(&fields("B"), &[path_image("b.png")]).await.unwrap();
        let c = storage.create(&fields("C"), &[path_image("c.png")]).await.unwrap();

        let images = storage.list_images_for(&[a, c]).await.unwrap();
        let owners: Vec<i64> = images.iter().map(|img| img.superhero_id).collect();
        assert_eq!(owners, vec![a, a, c]);
        assert!(!owners.contains(&b));

        assert!(storage.list_images_for(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_missing_id_writes_nothing() {
        let (storage, _dir) = storage().await;
        let updated = storage
            .update(42, &fields("Nobody"), &[], &[path_image("x.png")])
            .await
            .unwrap();
        assert!(!updated);
        assert!(storage.list_all_images().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_only_removes_images_of_that_hero() {
        let (storage, _dir) = storage().await;
        let a = storage.create(&fields("A"), &[path_image("a.png")]).await.unwrap();
        let b = storage.create(&fields("B"), &[path_image("b.png")]).await.unwrap();
        let foreign = storage.list_images(b).await.unwrap()[0].id;

        storage.update(a, &fields("A2"), &[foreign], &[]).await.unwrap();
        assert_eq!(storage.list_images(b).await.unwrap().len(), 1);
        assert_eq!(storage.get_superhero(a).await.unwrap().unwrap().nickname, "A2");
    }

    #[tokio::test]
    async fn delete_cascades_images() {
        let (storage, _dir) = storage().await;
        let id = storage.create(&fields("Flash"), &[path_image("f.png")]).await.unwrap();

        assert!(storage.delete(id).await.unwrap());
        assert!(storage.get_superhero(id).await.unwrap().is_none());
        assert!(storage.list_all_images().await.unwrap().is_empty());
        assert!(!storage.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn blob_images_round_trip() {
        let (storage, _dir) = storage().await;
        let id = storage
            .create(
                &fields("Storm"),
                &[NewImage::Blob {
                    data: vec![1, 2, 3],
                    content_type: "image/gif".to_string(),
                }],
            )
            .await
            .unwrap();
        let image = &storage.list_images(id).await.unwrap()[0];
        assert!(image.file_path.is_none());

        let blob = storage.get_image_blob(image.id).await.unwrap().unwrap();
        assert_eq!(blob.image_data, vec![1, 2, 3]);
        assert_eq!(blob.content_type.as_deref(), Some("image/gif"));
    }
}
