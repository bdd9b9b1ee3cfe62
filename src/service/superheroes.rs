use crate::db::models::{DbImage, DbImageBlob};
use crate::db::sqlite::SuperheroStorage;
use crate::error::RegistryError;
use crate::service::image_store::{ImageStore, file_name_of};
use crate::types::{HeroSubmission, ListQuery, SuperheroView};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// CRUD over superheroes plus reconciliation of their image sets.
#[derive(Clone)]
pub struct SuperheroService {
    storage: SuperheroStorage,
    images: ImageStore,
}

impl SuperheroService {
    pub fn new(storage: SuperheroStorage, images: ImageStore) -> Self {
        Self { storage, images }
    }

    pub fn image_store(&self) -> &ImageStore {
        &self.images
    }

    pub async fn list(&self, query: ListQuery) -> Result<Vec<SuperheroView>, RegistryError> {
        let (heroes, images) = match query.window() {
            Some((limit, offset)) => {
                let heroes = self.storage.list_superheroes_page(limit, offset).await?;
                let ids: Vec<i64> = heroes.iter().map(|hero| hero.id).collect();
                let images = self.storage.list_images_for(&ids).await?;
                (heroes, images)
            }
            None => (
                self.storage.list_superheroes().await?,
                self.storage.list_all_images().await?,
            ),
        };

        let mut by_hero: HashMap<i64, Vec<String>> = HashMap::new();
        for image in images {
            by_hero
                .entry(image.superhero_id)
                .or_default()
                .push(self.images.url(&image));
        }

        Ok(heroes
            .into_iter()
            .map(|hero| {
                let urls = by_hero.remove(&hero.id).unwrap_or_default();
                SuperheroView::new(hero, urls)
            })
            .collect())
    }

    pub async fn get(&self, id: i64) -> Result<SuperheroView, RegistryError> {
        let hero = self
            .storage
            .get_superhero(id)
            .await?
            .ok_or_else(|| RegistryError::superhero_not_found(id))?;
        let urls = self
            .storage
            .list_images(id)
            .await?
            .iter()
            .map(|img| self.images.url(img))
            .collect();
        Ok(SuperheroView::new(hero, urls))
    }

    pub async fn create(&self, submission: HeroSubmission) -> Result<i64, RegistryError> {
        let (fields, uploads) = submission.into_parts()?;
        let new_images = self.images.persist_all(uploads).await?;

        match self.storage.create(&fields, &new_images).await {
            Ok(id) => {
                info!(id, nickname = %fields.nickname, images = new_images.len(), "superhero created");
                Ok(id)
            }
            Err(e) => {
                self.images.discard_new(&new_images).await;
                Err(e)
            }
        }
    }

    /// Overwrite fields, drop stored images missing from the keep list, attach uploads.
    pub async fn update(&self, id: i64, submission: HeroSubmission) -> Result<(), RegistryError> {
        let keep = submission.existing_images.clone();
        let (fields, uploads) = submission.into_parts()?;

        if self.storage.get_superhero(id).await?.is_none() {
            return Err(RegistryError::superhero_not_found(id));
        }

        let stored = self.storage.list_images(id).await?;
        let removed = images_to_remove(&self.images, &stored, &keep);
        let removed_ids: Vec<i64> = removed.iter().map(|img| img.id).collect();

        let new_images = self.images.persist_all(uploads).await?;

        match self
            .storage
            .update(id, &fields, &removed_ids, &new_images)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                self.images.discard_new(&new_images).await;
                return Err(RegistryError::superhero_not_found(id));
            }
            Err(e) => {
                self.images.discard_new(&new_images).await;
                return Err(e);
            }
        }

        // Rows are gone at this point; file removal failures only get logged.
        self.images.discard(&removed).await;

        info!(
            id,
            removed = removed.len(),
            added = new_images.len(),
            "superhero updated"
        );
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), RegistryError> {
        let stored = self.storage.list_images(id).await?;
        if !self.storage.delete(id).await? {
            return Err(RegistryError::superhero_not_found(id));
        }

        self.images.discard(&stored).await;
        info!(id, images = stored.len(), "superhero deleted");
        Ok(())
    }

    pub async fn image_blob(&self, id: i64) -> Result<DbImageBlob, RegistryError> {
        self.storage
            .get_image_blob(id)
            .await?
            .ok_or_else(|| RegistryError::image_not_found(id))
    }
}

/// Stored images whose identifier does not appear in `keep`.
///
/// Keep entries may be bare identifiers or full URLs; only the last path
/// segment is compared.
pub fn images_to_remove(store: &ImageStore, stored: &[DbImage], keep: &[String]) -> Vec<DbImage> {
    let keep: HashSet<&str> = keep
        .iter()
        .map(|k| file_name_of(k))
        .filter(|k| !k.is_empty())
        .collect();

    stored
        .iter()
        .filter(|img| !keep.contains(store.identifier(img).as_str()))
        .cloned()
        .collect()
}
