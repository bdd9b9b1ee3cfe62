use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::get,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::config::Config;
use crate::db::{SuperheroStorage, connect};
use crate::error::RegistryError;
use crate::handlers::superheroes::{
    create_superhero, delete_superhero, get_image, get_superhero, health, list_superheroes,
    update_superhero,
};
use crate::service::{ImageStore, SuperheroService};
use crate::service::image_store::BLOB_ROUTE_PREFIX;

#[derive(Clone)]
pub struct RegistryState {
    pub service: SuperheroService,
}

impl RegistryState {
    pub fn new(service: SuperheroService) -> Self {
        Self { service }
    }

    /// Connect the database, apply the schema and prepare image storage.
    pub async fn from_config(cfg: &Config) -> Result<Self, RegistryError> {
        let pool = connect(&cfg.basic.database_url).await?;
        let storage = SuperheroStorage::new(pool);
        storage.init_schema().await?;

        let images = ImageStore::from_config(&cfg.storage);
        images.ensure_ready().await?;
        info!(mode = ?cfg.storage.mode, "image storage ready");

        Ok(Self::new(SuperheroService::new(storage, images)))
    }
}

fn superhero_routes() -> Router<RegistryState> {
    Router::new()
        .route("/", get(list_superheroes).post(create_superhero))
        .route(
            "/{id}",
            get(get_superhero)
                .put(update_superhero)
                .delete(delete_superhero),
        )
}

pub fn registry_router(state: RegistryState, cfg: &Config) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .nest("/superheroes", superhero_routes())
        .nest("/api/superheroes", superhero_routes())
        .route(&format!("{BLOB_ROUTE_PREFIX}/{{id}}"), get(get_image));

    if let ImageStore::Disk {
        dir,
        uploads_prefix,
    } = state.service.image_store()
    {
        router = router.nest_service(uploads_prefix, ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(cfg.storage.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
