pub mod image_store;
pub mod superheroes;

pub use image_store::{ImageStore, ImageUpload};
pub use superheroes::SuperheroService;
