pub mod hero_form;
pub mod params;

pub use hero_form::HeroForm;
pub use params::{IdParam, ListParams};
