pub mod superhero;

pub use superhero::{CreatedResponse, HeroSubmission, ListQuery, MessageResponse, SuperheroView};
