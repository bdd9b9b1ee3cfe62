pub mod superheroes;
