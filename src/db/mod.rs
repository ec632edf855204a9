// Declare database submodules
pub mod models;
pub mod postgres; // Contains schema.rs and the embedded migrations
pub mod repositories;
