pub mod auth;
pub mod catalogs;
pub mod core;
pub mod import;
pub mod periods;
pub mod students;
pub mod teachers;
