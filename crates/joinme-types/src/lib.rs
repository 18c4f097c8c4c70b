pub mod api;
pub mod events;
pub mod ids;
pub mod keys;
pub mod models;
