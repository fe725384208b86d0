pub mod api;
pub mod backend;
pub mod entity;
pub mod format;
pub mod models;
pub mod nav;
