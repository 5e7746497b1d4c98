pub mod api;
pub mod auth;
pub mod configuration;
pub mod db;
pub mod docs;
pub mod entity;
pub mod model;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod util;
