pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod kv;
pub mod models;
pub mod services;
pub mod state;
