//! Basket - local-first shopping lists with templates and JSON export

pub mod commands;
pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod storage;
pub mod store;
pub mod templates;
pub mod validation;
