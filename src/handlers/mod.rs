// src/handlers/mod.rs

pub mod admin;
pub mod admin_categories;
pub mod auth;
pub mod catalog;
pub mod profile;
pub mod quiz;
