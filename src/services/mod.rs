// src/services/mod.rs

pub mod leveling;
pub mod scoring;
pub mod streak;
