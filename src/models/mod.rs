// src/models/mod.rs

pub mod category;
pub mod pagination;
pub mod question;
pub mod test;
pub mod test_result;
pub mod user;
