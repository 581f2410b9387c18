// src/models/category.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Represents the 'categories' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Technology tags, stored as `TEXT[]`.
    pub technologies: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Category row with the number of tests it owns.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryWithCount {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub tests_count: i64,
}

/// Query parameters for the public category listing.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryCatalogParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// DTO for creating or replacing a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title length must be between 1 and 100 characters."
    ))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_technologies))]
    pub technologies: Vec<String>,
}

impl CategoryRequest {
    /// Trims the title and drops blank technology tags.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.technologies = self
            .technologies
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }
}

fn validate_technologies(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > 50 {
        return Err(ValidationError::new("too_many_technologies"));
    }
    if tags.iter().any(|t| t.len() > 50) {
        return Err(ValidationError::new("technology_too_long"));
    }
    Ok(())
}
