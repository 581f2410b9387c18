// src/models/user.rs

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

static BIRTH_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid birth date pattern"));

/// Experience tier of a user, ordered from lowest to highest.
/// Stored as the Postgres enum `user_level`.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "user_level")]
pub enum Level {
    #[default]
    Trainee,
    Junior,
    Middle,
    Senior,
    Lead,
}

/// Account role. Stored as the Postgres enum `user_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// Column list matching `User`, for `SELECT` and `RETURNING` clauses.
pub const USER_COLUMNS: &str = "id, name, email, password, birth_date, created_at, avatar_url, \
     level, exp, last_visit_date, current_streak, role";

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub avatar_url: Option<String>,
    pub level: Level,
    pub exp: i32,
    pub last_visit_date: Option<NaiveDate>,
    pub current_streak: i32,
    pub role: Role,
}

/// Public part of a freshly registered account.
#[derive(Debug, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Current user's profile with test statistics.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub count_completed_tests: i64,
}

/// Row shape for the admin users table.
#[derive(Debug, Serialize, FromRow)]
pub struct UserListItem {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_visit_date: Option<NaiveDate>,
    pub role: Role,
    pub level: Level,
    pub exp: i32,
    pub current_streak: i32,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 6,
        max = 20,
        message = "Name length must be between 6 and 20 characters."
    ))]
    pub name: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 100,
        message = "Password length must be between 6 and 100 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(min = 6, max = 100))]
    pub password: String,
}

/// DTO for editing the current user's profile.
///
/// `birth_date` distinguishes an absent key (leave as is) from `null` (clear).
#[derive(Debug, Default, Deserialize, Validate)]
#[validate(schema(function = validate_profile_not_empty))]
pub struct UpdateProfileRequest {
    #[validate(length(
        min = 2,
        max = 50,
        message = "Name length must be between 2 and 50 characters."
    ))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address."))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(custom(function = validate_birth_date))]
    pub birth_date: Option<Option<String>>,
}

impl UpdateProfileRequest {
    /// Trims free-text fields in place before validation.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self.email = self.email.map(|e| e.trim().to_string());
        self
    }
}

fn validate_profile_not_empty(req: &UpdateProfileRequest) -> Result<(), ValidationError> {
    if req.name.is_none() && req.email.is_none() && req.birth_date.is_none() {
        return Err(ValidationError::new("empty_update")
            .with_message("At least one field must be provided".into()));
    }
    Ok(())
}

/// Accepts `YYYY-MM-DD` strings that are also real calendar dates.
fn validate_birth_date(value: &str) -> Result<(), ValidationError> {
    if !BIRTH_DATE_RE.is_match(value) || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err(ValidationError::new("invalid_date")
            .with_message("Birth date must be in YYYY-MM-DD format".into()));
    }
    Ok(())
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// DTO for persisting level and experience chosen by the client.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLevelRequest {
    pub level: Level,
    #[validate(range(min = 0, message = "Experience cannot be negative"))]
    pub exp: i32,
}

/// DTO for awarding experience for a named action.
#[derive(Debug, Deserialize, Validate)]
pub struct AwardExperienceRequest {
    #[validate(length(min = 1, max = 50))]
    pub action: String,
}

/// DTO for admin user edits. Only name and role are editable.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 2, max = 50))]
    pub name: Option<String>,
    pub role: Option<Role>,
}
