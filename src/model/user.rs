use crate::model::role::Role;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Public user profile, never carries the password hash.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct UserProfile {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
}
