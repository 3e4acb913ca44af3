use crate::{auth::auth::AuthUser, model::role::Role, model::user::UserProfile};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateRoleReq {
    #[schema(example = "manager", value_type = String)]
    pub role: Option<String>,
}

/// List users
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All user accounts", body = [UserProfile]),
        (status = 403, description = "Requires admin role")
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let users = sqlx::query_as::<_, UserProfile>("SELECT id, email, name, role FROM users")
        .fetch_all(pool.get_ref())
        .await;

    match users {
        Ok(users) => Ok(HttpResponse::Ok().json(users)),
        Err(e) => {
            error!(error = %e, "Failed to fetch users");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to fetch users"
            })))
        }
    }
}

/// Update a user's role
#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    params(
        ("id", Path, description = "User ID")
    ),
    request_body = UpdateRoleReq,
    responses(
        (status = 200, description = "Role updated", body = Object, example = json!({"success": true})),
        (status = 400, description = "Missing or invalid role"),
        (status = 403, description = "Requires admin role"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_user_role(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateRoleReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let role = match body.role.as_deref() {
        None | Some("") => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "Role is required"
            })));
        }
        Some(raw) => match Role::from_str(raw) {
            Ok(role) => role,
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "error": "Invalid role"
                })));
            }
        },
    };

    let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role)
        .bind(user_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "error": "User not found"
                })));
            }

            info!(user_id, %role, "Updated user role");
            Ok(HttpResponse::Ok().json(json!({ "success": true })))
        }
        Err(e) => {
            error!(error = %e, user_id, "Failed to update user role");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to update user role"
            })))
        }
    }
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id", Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Deleted", body = Object, example = json!({"success": true})),
        (status = 403, description = "Requires admin role"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "error": "User not found"
                })));
            }

            info!(user_id, "Deleted user");
            Ok(HttpResponse::Ok().json(json!({ "success": true })))
        }
        Err(e) => {
            error!(error = %e, user_id, "Failed to delete user");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to delete user"
            })))
        }
    }
}
