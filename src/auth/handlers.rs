use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    model::{role::Role, user::UserProfile},
    models::{LoginReqDto, RegisterReq, UserSql},
};
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

/// Inserts a new user row with a freshly hashed password.
async fn insert_user(
    email: &str,
    password: &str,
    name: &str,
    pool: &MySqlPool,
) -> Result<u64, HttpResponse> {
    let hashed = hash_password(password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        HttpResponse::InternalServerError().json(json!({
            "error": "Failed to register user"
        }))
    })?;

    let result = sqlx::query(
        r#"INSERT INTO users (email, password_hash, name, role) VALUES (?, ?, ?, ?)"#,
    )
    .bind(email)
    .bind(hashed)
    .bind(name)
    .bind(Role::User)
    .execute(pool)
    .await;

    match result {
        Ok(res) => Ok(res.last_insert_id()),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                // unique key on email
                if db_err.code() == Some("23000".into()) {
                    return Err(HttpResponse::Conflict().json(json!({
                        "error": "User already exists"
                    })));
                }
            }

            error!(error = %e, "Failed to insert user");
            Err(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to register user"
            })))
        }
    }
}

/// User registration handler
pub async fn register(user: web::Json<RegisterReq>, pool: web::Data<MySqlPool>) -> impl Responder {
    let email = user.email.trim();
    let name = user.name.trim();
    let password = &user.password;

    if email.is_empty() || password.is_empty() || name.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "Email, password and name must not be empty"
        }));
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(email)
    .fetch_one(pool.get_ref())
    .await
    .unwrap_or(false);

    if exists {
        return HttpResponse::Conflict().json(json!({
            "error": "User already exists"
        }));
    }

    match insert_user(email, password, name, pool.get_ref()).await {
        Ok(id) => {
            info!(user_id = id, "User registered");
            HttpResponse::Created().json(UserProfile {
                id,
                email: email.to_string(),
                name: name.to_string(),
                role: Role::User,
            })
        }
        Err(err_resp) => err_resp,
    }
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: UserProfile,
}

#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().json(json!({
            "error": "Email and password are required"
        }));
    }

    debug!("Fetching user from database");

    let db_user = match sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, email, password_hash, name, role
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(user.email.trim())
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().json(json!({
                "error": "Invalid email or password"
            }));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().json(json!({
                "error": "Failed to login"
            }));
        }
    };

    debug!("Verifying password");

    if let Err(e) = verify_password(&user.password, &db_user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({
            "error": "Invalid email or password"
        }));
    }

    debug!("Generating access token");

    let token = generate_access_token(
        db_user.id,
        db_user.email.clone(),
        db_user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    );

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        token,
        user: UserProfile {
            id: db_user.id,
            email: db_user.email,
            name: db_user.name,
            role: db_user.role,
        },
    })
}

/// Re-hydrates the client identity from a bearer token. Reads the user
/// row fresh so a deleted or re-roled account stops verifying.
pub async fn verify_session(auth: AuthUser, pool: web::Data<MySqlPool>) -> impl Responder {
    let profile = sqlx::query_as::<_, UserProfile>(
        "SELECT id, email, name, role FROM users WHERE id = ?",
    )
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await;

    match profile {
        Ok(Some(user)) => HttpResponse::Ok().json(user),
        Ok(None) => HttpResponse::Unauthorized().json(json!({
            "error": "User not found"
        })),
        Err(e) => {
            error!(error = %e, "Failed to verify session");
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to verify session"
            }))
        }
    }
}

/// Access tokens are stateless; the client just discards its copy.
pub async fn logout() -> impl Responder {
    HttpResponse::Ok().json(json!({ "success": true }))
}
