use crate::auth::password::hash_password;
use crate::model::role::Role;
use anyhow::{Context, Result, anyhow};
use sqlx::MySqlPool;
use tracing::info;

/// Ensures the configured admin account exists, promoting an existing
/// row if the email is already registered. Runs once at startup.
pub async fn ensure_admin_user(pool: &MySqlPool, email: &str, password: &str) -> Result<()> {
    let existing = sqlx::query_as::<_, (u64, Role)>("SELECT id, role FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to look up admin account")?;

    match existing {
        Some((id, Role::Admin)) => {
            info!(user_id = id, "Admin account already present");
        }
        Some((id, _)) => {
            sqlx::query("UPDATE users SET role = ? WHERE id = ?")
                .bind(Role::Admin)
                .bind(id)
                .execute(pool)
                .await
                .context("failed to promote admin account")?;
            info!(user_id = id, "Promoted existing account to admin");
        }
        None => {
            let hashed = hash_password(password)
                .map_err(|e| anyhow!("failed to hash admin password: {e}"))?;

            let result = sqlx::query(
                "INSERT INTO users (email, password_hash, name, role) VALUES (?, ?, ?, ?)",
            )
            .bind(email)
            .bind(hashed)
            .bind("Administrator")
            .bind(Role::Admin)
            .execute(pool)
            .await
            .context("failed to create admin account")?;

            info!(user_id = result.last_insert_id(), "Created admin account");
        }
    }

    Ok(())
}
