use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::Config;

pub async fn reset_password(pool: &PgPool, username: &str, new_pass: &str) -> Result<()> {
    let hash = bcrypt::hash(new_pass, bcrypt::DEFAULT_COST).context("Failed to hash password")?;

    // Try update first
    let result = sqlx::query("UPDATE admins SET password_hash = $1 WHERE username = $2")
        .bind(&hash)
        .bind(username)
        .execute(pool)
        .await
        .context("Failed to update password in database")?;

    if result.rows_affected() == 0 {
        sqlx::query("INSERT INTO admins (username, password_hash) VALUES ($1, $2)")
            .bind(username)
            .bind(&hash)
            .execute(pool)
            .await
            .context("Failed to create new admin")?;
        println!("New admin user '{}' created successfully.", username);
    } else {
        println!("Password for user '{}' has been successfully reset.", username);
    }

    Ok(())
}

pub fn print_info(config: &Config) {
    println!("\n=== ATELIER API INFO ===");
    println!("Listen port: {}", config.listen_port);
    println!("Admin login: http://<YOUR_DOMAIN>:{}/admin/login", config.listen_port);
    println!("========================\n");
}
