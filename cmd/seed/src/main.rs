//! # seed
//!
//! Creates (or reports) the initial admin account in PostgreSQL. Reads the
//! same configuration as the server, so `auth.jwt_secret` must be set too.
//!
//! ```sh
//! STACKIT__DATABASE__URL=postgres://... SEED_ADMIN_PASSWORD=... cargo run -p seed
//! ```

use anyhow::{bail, Context};
use auth_adapters::Argon2Hasher;
use chrono::Utc;
use configs::Settings;
use domains::{Role, User, UserId, UserRepository};
use secrecy::ExposeSecret;
use storage_adapters::PgStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = Settings::load().context("loading configuration")?;
    let Some(url) = settings.database.url.as_ref() else {
        bail!("STACKIT__DATABASE__URL must be set to seed a database");
    };

    let username = std::env::var("SEED_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let email = std::env::var("SEED_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@stackit.local".to_string())
        .to_lowercase();
    let password = std::env::var("SEED_ADMIN_PASSWORD").context("SEED_ADMIN_PASSWORD is required")?;

    let store = PgStore::connect(url.expose_secret(), 1).await?;
    store.migrate().await?;

    if let Some(existing) = store.find_user_by_email(&email).await? {
        info!(user = %existing.id, %email, "admin already present");
        return Ok(());
    }

    let admin = User {
        id: UserId::generate(),
        username,
        email,
        password_hash: Argon2Hasher::new().hash(&password)?,
        avatar: String::new(),
        role: Role::Admin,
        reputation: 0,
        created_at: Utc::now(),
    };
    store.create_user(&admin).await?;
    info!(user = %admin.id, username = %admin.username, "admin created");
    Ok(())
}
