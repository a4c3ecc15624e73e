use std::{str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqliteConnection, SqlitePool,
};
use tracing::info;

use crate::users::{repo, NewUser, User, UserStatus};

/// Accounts inserted on first start, one per status so every login branch is reachable.
pub const BOOTSTRAP_USERS: &[NewUser<'static>] = &[
    NewUser {
        username: "admin",
        password: "admin123",
        full_name: Some("Administrator"),
        email: Some("admin@example.com"),
        status: UserStatus::Active,
    },
    NewUser {
        username: "user1",
        password: "password1",
        full_name: Some("Ivan Petrov"),
        email: Some("ivan@example.com"),
        status: UserStatus::Active,
    },
    NewUser {
        username: "user2",
        password: "password2",
        full_name: Some("Maria Sidorova"),
        email: Some("maria@example.com"),
        status: UserStatus::Inactive,
    },
    NewUser {
        username: "user3",
        password: "password3",
        full_name: Some("Sergey Kuznetsov"),
        email: Some("sergey@example.com"),
        status: UserStatus::Blocked,
    },
];

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parse database url {database_url}"))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .context("connect to database")?;
    Ok(pool)
}

/// A single-connection pool over a private in-memory database.
///
/// The connection is never recycled, otherwise the database would vanish with it.
pub async fn connect_in_memory() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect("sqlite::memory:")
        .await
        .context("open in-memory database")?;
    Ok(pool)
}

/// Create the users table if absent and seed it when it holds no rows.
///
/// Returns the number of seeded accounts (0 when the table already had data).
pub async fn bootstrap(conn: &mut SqliteConnection) -> anyhow::Result<usize> {
    repo::create_table(conn).await?;

    let existing = User::count(conn).await?;
    if existing > 0 {
        info!(existing, "users table already populated; skipping seed");
        return Ok(0);
    }

    for new in BOOTSTRAP_USERS {
        User::create(conn, new)
            .await
            .with_context(|| format!("seed user {}", new.username))?;
    }
    info!(seeded = BOOTSTRAP_USERS.len(), "seeded empty users table");
    Ok(BOOTSTRAP_USERS.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_seeds_every_status_once() {
        let pool = connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        assert_eq!(bootstrap(&mut conn).await.unwrap(), BOOTSTRAP_USERS.len());
        assert_eq!(bootstrap(&mut conn).await.unwrap(), 0);
        assert_eq!(User::count(&mut conn).await.unwrap(), 4);

        let statuses: Vec<_> = User::count_by_status(&mut conn)
            .await
            .unwrap()
            .into_iter()
            .map(|(s, _)| s)
            .collect();
        assert_eq!(
            statuses,
            vec![UserStatus::Active, UserStatus::Blocked, UserStatus::Inactive]
        );
    }

    #[tokio::test]
    async fn bootstrap_leaves_existing_rows_alone() {
        let pool = connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        repo::create_table(&mut conn).await.unwrap();
        User::create(
            &mut conn,
            &NewUser {
                username: "someone",
                password: "pw",
                full_name: None,
                email: None,
                status: UserStatus::Active,
            },
        )
        .await
        .unwrap();

        assert_eq!(bootstrap(&mut conn).await.unwrap(), 0);
        assert!(User::find_by_username(&mut conn, "admin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn admin_seed_matches_documented_credentials() {
        let pool = connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        bootstrap(&mut conn).await.unwrap();

        let admin = User::find_by_credentials(&mut conn, "admin", "admin123")
            .await
            .unwrap()
            .expect("admin seeded");
        assert_eq!(admin.status, UserStatus::Active);
    }
}
