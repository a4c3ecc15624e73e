use anyhow::Context;
use sqlx::SqliteConnection;

use crate::users::repo_types::{ColumnInfo, NewUser, User, UserStatus};

const USER_COLUMNS: &str = "id, username, password, full_name, email, status, created_at";

/// Create the `users` table if it does not exist yet.
pub async fn create_table(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password TEXT NOT NULL,
            full_name TEXT,
            email TEXT,
            status TEXT NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'inactive', 'blocked')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await
    .context("create users table")?;
    Ok(())
}

pub async fn drop_table(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    sqlx::query("DROP TABLE IF EXISTS users")
        .execute(&mut *conn)
        .await
        .context("drop users table")?;
    Ok(())
}

pub async fn table_columns(conn: &mut SqliteConnection) -> anyhow::Result<Vec<ColumnInfo>> {
    let cols = sqlx::query_as::<_, ColumnInfo>("PRAGMA table_info(users)")
        .fetch_all(&mut *conn)
        .await
        .context("read users table info")?;
    Ok(cols)
}

impl User {
    /// Find the user whose username and password both match exactly.
    pub async fn find_by_credentials(
        conn: &mut SqliteConnection,
        username: &str,
        password: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? AND password = ?"
        ))
        .bind(username)
        .bind(password)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(user)
    }

    #[cfg(test)]
    pub(crate) async fn find_by_username(
        conn: &mut SqliteConnection,
        username: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(user)
    }

    /// Insert a new user. A duplicate username surfaces as a unique violation,
    /// see [`is_unique_violation`].
    pub async fn create(conn: &mut SqliteConnection, new: &NewUser<'_>) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password, full_name, email, status)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.username)
        .bind(new.password)
        .bind(new.full_name)
        .bind(new.email)
        .bind(new.status)
        .fetch_one(&mut *conn)
        .await?;
        Ok(user)
    }

    pub async fn list_all(conn: &mut SqliteConnection) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&mut *conn)
        .await?;
        Ok(users)
    }

    pub async fn count(conn: &mut SqliteConnection) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *conn)
            .await?;
        Ok(n)
    }

    pub async fn count_by_status(
        conn: &mut SqliteConnection,
    ) -> anyhow::Result<Vec<(UserStatus, i64)>> {
        let rows = sqlx::query_as::<_, (UserStatus, i64)>(
            "SELECT status, COUNT(*) FROM users GROUP BY status ORDER BY status",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }
}

/// True when `err` wraps a database unique-constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}
