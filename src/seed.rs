//! Destructive demo reset used by the `seed` binary.
//!
//! Unlike [`crate::db::bootstrap`], this always drops the table and reloads a
//! larger fixed data set. The running service never calls it.

use std::fmt::Write;

use anyhow::Context;
use sqlx::{Connection, SqliteConnection, SqlitePool};
use tracing::{error, info};

use crate::users::{
    repo::{self, is_unique_violation},
    repo_types::ColumnInfo,
    NewUser, User, UserStatus,
};

const fn demo(
    username: &'static str,
    password: &'static str,
    full_name: &'static str,
    email: &'static str,
    status: UserStatus,
) -> NewUser<'static> {
    NewUser {
        username,
        password,
        full_name: Some(full_name),
        email: Some(email),
        status,
    }
}

pub const DEMO_USERS: &[NewUser<'static>] = &[
    demo("admin", "admin123", "System Administrator", "admin@company.com", UserStatus::Active),
    demo("ivan.petrov", "password123", "Ivan Petrov", "ivan.petrov@example.com", UserStatus::Active),
    demo("maria.sidorova", "qwerty456", "Maria Sidorova", "maria.sidorova@example.com", UserStatus::Active),
    demo("alex.volkov", "letmein789", "Alexander Volkov", "alex.volkov@example.com", UserStatus::Active),
    demo("olga.ivanova", "securepass", "Olga Ivanova", "olga.ivanova@example.com", UserStatus::Inactive),
    demo("sergey.kuznetsov", "testpass", "Sergey Kuznetsov", "sergey@test.ru", UserStatus::Blocked),
    demo("ekaterina.smirnova", "catlover", "Ekaterina Smirnova", "katya@mail.ru", UserStatus::Active),
    demo("dmitry.kozlov", "dima2024", "Dmitry Kozlov", "dima@work.com", UserStatus::Active),
    demo("anna.morozova", "winter2024", "Anna Morozova", "anna.m@company.com", UserStatus::Inactive),
    demo("maxim.orlov", "maxpower", "Maxim Orlov", "max.orlov@example.com", UserStatus::Active),
];

#[derive(Debug)]
pub struct SeedReport {
    pub users: Vec<User>,
    pub by_status: Vec<(UserStatus, i64)>,
}

#[derive(Debug)]
pub struct VerifyReport {
    pub columns: Vec<ColumnInfo>,
    pub count: i64,
}

/// Drop and recreate `users`, then load [`DEMO_USERS`] in one transaction.
pub async fn reset(conn: &mut SqliteConnection) -> anyhow::Result<SeedReport> {
    repo::drop_table(conn).await?;
    repo::create_table(conn).await?;
    info!("users table recreated");

    insert_all(conn, DEMO_USERS).await?;

    Ok(SeedReport {
        users: User::list_all(conn).await?,
        by_status: User::count_by_status(conn).await?,
    })
}

/// Insert `users` atomically; any failure rolls the whole batch back.
pub async fn insert_all(conn: &mut SqliteConnection, users: &[NewUser<'_>]) -> anyhow::Result<()> {
    let mut tx = conn.begin().await.context("begin tx")?;
    for new in users {
        if let Err(e) = User::create(&mut tx, new).await {
            tx.rollback().await.context("rollback tx")?;
            if is_unique_violation(&e) {
                anyhow::bail!("duplicate username in seed set: {}", new.username);
            }
            return Err(e.context(format!("insert {}", new.username)));
        }
    }
    tx.commit().await.context("commit tx")?;
    info!(inserted = users.len(), "seed users inserted");
    Ok(())
}

pub async fn inspect(conn: &mut SqliteConnection) -> anyhow::Result<VerifyReport> {
    Ok(VerifyReport {
        columns: repo::table_columns(conn).await?,
        count: User::count(conn).await?,
    })
}

pub fn render_seed_report(report: &SeedReport) -> String {
    let rule = "-".repeat(96);
    let mut out = String::new();
    let _ = writeln!(out, "Inserted {} users", report.users.len());
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "{:<4} {:<20} {:<25} {:<10} {:<30}",
        "ID", "Username", "Full Name", "Status", "Email"
    );
    let _ = writeln!(out, "{rule}");
    for u in &report.users {
        let _ = writeln!(
            out,
            "{:<4} {:<20} {:<25} {:<10} {:<30}",
            u.id,
            u.username,
            u.full_name.as_deref().unwrap_or(""),
            u.status.as_str(),
            u.email.as_deref().unwrap_or("")
        );
    }
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "\nUsers by status:");
    for (status, n) in &report.by_status {
        let _ = writeln!(out, "  {status}: {n}");
    }
    let _ = writeln!(out, "\nDemo credentials:");
    let _ = writeln!(out, "  administrator: admin / admin123");
    let _ = writeln!(out, "  regular user:  ivan.petrov / password123");
    let _ = writeln!(out, "  inactive user: olga.ivanova / securepass");
    let _ = writeln!(out, "  blocked user:  sergey.kuznetsov / testpass");
    out
}

pub fn render_verify_report(report: &VerifyReport) -> String {
    let rule = "-".repeat(60);
    let mut out = String::new();
    let _ = writeln!(out, "Table 'users' layout:");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "{:<3} {:<15} {:<15} {:<10} {:<15}",
        "ID", "Name", "Type", "Not Null", "Default"
    );
    let _ = writeln!(out, "{rule}");
    for c in &report.columns {
        let _ = writeln!(
            out,
            "{:<3} {:<15} {:<15} {:<10} {:<15}",
            c.cid,
            c.name,
            c.ty,
            c.notnull,
            c.dflt_value.as_deref().unwrap_or("None")
        );
    }
    let _ = writeln!(out, "{rule}");
    out
}

/// Reset the store and print what was loaded. Returns `false` on any failure.
pub async fn reset_and_seed(pool: &SqlitePool) -> bool {
    let result = async {
        let mut conn = pool.acquire().await.context("acquire connection")?;
        reset(&mut conn).await
    }
    .await;

    match result {
        Ok(report) => {
            println!("{}", render_seed_report(&report));
            true
        }
        Err(e) => {
            error!(error = ?e, "seeding failed");
            println!("Seeding failed: {e:#}");
            false
        }
    }
}

/// Print the table layout and check that it holds rows.
pub async fn verify(pool: &SqlitePool) -> bool {
    let result = async {
        let mut conn = pool.acquire().await.context("acquire connection")?;
        inspect(&mut conn).await
    }
    .await;

    match result {
        Ok(report) => {
            println!("{}", render_verify_report(&report));
            if report.count > 0 {
                println!("Database initialised correctly, {} rows.", report.count);
                true
            } else {
                println!("Database is empty!");
                false
            }
        }
        Err(e) => {
            error!(error = ?e, "verification failed");
            println!("Verification failed: {e:#}");
            false
        }
    }
}
