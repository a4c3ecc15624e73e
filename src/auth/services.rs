use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::auth::dto::{non_empty, RegisterForm};
use crate::users::{repo::is_unique_violation, NewUser, User, UserStatus};

/// Result of checking submitted credentials against the store.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials match an active account.
    Authenticated(User),
    Inactive,
    Blocked,
    InvalidCredentials,
}

#[derive(Debug)]
pub enum RegisterOutcome {
    Created(User),
    MissingFields,
    UsernameTaken,
}

/// Look up the exact username/password pair and gate on account status.
///
/// Passwords are compared as stored, in plain text.
pub async fn authenticate(
    conn: &mut SqliteConnection,
    username: &str,
    password: &str,
) -> anyhow::Result<LoginOutcome> {
    let Some(user) = User::find_by_credentials(conn, username, password).await? else {
        warn!(%username, "login with invalid credentials");
        return Ok(LoginOutcome::InvalidCredentials);
    };

    let outcome = match user.status {
        UserStatus::Active => {
            info!(user_id = user.id, %username, "user logged in");
            LoginOutcome::Authenticated(user)
        }
        UserStatus::Inactive => {
            warn!(user_id = user.id, %username, "login refused: account inactive");
            LoginOutcome::Inactive
        }
        UserStatus::Blocked => {
            warn!(user_id = user.id, %username, "login refused: account blocked");
            LoginOutcome::Blocked
        }
    };
    Ok(outcome)
}

/// Validate the form and insert an active account.
pub async fn register(
    conn: &mut SqliteConnection,
    form: &RegisterForm,
) -> anyhow::Result<RegisterOutcome> {
    if !form.has_required_fields() {
        warn!("registration without username or password");
        return Ok(RegisterOutcome::MissingFields);
    }

    let new = NewUser {
        username: &form.username,
        password: &form.password,
        full_name: non_empty(&form.full_name),
        email: non_empty(&form.email),
        status: UserStatus::Active,
    };

    match User::create(conn, &new).await {
        Ok(user) => {
            info!(user_id = user.id, username = %user.username, "user registered");
            Ok(RegisterOutcome::Created(user))
        }
        Err(e) if is_unique_violation(&e) => {
            warn!(username = %form.username, "username already registered");
            Ok(RegisterOutcome::UsernameTaken)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    fn form(username: &str, password: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn authenticate_covers_every_status() {
        let state = AppState::in_memory().await.unwrap();
        let mut conn = state.db.acquire().await.unwrap();

        assert!(matches!(
            authenticate(&mut conn, "admin", "admin123").await.unwrap(),
            LoginOutcome::Authenticated(u) if u.username == "admin"
        ));
        assert!(matches!(
            authenticate(&mut conn, "user2", "password2").await.unwrap(),
            LoginOutcome::Inactive
        ));
        assert!(matches!(
            authenticate(&mut conn, "user3", "password3").await.unwrap(),
            LoginOutcome::Blocked
        ));
        assert!(matches!(
            authenticate(&mut conn, "admin", "wrong").await.unwrap(),
            LoginOutcome::InvalidCredentials
        ));
        assert!(matches!(
            authenticate(&mut conn, "nobody", "admin123").await.unwrap(),
            LoginOutcome::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn wrong_password_for_inactive_account_is_generic() {
        let state = AppState::in_memory().await.unwrap();
        let mut conn = state.db.acquire().await.unwrap();
        assert!(matches!(
            authenticate(&mut conn, "user2", "nope").await.unwrap(),
            LoginOutcome::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn register_creates_active_account() {
        let state = AppState::in_memory().await.unwrap();
        let mut conn = state.db.acquire().await.unwrap();

        let mut f = form("newbie", "pw");
        f.email = "newbie@example.com".into();
        let RegisterOutcome::Created(user) = register(&mut conn, &f).await.unwrap() else {
            panic!("expected account to be created");
        };
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.full_name, None);
        assert_eq!(user.email.as_deref(), Some("newbie@example.com"));

        let stored = User::find_by_username(&mut conn, "newbie").await.unwrap();
        assert_eq!(stored.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn register_rejects_missing_fields_before_store() {
        let state = AppState::in_memory().await.unwrap();
        let mut conn = state.db.acquire().await.unwrap();
        let before = User::count(&mut conn).await.unwrap();

        for f in [form("", "pw"), form("someone", ""), form("", "")] {
            assert!(matches!(
                register(&mut conn, &f).await.unwrap(),
                RegisterOutcome::MissingFields
            ));
        }
        assert_eq!(User::count(&mut conn).await.unwrap(), before);
    }

    #[tokio::test]
    async fn register_duplicate_is_conflict_without_new_row() {
        let state = AppState::in_memory().await.unwrap();
        let mut conn = state.db.acquire().await.unwrap();
        let before = User::count(&mut conn).await.unwrap();

        assert!(matches!(
            register(&mut conn, &form("admin", "different")).await.unwrap(),
            RegisterOutcome::UsernameTaken
        ));
        assert_eq!(User::count(&mut conn).await.unwrap(), before);
    }

    #[tokio::test]
    async fn register_accepts_varied_usernames_verbatim() {
        let state = AppState::in_memory().await.unwrap();
        let mut conn = state.db.acquire().await.unwrap();

        let names = [
            "Admin",
            "ADMIN",
            "пользователь",
            "ユーザー",
            " admin",
            "spaced ",
            "two words",
        ];
        for name in names {
            let outcome = register(&mut conn, &form(name, "pw")).await.unwrap();
            let RegisterOutcome::Created(user) = outcome else {
                panic!("expected {name:?} to be created");
            };
            assert_eq!(user.username, name);
            assert_eq!(user.status, UserStatus::Active);

            assert!(matches!(
                authenticate(&mut conn, name, "pw").await.unwrap(),
                LoginOutcome::Authenticated(u) if u.id == user.id
            ));
            assert!(matches!(
                register(&mut conn, &form(name, "other")).await.unwrap(),
                RegisterOutcome::UsernameTaken
            ));
        }

        let admin = User::find_by_username(&mut conn, "admin").await.unwrap();
        assert_eq!(admin.map(|u| u.password), Some("admin123".into()));
    }
}
