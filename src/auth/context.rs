use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sqlx::{pool::PoolConnection, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::{auth::session::Session, error::AppError, state::AppState};

/// Per-request handle on the store and the client's session.
///
/// The store connection is checked out of the pool on first use and goes
/// back when the context is dropped at the end of the request.
pub struct RequestContext {
    pool: SqlitePool,
    conn: Option<PoolConnection<Sqlite>>,
    pub session: Session,
}

impl RequestContext {
    pub fn new(pool: SqlitePool, session: Session) -> Self {
        Self {
            pool,
            conn: None,
            session,
        }
    }

    pub async fn conn(&mut self) -> Result<&mut SqliteConnection, AppError> {
        let conn = match self.conn.take() {
            Some(c) => c,
            None => {
                debug!("acquiring store connection");
                self.pool.acquire().await?
            }
        };
        Ok(&mut **self.conn.insert(conn))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(RequestContext::new(state.db.clone(), session))
    }
}
