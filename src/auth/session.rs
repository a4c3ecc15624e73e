use std::convert::Infallible;
use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponseParts, ResponseParts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{
    config::{SessionConfig, MAX_SESSION_TTL_MINUTES},
    error::AppError,
    state::AppState,
    users::User,
};

pub const SESSION_COOKIE: &str = "session";

/// Pending flashes kept per session; older ones are dropped first.
pub const MAX_FLASHES: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Everything a client carries between requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<Flash>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.user_id.is_none() && self.flashes.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    iat: usize,
    exp: usize,
    data: SessionData,
}

/// Signing material for the session cookie.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.session)
    }
}

impl SessionKeys {
    /// TTL is clamped to `0..=MAX_SESSION_TTL_MINUTES`; config loading rejects values outside it.
    pub fn from_config(cfg: &SessionConfig) -> Self {
        let minutes = cfg.ttl_minutes.clamp(0, MAX_SESSION_TTL_MINUTES) as u64;
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::from_secs(minutes.saturating_mul(60)),
        }
    }

    pub fn sign(&self, data: &SessionData) -> Result<String, AppError> {
        let now = OffsetDateTime::now_utc();
        let exp = TimeDuration::try_from(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| anyhow::anyhow!("session ttl {:?} overflows expiry", self.ttl))?;
        let claims = SessionClaims {
            iat: usize::try_from(now.unix_timestamp()).map_err(anyhow::Error::from)?,
            exp: usize::try_from(exp.unix_timestamp()).map_err(anyhow::Error::from)?,
            data: data.clone(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<SessionData, jsonwebtoken::errors::Error> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims.data)
    }
}

/// Cookie-backed session for the current request.
///
/// Mutations are written back only when the session is returned as part of
/// the response, e.g. `(session, Redirect::to("/"))`.
pub struct Session {
    keys: SessionKeys,
    data: SessionData,
    modified: bool,
}

impl Session {
    pub fn new(keys: SessionKeys, data: SessionData) -> Self {
        Self {
            keys,
            data,
            modified: false,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.data.username.as_deref()
    }

    /// Id of the logged-in user, if both identity fields are present.
    pub fn user_id(&self) -> Option<i64> {
        match (&self.data.username, self.data.user_id) {
            (Some(_), Some(id)) => Some(id),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }

    pub fn establish(&mut self, user: &User) {
        self.data.username = Some(user.username.clone());
        self.data.user_id = Some(user.id);
        self.modified = true;
    }

    /// Drop identity and pending flashes.
    pub fn clear(&mut self) {
        self.data = SessionData::default();
        self.modified = true;
    }

    /// Queue a message; a repeat of the last one is skipped and the queue
    /// holds at most [`MAX_FLASHES`] entries.
    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        let flash = Flash {
            level,
            message: message.into(),
        };
        if self.data.flashes.last() == Some(&flash) {
            return;
        }
        self.data.flashes.push(flash);
        if self.data.flashes.len() > MAX_FLASHES {
            let excess = self.data.flashes.len() - MAX_FLASHES;
            self.data.flashes.drain(..excess);
        }
        self.modified = true;
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        if self.data.flashes.is_empty() {
            return Vec::new();
        }
        self.modified = true;
        std::mem::take(&mut self.data.flashes)
    }

    fn cookie(&self) -> Result<Cookie<'static>, AppError> {
        if self.data.is_empty() {
            let mut removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
            removal.make_removal();
            return Ok(removal);
        }
        let token = self.keys.sign(&self.data)?;
        Ok(Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let data = match jar.get(SESSION_COOKIE) {
            None => SessionData::default(),
            Some(c) => match keys.verify(c.value()) {
                Ok(data) => {
                    debug!(user_id = ?data.user_id, "session restored");
                    data
                }
                Err(e) => {
                    // Tampered, expired or signed with another secret.
                    warn!(error = %e, "discarding invalid session cookie");
                    SessionData::default()
                }
            },
        };

        Ok(Session::new(keys, data))
    }
}

impl IntoResponseParts for Session {
    type Error = AppError;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if !self.modified {
            return Ok(res);
        }
        let jar = CookieJar::new().add(self.cookie()?);
        match jar.into_response_parts(res) {
            Ok(res) => Ok(res),
            Err(never) => match never {},
        }
    }
}
