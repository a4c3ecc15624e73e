use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        context::RequestContext,
        dto::{LoginForm, RegisterForm},
        services::{self, LoginOutcome, RegisterOutcome},
        session::{FlashLevel, Session},
    },
    error::AppError,
    state::AppState,
    users::User,
    views,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", get(logout))
}

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/profile", get(profile))
}

#[instrument(skip(session))]
pub async fn index(mut session: Session) -> Response {
    let flashes = session.take_flashes();
    let html = views::index(session.username(), &flashes);
    (session, Html(html)).into_response()
}

#[instrument(skip(session))]
pub async fn login_page(mut session: Session) -> Response {
    let flashes = session.take_flashes();
    (session, Html(views::login_form(&flashes))).into_response()
}

/// Re-show the login form with `message` and the given status.
fn login_rejected(
    mut session: Session,
    status: StatusCode,
    level: FlashLevel,
    message: &str,
) -> Response {
    session.flash(level, message);
    let flashes = session.take_flashes();
    (status, session, Html(views::login_form(&flashes))).into_response()
}

#[instrument(skip(ctx, form), fields(username = %form.username))]
pub async fn login(
    mut ctx: RequestContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let outcome = services::authenticate(ctx.conn().await?, &form.username, &form.password).await?;
    let mut session = ctx.session;

    let res = match outcome {
        LoginOutcome::Authenticated(user) => {
            session.establish(&user);
            session.flash(
                FlashLevel::Success,
                format!("Welcome, {}!", user.username),
            );
            (session, Redirect::to("/profile")).into_response()
        }
        LoginOutcome::Inactive => login_rejected(
            session,
            StatusCode::FORBIDDEN,
            FlashLevel::Warning,
            "Your account is inactive. Please contact the administrator.",
        ),
        LoginOutcome::Blocked => login_rejected(
            session,
            StatusCode::FORBIDDEN,
            FlashLevel::Danger,
            "Your account has been blocked.",
        ),
        LoginOutcome::InvalidCredentials => login_rejected(
            session,
            StatusCode::UNAUTHORIZED,
            FlashLevel::Danger,
            "Invalid username or password.",
        ),
    };
    Ok(res)
}

#[instrument(skip(session))]
pub async fn register_page(mut session: Session) -> Response {
    let flashes = session.take_flashes();
    (session, Html(views::register_form(&flashes))).into_response()
}

#[instrument(skip(ctx, form), fields(username = %form.username))]
pub async fn register(
    mut ctx: RequestContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let outcome = if form.has_required_fields() {
        services::register(ctx.conn().await?, &form).await?
    } else {
        // Reject locally; no store connection is taken.
        RegisterOutcome::MissingFields
    };
    let mut session = ctx.session;

    let (status, level, message) = match outcome {
        RegisterOutcome::Created(_) => {
            session.flash(
                FlashLevel::Success,
                "Registration successful! You can now log in.",
            );
            return Ok((session, Redirect::to("/login")).into_response());
        }
        RegisterOutcome::MissingFields => (
            StatusCode::BAD_REQUEST,
            FlashLevel::Warning,
            "Username and password are required.",
        ),
        RegisterOutcome::UsernameTaken => (
            StatusCode::CONFLICT,
            FlashLevel::Danger,
            "A user with this username already exists.",
        ),
    };

    session.flash(level, message);
    let flashes = session.take_flashes();
    Ok((status, session, Html(views::register_form(&flashes))).into_response())
}

#[instrument(skip(ctx))]
pub async fn profile(mut ctx: RequestContext) -> Result<Response, AppError> {
    let Some(user_id) = ctx.session.user_id() else {
        let mut session = ctx.session;
        session.flash(
            FlashLevel::Warning,
            "Please log in to view your profile.",
        );
        return Ok((session, Redirect::to("/login")).into_response());
    };

    let user = User::find_by_id(ctx.conn().await?, user_id).await?;
    let mut session = ctx.session;

    match user {
        Some(user) => {
            let flashes = session.take_flashes();
            Ok((session, Html(views::profile(&user, &flashes))).into_response())
        }
        None => {
            // Account removed while the session was still alive.
            warn!(user_id, "session refers to a missing user; clearing it");
            session.clear();
            session.flash(FlashLevel::Danger, "User not found.");
            Ok((session, Redirect::to("/login")).into_response())
        }
    }
}

#[instrument(skip(session))]
pub async fn logout(mut session: Session) -> Response {
    let username = session.username().unwrap_or("Guest").to_string();
    session.clear();
    session.flash(
        FlashLevel::Info,
        format!("Goodbye, {username}! You have been logged out."),
    );
    info!(%username, "user logged out");
    (session, Redirect::to("/")).into_response()
}
