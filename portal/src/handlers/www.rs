use crate::domain::Domain;
use crate::session::{expire_session_cookies, read_access_token, store_session};
use crate::templates::{IndexTemplate, LoginTemplate};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    IndexTemplate {
        app_url: state.settings.domains.base_url(Domain::App).to_string(),
    }
}

#[derive(Deserialize)]
pub struct LoginParams {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

/// Follow `next` only when it points at one of our own front-ends.
fn post_login_target(state: &AppState, next: &str) -> String {
    let domains = &state.settings.domains;
    if domains.is_known_target(next) {
        next.to_string()
    } else {
        domains.base_url(Domain::App).to_string()
    }
}

pub async fn login_page(Query(params): Query<LoginParams>) -> impl IntoResponse {
    LoginTemplate {
        next: params.next.unwrap_or_default(),
        email: String::new(),
        error: None,
    }
}

pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(payload): Form<LoginRequest>,
) -> Result<Response, AppError> {
    let rejected = |message: &str| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginTemplate {
                next: payload.next.clone(),
                email: payload.email.clone(),
                error: Some(message.to_string()),
            },
        )
            .into_response()
    };

    if payload.validate().is_err() {
        return Ok(rejected("Enter a valid email address and password"));
    }

    let Some(session) = state
        .auth
        .sign_in_with_password(&payload.email, &payload.password)
        .await?
    else {
        tracing::info!("Sign-in rejected by auth provider");
        return Ok(rejected("Invalid email or password"));
    };

    let jar = store_session(jar, &session, &state.settings.session)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode session: {}", e)))?;

    let target = post_login_target(&state, &payload.next);
    tracing::info!(target = %target, "User signed in");

    Ok((jar, Redirect::to(&target)).into_response())
}

pub async fn logout_handler(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(access_token) = read_access_token(&jar, &state.settings.session.cookie_name) {
        // Sign-out proceeds locally even if revocation fails.
        if let Err(e) = state.auth.sign_out(&access_token).await {
            tracing::error!("Failed to revoke token during logout: {}", e);
        } else {
            tracing::info!("Token revoked successfully");
        }
    }

    let jar = expire_session_cookies(jar, &state.settings.session);
    (
        jar,
        Redirect::to(state.settings.domains.base_url(Domain::Www)),
    )
}
