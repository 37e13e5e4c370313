use crate::services::AuthUser;
use crate::session::read_access_token;
use crate::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use service_core::error::AppError;

/// The provider-verified caller, or `None` when there is no readable session
/// or the provider rejects its token.
#[derive(Debug, Clone)]
pub struct CurrentCaller(pub Option<AuthUser>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let Some(access_token) = read_access_token(&jar, &state.settings.session.cookie_name) else {
            return Ok(CurrentCaller(None));
        };

        let user = state.auth.get_user(&access_token).await?;
        if let Some(user) = &user {
            tracing::Span::current().record("user_id", tracing::field::display(user.id));
        }

        Ok(CurrentCaller(user))
    }
}
