//! Session authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{cookie::session_token, error::ApiError, state::AppState, store::Store};

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub session_id: String,
}

/// Resolve the session cookie (or `session_id` header) to an [`AuthUser`]
pub async fn auth_middleware<S>(
    State(state): State<AppState<S>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: Store + Send + Sync + 'static,
{
    let session_id = session_token(&jar, req.headers()).ok_or(ApiError::Unauthorized)?;

    let username = state.authority.authorize(&session_id).await?;

    req.extensions_mut().insert(AuthUser {
        username,
        session_id,
    });

    Ok(next.run(req).await)
}
