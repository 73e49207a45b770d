//! Pastebin HTTP routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::{LoginCredentials, NewPaste, NewUser},
    state::AppState,
    store::Store,
    validation::{validate_new_user, validate_paste},
};

/// Create the router for the pastebin service
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: Store + Send + Sync + 'static,
{
    let protected_routes = Router::new()
        .route("/auth", get(current_user))
        .route("/users/:username", get(get_user::<S>))
        .route("/logout", post(logout::<S>))
        .route("/pastes", post(create_paste::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ));

    Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health_check))
        .route("/users", post(register::<S>))
        .route("/login", post(login::<S>))
        .route("/pastes", get(list_pastes::<S>))
        .route("/pastes/:username", get(list_user_pastes::<S>))
        .merge(protected_routes)
        .with_state(state)
}

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
    }))
}

/// Register a new user
pub async fn register<S>(
    State(state): State<AppState<S>>,
    Json(payload): Json<NewUser>,
) -> ApiResult<impl IntoResponse>
where
    S: Store + Send + Sync + 'static,
{
    validate_new_user(&payload)?;

    let store = state.authority.store();
    store.create_user(&payload).await?;
    let user = store.get_user(&payload.username).await?;

    info!("Registered user: {}", user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Profile of the session's own user
///
/// Any other username answers like an unknown one.
pub async fn get_user<S>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse>
where
    S: Store + Send + Sync + 'static,
{
    if auth.username != username {
        return Err(ApiError::NotFound("Not found".to_string()));
    }

    let user = state.authority.store().get_user(&username).await?;
    Ok(Json(user))
}

/// Open a session and hand its token back as a cookie and in the body
pub async fn login<S>(
    State(state): State<AppState<S>>,
    Json(credentials): Json<LoginCredentials>,
) -> ApiResult<impl IntoResponse>
where
    S: Store + Send + Sync + 'static,
{
    let session_id = state
        .authority
        .login(&credentials.username, &credentials.password)
        .await?;

    let cookie = state.cookie.build_set_cookie(&session_id);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "session_id": session_id })),
    ))
}

pub async fn logout<S>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse>
where
    S: Store + Send + Sync + 'static,
{
    state.authority.logout(&user.session_id).await?;

    info!("User logged out: {}", user.username);
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.cookie.build_delete_cookie())],
    ))
}

pub async fn current_user(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    Json(json!({ "username": user.username }))
}

/// Query parameters for paste listing
#[derive(Debug, Deserialize)]
pub struct PasteFilter {
    pub username: Option<String>,
}

/// Every paste, or only those of `?username=`
pub async fn list_pastes<S>(
    State(state): State<AppState<S>>,
    Query(filter): Query<PasteFilter>,
) -> ApiResult<impl IntoResponse>
where
    S: Store + Send + Sync + 'static,
{
    let store = state.authority.store();
    let pastes = match filter.username {
        Some(username) => store.get_pastes_by_user(&username).await?,
        None => store.get_all_pastes().await?,
    };
    Ok(Json(pastes))
}

pub async fn list_user_pastes<S>(
    State(state): State<AppState<S>>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse>
where
    S: Store + Send + Sync + 'static,
{
    let pastes = state
        .authority
        .store()
        .get_pastes_by_user(&username)
        .await?;
    Ok(Json(pastes))
}

/// Create a paste owned by the session's user
pub async fn create_paste<S>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewPaste>,
) -> ApiResult<impl IntoResponse>
where
    S: Store + Send + Sync + 'static,
{
    validate_paste(&payload)?;

    let paste_id = state
        .authority
        .store()
        .create_paste(&user.username, &payload)
        .await?;

    info!("User {} created paste {}", user.username, paste_id);
    Ok((StatusCode::CREATED, Json(json!({ "paste_id": paste_id }))))
}
