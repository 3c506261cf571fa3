//! # hb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{NaiveTime, Utc};
use hb_core::sanitize::sanitize;
use hb_core::{
    AdminAuthenticator, AdminIdentity, AppError, ArchivedConfession, AuthError, AuthProvider,
    BanRepo, Confession, ConfessionRepo, Stats, SubmissionPolicy,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::session::{cleared_session_cookie, session_cookie, AdminSession, ClientMeta};

/// Cookie attributes for issued sessions.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub max_age_secs: i64,
    pub secure: bool,
}

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub confessions: Arc<dyn ConfessionRepo>,
    pub bans: Arc<dyn BanRepo>,
    pub auth: Arc<dyn AuthProvider>,
    pub authenticator: Arc<AdminAuthenticator>,
    pub policy: Arc<SubmissionPolicy>,
    /// Peers allowed to name the client through forwarding headers.
    pub trusted_proxies: Arc<Vec<IpAddr>>,
    pub session: SessionSettings,
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadUpdate {
    pub is_read: bool,
}

#[derive(Debug, Deserialize)]
pub struct IpRequest {
    #[serde(default)]
    pub ip: Option<String>,
}

impl IpRequest {
    fn require_ip(self) -> Result<String, AppError> {
        self.ip
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| AppError::BadRequest("IP address is required".into()))
    }
}

fn user_json(identity: &AdminIdentity) -> Value {
    json!({ "username": identity.username, "role": identity.role })
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Public submission endpoint.
///
/// The same checks the form runs client-side are repeated here; the server
/// is the authoritative gate.
#[instrument(skip(state, body), fields(ip = %client.ip))]
pub async fn submit_confession(
    State(state): State<AppState>,
    client: ClientMeta,
    ApiJson(body): ApiJson<SubmitRequest>,
) -> ApiResult<impl IntoResponse> {
    // 1. Security Check: Is the IP banned?
    if state.bans.is_banned(&client.ip).await? {
        tracing::warn!("submission from banned ip");
        return Err(AppError::Banned.into());
    }

    // 2. Validation: unsafe content, length, forbidden terms
    if let Err(err) = state.policy.validate(&body.content) {
        tracing::info!(reason = err.reason(), "submission rejected");
        return Err(err.into());
    }

    // 3. Persistence: store the escaped text
    let confession = Confession::new(sanitize(&body.content), client.ip, client.user_agent);
    let id = confession.id;
    state.confessions.create_confession(confession).await?;

    tracing::info!(%id, "confession stored");
    Ok((StatusCode::CREATED, Json(json!({}))))
}

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest("Username and password are required".into()).into());
    }

    if !state
        .auth
        .verify_admin_credentials(&body.username, &body.password)
        .await
    {
        tracing::warn!("failed admin login");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.auth.issue_token(&body.username)?;
    let cookie = session_cookie(&token, state.session.max_age_secs, state.session.secure);
    let identity = AdminIdentity {
        username: body.username,
        role: hb_core::ADMIN_ROLE.to_string(),
    };

    tracing::info!("admin logged in");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "user": user_json(&identity) })),
    ))
}

/// Always succeeds, with or without a session.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, cleared_session_cookie(state.session.secure))],
        Json(json!({ "success": true })),
    )
}

pub async fn verify(AdminSession(identity): AdminSession) -> impl IntoResponse {
    Json(json!({ "success": true, "user": user_json(&identity) }))
}

#[instrument(skip_all)]
pub async fn list_confessions(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Confession>>> {
    Ok(Json(state.confessions.list_confessions().await?))
}

#[instrument(skip_all, fields(%id))]
pub async fn update_confession(
    _admin: AdminSession,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ReadUpdate>,
) -> ApiResult<Json<Confession>> {
    state
        .confessions
        .set_read(id, body.is_read)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Confession", id).into())
}

#[instrument(skip_all, fields(%id))]
pub async fn delete_confession(
    _admin: AdminSession,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    if !state.confessions.delete_confession(id).await? {
        return Err(AppError::not_found("Confession", id).into());
    }
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip_all)]
pub async fn delete_by_ip(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<IpRequest>,
) -> ApiResult<Json<Value>> {
    let ip = body.require_ip()?;
    let deleted = state.confessions.delete_by_ip(&ip).await?;
    tracing::info!(%ip, deleted, admin = %admin.username, "bulk delete by ip");
    Ok(Json(json!({ "success": true, "deletedCount": deleted })))
}

#[instrument(skip_all)]
pub async fn ban_ip(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<IpRequest>,
) -> ApiResult<Json<Value>> {
    let ip = body.require_ip()?;
    if !state.bans.ban_ip(&ip).await? {
        return Err(AppError::BadRequest("IP is already banned".into()).into());
    }
    tracing::info!(%ip, admin = %admin.username, "ip banned");
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip_all)]
pub async fn stats(_admin: AdminSession, State(state): State<AppState>) -> ApiResult<Json<Stats>> {
    let day_start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    Ok(Json(state.confessions.stats(day_start).await?))
}

#[instrument(skip_all, fields(%id))]
pub async fn archive_confession(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ArchivedConfession>> {
    state
        .confessions
        .archive_confession(id, &admin.username)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Confession", id).into())
}

#[instrument(skip_all, fields(%id))]
pub async fn unarchive_confession(
    _admin: AdminSession,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Confession>> {
    state
        .confessions
        .unarchive_confession(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Archived confession", id).into())
}

#[instrument(skip_all)]
pub async fn list_archived(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ArchivedConfession>>> {
    Ok(Json(state.confessions.list_archived().await?))
}

#[instrument(skip_all, fields(%id))]
pub async fn delete_archived(
    _admin: AdminSession,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    if !state.confessions.delete_archived(id).await? {
        return Err(AppError::not_found("Archived confession", id).into());
    }
    Ok(Json(json!({ "success": true })))
}
