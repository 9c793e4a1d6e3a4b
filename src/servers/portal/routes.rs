use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

use super::PortalState;
use crate::auth::CurrentIdentity;
use crate::database::Datastore;
use crate::error::{ApiResponse, GatewayError, InvalidInput};
use crate::projector::CharacterRecord;
use crate::session::Token;

pub fn router<D: Datastore>(state: PortalState<D>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login::<D>))
        .route("/api/auth/logout", post(logout::<D>))
        .route("/api/auth/me", get(me))
        .route("/api/user/characters", get(characters::<D>))
        .route("/api/user/password", post(change_password::<D>))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    account: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginData {
    account: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest {
    #[serde(default)]
    old_password: String,
    #[serde(default)]
    new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionData {
    account: String,
    login_time: i64,
}

async fn login<D: Datastore>(
    State(state): State<PortalState<D>>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<ApiResponse<LoginData>>), GatewayError> {
    let Json(req) = body.map_err(|_| InvalidInput::MissingCredentials)?;
    let identity = state.login(&req.account, &req.password).await?;
    let token = state.issue_token(&identity);

    let jar = jar.add(session_cookie(&state, token));
    let data = LoginData {
        account: identity.account().to_string(),
    };
    Ok((jar, Json(ApiResponse::ok_with_message("Logged in.", Some(data)))))
}

async fn logout<D: Datastore>(
    State(state): State<PortalState<D>>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    let jar = jar.remove(clear_cookie(state.guard.cookie_name()));
    (jar, Json(ApiResponse::ok_with_message("Logged out.", None)))
}

async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<ApiResponse<SessionData>> {
    Json(ApiResponse::ok(SessionData {
        account: identity.account().to_string(),
        login_time: identity.login_time_ms(),
    }))
}

async fn characters<D: Datastore>(
    State(state): State<PortalState<D>>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<ApiResponse<Vec<CharacterRecord>>>, GatewayError> {
    let records = state.list_characters(&identity).await?;
    Ok(Json(ApiResponse::ok(records)))
}

async fn change_password<D: Datastore>(
    State(state): State<PortalState<D>>,
    CurrentIdentity(identity): CurrentIdentity,
    body: Result<Json<PasswordRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, GatewayError> {
    let Json(req) = body.map_err(|_| InvalidInput::MissingPasswords)?;
    state
        .change_password(&identity, &req.old_password, &req.new_password)
        .await?;
    Ok(Json(ApiResponse::ok_with_message("Password changed.", None)))
}

fn session_cookie<D: Datastore>(state: &PortalState<D>, token: Token) -> Cookie<'static> {
    let max_age = i64::try_from(state.guard.max_age().as_secs()).unwrap_or(i64::MAX);
    Cookie::build(Cookie::new(state.guard.cookie_name().to_string(), token.into_string()))
        .path("/")
        .http_only(true)
        .secure(state.secure_cookie)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age))
        .build()
}

fn clear_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
