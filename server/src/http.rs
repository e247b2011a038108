//! HTTP transport.
//!
//! Maps requests onto the authentication core and typed failures onto status
//! codes. Everything below this layer is transport-agnostic.
//!
//! | Route | Success | Failures |
//! |---|---|---|
//! | `GET /` | 200 | |
//! | `POST /api/auth/login` | 200 | 400 missing credentials, 401 invalid credentials, 500 internal |
//! | `GET /api/protected` | 200 | 403 token missing, 401 token invalid |
//!
//! Cross-origin requests are allowed from any origin for `GET` and `POST`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{AccessGuard, AuthError, AuthService, GuardError, IdentityClaim};
use crate::types::AccountSummary;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub guard: AccessGuard,
}

/// Build the application router.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/protected", get(protected))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(root))
        .route("/api/auth/login", post(login))
        .merge(protected)
        .layer(cors)
        .with_state(state)
}

/// Failures as seen by HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Guard(GuardError),
}

#[derive(Debug, Serialize)]
struct MessageBody {
    success: bool,
    message: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Auth(AuthError::MissingCredentials) => {
                (StatusCode::BAD_REQUEST, "email and password are required")
            }
            Self::Auth(AuthError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "invalid credentials")
            }
            Self::Auth(AuthError::Internal) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "login failed")
            }
            Self::Guard(GuardError::TokenMissing) => (StatusCode::FORBIDDEN, "token not provided"),
            Self::Guard(GuardError::TokenInvalid { .. }) => {
                (StatusCode::UNAUTHORIZED, "invalid token")
            }
        };

        (
            status,
            Json(MessageBody {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<GuardError> for ApiError {
    fn from(e: GuardError) -> Self {
        Self::Guard(e)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: String,
    pub user: AccountSummary,
}

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub success: bool,
    pub message: &'static str,
    pub user_id: String,
}

async fn root() -> Json<MessageBody> {
    Json(MessageBody {
        success: true,
        message: "authentication API is running",
    })
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    // An unreadable body carries no credentials.
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!("Rejected login body: {rejection}");
        ApiError::Auth(AuthError::MissingCredentials)
    })?;

    let result = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(LoginResponse {
        success: true,
        message: "login successful",
        token: result.token,
        user: result.account,
    }))
}

/// Verify the bearer token and attach the identity to the request.
async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let claim = state.guard.authorize(header_value)?;
    request.extensions_mut().insert(claim);
    Ok(next.run(request).await)
}

async fn protected(Extension(claim): Extension<IdentityClaim>) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        success: true,
        message: "access granted",
        user_id: claim.account_id.to_string(),
    })
}
