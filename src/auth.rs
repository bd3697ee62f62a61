// src/auth.rs
//
// Header-based authentication: the dashboard forwards the signed-in user's
// email in `X-User-Email`; access is gated to the corporate domain, with an
// admin role for the configured address and an allow-list for sensitive
// endpoints.
use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::AppState;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Guest,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Email guard applied to every route. CORS preflights and the configured
/// exempt paths pass through untouched.
pub async fn email_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS
        || state.config.exempt_paths.contains(request.uri().path())
    {
        return Ok(next.run(request).await);
    }

    let email = request
        .headers()
        .get("x-user-email")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim()
        .to_lowercase();

    if email.is_empty() || !email.ends_with(&state.config.allowed_domain) {
        return Err(ApiError::Unauthenticated(format!(
            "Email non autorisé (domaine {} requis)",
            state.config.allowed_domain
        )));
    }

    let role = if !state.config.admin_email.is_empty() && email == state.config.admin_email {
        Role::Admin
    } else {
        Role::Guest
    };
    request.extensions_mut().insert(AuthUser { email, role });

    Ok(next.run(request).await)
}

/// Restricted endpoints (lean actions, meeting summaries) only accept
/// allow-listed identities.
pub fn require_allowed_admin(state: &AppState, user: &AuthUser) -> Result<(), ApiError> {
    if state.config.is_allowed_admin(&user.email) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Accès restreint".to_string()))
    }
}

/// Upload endpoints require the admin role, plus the admin password header
/// when one is configured.
pub fn require_uploader(
    state: &AppState,
    user: &AuthUser,
    provided_password: Option<&str>,
) -> Result<(), ApiError> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden("Accès admin requis".to_string()));
    }
    if !state.config.admin_password.is_empty()
        && provided_password.unwrap_or("") != state.config.admin_password
    {
        return Err(ApiError::Forbidden("Mot de passe admin invalide".to_string()));
    }
    Ok(())
}
