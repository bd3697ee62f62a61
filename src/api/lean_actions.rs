// src/api/lean_actions.rs
//
// CRUD over lean improvement actions, restricted to allow-listed admins.
use axum::extract::{Path, State};
use axum::response::Json;
use axum::Extension;
use serde_json::{json, Value};

use crate::auth::{require_allowed_admin, AuthUser};
use crate::error::ApiError;
use crate::store::{LeanAction, LeanActionInput};

use super::AppState;

/// GET /api/lean-actions
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    require_allowed_admin(&state, &user)?;
    let actions = state.store.list_lean_actions()?;
    Ok(Json(json!({ "actions": actions })))
}

/// POST /api/lean-actions
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<LeanActionInput>,
) -> Result<Json<LeanAction>, ApiError> {
    require_allowed_admin(&state, &user)?;

    let probleme = input
        .probleme
        .as_deref()
        .map(str::trim)
        .unwrap_or("")
        .to_string();
    if probleme.is_empty() {
        return Err(ApiError::Validation("Le problème est obligatoire".to_string()));
    }
    let owner = input
        .owner
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .unwrap_or(&user.email)
        .to_string();
    let statut = match input.statut.as_deref() {
        Some("Clôturé") => "Clôturé",
        _ => "Ouvert",
    };
    let notes = input.notes.as_deref().map(str::trim).unwrap_or("");

    let action = state.store.create_lean_action(
        &probleme,
        &owner,
        input.date_ouverture,
        input.date_cloture_prevue,
        statut,
        notes,
    )?;
    Ok(Json(action))
}

/// PUT /api/lean-actions/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(patch): Json<LeanActionInput>,
) -> Result<Json<LeanAction>, ApiError> {
    require_allowed_admin(&state, &user)?;
    match state.store.update_lean_action(id, &patch)? {
        Some(action) => Ok(Json(action)),
        None => {
            // Either no fields were supplied or the id is unknown.
            if patch.probleme.is_none()
                && patch.owner.is_none()
                && patch.date_cloture_prevue.is_none()
                && patch.statut.is_none()
                && patch.notes.is_none()
            {
                Err(ApiError::Validation("Aucune modification fournie".to_string()))
            } else {
                Err(ApiError::NotFound("Action non trouvée".to_string()))
            }
        }
    }
}

/// DELETE /api/lean-actions/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    require_allowed_admin(&state, &user)?;
    if !state.store.delete_lean_action(id)? {
        return Err(ApiError::NotFound("Action non trouvée".to_string()));
    }
    Ok(Json(json!({ "message": "Action supprimée", "id": id })))
}
