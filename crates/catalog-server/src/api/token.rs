use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::auth::IssuedToken;
use crate::middleware::RequestId;

use super::{map_rejection, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct TokenRequest {
    pub email: String,
}

/// Shape check only: one `@`, non-empty local part, dotted domain.
fn is_plausible_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// POST /token — issue a signed bearer token for `email`.
pub(super) async fn issue_token(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<IssuedToken>>, ApiError> {
    let Json(body) = body.map_err(|e| map_rejection(&req_id.0, &e))?;
    let email = body.email.trim();
    if !is_plausible_email(email) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "email must be a valid address",
        ));
    }

    let issued = state.auth.signer().issue(email);
    tracing::info!(expires_at = %issued.expires_at, "issued access token");

    Ok(Json(ApiResponse::new(req_id.0, issued)))
}
