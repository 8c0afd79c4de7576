//! `GET /api/config`, `POST /api/config`, `POST /api/config/validate`,
//! `GET /api/config/revision/{filename}` — ported from `dashboard/app.py`'s
//! `get_config`/`save_config`/`validate_config`/`get_config_revision`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::{dto, ApiError, AppState};

pub async fn get_config(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let content = std::fs::read_to_string(state.config.path())
        .map_err(|e| ApiError::Internal(e.into()))?;
    let revisions = state
        .config
        .get_revisions()
        .map_err(|e| ApiError::Internal(e.into()))?
        .into_iter()
        .take(50)
        .filter_map(|filename| {
            let size = std::fs::metadata(state.config.path().parent()?.join("config_backups").join(&filename))
                .ok()?
                .len();
            Some(dto::ConfigRevision { filename, size })
        })
        .collect();

    Ok(HttpResponse::Ok().json(dto::ConfigResponse { content, revisions }))
}

pub async fn get_config_revision(
    state: web::Data<AppState>,
    filename: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let filename = filename.into_inner();
    let content = state
        .config
        .get_revision_content(&filename)
        .ok_or_else(|| ApiError::NotFound(format!("Revision not found: {filename}")))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "content": content,
        "filename": filename,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ConfigBody {
    content: String,
}

pub async fn validate_config(body: web::Json<ConfigBody>) -> HttpResponse {
    match serde_yaml::from_str::<serde_yaml::Value>(&body.content) {
        Ok(_) => HttpResponse::Ok().json(dto::ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
        }),
        Err(e) => HttpResponse::Ok().json(dto::ConfigValidationResult {
            valid: false,
            errors: vec![e.to_string()],
        }),
    }
}

pub async fn save_config(
    state: web::Data<AppState>,
    body: web::Json<ConfigBody>,
) -> Result<HttpResponse, ApiError> {
    state
        .config
        .save(&body.content, true)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Configuration saved",
    })))
}
