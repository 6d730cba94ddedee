//! Content extraction route handlers
//!
//! Stateless helpers so the UI can re-parse an edited draft before commit.

use crate::error::{validation_error, ApiResult, AppError};
use crate::extract::{
    extract_sections, extract_table, parse_document, MarkdownTable, SectionExtraction,
};
use crate::models::SuccessResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsRequest {
    pub text: String,
    pub headings: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRequest {
    pub text: String,
}

/// Split a document into the requested heading sections
pub async fn sections(
    Json(payload): Json<SectionsRequest>,
) -> ApiResult<Json<SuccessResponse<SectionExtraction>>> {
    if payload.headings.is_empty() {
        return Err(validation_error("At least one heading is required"));
    }

    let headings: Vec<&str> = payload.headings.iter().map(String::as_str).collect();
    let extraction = extract_sections(&payload.text, &headings);
    let message = if extraction.complete {
        "All sections found.".to_string()
    } else {
        format!("Missing sections: {}", extraction.missing.join(", "))
    };

    Ok(Json(SuccessResponse::with_data(message, extraction)))
}

/// Read the first markdown table
pub async fn table(
    Json(payload): Json<TextRequest>,
) -> ApiResult<Json<SuccessResponse<MarkdownTable>>> {
    let table = extract_table(&payload.text);
    Ok(Json(SuccessResponse::with_data(
        format!("{} rows extracted.", table.rows.len()),
        table,
    )))
}

/// Parse a YAML mapping and return it as JSON
pub async fn yaml(
    Json(payload): Json<TextRequest>,
) -> ApiResult<Json<SuccessResponse<serde_json::Value>>> {
    let mapping = parse_document(&payload.text)?;
    let value = serde_json::to_value(&mapping).map_err(|e| {
        AppError::InvalidFormat(format!("YAML cannot be represented as JSON: {}", e))
    })?;

    Ok(Json(SuccessResponse::with_data("YAML parsed.", value)))
}
