//! Image-to-text and text enhancement.
//!
//! The pure pieces (response parsing, progress, local cleanup, settling an
//! enhancement result) live here; browser plumbing lives in the submodules.

mod camera;
mod clipboard;
mod upload;

pub(crate) use camera::{capture_frame, start_camera, stop_camera};
pub(crate) use clipboard::copy_to_clipboard;
pub(crate) use upload::upload_image;

use crate::api::{ApiClient, ApiError, ApiResult, EnhanceResponse};
use crate::util::with_timeout;

pub(crate) const OCR_PATH: &str = "/api/ocr/image-to-text";
pub(crate) const ENHANCE_TIMEOUT_MS: i32 = 30_000;
pub(crate) const MIN_ENHANCE_CHARS: usize = 10;

/// Local stand-in for the enhancement service: blank-line runs become a
/// paragraph break, then every whitespace run becomes one space, then trim.
///
/// The second pass also flattens the paragraph breaks, so the output is a
/// single line.
pub(crate) fn cleanup_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed input, or a validation error when it is too short to enhance.
pub(crate) fn validate_enhance_input(text: &str) -> ApiResult<&str> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_ENHANCE_CHARS {
        return Err(ApiError::validation(
            "Please extract some text first (at least 10 characters)",
        ));
    }
    Ok(trimmed)
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Enhanced {
    pub text: String,
    pub service: Option<String>,
    pub processing_ms: Option<u64>,
    /// Set when the local cleanup was used; says why.
    pub fallback: Option<String>,
}

/// Turn whatever the enhancement call produced into displayable text.
/// Never fails: every error path ends in [`cleanup_text`].
pub(crate) fn settle_enhancement(original: &str, result: ApiResult<EnhanceResponse>) -> Enhanced {
    match result {
        Ok(res) if res.success => Enhanced {
            text: res.enhanced_text.unwrap_or_else(|| cleanup_text(original)),
            service: res.service_used,
            processing_ms: res.processing_time,
            fallback: None,
        },
        Ok(res) => {
            let reason = res
                .message
                .unwrap_or_else(|| "Enhancement service reported a failure".to_string());
            match res.enhanced_text {
                Some(text) => Enhanced {
                    text,
                    service: res.service_used,
                    processing_ms: res.processing_time,
                    fallback: Some(reason),
                },
                None => Enhanced {
                    text: cleanup_text(original),
                    service: None,
                    processing_ms: None,
                    fallback: Some(reason),
                },
            }
        }
        Err(e) => Enhanced {
            text: cleanup_text(original),
            service: None,
            processing_ms: None,
            fallback: Some(e.to_string()),
        },
    }
}

/// Validate, call the service with a fixed timeout, and settle.
pub(crate) async fn enhance(client: &ApiClient, text: &str) -> ApiResult<Enhanced> {
    let input = validate_enhance_input(text)?;
    let result = with_timeout(ENHANCE_TIMEOUT_MS, client.enhance_text(input))
        .await
        .unwrap_or_else(|| Err(ApiError::timeout("Enhancement", ENHANCE_TIMEOUT_MS)));
    if let Err(e) = &result {
        leptos::logging::warn!("Enhancement failed, using local cleanup: {e}");
    }
    Ok(settle_enhancement(input, result))
}

/// `ParsedResults[0].ParsedText`, trimmed; empty when absent.
pub(crate) fn parse_ocr_response(data: &serde_json::Value) -> ApiResult<String> {
    let errored = data
        .get("IsErroredOnProcessing")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if errored {
        let message = match data.get("ErrorMessage") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(list)) => list
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "Error processing image".to_string(),
        };
        return Err(ApiError::server(message));
    }

    Ok(data
        .get("ParsedResults")
        .and_then(|r| r.get(0))
        .and_then(|r| r.get("ParsedText"))
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .unwrap_or_default())
}

/// Whole percent uploaded, `None` while the total is unknown.
pub(crate) fn progress_percent(loaded: f64, total: f64) -> Option<u8> {
    if total <= 0.0 {
        return None;
    }
    Some((loaded / total * 100.0).round().clamp(0.0, 100.0) as u8)
}
