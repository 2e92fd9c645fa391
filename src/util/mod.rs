use futures::future::{select, Either};
use std::future::Future;

/// Current time as the backend formats `createdAt` (RFC 3339, millis, `Z`).
pub(crate) fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Milliseconds since the epoch for an RFC 3339 timestamp.
pub(crate) fn parse_timestamp_ms(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|d| d.timestamp_millis())
}

/// Locale-ish display for a note footer. Falls back to the raw value.
pub(crate) fn format_timestamp(s: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(s.trim())
        .map(|d| {
            d.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|_| s.to_string())
}

/// One random byte from the platform RNG (`crypto.getRandomValues` in the browser).
pub(crate) fn random_byte() -> u8 {
    let mut buf = [0u8; 1];
    if getrandom::getrandom(&mut buf).is_err() {
        return 0;
    }
    buf[0]
}

/// Resolve after `ms` milliseconds using `setTimeout`.
pub(crate) async fn sleep_ms(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(win) = web_sys::window() {
            let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Race `fut` against a timer. `None` means the timer won.
///
/// The losing request is not aborted; fetch has no cancellation wired here.
pub(crate) async fn with_timeout<F: Future>(ms: i32, fut: F) -> Option<F::Output> {
    let fut = std::pin::pin!(fut);
    let timer = std::pin::pin!(sleep_ms(ms));
    match select(fut, timer).await {
        Either::Left((out, _)) => Some(out),
        Either::Right(_) => None,
    }
}
