use crate::api::{ApiError, ApiResult};
use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// `navigator.clipboard.writeText(text)`.
pub(crate) async fn copy_to_clipboard(text: &str) -> ApiResult<()> {
    if text.trim().is_empty() {
        return Err(ApiError::validation("Nothing to copy"));
    }

    let window = web_sys::window().ok_or_else(|| ApiError::unsupported("No window"))?;
    let clipboard = Reflect::get(&window.navigator(), &"clipboard".into()).map_err(ApiError::js)?;
    if clipboard.is_undefined() || clipboard.is_null() {
        return Err(ApiError::unsupported("Clipboard is not available"));
    }

    let write: js_sys::Function = Reflect::get(&clipboard, &"writeText".into())
        .map_err(ApiError::js)?
        .dyn_into()
        .map_err(ApiError::js)?;
    let promise: js_sys::Promise = write
        .call1(&clipboard, &JsValue::from_str(text))
        .map_err(ApiError::js)?
        .dyn_into()
        .map_err(ApiError::js)?;
    JsFuture::from(promise).await.map_err(ApiError::js)?;
    Ok(())
}
