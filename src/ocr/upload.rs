use super::{parse_ocr_response, progress_percent, OCR_PATH};
use crate::api::{ApiClient, ApiError, ApiResult};
use futures::channel::oneshot;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Multipart upload of `image` to the OCR endpoint.
///
/// Goes through `XMLHttpRequest` rather than fetch so upload progress can be
/// reported; `on_progress` gets whole percents.
pub(crate) async fn upload_image(
    client: &ApiClient,
    image: &web_sys::Blob,
    filename: &str,
    on_progress: impl Fn(u8) + 'static,
) -> ApiResult<String> {
    let form = web_sys::FormData::new().map_err(ApiError::js)?;
    form.append_with_blob_and_filename("image", image, filename)
        .map_err(ApiError::js)?;

    let xhr = web_sys::XmlHttpRequest::new().map_err(ApiError::js)?;
    xhr.open_with_async("POST", &client.url(OCR_PATH), true)
        .map_err(ApiError::js)?;
    if let Some(auth) = client.get_auth_header() {
        xhr.set_request_header("Authorization", &auth)
            .map_err(ApiError::js)?;
    }

    let on_progress = Closure::<dyn FnMut(web_sys::ProgressEvent)>::new(
        move |ev: web_sys::ProgressEvent| {
            if !ev.length_computable() {
                return;
            }
            if let Some(pct) = progress_percent(ev.loaded(), ev.total()) {
                on_progress(pct);
            }
        },
    );
    xhr.upload()
        .map_err(ApiError::js)?
        .set_onprogress(Some(on_progress.as_ref().unchecked_ref()));

    let (tx, rx) = oneshot::channel::<()>();
    let tx = Rc::new(RefCell::new(Some(tx)));
    let on_done = Closure::<dyn FnMut()>::new(move || {
        if let Some(tx) = tx.borrow_mut().take() {
            let _ = tx.send(());
        }
    });
    xhr.set_onloadend(Some(on_done.as_ref().unchecked_ref()));

    xhr.send_with_opt_form_data(Some(&form))
        .map_err(ApiError::js)?;
    let _ = rx.await;
    drop(on_progress);
    drop(on_done);

    let status = xhr.status().map_err(ApiError::js)?;
    if status == 0 {
        return Err(ApiError::network_msg("Could not reach the image-to-text service"));
    }
    let body = xhr.response_text().map_err(ApiError::js)?.unwrap_or_default();
    if !(200..300).contains(&status) {
        return Err(ApiError::http(status, &body, "Image to text"));
    }

    let data: serde_json::Value = serde_json::from_str(&body).map_err(ApiError::parse)?;
    parse_ocr_response(&data)
}
