use crate::api::{ApiError, ApiResult};
use std::cell::RefCell;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

thread_local! {
    static STREAM: RefCell<Option<web_sys::MediaStream>> = const { RefCell::new(None) };
}

/// Ask for the camera and attach it to `video`. A previous stream is stopped first.
pub(crate) async fn start_camera(video: &web_sys::HtmlVideoElement) -> ApiResult<()> {
    stop_camera();

    let window = web_sys::window().ok_or_else(|| ApiError::unsupported("No window"))?;
    let devices = window
        .navigator()
        .media_devices()
        .map_err(|_| ApiError::unsupported("Camera access is not supported in this browser"))?;

    let constraints = web_sys::MediaStreamConstraints::new();
    constraints.set_video(&JsValue::TRUE);
    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(ApiError::js)?;
    let stream: web_sys::MediaStream = JsFuture::from(promise)
        .await
        .map_err(|e| ApiError::unsupported(format!("Could not access camera: {}", ApiError::js(e))))?
        .unchecked_into();

    video.set_src_object(Some(&stream));
    if let Ok(p) = video.play() {
        let _ = JsFuture::from(p).await;
    }
    STREAM.with(|s| *s.borrow_mut() = Some(stream));
    Ok(())
}

/// Stop every track of the active stream, if any.
pub(crate) fn stop_camera() {
    let Some(stream) = STREAM.with(|s| s.borrow_mut().take()) else {
        return;
    };
    for track in stream.get_tracks().iter() {
        track.unchecked_into::<web_sys::MediaStreamTrack>().stop();
    }
}

/// Draw the current video frame onto a canvas and encode it as JPEG.
pub(crate) async fn capture_frame(video: &web_sys::HtmlVideoElement) -> ApiResult<web_sys::Blob> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| ApiError::unsupported("No document"))?;
    let canvas: web_sys::HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(ApiError::js)?
        .dyn_into()
        .map_err(|e| ApiError::js(e.into()))?;
    canvas.set_width(video.video_width());
    canvas.set_height(video.video_height());

    let ctx: web_sys::CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(ApiError::js)?
        .ok_or_else(|| ApiError::unsupported("Canvas 2D is not available"))?
        .dyn_into()
        .map_err(|e| ApiError::js(e.into()))?;
    ctx.draw_image_with_html_video_element(video, 0.0, 0.0)
        .map_err(ApiError::js)?;

    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        if let Err(e) = canvas.to_blob_with_type(&resolve, "image/jpeg") {
            let _ = reject.call1(&JsValue::NULL, &e);
        }
    });
    let blob = JsFuture::from(promise).await.map_err(ApiError::js)?;
    if blob.is_null() {
        return Err(ApiError::unsupported("Could not capture a frame"));
    }
    blob.dyn_into().map_err(ApiError::js)
}
