use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription,
    CardHeader, CardTitle, Spinner, TextArea,
};
use crate::ocr::{self, Enhanced};
use crate::state::AppContext;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Image-to-text panel: pick or capture an image, extract its text, then
/// optionally enhance and copy it.
#[component]
pub fn OcrPanel() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let file_input: NodeRef<html::Input> = NodeRef::new();
    let video_ref: NodeRef<html::Video> = NodeRef::new();

    let preview: RwSignal<Option<String>> = RwSignal::new(None);
    let camera_on: RwSignal<bool> = RwSignal::new(false);
    let progress: RwSignal<Option<u8>> = RwSignal::new(None);
    let extracting: RwSignal<bool> = RwSignal::new(false);
    let extracted: RwSignal<String> = RwSignal::new(String::new());
    let enhancing: RwSignal<bool> = RwSignal::new(false);
    let enhanced: RwSignal<Option<Enhanced>> = RwSignal::new(None);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    on_cleanup(ocr::stop_camera);

    let set_preview = move |url: Option<String>| {
        if let Some(old) = preview.get_untracked() {
            let _ = web_sys::Url::revoke_object_url(&old);
        }
        preview.set(url);
    };

    // A new image starts from a clean slate.
    let reset_results = move || {
        extracted.set(String::new());
        enhanced.set(None);
        progress.set(None);
        error.set(None);
    };

    let extract_blob = move |blob: web_sys::Blob, name: &'static str| {
        extracting.set(true);
        progress.set(Some(0));
        error.set(None);
        enhanced.set(None);

        let client = app_state.0.api_client.get_untracked();
        spawn_local(async move {
            match ocr::upload_image(&client, &blob, name, move |p| progress.set(Some(p))).await {
                Ok(text) => {
                    if text.is_empty() {
                        error.set(Some("No text found in the image".to_string()));
                    }
                    extracted.set(text);
                }
                Err(e) => {
                    leptos::logging::error!("Image to text failed: {e}");
                    if e.is_unauthorized() {
                        app_state.0.logout();
                    }
                    error.set(Some(e.to_string()));
                }
            }
            extracting.set(false);
            progress.set(None);
        });
    };

    let on_file_change = move |_| {
        let file = file_input
            .get_untracked()
            .and_then(|input| input.files())
            .and_then(|files| files.item(0));
        reset_results();
        set_preview(file.and_then(|f| web_sys::Url::create_object_url_with_blob(&f).ok()));
    };

    let on_extract = move |_| {
        let file = file_input
            .get_untracked()
            .and_then(|input| input.files())
            .and_then(|files| files.item(0));
        match file {
            Some(f) => extract_blob(f.into(), "upload.jpg"),
            None => error.set(Some("Choose an image first".to_string())),
        }
    };

    let on_camera = move |_| {
        if camera_on.get_untracked() {
            ocr::stop_camera();
            camera_on.set(false);
            return;
        }
        let Some(video) = video_ref.get_untracked() else {
            return;
        };
        error.set(None);
        spawn_local(async move {
            match ocr::start_camera(&video).await {
                Ok(()) => camera_on.set(true),
                Err(e) => {
                    leptos::logging::warn!("Camera unavailable: {e}");
                    error.set(Some(e.to_string()));
                }
            }
        });
    };

    let on_capture = move |_| {
        let Some(video) = video_ref.get_untracked() else {
            return;
        };
        spawn_local(async move {
            match ocr::capture_frame(&video).await {
                Ok(blob) => {
                    ocr::stop_camera();
                    camera_on.set(false);
                    reset_results();
                    set_preview(web_sys::Url::create_object_url_with_blob(&blob).ok());
                    extract_blob(blob, "capture.jpg");
                }
                Err(e) => error.set(Some(e.to_string())),
            }
        });
    };

    let on_enhance = move |_| {
        let text = extracted.get_untracked();
        let client = app_state.0.api_client.get_untracked();
        enhancing.set(true);
        error.set(None);
        spawn_local(async move {
            match ocr::enhance(&client, &text).await {
                Ok(out) => enhanced.set(Some(out)),
                Err(e) => error.set(Some(e.to_string())),
            }
            enhancing.set(false);
        });
    };

    let on_copy = move |_| {
        let text = enhanced
            .get_untracked()
            .map(|e| e.text)
            .unwrap_or_else(|| extracted.get_untracked());
        spawn_local(async move {
            match ocr::copy_to_clipboard(&text).await {
                Ok(()) => app_state.0.notify_info("Copied to clipboard"),
                Err(e) => error.set(Some(e.to_string())),
            }
        });
    };

    view! {
        <Card class="gap-3 py-4">
            <CardHeader class="px-4">
                <CardTitle class="text-sm">"Image to text"</CardTitle>
                <CardDescription class="text-xs">"Upload or snap a photo, then extract and tidy its text."</CardDescription>
            </CardHeader>
            <CardContent class="flex flex-col gap-3 px-4">
                <input
                    type="file"
                    accept="image/*"
                    class="text-xs"
                    node_ref=file_input
                    on:change=on_file_change
                />

                <video
                    node_ref=video_ref
                    class=move || if camera_on.get() { "w-full rounded-md bg-black" } else { "hidden" }
                    prop:muted=true
                ></video>

                {move || preview.get().map(|src| view! {
                    <img src=src alt="Selected image" class="max-h-48 w-full rounded-md object-contain" />
                })}

                <div class="flex flex-wrap gap-2">
                    <Button size=ButtonSize::Sm on:click=on_extract attr:disabled=move || extracting.get()>
                        "Extract text"
                    </Button>
                    <Button size=ButtonSize::Sm variant=ButtonVariant::Outline on:click=on_camera>
                        {move || if camera_on.get() { "Close camera" } else { "Use camera" }}
                    </Button>
                    <Show when=move || camera_on.get() fallback=|| ().into_view()>
                        <Button size=ButtonSize::Sm variant=ButtonVariant::Outline on:click=on_capture>
                            "Capture"
                        </Button>
                    </Show>
                </div>

                {move || progress.get().map(|p| view! {
                    <div class="flex items-center gap-2 text-xs text-muted-foreground">
                        <Spinner class="size-3" />
                        <div class="h-1.5 flex-1 rounded bg-muted">
                            <div class="h-1.5 rounded bg-primary" style=format!("width: {p}%")></div>
                        </div>
                        <span>{format!("{p}%")}</span>
                    </div>
                })}

                <TextArea bind_value=extracted placeholder="Extracted text appears here" rows=5 class="text-xs" />

                <div class="flex flex-wrap gap-2">
                    <Button size=ButtonSize::Sm variant=ButtonVariant::Outline on:click=on_enhance attr:disabled=move || enhancing.get()>
                        <span class="inline-flex items-center gap-2">
                            <Show when=move || enhancing.get() fallback=|| ().into_view()>
                                <Spinner />
                            </Show>
                            "Enhance"
                        </span>
                    </Button>
                    <Button size=ButtonSize::Sm variant=ButtonVariant::Ghost on:click=on_copy>"Copy"</Button>
                </div>

                {move || enhanced.get().map(|e| {
                    let meta = match (e.service.clone(), e.processing_ms) {
                        (Some(s), Some(ms)) => format!("{s} · {ms} ms"),
                        (Some(s), None) => s,
                        _ => String::new(),
                    };
                    view! {
                        <div class="flex flex-col gap-1 rounded-md border p-3 text-xs">
                            <p class="whitespace-pre-wrap">{e.text}</p>
                            <span class="text-muted-foreground">{meta}</span>
                            {e.fallback.map(|why| view! {
                                <span class="text-muted-foreground">{format!("Local cleanup used: {why}")}</span>
                            })}
                        </div>
                    }
                })}

                <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                    <Alert class="border-destructive/30">
                        <AlertDescription class="text-destructive text-xs">
                            {move || error.get().unwrap_or_default()}
                        </AlertDescription>
                    </Alert>
                </Show>
            </CardContent>
        </Card>
    }
}
