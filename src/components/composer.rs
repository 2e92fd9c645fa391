use crate::components::ui::{Button, ButtonSize, ButtonVariant, Card, CardContent, Input, Spinner, TextArea};
use crate::state::{AppContext, NotesController};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// New-note form with optional dictation into the content field.
#[component]
pub fn Composer() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let ctl = NotesController::new(app_state.0);

    let title: RwSignal<String> = RwSignal::new(String::new());
    let content: RwSignal<String> = RwSignal::new(String::new());
    let saving: RwSignal<bool> = RwSignal::new(false);
    let recording: RwSignal<bool> = RwSignal::new(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let t = title.get_untracked();
        let c = content.get_untracked();

        saving.set(true);
        spawn_local(async move {
            if ctl.create(t, c).await.is_applied() {
                title.set(String::new());
                content.set(String::new());
                app_state.0.clear_notice();
            }
            saving.set(false);
        });
    };

    let on_dictate = move |_| {
        if recording.get_untracked() {
            return;
        }
        recording.set(true);
        let started = crate::speech::start_dictation(
            move |text| {
                leptos::logging::log!("Dictation: {text}");
                content.set(text);
            },
            move || recording.set(false),
        );
        if let Err(e) = started {
            leptos::logging::warn!("Dictation unavailable: {e}");
            recording.set(false);
            app_state.0.notify_error(e.to_string());
        }
    };

    view! {
        <Card class="gap-3 py-4">
            <CardContent class="px-4">
                <form class="flex flex-col gap-2" on:submit=on_submit>
                    <Input bind_value=title placeholder="Title" class="h-8 text-sm" />
                    <TextArea bind_value=content placeholder="Take a note..." rows=3 class="text-sm" />
                    <div class="flex items-center justify-end gap-2">
                        <Button
                            attr:r#type="button"
                            size=ButtonSize::Sm
                            variant=ButtonVariant::Outline
                            on:click=on_dictate
                            attr:disabled=move || recording.get()
                        >
                            {move || if recording.get() { "Listening..." } else { "Dictate" }}
                        </Button>
                        <Button size=ButtonSize::Sm attr:disabled=move || saving.get()>
                            <span class="inline-flex items-center gap-2">
                                <Show when=move || saving.get() fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                "Add note"
                            </span>
                        </Button>
                    </div>
                </form>
            </CardContent>
        </Card>
    }
}
