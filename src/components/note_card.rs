use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Input, NoteTile, NoteTileActions, Spinner, TextArea,
};
use crate::models::{Note, NoteView};
use crate::notes::PALETTE;
use crate::spelling::error_mask;
use crate::state::{AppContext, NoteAction, NotesController};
use crate::tokens::tokenize;
use crate::util::format_timestamp;
use icons::{ChevronDown, ChevronUp};
use leptos::prelude::*;
use leptos::task::spawn_local;

fn is_punct(text: &str) -> bool {
    matches!(text, "." | "," | "!" | "?" | ";")
}

/// Toggle label for a clamped body. `None` when the text fits.
pub(crate) fn show_more_label(expanded: bool, overflows: bool) -> Option<&'static str> {
    match (expanded, overflows) {
        (true, _) => Some("Show less"),
        (false, true) => Some("Show more"),
        (false, false) => None,
    }
}

/// Note body split into word spans, used while spelling marks or speech
/// highlighting are active for this note.
#[component]
fn AnnotatedContent(note_id: String, content: String) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let tokens = StoredValue::new(tokenize(&content));

    let id_for_spelling = note_id.clone();
    let errors = Memo::new(move |_| {
        let matches = app_state
            .0
            .spelling
            .with(|m| m.get(&id_for_spelling).cloned().unwrap_or_default());
        tokens.with_value(|t| error_mask(t, &matches))
    });

    let spoken = Memo::new(move |_| {
        app_state.0.speech.with(|s| {
            if s.note_id.as_deref() == Some(note_id.as_str()) {
                s.spoken.clone()
            } else {
                Vec::new()
            }
        })
    });

    view! {
        <p class="whitespace-pre-wrap break-words text-sm leading-relaxed">
            {move || {
                let errors = errors.get();
                let spoken = spoken.get();
                tokens
                    .get_value()
                    .into_iter()
                    .enumerate()
                    .map(|(i, t)| {
                        let sep = if i == 0 || is_punct(&t.text) { "" } else { " " };
                        let mut class = String::from("rounded-sm");
                        if errors.get(i).copied().unwrap_or(false) {
                            class.push_str(" underline decoration-wavy decoration-red-600");
                        }
                        if spoken.get(i).copied().unwrap_or(false) {
                            class.push_str(" bg-amber-300/80");
                        }
                        view! {
                            {sep}
                            <span class=class>{t.text}</span>
                        }
                    })
                    .collect_view()
            }}
        </p>
    }
}

#[component]
pub(crate) fn NoteCard(note: Note, list: NoteView) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let ctl = NotesController::new(app_state.0);

    let id = StoredValue::new(note.id.clone());
    let background = note.color.clone().unwrap_or_else(|| PALETTE[0].to_string());
    let created = format_timestamp(&note.created_at);
    let snapshot = StoredValue::new(note);
    // Follows local edits and reverts without remounting the card.
    let note = Memo::new(move |_| {
        let id = id.get_value();
        app_state
            .0
            .store
            .with(|s| s.find(&id).map(|(_, n)| n.clone()))
            .unwrap_or_else(|| snapshot.get_value())
    });

    let editing: RwSignal<bool> = RwSignal::new(false);
    let expanded: RwSignal<bool> = RwSignal::new(false);
    let overflows: RwSignal<bool> = RwSignal::new(false);
    let body_ref = NodeRef::<leptos::html::Div>::new();

    // Measure only while clamped; expanding removes the height cap.
    Effect::new(move |_| {
        note.track();
        if expanded.get() {
            return;
        }
        if let Some(el) = body_ref.get() {
            overflows.set(el.scroll_height() > el.client_height());
        }
    });
    let edit_title: RwSignal<String> = RwSignal::new(String::new());
    let edit_content: RwSignal<String> = RwSignal::new(String::new());

    let pending_label = Memo::new(move |_| {
        let id = id.get_value();
        app_state.0.store.with(|s| s.pending(&id).map(|op| op.label()))
    });
    let busy = move || pending_label.get().is_some();

    let has_marks = Memo::new(move |_| {
        let id = id.get_value();
        app_state.0.spelling.with(|m| m.contains_key(&id))
    });
    let speaking = Memo::new(move |_| {
        let id = id.get_value();
        app_state.0.speech.with(|s| s.note_id.as_deref() == Some(id.as_str()))
    });
    let checking = Memo::new(move |_| {
        let id = id.get_value();
        app_state.0.spell_checking.get().as_deref() == Some(id.as_str())
    });

    let start_edit = move |_| {
        note.with_untracked(|n| {
            edit_title.set(n.title.clone());
            edit_content.set(n.content.clone());
        });
        editing.set(true);
    };

    let save_edit = move |_| {
        let id = id.get_value();
        let title = edit_title.get_untracked();
        let content = edit_content.get_untracked();
        spawn_local(async move {
            if ctl.update(id.clone(), title, content).await.is_applied() {
                editing.set(false);
                ctl.clear_spelling(&id);
            }
        });
    };

    let run = move |action: NoteAction| {
        let id = id.get_value();
        spawn_local(async move {
            let _ = ctl.apply(id, action).await;
        });
    };

    let check_spelling = move |_| spawn_local(ctl.check_spelling(note.get_untracked()));
    let speak = move |_| note.with_untracked(|n| ctl.toggle_speech(n));
    let pin = move |_| note.with_untracked(|n| ctl.pin(n));

    let body = move || {
        let (title, content) = note.with(|n| (n.title.clone(), n.content.clone()));
        let text = if has_marks.get() || speaking.get() {
            view! { <AnnotatedContent note_id=id.get_value() content=content /> }.into_any()
        } else {
            view! { <p class="whitespace-pre-wrap break-words text-sm leading-relaxed">{content}</p> }
                .into_any()
        };
        view! {
            <h3 class="text-base font-semibold break-words">{title}</h3>
            <div
                node_ref=body_ref
                class=move || if expanded.get() { "" } else { "max-h-24 overflow-hidden" }
            >
                {text}
            </div>
            {move || show_more_label(expanded.get(), overflows.get()).map(|label| view! {
                <button
                    class="inline-flex items-center gap-1 self-start text-xs text-blue-900"
                    on:click=move |_| expanded.update(|e| *e = !*e)
                >
                    {if expanded.get_untracked() {
                        view! { <ChevronUp class="size-3" /> }.into_any()
                    } else {
                        view! { <ChevronDown class="size-3" /> }.into_any()
                    }}
                    {label}
                </button>
            })}
        }
    };

    view! {
        <NoteTile attr:style=format!("background-color: {background}")>
            <Show when=move || editing.get() fallback=body>
                <Input bind_value=edit_title class="h-8 bg-white/70 text-sm" placeholder="Title" />
                <TextArea bind_value=edit_content class="bg-white/70 text-sm" placeholder="Content" />
            </Show>

            <div class="flex items-center justify-between text-[11px] text-zinc-700">
                <span>{created}</span>
                {move || pending_label.get().map(|label| view! {
                    <span class="inline-flex items-center gap-1"><Spinner class="size-3" />{label}</span>
                })}
            </div>

            <NoteTileActions>
                {move || {
                    if editing.get() {
                        return view! {
                            <Button size=ButtonSize::Xs on:click=save_edit attr:disabled=busy>"Save"</Button>
                            <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=move |_| editing.set(false)>
                                "Cancel"
                            </Button>
                        }
                        .into_any();
                    }
                    match list {
                        NoteView::Notes => view! {
                            <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=start_edit attr:disabled=busy>
                                "Edit"
                            </Button>
                            <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=move |_| run(NoteAction::Archive) attr:disabled=busy>
                                "Archive"
                            </Button>
                            <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=move |_| run(NoteAction::Remove) attr:disabled=busy>
                                "Delete"
                            </Button>
                            <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=check_spelling attr:disabled=move || checking.get()>
                                {move || if checking.get() { "Checking..." } else { "Spelling" }}
                            </Button>
                            <Show when=move || has_marks.get() fallback=|| ().into_view()>
                                <Button
                                    size=ButtonSize::Xs
                                    variant=ButtonVariant::Ghost
                                    on:click=move |_| ctl.clear_spelling(&id.get_value())
                                >
                                    "Clear marks"
                                </Button>
                            </Show>
                            <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=speak>
                                {move || if speaking.get() { "Stop" } else { "Speak" }}
                            </Button>
                            <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=pin>"Pin"</Button>
                        }
                        .into_any(),
                        NoteView::Archive => view! {
                            <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=move |_| run(NoteAction::Unarchive) attr:disabled=busy>
                                "Unarchive"
                            </Button>
                            <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=speak>
                                {move || if speaking.get() { "Stop" } else { "Speak" }}
                            </Button>
                            <Button size=ButtonSize::Xs variant=ButtonVariant::Ghost on:click=pin>"Pin"</Button>
                        }
                        .into_any(),
                        NoteView::Trash => view! {
                            <span class="text-[11px] text-zinc-700">"Deleted"</span>
                        }
                        .into_any(),
                    }
                }}
            </NoteTileActions>
        </NoteTile>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_more_only_when_clamped_text_overflows() {
        assert_eq!(show_more_label(false, false), None);
        assert_eq!(show_more_label(false, true), Some("Show more"));
        assert_eq!(show_more_label(true, true), Some("Show less"));
        // Once expanded the body no longer overflows, but it can still collapse.
        assert_eq!(show_more_label(true, false), Some("Show less"));
    }
}
