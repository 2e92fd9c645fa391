use leptos::html;
use leptos::prelude::*;
use tw_merge::tw_merge;

const FIELD_CLASS: &str = "placeholder:text-muted-foreground dark:bg-input/30 border-input w-full min-w-0 rounded-md border bg-transparent px-3 py-1 text-base shadow-xs outline-none transition-[color,box-shadow] focus-visible:border-ring focus-visible:ring-2 focus-visible:ring-ring/50 disabled:cursor-not-allowed disabled:opacity-50 md:text-sm";

/// Text input wired to a signal. `on_input` fires after the signal is set.
#[component]
pub fn Input(
    #[prop(into, optional)] class: String,
    #[prop(into, default = "text")] r#type: &'static str,
    #[prop(into, optional)] placeholder: String,
    #[prop(into, optional)] id: String,
    #[prop(optional)] required: bool,
    #[prop(into)] bind_value: RwSignal<String>,
    #[prop(optional, into)] on_input: Option<Callback<String>>,
    #[prop(optional)] node_ref: NodeRef<html::Input>,
) -> impl IntoView {
    let merged_class = tw_merge!(FIELD_CLASS, "flex h-9", class);

    view! {
        <input
            data-name="Input"
            type=r#type
            class=merged_class
            placeholder=placeholder
            id=id
            required=required
            prop:value=move || bind_value.get()
            on:input=move |ev| {
                let v = event_target_value(&ev);
                bind_value.set(v.clone());
                if let Some(cb) = on_input {
                    cb.run(v);
                }
            }
            node_ref=node_ref
        />
    }
}

#[component]
pub fn TextArea(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] placeholder: String,
    #[prop(into, optional)] id: String,
    #[prop(default = 4)] rows: u32,
    #[prop(into)] bind_value: RwSignal<String>,
) -> impl IntoView {
    let merged_class = tw_merge!(FIELD_CLASS, "min-h-20 resize-y py-2", class);

    view! {
        <textarea
            data-name="TextArea"
            class=merged_class
            placeholder=placeholder
            id=id
            rows=rows
            prop:value=move || bind_value.get()
            on:input=move |ev| bind_value.set(event_target_value(&ev))
        ></textarea>
    }
}
