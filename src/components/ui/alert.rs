use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative flex w-full items-start justify-between gap-3 rounded-lg border px-4 py-3 text-sm"}
    clx! {AlertDescription, p, "text-sm leading-relaxed"}
}

pub use components::*;
