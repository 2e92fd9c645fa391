use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Card, div, "bg-card text-card-foreground flex flex-col gap-4 rounded-xl border py-6 shadow-sm"}
    clx! {CardHeader, div, "flex flex-col items-start gap-1.5 px-6"}
    clx! {CardTitle, h2, "leading-none font-semibold"}
    clx! {CardDescription, p, "text-muted-foreground text-sm"}
    clx! {CardContent, div, "px-6"}

    // Note tiles: the background colour comes from the note itself.
    clx! {NoteTile, article, "group relative flex min-h-40 flex-col gap-2 rounded-lg p-4 text-zinc-900 shadow-sm transition-shadow hover:shadow-md"}
    clx! {NoteTileActions, div, "mt-auto flex flex-wrap items-center gap-1 pt-2"}
}

pub use components::*;
