use crate::geometry::{Point, Size};
use crate::state::{AppContext, NotesController};
use icons::X;
use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;

fn pointer(ev: &web_sys::MouseEvent) -> Point {
    Point {
        x: ev.client_x() as f64,
        y: ev.client_y() as f64,
    }
}

fn viewport() -> Size {
    let win = web_sys::window();
    let dim = |v: Option<wasm_bindgen::JsValue>| v.and_then(|v| v.as_f64()).unwrap_or(0.0);
    Size {
        width: dim(win.as_ref().and_then(|w| w.inner_width().ok())),
        height: dim(win.as_ref().and_then(|w| w.inner_height().ok())),
    }
}

/// Floating copy of a pinned note. Dragged by its header, resized from the
/// bottom-right corner.
#[component]
pub fn StickyOverlay() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sticky = app_state.0.sticky;
    let ctl = NotesController::new(app_state.0);

    let move_handle = window_event_listener(ev::mousemove, move |ev: web_sys::MouseEvent| {
        let at = pointer(&ev);
        let gesturing = sticky
            .with_untracked(|s| s.as_ref().and_then(|s| s.frame.gesture).is_some());
        if !gesturing {
            return;
        }
        let screen = viewport();
        sticky.update(|s| {
            if let Some(s) = s.as_mut() {
                s.frame.pointer_moved(at, screen);
            }
        });
    });
    let up_handle = window_event_listener(ev::mouseup, move |_ev: web_sys::MouseEvent| {
        let gesturing = sticky
            .with_untracked(|s| s.as_ref().and_then(|s| s.frame.gesture).is_some());
        if gesturing {
            sticky.update(|s| {
                if let Some(s) = s.as_mut() {
                    s.frame.release();
                }
            });
        }
    });
    on_cleanup(move || {
        move_handle.remove();
        up_handle.remove();
    });

    let on_grab = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        let at = pointer(&ev);
        sticky.update(|s| {
            if let Some(s) = s.as_mut() {
                s.frame.start_drag(at);
            }
        });
    };
    let on_resize = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        ev.stop_propagation();
        sticky.update(|s| {
            if let Some(s) = s.as_mut() {
                s.frame.start_resize();
            }
        });
    };

    view! {
        {move || sticky.get().map(|s| {
            let style = format!(
                "left: {}px; top: {}px; width: {}px; height: {}px; background-color: {};",
                s.frame.position.x,
                s.frame.position.y,
                s.frame.size.width,
                s.frame.size.height,
                s.note.color.as_deref().unwrap_or("#ffe666"),
            );
            view! {
                <div class="fixed z-50 flex flex-col overflow-hidden rounded-lg text-zinc-900 shadow-xl" style=style>
                    <div
                        class="flex cursor-move items-center justify-between gap-2 bg-black/10 px-3 py-1.5"
                        on:mousedown=on_grab
                    >
                        <span class="truncate text-sm font-semibold">{s.note.title.clone()}</span>
                        <button
                            class="rounded p-0.5 hover:bg-black/10"
                            title="Close"
                            on:mousedown=|ev: web_sys::MouseEvent| ev.stop_propagation()
                            on:click=move |_| ctl.unpin()
                        >
                            <X class="size-4" />
                        </button>
                    </div>
                    <p class="flex-1 overflow-auto whitespace-pre-wrap px-3 py-2 text-sm">{s.note.content.clone()}</p>
                    <div
                        class="absolute right-0 bottom-0 size-4 cursor-se-resize"
                        on:mousedown=on_resize
                    ></div>
                </div>
            }
        })}
    }
}
