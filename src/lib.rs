mod api;
mod app;
mod components;
mod geometry;
mod models;
mod notes;
mod ocr;
mod pages;
mod speech;
mod spelling;
mod state;
mod storage;
mod tokens;
mod util;

pub use app::App;

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::api::ApiClient;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_api_client_storage_roundtrip_token() {
        ApiClient::clear_storage();

        let mut c = ApiClient::load_from_storage();
        assert!(!c.is_authenticated());

        c.set_token("t1".to_string());
        c.save_to_storage();

        let c2 = ApiClient::load_from_storage();
        assert_eq!(c2.token.as_deref(), Some("t1"));

        let mut c3 = ApiClient::load_from_storage();
        c3.logout();
        assert!(!c3.is_authenticated());
        assert!(ApiClient::load_from_storage().token.is_none());
    }

    #[wasm_bindgen_test]
    async fn test_logged_out_request_never_leaves_the_client() {
        ApiClient::clear_storage();
        let c = ApiClient::load_from_storage();
        let err = c.fetch_active_notes().await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[wasm_bindgen_test]
    fn test_detached_playback_leaves_no_handlers() {
        use wasm_bindgen::closure::Closure;

        let utterance = web_sys::SpeechSynthesisUtterance::new_with_text("hi").unwrap();
        let playback = crate::speech::Playback::attach(
            utterance,
            Closure::new(|_ev: web_sys::SpeechSynthesisEvent| {}),
            Closure::new(|| {}),
        );
        let utterance = playback.detach();
        assert!(utterance.onend().is_none());
        assert!(utterance.onerror().is_none());
        assert!(utterance.onboundary().is_none());
    }

    #[wasm_bindgen_test]
    async fn test_typing_burst_sends_one_search() {
        use crate::state::{AppState, NotesController};
        use leptos::prelude::*;
        use wasm_bindgen::JsCast;

        // Mounting starts the executor that `spawn_local` runs on.
        let host = document().create_element("div").unwrap();
        let _mounted = leptos::mount::mount_to(host.unchecked_into(), || ());
        ApiClient::clear_storage();
        let state = AppState::new();
        state.api_client.update(|c| {
            // Nothing listens here, so the remote tier fails and the local
            // match answers.
            c.base_url = "http://127.0.0.1:9".to_string();
            c.set_token("t".to_string());
        });
        let ctl = NotesController::new(state);

        ctl.on_query_input("a".to_string());
        ctl.on_query_input("ab".to_string());
        assert!(state.search_gate.get_untracked().pending_timer().is_some());

        for _ in 0..80 {
            if state.search.get_untracked().is_some() {
                break;
            }
            crate::util::sleep_ms(100).await;
        }
        let res = state.search.get_untracked().expect("search should resolve");
        assert_eq!(res.query, "ab");
        assert_eq!(state.search_gate.get_untracked().issued(), 1);
        assert!(state.search_gate.get_untracked().pending_timer().is_none());
    }

    #[wasm_bindgen_test]
    async fn test_picking_new_image_clears_extracted_text() {
        use crate::components::OcrPanel;
        use crate::state::{AppContext, AppState};
        use leptos::prelude::*;
        use wasm_bindgen::JsCast;

        let host = document().create_element("div").unwrap();
        document().body().unwrap().append_child(&host).unwrap();
        let _mounted = leptos::mount::mount_to(host.clone().unchecked_into(), || {
            provide_context(AppContext(AppState::new()));
            view! { <OcrPanel /> }
        });

        let text: web_sys::HtmlTextAreaElement =
            host.query_selector("textarea").unwrap().unwrap().unchecked_into();
        text.set_value("from the last image");
        text.dispatch_event(&web_sys::Event::new("input").unwrap()).unwrap();

        let file = host.query_selector("input[type=file]").unwrap().unwrap();
        file.dispatch_event(&web_sys::Event::new("change").unwrap()).unwrap();
        crate::util::sleep_ms(20).await;

        assert_eq!(text.value(), "");
    }

    #[wasm_bindgen_test]
    async fn test_timeout_wins_over_slow_future() {
        let slow = crate::util::sleep_ms(200);
        assert_eq!(crate::util::with_timeout(10, slow).await, None);
        let fast = async { 7 };
        assert_eq!(crate::util::with_timeout(100, fast).await, Some(7));
    }
}
