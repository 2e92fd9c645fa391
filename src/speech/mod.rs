use crate::api::{ApiError, ApiResult};
use crate::models::Note;
use crate::tokens::{tokenize, Token};
use js_sys::Reflect;
use std::cell::RefCell;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

/// Index of the token being spoken at `char_index`: the last token starting
/// at or before it. `None` before the first token.
pub(crate) fn word_index_for_char(tokens: &[Token], char_index: usize) -> Option<usize> {
    let after = tokens.partition_point(|t| t.start <= char_index);
    after.checked_sub(1)
}

/// UTF-16 length of the `"{title}. "` prefix that precedes the content in
/// the spoken text (see [`crate::models::Note::spoken_text`]).
pub(crate) fn content_offset(title: &str) -> usize {
    title.encode_utf16().count() + 2
}

/// Map a boundary in the spoken text onto a token of the note's content.
/// Boundaries inside the title map to nothing.
pub(crate) fn content_word_index(title: &str, content_tokens: &[Token], char_index: usize) -> Option<usize> {
    let offset = content_offset(title);
    if char_index < offset {
        return None;
    }
    word_index_for_char(content_tokens, char_index - offset)
}

pub(crate) struct Playback {
    utterance: web_sys::SpeechSynthesisUtterance,
    _on_boundary: Closure<dyn FnMut(web_sys::SpeechSynthesisEvent)>,
    _on_end: Closure<dyn FnMut()>,
}

impl Playback {
    pub(crate) fn attach(
        utterance: web_sys::SpeechSynthesisUtterance,
        on_boundary: Closure<dyn FnMut(web_sys::SpeechSynthesisEvent)>,
        on_end: Closure<dyn FnMut()>,
    ) -> Self {
        utterance.set_onboundary(Some(on_boundary.as_ref().unchecked_ref()));
        utterance.set_onend(Some(on_end.as_ref().unchecked_ref()));
        utterance.set_onerror(Some(on_end.as_ref().unchecked_ref()));
        Self {
            utterance,
            _on_boundary: on_boundary,
            _on_end: on_end,
        }
    }

    /// Unhook the handlers. A cancelled utterance still fires `error` or
    /// `end` later, and that must not reach a dropped closure.
    pub(crate) fn detach(self) -> web_sys::SpeechSynthesisUtterance {
        self.utterance.set_onboundary(None);
        self.utterance.set_onend(None);
        self.utterance.set_onerror(None);
        self.utterance
    }
}

struct Dictation {
    _on_result: Closure<dyn FnMut(JsValue)>,
    _on_end: Closure<dyn FnMut()>,
}

thread_local! {
    // Handlers must outlive the utterance / recognition session they are attached to.
    static PLAYBACK: RefCell<Option<Playback>> = const { RefCell::new(None) };
    static DICTATION: RefCell<Option<Dictation>> = const { RefCell::new(None) };
}

fn synth() -> ApiResult<web_sys::SpeechSynthesis> {
    web_sys::window()
        .and_then(|w| w.speech_synthesis().ok())
        .ok_or_else(|| ApiError::unsupported("Text-to-speech is not supported in your browser"))
}

pub(crate) fn is_speaking() -> bool {
    synth().map(|s| s.speaking()).unwrap_or(false)
}

/// Stop any utterance. Handlers are detached before the engine is told to
/// cancel.
pub(crate) fn cancel_speech() {
    if let Some(playback) = PLAYBACK.with(|p| p.borrow_mut().take()) {
        playback.detach();
    }
    if let Ok(s) = synth() {
        s.cancel();
    }
}

/// Speak a note as `title. content`.
///
/// `on_word` receives the content token index at each word boundary;
/// `on_end` fires once playback finishes or is cancelled.
pub(crate) fn speak(
    note: &Note,
    on_word: impl Fn(usize) + 'static,
    on_end: impl Fn() + 'static,
) -> ApiResult<()> {
    let synth = synth()?;
    let utterance =
        web_sys::SpeechSynthesisUtterance::new_with_text(&note.spoken_text()).map_err(ApiError::js)?;

    let title = note.title.clone();
    let tokens = tokenize(&note.content);
    let on_boundary = Closure::<dyn FnMut(web_sys::SpeechSynthesisEvent)>::new(
        move |ev: web_sys::SpeechSynthesisEvent| {
            if ev.name().as_deref() != Some("word") {
                return;
            }
            if let Some(i) = content_word_index(&title, &tokens, ev.char_index() as usize) {
                on_word(i);
            }
        },
    );
    let on_end = Closure::<dyn FnMut()>::new(on_end);

    let playback = Playback::attach(utterance.clone(), on_boundary, on_end);
    let previous = PLAYBACK.with(|p| p.borrow_mut().replace(playback));
    if let Some(previous) = previous {
        previous.detach();
    }
    synth.speak(&utterance);
    Ok(())
}

/// `event.results[0][0].transcript`
fn first_transcript(ev: &JsValue) -> Option<String> {
    let results = Reflect::get(ev, &"results".into()).ok()?;
    let first = Reflect::get_u32(&results, 0).ok()?;
    let alt = Reflect::get_u32(&first, 0).ok()?;
    Reflect::get(&alt, &"transcript".into()).ok()?.as_string()
}

/// One-shot dictation through the browser's speech recognition.
///
/// Chromium still only exposes the prefixed `webkitSpeechRecognition`, so
/// the constructor is looked up dynamically.
pub(crate) fn start_dictation(
    on_text: impl Fn(String) + 'static,
    on_done: impl Fn() + 'static,
) -> ApiResult<()> {
    let win = web_sys::window().ok_or_else(|| ApiError::unsupported("No window"))?;
    let ctor = ["SpeechRecognition", "webkitSpeechRecognition"]
        .iter()
        .find_map(|k| Reflect::get(&win, &JsValue::from_str(k)).ok().filter(|v| v.is_function()))
        .ok_or_else(|| ApiError::unsupported("Speech recognition is not supported in your browser"))?;
    let ctor: js_sys::Function = ctor.unchecked_into();

    let rec = Reflect::construct(&ctor, &js_sys::Array::new()).map_err(ApiError::js)?;
    Reflect::set(&rec, &"lang".into(), &"en-US".into()).map_err(ApiError::js)?;

    let on_result = Closure::<dyn FnMut(JsValue)>::new(move |ev: JsValue| {
        if let Some(text) = first_transcript(&ev) {
            on_text(text);
        }
    });
    let on_end = Closure::<dyn FnMut()>::new(on_done);

    Reflect::set(&rec, &"onresult".into(), on_result.as_ref()).map_err(ApiError::js)?;
    Reflect::set(&rec, &"onerror".into(), on_end.as_ref()).map_err(ApiError::js)?;
    Reflect::set(&rec, &"onend".into(), on_end.as_ref()).map_err(ApiError::js)?;

    let start: js_sys::Function = Reflect::get(&rec, &"start".into())
        .map_err(ApiError::js)?
        .dyn_into()
        .map_err(ApiError::js)?;

    DICTATION.with(|d| {
        *d.borrow_mut() = Some(Dictation {
            _on_result: on_result,
            _on_end: on_end,
        })
    });
    start.call0(&rec).map_err(ApiError::js)?;
    Ok(())
}
