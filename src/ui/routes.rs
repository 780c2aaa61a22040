use std::path::Path;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::backend_client::get_translation;
use crate::languages::{self, speech_code};
use crate::session::{SessionHistory, UiSession};
use crate::state::UiState;
use crate::tts::{save_and_read_back, TtsError};
use crate::ui::page::{render_page, Notice, PageView};

pub const SESSION_COOKIE: &str = "lcel_session";

#[derive(Debug, Deserialize)]
pub struct TranslateForm {
    pub language: String,
    #[serde(default)]
    pub text: String,
}

pub fn create_routes() -> Router<UiState> {
    Router::new()
        .route("/", get(index))
        .route("/translate", post(translate))
        .route("/copy", post(copy_to_clipboard))
        .route("/audio", get(audio))
        .route("/session/end", post(end_session))
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Render the page and (re)issue the session cookie when the browser sent a different one.
fn page_response(
    requested: Option<&str>,
    session_id: &str,
    session: &UiSession,
    language: &str,
    input_text: &str,
    notices: Vec<Notice>,
) -> Response {
    let translation = session.last_translation.as_ref().map(|(text, _)| text.as_str());
    let html = render_page(&PageView {
        selected_language: language,
        input_text,
        translation,
        audio_version: session.history.len(),
        notices,
        history: session.history.entries(),
    });

    let mut response = Html(html).into_response();
    if requested != Some(session_id) {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session_id);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

fn default_language(session: &UiSession) -> String {
    session
        .last_translation
        .as_ref()
        .map(|(_, language)| language.clone())
        .unwrap_or_else(|| languages::LANGUAGES[0].0.to_string())
}

async fn index(State(state): State<UiState>, headers: HeaderMap) -> Response {
    let requested = session_cookie(&headers);
    let (id, handle) = state.sessions.get_or_create(requested.as_deref());
    let mut session = handle.lock().await;
    session.touch();

    let language = default_language(&session);
    page_response(requested.as_deref(), &id, &session, &language, "", Vec::new())
}

async fn translate(
    State(state): State<UiState>,
    headers: HeaderMap,
    Form(form): Form<TranslateForm>,
) -> Response {
    let requested = session_cookie(&headers);
    let (id, handle) = state.sessions.get_or_create(requested.as_deref());
    {
        let mut session = handle.lock().await;
        session.touch();

        if form.text.trim().is_empty() {
            return page_response(requested.as_deref(), &id, &session, &form.language, &form.text, Vec::new());
        }
    }

    info!("Translating {} chars into {}", form.text.chars().count(), form.language);
    // The session stays unlocked while the backend call is in flight.
    let mut recorded = SessionHistory::new();
    let outcome = get_translation(
        state.backend.as_ref(),
        &mut recorded,
        &form.text,
        &form.language,
    )
    .await;

    let mut session = handle.lock().await;
    session.history.append(recorded);

    let mut notices = Vec::new();
    match outcome.error {
        Some(message) => {
            session.last_translation = None;
            notices.push(Notice::error(message));
        }
        None if outcome.translation.is_empty() => session.last_translation = None,
        None => session.last_translation = Some((outcome.translation, form.language.clone())),
    }

    page_response(requested.as_deref(), &id, &session, &form.language, &form.text, notices)
}

async fn copy_to_clipboard(State(state): State<UiState>, headers: HeaderMap) -> Response {
    let requested = session_cookie(&headers);
    let (id, handle) = state.sessions.get_or_create(requested.as_deref());
    let last = {
        let mut session = handle.lock().await;
        session.touch();
        session.last_translation.clone()
    };

    let notice = match &last {
        None => Notice::error("Nothing to copy yet"),
        Some((text, _)) => match state.clipboard.copy(text).await {
            Ok(()) => Notice::success("Text copied to clipboard!"),
            Err(e) => {
                warn!("Clipboard copy failed: {}", e);
                Notice::error(format!("Could not copy to clipboard: {}", e))
            }
        },
    };

    let session = handle.lock().await;
    let language = default_language(&session);
    page_response(requested.as_deref(), &id, &session, &language, "", vec![notice])
}

async fn audio(State(state): State<UiState>, headers: HeaderMap) -> Response {
    let Some(handle) = session_cookie(&headers).and_then(|id| state.sessions.get(&id)) else {
        return (StatusCode::NOT_FOUND, "No translation to speak yet").into_response();
    };
    let last = {
        let mut session = handle.lock().await;
        session.touch();
        session.last_translation.clone()
    };

    let Some((text, language)) = last else {
        return (StatusCode::NOT_FOUND, "No translation to speak yet").into_response();
    };

    match synthesize(&state, &text, &language).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response(),
        Err(e) => {
            error!("Speech synthesis failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Speech synthesis failed: {}", e)).into_response()
        }
    }
}

async fn synthesize(state: &UiState, text: &str, language: &str) -> Result<Vec<u8>, TtsError> {
    let audio = state.tts.generate_audio(text, speech_code(language)).await?;
    save_and_read_back(&audio, Path::new(&state.config.audio_path)).await
}

async fn end_session(State(state): State<UiState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_cookie(&headers) {
        state.sessions.end_session(&id);
    }

    let mut response = Redirect::to("/").into_response();
    let expired = format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE);
    if let Ok(value) = HeaderValue::from_str(&expired) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}
