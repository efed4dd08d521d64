// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! HTTP API over the dual-channel dispatcher.
//!
//! - `POST /api/message` `{text, user_mode?, screen_mode?}` -> `{user_response}`
//! - `GET /api/screen-text` -> next screen message, or `204` when none is pending
//! - `GET /api/settings` / `POST /api/settings` -> current channel modes

use agora_app_core::ProcessingMode;
use agora_dispatch::{DispatchSettings, Dispatcher, ModeOverrides, UserResponse};
use agora_display::SCREEN_TEXT_PATH;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Called after the channel modes change, e.g. to persist them.
pub type SettingsHook = Arc<dyn Fn(DispatchSettings) + Send + Sync>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    on_settings: Option<SettingsHook>,
}

impl AppState {
    /// State serving `dispatcher`.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            on_settings: None,
        }
    }

    /// Run `hook` after every settings change made over HTTP.
    pub fn with_settings_hook(mut self, hook: SettingsHook) -> Self {
        self.on_settings = Some(hook);
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    text: String,
    #[serde(flatten)]
    overrides: ModeOverrides,
}

#[derive(Debug, Serialize)]
pub struct MessageReply {
    user_response: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    error: String,
}

/// Mode names arrive as plain strings; unknown ones are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    user_mode: Option<String>,
    #[serde(default)]
    screen_mode: Option<String>,
}

/// All API routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/message", post(post_message))
        .route(SCREEN_TEXT_PATH, get(get_screen_text))
        .route("/api/settings", get(get_settings).post(post_settings))
        .with_state(state)
}

async fn post_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageReply>, (StatusCode, Json<ErrorBody>)> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "message text is empty".into(),
            }),
        ));
    }
    let user_response = state.dispatcher.submit_with(text, req.overrides).await;
    Ok(Json(MessageReply { user_response }))
}

#[allow(clippy::unused_async)]
async fn get_screen_text(State(state): State<AppState>) -> Response {
    match state.dispatcher.screen_slot().take() {
        Some(message) => Json(message).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[allow(clippy::unused_async)]
async fn get_settings(State(state): State<AppState>) -> Json<DispatchSettings> {
    Json(state.dispatcher.settings())
}

fn parse_mode(field: &str, value: Option<&str>, current: ProcessingMode) -> ProcessingMode {
    match value.map(str::parse::<ProcessingMode>) {
        Some(Ok(mode)) => mode,
        Some(Err(err)) => {
            warn!(field, %err, "ignoring invalid mode");
            current
        }
        None => current,
    }
}

#[allow(clippy::unused_async)]
async fn post_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Json<DispatchSettings> {
    let current = state.dispatcher.settings();
    let next = DispatchSettings {
        user_mode: parse_mode("user_mode", update.user_mode.as_deref(), current.user_mode),
        screen_mode: parse_mode("screen_mode", update.screen_mode.as_deref(), current.screen_mode),
    };
    if next != current {
        state.dispatcher.update_settings(next);
        if let Some(hook) = &state.on_settings {
            hook(next);
        }
        info!(user = %next.user_mode, screen = %next.screen_mode, "settings changed over http");
    }
    Json(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_app_core::DispatchPrefs;
    use agora_dry_tests::{CountingLookup, ScriptedGenerator};
    use std::sync::Mutex;
    use tokio::runtime::Handle;

    fn state(prefs: &DispatchPrefs) -> AppState {
        let dispatcher = Dispatcher::new(
            Handle::current(),
            prefs,
            Arc::new(ScriptedGenerator::new()),
            Arc::new(CountingLookup::new("Know thyself.", "Socrates")),
        );
        AppState::new(Arc::new(dispatcher))
    }

    fn request(text: &str) -> MessageRequest {
        MessageRequest {
            text: text.into(),
            overrides: ModeOverrides::default(),
        }
    }

    #[tokio::test]
    async fn message_then_screen_text_then_empty() {
        let state = state(&DispatchPrefs::default());
        let Json(reply) = post_message(State(state.clone()), Json(request("  hello ")))
            .await
            .unwrap();
        assert_eq!(reply.user_response.text, "hello");

        let first = get_screen_text(State(state.clone())).await;
        assert_eq!(first.status(), StatusCode::OK);
        let second = get_screen_text(State(state)).await;
        assert_eq!(second.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let state = state(&DispatchPrefs::default());
        let (status, _) = post_message(State(state), Json(request("   ")))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn request_overrides_flatten_into_the_body() {
        let state = state(&DispatchPrefs::default());
        let req: MessageRequest =
            serde_json::from_str(r#"{"text":"who","user_mode":"quote"}"#).unwrap();
        let Json(reply) = post_message(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(reply.user_response.text, "Know thyself.");
        assert_eq!(reply.user_response.author.as_deref(), Some("Socrates"));
        state.dispatcher.settle().await;
    }

    #[tokio::test]
    async fn settings_update_ignores_unknown_modes_and_notifies() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let state = state(&DispatchPrefs::default())
            .with_settings_hook(Arc::new(move |s| sink.lock().unwrap().push(s)));

        let update = SettingsUpdate {
            user_mode: Some("llm".into()),
            screen_mode: Some("telepathy".into()),
        };
        let Json(next) = post_settings(State(state.clone()), Json(update)).await;
        assert_eq!(next.user_mode, ProcessingMode::LocalGeneration);
        assert_eq!(next.screen_mode, ProcessingMode::PassThrough);

        let Json(current) = get_settings(State(state.clone())).await;
        assert_eq!(current, next);
        assert_eq!(seen.lock().unwrap().as_slice(), &[next]);

        let _ = post_settings(State(state), Json(SettingsUpdate::default())).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn reply_serializes_under_user_response() {
        let reply = MessageReply {
            user_response: UserResponse::pass_through("hi"),
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["user_response"]["text"], "hi");
        assert_eq!(value["user_response"]["mode"], "echo");
    }
}
