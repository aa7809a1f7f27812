//! Browser bindings (wasm32 only)
//!
//! - `BrowserStorage`: LocalStorage as a `KeyValueStore`
//! - `AnimationFrames`: requestAnimationFrame as a `FrameScheduler`
//! - `fetch_leaderboard` / `post_score`: async sync with the leaderboard endpoint

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response, Storage};

use super::{FrameHandles, FrameScheduler, FrameToken};
use crate::api::LeaderboardResponse;
use crate::highscores::ScoreEntry;
use crate::persistence::{KeyValueStore, StoreError};

/// Leaderboard endpoint path
pub const LEADERBOARD_URL: &str = "/api/leaderboard";

fn js_err(value: JsValue) -> StoreError {
    StoreError::Unavailable(format!("{:?}", value))
}

/// LocalStorage-backed store. Private browsing can deny storage entirely;
/// every call then fails with `NotConfigured`.
pub struct BrowserStorage {
    storage: Option<Storage>,
}

impl BrowserStorage {
    pub fn open() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable, scores will not persist");
        }
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage, StoreError> {
        self.storage.as_ref().ok_or(StoreError::NotConfigured)
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?.get_item(key).map_err(js_err)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?.set_item(key, value).map_err(js_err)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage()?.remove_item(key).map_err(js_err)
    }
}

impl std::fmt::Debug for BrowserStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserStorage")
            .field("available", &self.storage.is_some())
            .finish()
    }
}

/// requestAnimationFrame scheduler. Holds the single frame callback and the
/// browser handle of the pending request so it can be cancelled.
#[derive(Default)]
pub struct AnimationFrames {
    callback: Option<Closure<dyn FnMut(f64)>>,
    handles: FrameHandles,
}

impl AnimationFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the callback every requested frame invokes
    pub fn set_callback(&mut self, callback: Closure<dyn FnMut(f64)>) {
        self.callback = Some(callback);
    }

    /// Called from the callback: the token of the frame that just fired
    pub fn take_fired(&mut self) -> Option<FrameToken> {
        self.handles.take_fired()
    }
}

impl FrameScheduler for AnimationFrames {
    fn request_frame(&mut self) -> FrameToken {
        let requested = match (web_sys::window(), self.callback.as_ref()) {
            (Some(window), Some(callback)) => {
                window.request_animation_frame(callback.as_ref().unchecked_ref())
            }
            _ => Err(JsValue::from_str("no window or frame callback")),
        };
        self.handles.issue(requested)
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if let Some(handle) = self.handles.cancel(token) {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(handle);
            }
        }
    }
}

async fn send(request: Request) -> Result<String, StoreError> {
    let window = web_sys::window().ok_or(StoreError::NotConfigured)?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_err)?;
    let response: Response = value.dyn_into().map_err(js_err)?;
    if !response.ok() {
        return Err(StoreError::Unavailable(format!("HTTP {}", response.status())));
    }
    let text = JsFuture::from(response.text().map_err(js_err)?)
        .await
        .map_err(js_err)?;
    text.as_string()
        .ok_or_else(|| StoreError::Unavailable("response body is not text".to_string()))
}

/// GET the shared top-N view
pub async fn fetch_leaderboard(url: &str) -> Result<Vec<ScoreEntry>, StoreError> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    let request = Request::new_with_str_and_init(url, &opts).map_err(js_err)?;

    let body = send(request).await?;
    let response: LeaderboardResponse = serde_json::from_str(&body)?;
    Ok(response.leaderboard)
}

/// POST a score; returns the updated top-N view
pub async fn post_score(url: &str, name: &str, score: u64) -> Result<Vec<ScoreEntry>, StoreError> {
    let payload = serde_json::json!({ "name": name, "score": score }).to_string();
    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_body(&JsValue::from_str(&payload));
    let request = Request::new_with_str_and_init(url, &opts).map_err(js_err)?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(js_err)?;

    let body = send(request).await?;
    let response: LeaderboardResponse = serde_json::from_str(&body)?;
    Ok(response.leaderboard)
}
