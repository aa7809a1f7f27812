//! Leaderboard endpoint handlers
//!
//! Transport-agnostic: each handler takes the request body and returns a
//! status code plus a JSON body.
//!
//! - `GET`  → `{"success": true, "leaderboard": [...]}` (top 10, never an error)
//! - `POST {name, score}` → 400 on malformed input, otherwise the merged top 10.
//!   Storage failures after validation are logged, not reported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::highscores::{Leaderboard, ScoreEntry, normalize_name};
use crate::persistence::RemoteStore;
use crate::tuning::Tuning;

/// Request handling errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or ill-typed `name`/`score`
    #[error("Invalid data")]
    InvalidData,

    /// Anything else; reported generically
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::InvalidData => 400,
            ApiError::Internal(_) => 500,
        }
    }
}

/// Successful response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub success: bool,
    pub leaderboard: Vec<ScoreEntry>,
}

/// Failed response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// A status code and JSON body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    fn ok(leaderboard: Vec<ScoreEntry>, failure_message: &str) -> Self {
        let response = LeaderboardResponse {
            success: true,
            leaderboard,
        };
        match serde_json::to_string(&response) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(&ApiError::Internal(e.to_string()), failure_message),
        }
    }

    fn error(err: &ApiError, message: &str) -> Self {
        match err {
            ApiError::InvalidData => log::warn!("Rejected leaderboard request: {}", err),
            ApiError::Internal(_) => log::error!("{}: {}", message, err),
        }
        let body = ErrorResponse {
            success: false,
            error: message.to_string(),
        };
        Self {
            status: err.status(),
            body: serde_json::to_string(&body)
                .unwrap_or_else(|_| r#"{"success":false,"error":"Internal error"}"#.to_string()),
        }
    }
}

/// A validated score submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub score: u64,
}

/// Validate a write request body: `name` must be a non-empty string and
/// `score` a finite, non-negative number (floored).
pub fn parse_submission(body: &str) -> Result<Submission, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(|_| ApiError::InvalidData)?;

    let name = match value.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        _ => return Err(ApiError::InvalidData),
    };

    let score = match value.get("score").and_then(Value::as_f64) {
        Some(score) if score.is_finite() && score >= 0.0 => score.floor() as u64,
        _ => return Err(ApiError::InvalidData),
    };

    Ok(Submission { name, score })
}

/// Handlers for the shared leaderboard
#[derive(Debug)]
pub struct LeaderboardApi<R> {
    remote: R,
    view_size: usize,
    archive_size: usize,
    max_name_len: usize,
}

impl<R: RemoteStore> LeaderboardApi<R> {
    pub fn new(remote: R, tuning: &Tuning) -> Self {
        Self {
            remote,
            view_size: tuning.leaderboard_view,
            archive_size: tuning.leaderboard_archive,
            max_name_len: tuning.max_name_len,
        }
    }

    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    /// Dispatch by HTTP method
    pub fn handle(&mut self, method: &str, body: &str) -> ApiResponse {
        match method {
            "GET" => self.get(),
            "POST" => self.post(body),
            _ => ApiResponse {
                status: 405,
                body: r#"{"success":false,"error":"Method not allowed"}"#.to_string(),
            },
        }
    }

    /// Top-N view. An unreachable store yields an empty list, not an error.
    pub fn get(&mut self) -> ApiResponse {
        let entries = match self.remote.load() {
            Ok(entries) => entries,
            Err(e) => {
                log::info!("Leaderboard store unavailable, returning empty list: {}", e);
                Vec::new()
            }
        };
        let board = Leaderboard::from_entries(entries, self.view_size);
        ApiResponse::ok(board.into_entries(), "Failed to fetch leaderboard")
    }

    pub fn post(&mut self, body: &str) -> ApiResponse {
        self.post_at(body, Utc::now())
    }

    /// Validate, normalize, read-merge-write, and return the top-N view
    pub fn post_at(&mut self, body: &str, now: DateTime<Utc>) -> ApiResponse {
        const FAILURE: &str = "Failed to save score";

        let submission = match parse_submission(body) {
            Ok(submission) => submission,
            Err(e) => return ApiResponse::error(&e, "Invalid data"),
        };

        let entry = ScoreEntry {
            name: normalize_name(&submission.name, self.max_name_len),
            score: submission.score,
            date: now,
        };

        let (existing, readable) = match self.remote.load() {
            Ok(entries) => (entries, true),
            Err(e) => {
                log::warn!("Leaderboard store unavailable, not persisting: {}", e);
                (Vec::new(), false)
            }
        };

        let mut board = Leaderboard::from_entries(existing, self.archive_size);
        board.insert(entry);

        if readable {
            if let Err(e) = self.remote.save(board.entries()) {
                log::error!("Failed to save leaderboard: {}", e);
            }
        }

        ApiResponse::ok(board.top(self.view_size), FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{KvRemote, MemoryStore, NoRemote, StoreError};
    use chrono::TimeZone;

    /// Remote that answers reads but refuses every write
    struct ReadOnlyRemote {
        entries: Vec<ScoreEntry>,
        refused_saves: usize,
    }

    impl RemoteStore for ReadOnlyRemote {
        fn load(&mut self) -> Result<Vec<ScoreEntry>, StoreError> {
            Ok(self.entries.clone())
        }

        fn save(&mut self, _entries: &[ScoreEntry]) -> Result<(), StoreError> {
            self.refused_saves += 1;
            Err(StoreError::Unavailable("read-only".into()))
        }
    }

    fn api() -> LeaderboardApi<KvRemote<MemoryStore>> {
        LeaderboardApi::new(KvRemote::new(MemoryStore::new()), &Tuning::default())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn board(response: &ApiResponse) -> Vec<ScoreEntry> {
        let parsed: LeaderboardResponse = serde_json::from_str(&response.body).unwrap();
        assert!(parsed.success);
        parsed.leaderboard
    }

    #[test]
    fn test_first_post_is_rank_one() {
        let mut api = api();
        let response = api.post_at(r#"{"name":"AAA","score":100}"#, now());
        assert_eq!(response.status, 200);
        let entries = board(&response);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "AAA");
        assert_eq!(entries[0].score, 100);
        assert_eq!(entries[0].date, now());
    }

    #[test]
    fn test_invalid_post_rejected_and_store_unchanged() {
        let mut api = api();
        api.post_at(r#"{"name":"keep","score":5}"#, now());
        let before = api.remote_mut().load().unwrap();

        for body in [
            r#"{"name":"","score":-1}"#,
            r#"{"name":"x","score":-1}"#,
            r#"{"name":"","score":10}"#,
            r#"{"score":10}"#,
            r#"{"name":"x"}"#,
            r#"{"name":"x","score":"10"}"#,
            r#"{"name":7,"score":10}"#,
            "not json",
        ] {
            let response = api.post_at(body, now());
            assert_eq!(response.status, 400, "body {body}");
            let parsed: ErrorResponse = serde_json::from_str(&response.body).unwrap();
            assert!(!parsed.success);
            assert_eq!(parsed.error, "Invalid data");
        }
        assert_eq!(api.remote_mut().load().unwrap(), before);
    }

    #[test]
    fn test_post_normalizes_and_floors() {
        let mut api = api();
        let response = api.post_at(r#"{"name":"  a very long player name ","score":12.9}"#, now());
        let entries = board(&response);
        assert_eq!(entries[0].name, "A VERY LONG PLA");
        assert_eq!(entries[0].score, 12);

        let response = api.post_at(r#"{"name":"   ","score":1}"#, now());
        assert_eq!(board(&response)[1].name, "ANONYMOUS");
    }

    #[test]
    fn test_get_returns_sorted_top_ten() {
        let mut api = api();
        for i in 0..25u64 {
            let body = format!(r#"{{"name":"p{i}","score":{}}}"#, (i * 37) % 100);
            api.post_at(&body, now());
        }
        let first = api.get();
        let entries = board(&first);
        assert_eq!(entries.len(), 10);
        assert!(entries.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(api.remote_mut().load().unwrap().len(), 25);

        // Idempotent without intervening writes
        assert_eq!(api.get(), first);
    }

    #[test]
    fn test_archive_capped() {
        let mut api = api();
        for i in 0..120u64 {
            api.post_at(&format!(r#"{{"name":"p","score":{i}}}"#), now());
        }
        let archive = api.remote_mut().load().unwrap();
        assert_eq!(archive.len(), 100);
        assert_eq!(archive[0].score, 119);
    }

    #[test]
    fn test_unconfigured_store() {
        let mut api = LeaderboardApi::new(NoRemote, &Tuning::default());
        let response = api.get();
        assert_eq!(response.status, 200);
        assert!(board(&response).is_empty());

        // Still answers with the computed view
        let response = api.post_at(r#"{"name":"solo","score":3}"#, now());
        assert_eq!(response.status, 200);
        assert_eq!(board(&response)[0].name, "SOLO");
    }

    #[test]
    fn test_failed_save_still_returns_merged_view() {
        let remote = ReadOnlyRemote {
            entries: vec![ScoreEntry::new("old", 50, now())],
            refused_saves: 0,
        };
        let mut api = LeaderboardApi::new(remote, &Tuning::default());

        let response = api.post_at(r#"{"name":"new","score":70}"#, now());
        assert_eq!(response.status, 200);
        let entries = board(&response);
        let ranked: Vec<(&str, u64)> = entries.iter().map(|e| (e.name.as_str(), e.score)).collect();
        assert_eq!(ranked, vec![("NEW", 70), ("OLD", 50)]);

        assert_eq!(api.remote_mut().refused_saves, 1);
    }

    #[test]
    fn test_handle_dispatch() {
        let mut api = api();
        assert_eq!(api.handle("GET", "").status, 200);
        assert_eq!(api.handle("POST", r#"{"name":"a","score":1}"#).status, 200);
        assert_eq!(api.handle("DELETE", "").status, 405);
    }
}
