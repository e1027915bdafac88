//! Layout and theme preference handlers.

use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use emojiedit_core::{LayoutPrefs, PrefsStore, Theme};
use serde::{Deserialize, Serialize};
use std::sync::MutexGuard;

#[derive(Debug, Default, Deserialize)]
pub struct PrefersQuery {
    /// The client's `prefers-color-scheme`; only `light` changes anything.
    #[serde(default)]
    pub prefers: Option<String>,
}

impl PrefersQuery {
    fn prefers_light(&self) -> bool {
        self.prefers
            .as_deref()
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("light"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefsResponse {
    pub layout: LayoutPrefs,
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

fn store(state: &AppState) -> Result<MutexGuard<'_, PrefsStore>, HttpError> {
    state.prefs.lock().map_err(|_| {
        tracing::error!("Preference store lock poisoned");
        HttpError(AppError::Internal)
    })
}

/// `GET /api/prefs`
pub async fn get_prefs(
    State(state): State<AppState>,
    Query(query): Query<PrefersQuery>,
) -> Result<Json<PrefsResponse>, HttpError> {
    let prefs = store(&state)?.preferences();
    Ok(Json(PrefsResponse {
        layout: prefs.layout,
        theme: prefs.theme_or_default(query.prefers_light()),
    }))
}

/// Store a new split; out-of-range values are clamped, not rejected.
pub async fn set_layout(
    State(state): State<AppState>,
    Json(req): Json<LayoutPrefs>,
) -> Result<Json<LayoutPrefs>, HttpError> {
    let layout = store(&state)?.set_layout(req.width, req.height);
    Ok(Json(layout))
}

/// `POST /api/prefs/theme/toggle`
pub async fn toggle_theme(
    State(state): State<AppState>,
    Query(query): Query<PrefersQuery>,
) -> Result<Json<ThemeResponse>, HttpError> {
    let theme = store(&state)?.toggle_theme(query.prefers_light());
    tracing::debug!("Theme switched to {}", theme);
    Ok(Json(ThemeResponse { theme }))
}
