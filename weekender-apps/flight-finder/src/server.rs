//!  Weekender Flight Finder
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # HTTP Command Endpoint
//!
//! - `POST /commands` with `{"caller": "...", "text": "/find agosto"}` runs one
//!   command and answers `{"replies": [...]}` once it is done.
//! - `GET /health` answers `ok`.
//!
//! Replies are buffered and returned together when the command finishes, so
//! for `find` the per-weekend progress lines arrive only after the whole
//! month has been searched.
//!
//! `/commands` requires `Authorization: Bearer <access token>`. That token
//! only authenticates the front end; callers still `/login` through the gate.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth_gate::CallerId;
use crate::commands::CommandDispatcher;
use crate::messaging::{CollectingSink, Reply};

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub caller: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub replies: Vec<Reply>,
}

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<CommandDispatcher>,
    access_token: Arc<str>,
}

impl AppState {
    pub fn new(dispatcher: Arc<CommandDispatcher>, access_token: impl Into<Arc<str>>) -> Self {
        Self {
            dispatcher,
            access_token: access_token.into(),
        }
    }

    fn is_allowed(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == &*self.access_token)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/commands", post(run_command))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn run_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CommandRequest>,
) -> Response {
    if !state.is_allowed(&headers) {
        tracing::warn!("Rejected /commands call without a valid access token");
        return (StatusCode::UNAUTHORIZED, "invalid or missing access token").into_response();
    }
    if request.caller.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "caller must not be empty").into_response();
    }

    let caller = CallerId::new(request.caller);
    let sink = CollectingSink::new();
    state.dispatcher.dispatch(&caller, &request.text, &sink).await;

    Json(CommandResponse {
        replies: sink.take(),
    })
    .into_response()
}
