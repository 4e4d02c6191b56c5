#![cfg(feature = "web")]

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::cell::CellValue;
use crate::config::AppConfig;
use crate::downloader::ExportFormat;
use crate::error::SessionError;
use crate::reviewer::{Download, Reviewer};
use crate::session::{
    Action, FlagKind, Outcome, PaginationWindow, SELECT_COLUMN, SessionMode, SessionState,
    TableSession, WorkingTable,
};
use crate::table::Table;

pub const SESSION_COOKIE: &str = "review_session";

struct SessionSlot {
    session: TableSession,
    last_used: u64,
}

/// Sessions keyed by cookie value, holding at most `capacity` of them.
///
/// Only a successful upload adds a session; once the store is full the
/// least recently used one is dropped to make room.
struct SessionStore {
    slots: HashMap<String, SessionSlot>,
    capacity: usize,
    clock: u64,
}

impl SessionStore {
    fn new(capacity: usize) -> Self {
        SessionStore {
            slots: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn get(&mut self, key: &str) -> Option<&mut TableSession> {
        let now = self.tick();
        self.slots.get_mut(key).map(|slot| {
            slot.last_used = now;
            &mut slot.session
        })
    }

    fn insert(&mut self, key: String, session: TableSession) -> &mut TableSession {
        if !self.slots.contains_key(&key) && self.slots.len() >= self.capacity {
            let stale = self
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(k, _)| k.clone());
            if let Some(stale) = stale {
                self.slots.remove(&stale);
                info!("evicted least recently used session");
            }
        }
        let slot = SessionSlot {
            session,
            last_used: self.tick(),
        };
        match self.slots.entry(key) {
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                *existing = slot;
                &mut existing.session
            }
            Entry::Vacant(entry) => &mut entry.insert(slot).session,
        }
    }
}

pub struct AppState {
    config: AppConfig,
    reviewer: Reviewer,
    sessions: Mutex<SessionStore>,
}

impl AppState {
    pub fn new(config: AppConfig, reviewer: Reviewer) -> Self {
        let sessions = Mutex::new(SessionStore::new(config.max_sessions));
        AppState {
            config,
            reviewer,
            sessions,
        }
    }

    /// Number of sessions currently held in memory.
    pub fn session_count(&self) -> usize {
        self.sessions().slots.len()
    }

    fn sessions(&self) -> MutexGuard<'_, SessionStore> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh_session(&self) -> TableSession {
        TableSession::new(self.config.mode).with_rerun_policy(self.config.rerun_policy)
    }
}

/// JSON form of a grid interaction.
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    Edit {
        row: usize,
        column: String,
        value: serde_json::Value,
    },
    Select {
        row: usize,
        value: bool,
    },
    SelectResult {
        row: usize,
        value: bool,
    },
    AppendRow,
    RemoveSelected,
    MarkFinal,
    MarkFraud,
    NextPage,
    PrevPage,
    RunEngine,
}

impl From<ActionRequest> for Action {
    fn from(request: ActionRequest) -> Self {
        match request {
            ActionRequest::Edit { row, column, value } => Action::Edit {
                row,
                column,
                value: CellValue::from_json(&value),
            },
            ActionRequest::Select { row, value } => Action::Select { row, value },
            ActionRequest::SelectResult { row, value } => Action::SelectResult { row, value },
            ActionRequest::AppendRow => Action::AppendRow,
            ActionRequest::RemoveSelected => Action::BulkRemove,
            ActionRequest::MarkFinal => Action::BulkMarkFinal,
            ActionRequest::MarkFraud => Action::BulkMarkFraud,
            ActionRequest::NextPage => Action::NextPage,
            ActionRequest::PrevPage => Action::PrevPage,
            ActionRequest::RunEngine => Action::RunEngine,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct GridView {
    pub columns: Vec<String>,
    pub rows: Vec<RowView>,
    pub total_rows: usize,
}

#[derive(Serialize, Debug)]
pub struct RowView {
    /// Absolute position in its table; the value to send back in actions.
    pub index: usize,
    pub values: Vec<serde_json::Value>,
}

#[derive(Serialize, Debug)]
pub struct PageView {
    pub page_number: usize,
    pub page_count: usize,
    pub page_size: usize,
}

#[derive(Serialize, Debug)]
pub struct SessionView {
    pub mode: SessionMode,
    pub state: SessionState,
    pub grid: Option<GridView>,
    pub page: Option<PageView>,
    pub engine_result: Option<GridView>,
    /// The rows a download would contain right now, if any.
    pub export_preview: Option<GridView>,
}

#[derive(Serialize, Debug)]
struct ActionResponse {
    status: String,
    outcome: Option<Outcome>,
    message: Option<String>,
    session: SessionView,
}

#[derive(Serialize, Debug)]
struct MessageResponse {
    status: String,
    message: Option<String>,
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

pub fn grid_view(table: &WorkingTable, rows: std::ops::Range<usize>) -> GridView {
    let mut columns = Vec::with_capacity(table.columns().len() + 2);
    columns.push(SELECT_COLUMN.to_string());
    columns.extend(table.columns().iter().cloned());
    columns.push(table.flag().column_name().to_string());

    let rows = rows
        .map(|index| {
            let row = &table.rows()[index];
            let mut values = Vec::with_capacity(row.values.len() + 2);
            values.push(serde_json::Value::Bool(table.is_selected(index)));
            values.extend(row.values.iter().map(CellValue::to_json));
            values.push(serde_json::Value::Bool(table.is_flagged(index)));
            RowView { index, values }
        })
        .collect();

    GridView {
        columns,
        rows,
        total_rows: table.len(),
    }
}

/// A plain table with no select or flag columns, e.g. an export set.
pub fn table_view(table: &Table) -> GridView {
    let rows = table
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| RowView {
            index,
            values: row.iter().map(CellValue::to_json).collect(),
        })
        .collect();

    GridView {
        columns: table.columns().to_vec(),
        rows,
        total_rows: table.row_count(),
    }
}

pub fn session_view(session: &TableSession) -> SessionView {
    let grid = session
        .working()
        .zip(session.visible_rows())
        .map(|(working, (range, _))| grid_view(working, range));

    let page = match (session.mode().is_paginated(), session.working()) {
        (true, Some(working)) => {
            let window: PaginationWindow = session.page();
            Some(PageView {
                page_number: window.page_number,
                page_count: window.page_count(working.len()),
                page_size: window.page_size,
            })
        }
        _ => None,
    };

    let engine_result = session
        .engine_result()
        .map(|result| grid_view(result, 0..result.len()));

    let export_preview = session
        .export(session.mode().flag())
        .ok()
        .flatten()
        .map(|table| table_view(&table));

    SessionView {
        mode: session.mode(),
        state: session.state(),
        grid,
        page,
        engine_result,
        export_preview,
    }
}

/// Resolve the caller's session id, issuing a new cookie when there is none.
fn session_key(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let key = cookie.value().to_string();
        return (jar, key);
    }
    let key = Uuid::new_v4().to_string();
    let cookie = Cookie::build((SESSION_COOKIE, key.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), key)
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(MessageResponse {
            status: "error".to_string(),
            message: Some(message),
        }),
    )
        .into_response()
}

pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(serve_index))
        .route("/api/session", get(get_session))
        .route("/api/upload", post(upload_file))
        .route("/api/action", post(apply_action))
        .route("/api/export/:flag", get(export_flagged))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.bind_addr;
    info!("starting review server in {} mode", config.mode);

    let app_state = Arc::new(AppState::new(config, Reviewer::default()));
    let app = router(app_state);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn get_session(jar: CookieJar, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (jar, key) = session_key(jar);
    let mut sessions = state.sessions();
    let view = match sessions.get(&key) {
        Some(session) => session_view(session),
        None => session_view(&state.fresh_session()),
    };
    (jar, Json(view))
}

async fn upload_file(
    jar: CookieJar,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let (jar, key) = session_key(jar);

    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        };
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(bytes) => upload = Some((file_name, bytes)),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        }
    }

    let Some((file_name, bytes)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "No file data received".to_string());
    };

    let mut sessions = state.sessions();
    let uploaded = match sessions.get(&key) {
        Some(session) => state
            .reviewer
            .upload(session, &bytes, &file_name)
            .map(|()| session_view(session)),
        None => {
            let mut session = state.fresh_session();
            state
                .reviewer
                .upload(&mut session, &bytes, &file_name)
                .map(|()| session_view(sessions.insert(key, session)))
        }
    };

    match uploaded {
        Ok(view) => {
            info!("upload {} accepted", file_name);
            (jar, Json(view)).into_response()
        }
        Err(e) => {
            warn!("upload {} rejected: {}", file_name, e);
            (jar, error_response(StatusCode::BAD_REQUEST, e.to_string())).into_response()
        }
    }
}

async fn apply_action(
    jar: CookieJar,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ActionRequest>,
) -> Response {
    let (jar, key) = session_key(jar);
    let mut sessions = state.sessions();
    let Some(session) = sessions.get(&key) else {
        let body = ActionResponse {
            status: "error".to_string(),
            outcome: None,
            message: Some(SessionError::NotLoaded.to_string()),
            session: session_view(&state.fresh_session()),
        };
        return (jar, (StatusCode::BAD_REQUEST, Json(body))).into_response();
    };

    match state.reviewer.act(session, request.into()) {
        Ok(outcome) => {
            let message = match outcome {
                Outcome::Notice(notice) => Some(notice.to_string()),
                _ => None,
            };
            let body = ActionResponse {
                status: "ok".to_string(),
                outcome: Some(outcome),
                message,
                session: session_view(session),
            };
            (jar, Json(body)).into_response()
        }
        Err(e) => {
            let body = ActionResponse {
                status: "error".to_string(),
                outcome: None,
                message: Some(e.to_string()),
                session: session_view(session),
            };
            (jar, (StatusCode::BAD_REQUEST, Json(body))).into_response()
        }
    }
}

async fn export_flagged(
    jar: CookieJar,
    Path(flag): Path<String>,
    Query(params): Query<ExportQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let flag: FlagKind = match flag.parse() {
        Ok(flag) => flag,
        Err(e) => return error_response(StatusCode::NOT_FOUND, e),
    };
    let format: ExportFormat = match params.format.as_deref().map(str::parse::<ExportFormat>).transpose() {
        Ok(format) => format.unwrap_or_default(),
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    let (jar, key) = session_key(jar);
    let mut sessions = state.sessions();
    let fresh;
    let session: &TableSession = match sessions.get(&key) {
        Some(session) => &*session,
        None => {
            fresh = state.fresh_session();
            &fresh
        }
    };

    match state.reviewer.download(session, flag, format) {
        Ok(Download::File(file)) => (
            jar,
            [
                (header::CONTENT_TYPE, file.mime_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file.file_name),
                ),
            ],
            file.bytes,
        )
            .into_response(),
        Ok(Download::Notice(notice)) => (
            jar,
            Json(MessageResponse {
                status: "notice".to_string(),
                message: Some(notice.to_string()),
            }),
        )
            .into_response(),
        Err(e) => (jar, error_response(StatusCode::BAD_REQUEST, e.to_string())).into_response(),
    }
}
