//! Request handlers.

use std::convert::Infallible;
use std::future::ready;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json};
use axum::Form;
use futures::stream::{self, Stream, StreamExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;

use crate::config::NamingMode;
use crate::dedup::find_duplicates;
use crate::error::Error;
use crate::fs::{delete_file, delete_files, list_files, read_file, rename_file, FileEntry};
use crate::jobs::{JobId, JobSnapshot};
use crate::progress::{snapshot_map, Frame};
use crate::server::error::ApiError;
use crate::server::AppState;

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub url: String,
    #[serde(default)]
    pub auto_number: Option<String>,
}

impl AddForm {
    fn naming(&self, fallback: NamingMode) -> NamingMode {
        match self.auto_number.as_deref() {
            Some("1") | Some("true") | Some("on") => NamingMode::AutoNumber,
            _ => fallback,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteManyRequest {
    pub filenames: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DuplicateFile {
    pub name: String,
    pub size: u64,
}

pub async fn add_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AddForm>,
) -> ApiResult<Json<Value>> {
    let naming = form.naming(state.naming);
    let id = state.engine.submit(&form.url, naming).await?;
    Ok(Json(json!({ "message": "Download added", "id": id })))
}

pub async fn stream_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let (initial, rx) = state.engine.subscribe()?;

    // Lagged observers skip to the newest frame.
    let updates = BroadcastStream::new(rx).filter_map(|frame| ready(frame.ok()));
    let frames = stream::once(ready(initial))
        .chain(updates)
        .map(|frame: Frame| Ok::<_, Infallible>(Event::default().data(&*frame)));

    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}

pub async fn jobs_handler(State(state): State<Arc<AppState>>) -> Json<IndexMap<JobId, JobSnapshot>> {
    Json(snapshot_map(state.engine.registry()))
}

pub async fn files_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<FileEntry>>> {
    Ok(Json(list_files(state.engine.directory()).await?))
}

pub async fn video_handler(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (data, mime) = read_file(state.engine.directory(), &filename).await?;
    Ok(([(header::CONTENT_TYPE, mime)], data))
}

pub async fn rename_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenameRequest>,
) -> ApiResult<Json<Value>> {
    rename_file(state.engine.directory(), &request.old_name, &request.new_name).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Json<Value>> {
    delete_file(state.engine.directory(), &request.filename).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn find_duplicates_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<IndexMap<String, Vec<DuplicateFile>>>> {
    let dir = state.engine.directory().to_path_buf();
    let groups = tokio::task::spawn_blocking(move || find_duplicates(&dir))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;

    let body = groups
        .into_iter()
        .map(|group| {
            let size = group.size;
            let files = group
                .files
                .into_iter()
                .map(|name| DuplicateFile { name, size })
                .collect();
            (group.digest, files)
        })
        .collect();
    Ok(Json(body))
}

pub async fn delete_duplicates_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeleteManyRequest>,
) -> ApiResult<Json<Value>> {
    let deleted = delete_files(state.engine.directory(), &request.filenames).await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
