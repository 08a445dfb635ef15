// rest/routes/tasks.rs — Task CRUD routes.
//
// Bodies are taken as raw JSON values so field-type errors surface as the
// wire contract's 400 {"message"} payloads instead of extractor rejections.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::store::StoreError;
use crate::tasks::{Task, TaskPatch};
use crate::AppContext;

type ErrorResponse = (StatusCode, Json<Value>);

fn store_error(e: StoreError) -> ErrorResponse {
    let status = match e {
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Io(_) | StoreError::Serde(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "message": e.to_string() })))
}

fn bad_request(message: &str) -> ErrorResponse {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": message })))
}

pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<Task>>, ErrorResponse> {
    let tasks = ctx.store.list().await.map_err(store_error)?;
    Ok(Json(tasks))
}

pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Task>), ErrorResponse> {
    let title = match body.get("title").and_then(Value::as_str) {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            return Err(bad_request(
                "Field \"title\" is required and must be a non-empty string",
            ))
        }
    };
    // A non-boolean `completed` is not an error on create — it defaults.
    let completed = body.get("completed").and_then(Value::as_bool);

    let task = ctx
        .store
        .create(title, completed)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn patch_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Task>, ErrorResponse> {
    let mut patch = TaskPatch::default();

    if let Some(title) = body.get("title") {
        match title.as_str() {
            Some(t) => patch.title = Some(t.to_string()),
            None => return Err(bad_request("If provided, \"title\" must be a non-empty string")),
        }
    }
    if let Some(completed) = body.get("completed") {
        match completed.as_bool() {
            Some(c) => patch.completed = Some(c),
            None => return Err(bad_request("\"completed\" must be boolean")),
        }
    }

    let task = ctx.store.patch(&id, &patch).await.map_err(store_error)?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ErrorResponse> {
    let task = ctx.store.delete(&id).await.map_err(store_error)?;
    Ok(Json(task))
}
