// REST API with Axum
// Handlers translate HTTP requests into store calls and serialize the results.

use crate::entities::{
    delete_activity, get_camper, insert_camper, insert_signup, list_activities, list_campers,
    update_camper, CamperField,
};
use crate::error::StoreError;
use crate::serializer::{to_value, to_values, Exclusions, Node};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db.lock().map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation,
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => {
                debug!(entity, id, "lookup missed");
                ApiError::NotFound(err.to_string())
            }
            StoreError::Validation(e) => {
                debug!(error = %e, "validation failed");
                ApiError::Validation
            }
            StoreError::Database(e) => ApiError::Internal(e.to_string()),
            StoreError::UnknownEdge { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Validation => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": ["validation errors"] })),
            )
                .into_response(),
            ApiError::Internal(cause) => {
                error!(%cause, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Request body helpers
// ============================================================================
// Missing, null and wrongly typed fields all read as "absent", which the
// store's validators reject.

/// Unparseable bodies and wrong content types get the same 400 as bad fields.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!(error = %rejection, "request body rejected");
            Err(ApiError::Validation)
        }
    }
}

fn body_object(body: &Value) -> ApiResult<&Map<String, Value>> {
    body.as_object().ok_or(ApiError::Validation)
}

/// Integers, and floats with no fractional part (`12.0`), read as i64.
fn whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn int_field(body: &Map<String, Value>, key: &str) -> Option<i64> {
    body.get(key).and_then(whole_number)
}

fn str_field<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

/// Recognised camper keys in body order; anything else is ignored.
fn camper_fields(body: &Map<String, Value>) -> Vec<CamperField> {
    body.iter()
        .filter_map(|(key, value)| match key.as_str() {
            "name" => Some(CamperField::Name(value.as_str().map(str::to_string))),
            "age" => Some(CamperField::Age(whole_number(value))),
            other => {
                debug!(key = other, "ignoring unknown camper field");
                None
            }
        })
        .collect()
}

fn without_signups() -> Exclusions {
    Exclusions::parse(["signups"])
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /
async fn home() -> impl IntoResponse {
    ""
}

/// GET /campers - All campers, without signups
async fn get_campers(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let campers = list_campers(&conn)?;
    let body = to_values(&*conn, campers.into_iter().map(Node::from), &without_signups())?;
    Ok(Json(body))
}

/// POST /campers - Create a camper from `{name, age}`
async fn create_camper(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let body = json_body(body)?;
    let fields = body_object(&body)?;
    let conn = state.conn()?;

    let camper = insert_camper(&conn, str_field(fields, "name"), int_field(fields, "age"))?;
    let body = to_value(&*conn, &camper.into(), &without_signups())?;

    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /campers/:id - One camper with its signups
async fn get_camper_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let camper = get_camper(&conn, id)?;
    let body = to_value(&*conn, &camper.into(), &Exclusions::none())?;
    Ok(Json(body))
}

/// PATCH /campers/:id - Partial update of name and/or age
async fn patch_camper(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let conn = state.conn()?;

    // Unknown id wins over a malformed body
    get_camper(&conn, id)?;

    let body = json_body(body)?;
    let fields = camper_fields(body_object(&body)?);
    let camper = update_camper(&conn, id, &fields)?;
    let body = to_value(&*conn, &camper.into(), &without_signups())?;

    Ok((StatusCode::ACCEPTED, Json(body)))
}

/// GET /activities - All activities, without signups
async fn get_activities(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let conn = state.conn()?;
    let activities = list_activities(&conn)?;
    let body = to_values(&*conn, activities.into_iter().map(Node::from), &without_signups())?;
    Ok(Json(body))
}

/// DELETE /activities/:id - Remove an activity and its signups
async fn remove_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let conn = state.conn()?;
    delete_activity(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /signups - Create a signup from `{camper_id, activity_id, time}`
async fn create_signup(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let body = json_body(body)?;
    let fields = body_object(&body)?;
    let conn = state.conn()?;

    let signup = insert_signup(
        &conn,
        int_field(fields, "camper_id"),
        int_field(fields, "activity_id"),
        int_field(fields, "time"),
    )?;
    let body = to_value(&*conn, &signup.into(), &Exclusions::none())?;

    Ok((StatusCode::CREATED, Json(body)))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/campers", get(get_campers).post(create_camper))
        .route("/campers/:id", get(get_camper_by_id).patch(patch_camper))
        .route("/activities", get(get_activities))
        .route("/activities/:id", delete(remove_activity))
        .route("/signups", post(create_signup))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
