// File: src/app.rs
// Purpose: Router, shared state and request handlers

use crate::error::{unprocessable, ErrorResponse};
use crate::forms::{DEMO_FORM, PROFILE_MODEL, STUDENT_REGISTRATION};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use formflow::accounts::{Accounts, ResetLink};
use formflow::{
    Entity, FormContext, FormField, ModelSpec, ModelStore, PersistenceError, RawInput, Registry,
    Submission, ValidationErrors,
};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

type HandlerResult = Result<Response, ErrorResponse>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub store: ModelStore,
    pub accounts: Arc<Accounts>,
    /// Issued reset links, handed to whatever delivers them
    pub reset_links: UnboundedSender<ResetLink>,
}

impl AppState {
    /// Create every registered table plus the account tables
    pub async fn migrate(&self) -> anyhow::Result<()> {
        let models = self.registry.models();
        let models: Vec<&ModelSpec> = models.iter().map(Arc::as_ref).collect();
        self.store.migrate(&models).await?;
        self.accounts.migrate().await?;
        Ok(())
    }

    fn model(&self, name: &str) -> Result<Arc<ModelSpec>, ErrorResponse> {
        self.registry
            .model(name)
            .ok_or_else(|| ErrorResponse::not_found(format!("model '{}' is not registered", name)))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/student/registration", post(student_registration_handler))
        .route("/student/success", get(student_success_handler))
        .route("/student/all", get(student_all_handler))
        .route("/student/demo", post(demo_handler))
        .route("/account/register", post(register_handler))
        .route("/account/login", post(login_handler))
        .route("/account/password_reset", post(password_reset_handler))
        .route("/account/password_reset/done", get(password_reset_done_handler))
        .route(
            "/account/password_reset_confirm/:uidb64/:token",
            post(password_reset_confirm_handler),
        )
        .route("/admin/:model", get(admin_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parse a urlencoded or JSON body into raw input
fn raw_input(headers: &HeaderMap, body: &Bytes) -> Result<RawInput, ErrorResponse> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("application/x-www-form-urlencoded");

    if content_type.contains("application/json") {
        let json: JsonValue = serde_json::from_slice(body)
            .map_err(|e| ErrorResponse::bad_request(format!("invalid JSON body: {}", e)))?;
        if !json.is_object() {
            return Err(ErrorResponse::bad_request("JSON body must be an object"));
        }
        Ok(RawInput::from_json(&json))
    } else if content_type.contains("application/x-www-form-urlencoded") {
        Ok(RawInput::from_urlencoded(&String::from_utf8_lossy(body)))
    } else {
        Err(ErrorResponse::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("unsupported content type '{}'", content_type),
        ))
    }
}

/// 303 to `location`, with the affected entity id in the body
fn see_other(location: &str, id: Option<i64>) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location.to_string())],
        Json(json!({ "id": id })),
    )
        .into_response()
}

/// Entity as JSON without its hashed columns
fn public_entity(model: &ModelSpec, entity: &Entity) -> JsonValue {
    let mut map = Map::new();
    map.insert("id".to_string(), json!(entity.id));
    for (name, value) in &entity.values {
        let hidden = model.column(name).map(|c| c.is_hashed()).unwrap_or(false);
        if !hidden {
            map.insert(name.clone(), json!(value));
        }
    }
    JsonValue::Object(map)
}

// ============================================================================
// STUDENT
// ============================================================================

/// Describes the registration form for a client to render
async fn index_handler(State(state): State<AppState>) -> HandlerResult {
    let form = state
        .registry
        .form(STUDENT_REGISTRATION)
        .ok_or_else(|| ErrorResponse::not_found("registration form is not registered"))?;
    let schema = form.schema();

    let fields: Vec<JsonValue> = schema
        .field_names()
        .into_iter()
        .filter_map(|name| {
            schema.field_attrs(name).map(|attrs| {
                json!({
                    "name": name,
                    "label": attrs.label,
                    "help_text": attrs.help_text,
                    "attrs": attrs.render_html5_attrs(),
                })
            })
        })
        .collect();

    Ok(Json(json!({
        "form": form.name(),
        "action": "/student/registration",
        "fields": fields,
    }))
    .into_response())
}

async fn student_registration_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResult {
    let raw = raw_input(&headers, &body)?;
    let form = state
        .registry
        .form(STUDENT_REGISTRATION)
        .ok_or_else(|| ErrorResponse::not_found("registration form is not registered"))?;
    let model = state.model(PROFILE_MODEL)?;

    let record = match form.run_with_context(&raw) {
        Ok(record) => record,
        Err(context) => return Ok(unprocessable(context)),
    };

    match state.store.create(&model, &record).await {
        Ok(entity) => Ok(see_other("/student/success", Some(entity.id))),
        Err(PersistenceError::Conflict { .. }) => {
            let mut errors = ValidationErrors::new();
            errors.add("email", "Profile with this Email already exists.");
            Ok(unprocessable(FormContext::new(form.schema(), &raw, errors)))
        }
        Err(e) => Err(e.into()),
    }
}

async fn student_success_handler() -> Json<JsonValue> {
    Json(json!({ "message": "You have registered successfully" }))
}

async fn student_all_handler(State(state): State<AppState>) -> HandlerResult {
    let model = state.model(PROFILE_MODEL)?;
    let students: Vec<JsonValue> = state
        .store
        .all(&model)
        .await?
        .iter()
        .map(|entity| public_entity(&model, entity))
        .collect();

    Ok(Json(json!({ "students": students })).into_response())
}

/// Validates the demo form and echoes the cleaned values
async fn demo_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> HandlerResult {
    let raw = raw_input(&headers, &body)?;
    let form = state
        .registry
        .form(DEMO_FORM)
        .ok_or_else(|| ErrorResponse::not_found("demo form is not registered"))?;

    match form.run_with_context(&raw) {
        Ok(record) => Ok(Json(json!({ "cleaned_data": record })).into_response()),
        Err(context) => Ok(unprocessable(context)),
    }
}

// ============================================================================
// ACCOUNT
// ============================================================================

async fn register_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> HandlerResult {
    let raw = raw_input(&headers, &body)?;

    match state.accounts.register(&raw).await? {
        Submission::Valid(registered) => Ok(see_other("/account/login", Some(registered.user.id))),
        Submission::Invalid(context) => Ok(unprocessable(context)),
    }
}

async fn login_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> HandlerResult {
    let raw = raw_input(&headers, &body)?;

    match state.accounts.login(&raw).await? {
        Submission::Valid(user) => Ok(see_other("/", Some(user.id))),
        Submission::Invalid(context) => Ok(unprocessable(context)),
    }
}

/// Always answers the same way, whether or not the email is known
async fn password_reset_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResult {
    let raw = raw_input(&headers, &body)?;

    match state.accounts.request_password_reset(&raw).await? {
        Submission::Valid(link) => {
            if let Some(link) = link {
                if state.reset_links.send(link).is_err() {
                    warn!("no consumer for reset links; link dropped");
                }
            }
            Ok(see_other("/account/password_reset/done", None))
        }
        Submission::Invalid(context) => Ok(unprocessable(context)),
    }
}

async fn password_reset_done_handler() -> Json<JsonValue> {
    Json(json!({
        "message": "If an account exists for that email, a password reset link has been sent"
    }))
}

async fn password_reset_confirm_handler(
    State(state): State<AppState>,
    Path((uidb64, token)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResult {
    let raw = raw_input(&headers, &body)?;

    match state.accounts.confirm_password_reset(&uidb64, &token, &raw).await? {
        Submission::Valid(user) => {
            info!(user_id = user.id, "password changed through reset link");
            Ok(see_other("/account/login", Some(user.id)))
        }
        Submission::Invalid(context) => Ok(unprocessable(context)),
    }
}

// ============================================================================
// ADMIN
// ============================================================================

/// Change list: `?q=` search, `?p=` page, other keys filter
async fn admin_handler(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> HandlerResult {
    let (model, admin) = state
        .registry
        .admin(&model)
        .ok_or_else(|| ErrorResponse::not_found(format!("no admin registered for '{}'", model)))?;

    let query = admin.query_from_params(&params);
    let list = admin.change_list(&state.store, &model, &query).await?;

    Ok(Json(list).into_response())
}
