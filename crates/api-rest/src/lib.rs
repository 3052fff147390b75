//! # API REST
//!
//! REST API for the care scheduling engine.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON wire types, CORS, status codes)
//!
//! All scheduling decisions are made by `care-core`; handlers only translate requests and map
//! errors to status codes.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use care_core::{
    AppointmentSuggestion, ConditionType, CoreConfig, DiagnosisContext, JsonFilePatientDirectory,
    JsonFileReminderStore, NonEmptyText, PatientDirectory, Reminder, ReminderId, ReminderService,
    ReminderStore, RunSummary, SchedulingError, Severity, TypesError, VisitType,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

type ApiError = (StatusCode, &'static str);

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    service: ReminderService,
    directory: Arc<dyn PatientDirectory>,
    store: Arc<dyn ReminderStore>,
}

impl AppState {
    pub fn new(
        service: ReminderService,
        directory: Arc<dyn PatientDirectory>,
        store: Arc<dyn ReminderStore>,
    ) -> Self {
        Self {
            service,
            directory,
            store,
        }
    }

    /// State backed by the JSON files under the configured data directory.
    pub fn from_config(cfg: Arc<CoreConfig>) -> Self {
        let directory = Arc::new(JsonFilePatientDirectory::new(cfg.patients_path()));
        let store = Arc::new(JsonFileReminderStore::new(cfg.reminders_path()));
        Self::new(ReminderService::new(cfg), directory, store)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Diagnosis context for a follow-up suggestion. Vocabulary values are case-insensitive.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuggestAppointmentReq {
    /// `mild`, `moderate`, `severe` or `critical`; omit when not recorded.
    #[serde(default)]
    pub severity: Option<String>,
    /// `pregnancy`, `diabetes`, `hypertension`, `tuberculosis`, `other` or `none`.
    #[serde(default)]
    pub condition_type: Option<String>,
    /// `outpatient`, `inpatient`, `emergency` or `followup`.
    pub visit_type: String,
    #[serde(default)]
    pub diagnosis_name: Option<String>,
    /// RFC 3339 reference time; the current time when omitted.
    #[serde(default)]
    pub now: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuggestAppointmentRes {
    /// Calendar date, `YYYY-MM-DD`.
    pub suggested_date: String,
    pub days_from_now: u32,
    pub rationale: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReminderRes {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub phone: String,
    pub channel: String,
    #[serde(rename = "type")]
    pub reminder_type: String,
    pub message: String,
    pub scheduled_for: String,
    pub sent: bool,
    pub sent_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunRemindersRes {
    pub day: String,
    pub patients: usize,
    pub candidates_new: usize,
    pub inserted: usize,
    pub reminders: Vec<ReminderRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DueRemindersRes {
    pub reminders: Vec<ReminderRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkSentRes {
    pub success: bool,
}

/// Optional reference time for an operation.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NowQuery {
    /// RFC 3339 timestamp; the current time when omitted.
    pub now: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        suggest_appointment,
        run_reminders,
        due_reminders,
        mark_reminder_sent,
    ),
    components(schemas(
        HealthRes,
        SuggestAppointmentReq,
        SuggestAppointmentRes,
        ReminderRes,
        RunRemindersRes,
        DueRemindersRes,
        MarkSentRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router, including Swagger UI and the OpenAPI document.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/appointments/suggest", post(suggest_appointment))
        .route("/reminders/run", post(run_reminders))
        .route("/reminders/due", get(due_reminders))
        .route("/reminders/:id/sent", post(mark_reminder_sent))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Care scheduling API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/appointments/suggest",
    request_body = SuggestAppointmentReq,
    responses(
        (status = 200, description = "Suggested follow-up", body = SuggestAppointmentRes),
        (status = 400, description = "Bad request")
    )
)]
/// Suggest the next appointment date for a diagnosis context.
///
/// The suggestion is advisory; nothing is stored.
///
/// # Errors
/// Returns `400 Bad Request` if a vocabulary value or `now` cannot be parsed.
#[axum::debug_handler]
async fn suggest_appointment(
    State(state): State<AppState>,
    Json(req): Json<SuggestAppointmentReq>,
) -> Result<Json<SuggestAppointmentRes>, ApiError> {
    let now = reference_time(req.now.as_deref())?;
    let ctx = diagnosis_context(req)?;
    let suggestion = state.service.suggest(&ctx, now);
    Ok(Json(suggestion.into()))
}

#[utoipa::path(
    post,
    path = "/reminders/run",
    params(NowQuery),
    responses(
        (status = 200, description = "Daily run summary", body = RunRemindersRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Run daily reminder generation.
///
/// Safe to call repeatedly: reminders already generated for the day are not created again.
///
/// # Errors
/// Returns `500 Internal Server Error` if the patient directory or reminder store fails.
#[axum::debug_handler]
async fn run_reminders(
    State(state): State<AppState>,
    Query(query): Query<NowQuery>,
) -> Result<Json<RunRemindersRes>, ApiError> {
    let now = reference_time(query.now.as_deref())?;
    let summary = blocking("Run reminders", move || {
        state
            .service
            .run_daily(state.directory.as_ref(), state.store.as_ref(), now)
    })
    .await?;
    Ok(Json(summary.into()))
}

#[utoipa::path(
    get,
    path = "/reminders/due",
    params(NowQuery),
    responses(
        (status = 200, description = "Unsent reminders due now", body = DueRemindersRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// List unsent reminders scheduled at or before `now`, earliest first.
#[axum::debug_handler]
async fn due_reminders(
    State(state): State<AppState>,
    Query(query): Query<NowQuery>,
) -> Result<Json<DueRemindersRes>, ApiError> {
    let now = reference_time(query.now.as_deref())?;
    let reminders =
        blocking("Due reminders", move || state.service.due(state.store.as_ref(), now)).await?;
    Ok(Json(DueRemindersRes {
        reminders: reminders.into_iter().map(ReminderRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/reminders/{id}/sent",
    params(
        ("id" = String, Path, description = "Reminder id, 32 lowercase hex characters"),
        NowQuery
    ),
    responses(
        (status = 200, description = "Reminder marked sent", body = MarkSentRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Reminder not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Record that a reminder was delivered. Repeating the call keeps the first delivery time.
#[axum::debug_handler]
async fn mark_reminder_sent(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(query): Query<NowQuery>,
) -> Result<Json<MarkSentRes>, ApiError> {
    let id = match ReminderId::parse(&id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid reminder id: {e}");
            return Err((StatusCode::BAD_REQUEST, "Invalid reminder id"));
        }
    };
    let sent_at = reference_time(query.now.as_deref())?;

    blocking("Mark sent", move || {
        state.service.mark_sent(state.store.as_ref(), id, sent_at)
    })
    .await?;
    Ok(Json(MarkSentRes { success: true }))
}

/// Runs store-backed work off the async workers; the JSON adapters do file I/O under a lock.
async fn blocking<T, F>(operation: &'static str, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SchedulingError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(|e| scheduling_error(operation, e)),
        Err(e) => {
            tracing::error!("{operation} task failed: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

fn reference_time(value: Option<&str>) -> Result<DateTime<Utc>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(Utc::now()),
        Some(v) => DateTime::parse_from_rfc3339(v)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|e| {
                tracing::warn!("Invalid reference time {v:?}: {e}");
                (StatusCode::BAD_REQUEST, "Invalid timestamp, expected RFC 3339")
            }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn diagnosis_context(req: SuggestAppointmentReq) -> Result<DiagnosisContext, ApiError> {
    let bad_request = |e: TypesError| {
        tracing::warn!("Invalid diagnosis context: {e}");
        (StatusCode::BAD_REQUEST, "Invalid diagnosis context")
    };

    let severity = non_empty(req.severity)
        .map(|v| v.parse::<Severity>())
        .transpose()
        .map_err(bad_request)?;
    let condition_type = non_empty(req.condition_type)
        .map(|v| v.parse::<ConditionType>())
        .transpose()
        .map_err(bad_request)?
        .unwrap_or(ConditionType::Unspecified);
    let visit_type = req.visit_type.parse::<VisitType>().map_err(bad_request)?;
    let diagnosis_name = non_empty(req.diagnosis_name)
        .map(NonEmptyText::new)
        .transpose()
        .map_err(bad_request)?;

    Ok(DiagnosisContext {
        severity,
        condition_type,
        visit_type,
        diagnosis_name,
    })
}

fn scheduling_error(operation: &str, err: SchedulingError) -> ApiError {
    match err {
        SchedulingError::UnknownReminder(id) => {
            tracing::warn!("{operation}: reminder {id} not found");
            (StatusCode::NOT_FOUND, "Reminder not found")
        }
        SchedulingError::InvalidInput(_) | SchedulingError::Types(_) | SchedulingError::Id(_) => {
            tracing::warn!("{operation} error: {err}");
            (StatusCode::BAD_REQUEST, "Bad request")
        }
        other => {
            tracing::error!("{operation} error: {other:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<Reminder> for ReminderRes {
    fn from(r: Reminder) -> Self {
        Self {
            id: r.id.to_string(),
            patient_id: r.patient_id,
            patient_name: r.patient_name,
            phone: r.phone,
            channel: r.channel.to_string(),
            reminder_type: r.reminder_type.to_string(),
            message: r.message,
            scheduled_for: rfc3339(r.scheduled_for),
            sent: r.sent,
            sent_at: r.sent_at.map(rfc3339),
        }
    }
}

impl From<RunSummary> for RunRemindersRes {
    fn from(s: RunSummary) -> Self {
        Self {
            day: s.day.to_string(),
            patients: s.patients,
            candidates_new: s.candidates_new,
            inserted: s.inserted,
            reminders: s.reminders.into_iter().map(ReminderRes::from).collect(),
        }
    }
}

impl From<AppointmentSuggestion> for SuggestAppointmentRes {
    fn from(s: AppointmentSuggestion) -> Self {
        Self {
            suggested_date: s.suggested_date.to_string(),
            days_from_now: s.days_from_now,
            rationale: s.rationale,
        }
    }
}
