use crate::error::SchedulingError;
use crate::slot_service::SlotService;
use crate::types::{Block, BlockWithSlots, NewBlock, Slot, SlotId};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{http::StatusCode, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;
use validator::Validate;

pub struct AppState<T> {
    service: Arc<T>,
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ReservationRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Candidate name is required"))]
    candidate_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateBlockRequest {
    #[validate(length(min = 1, message = "blockId is required"))]
    block_id: String,
    #[validate(length(min = 1, message = "interviewerName is required"))]
    interviewer_name: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    #[validate(range(min = 1, message = "slotLength must be a positive number"))]
    slot_length: i32,
}

impl From<CreateBlockRequest> for NewBlock {
    fn from(request: CreateBlockRequest) -> Self {
        Self {
            block_id: request.block_id,
            interviewer_name: request.interviewer_name,
            start_time: request.start_time,
            end_time: request.end_time,
            slot_length: request.slot_length,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotResponse {
    message: String,
    slot: Slot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlockResponse {
    message: String,
    block: Block,
    slots: Vec<Slot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
    /// The same request may succeed when sent again.
    retryable: bool,
}

fn status_code(err: &SchedulingError) -> StatusCode {
    match err {
        SchedulingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SchedulingError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        err if err.is_not_found() => StatusCode::NOT_FOUND,
        err if err.is_conflict() => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for SchedulingError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            retryable: self.is_retryable(),
        };
        (status_code(&self), Json(body)).into_response()
    }
}

pub fn create_app<T: SlotService>(service: T) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let slots = Router::new()
        .route("/", get(get_slots::<T>))
        .route("/:id", get(get_slot::<T>))
        .route("/reserve/:id", post(reserve_slot::<T>))
        .route("/checkin/:id", post(check_in_slot::<T>))
        .route("/cancel/:id", post(cancel_slot::<T>));

    let blocks = Router::new()
        .route("/", get(get_blocks::<T>).post(create_block::<T>))
        .route("/:block_id", get(get_block::<T>));

    Router::new()
        .nest("/api/slots", slots)
        .nest("/api/blocks", blocks)
        .with_state(AppState {
            service: Arc::new(service),
        })
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Runs a blocking service call off the async executor.
async fn call<T, R, F>(state: &AppState<T>, operation: F) -> Result<R, SchedulingError>
where
    T: SlotService,
    R: Send + 'static,
    F: FnOnce(&T) -> Result<R, SchedulingError> + Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || operation(service.as_ref()))
        .await
        .unwrap_or_else(|err| {
            error!(?err, "Service task failed");
            Err(SchedulingError::StoreUnavailable(
                "request could not be processed".into(),
            ))
        })
}

/// Decodes and validates a JSON body, reporting both kinds of failure as
/// invalid input.
fn parse_body<R: Validate>(payload: Result<Json<R>, JsonRejection>) -> Result<R, SchedulingError> {
    let Json(request) =
        payload.map_err(|rejection| SchedulingError::InvalidInput(rejection.body_text()))?;
    request
        .validate()
        .map_err(|err| SchedulingError::InvalidInput(err.to_string()))?;
    Ok(request)
}

fn parse_slot_id(raw: &str) -> Result<SlotId, SchedulingError> {
    raw.trim()
        .parse()
        .map_err(|_| SchedulingError::InvalidInput("Invalid slot id".into()))
}

async fn get_slots<T: SlotService>(
    State(state): State<AppState<T>>,
) -> Result<Json<Vec<Slot>>, SchedulingError> {
    Ok(Json(call(&state, |service| service.list_slots()).await?))
}

async fn get_slot<T: SlotService>(
    State(state): State<AppState<T>>,
    Path(id): Path<String>,
) -> Result<Json<Slot>, SchedulingError> {
    let id = parse_slot_id(&id)?;
    Ok(Json(call(&state, move |service| service.get_slot(id)).await?))
}

async fn reserve_slot<T: SlotService>(
    State(state): State<AppState<T>>,
    Path(id): Path<String>,
    payload: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<Json<SlotResponse>, SchedulingError> {
    let id = parse_slot_id(&id)?;
    let candidate_name = parse_body(payload)?.candidate_name;
    let slot = call(&state, move |service| {
        service.reserve_slot(id, candidate_name)
    })
    .await?;
    Ok(Json(SlotResponse {
        message: "Slot reserved successfully".into(),
        slot,
    }))
}

async fn check_in_slot<T: SlotService>(
    State(state): State<AppState<T>>,
    Path(id): Path<String>,
) -> Result<Json<SlotResponse>, SchedulingError> {
    let id = parse_slot_id(&id)?;
    let slot = call(&state, move |service| service.check_in_slot(id)).await?;
    Ok(Json(SlotResponse {
        message: "Candidate checked in successfully".into(),
        slot,
    }))
}

async fn cancel_slot<T: SlotService>(
    State(state): State<AppState<T>>,
    Path(id): Path<String>,
) -> Result<Json<SlotResponse>, SchedulingError> {
    let id = parse_slot_id(&id)?;
    let slot = call(&state, move |service| service.cancel_slot(id)).await?;
    Ok(Json(SlotResponse {
        message: "Slot canceled successfully".into(),
        slot,
    }))
}

async fn create_block<T: SlotService>(
    State(state): State<AppState<T>>,
    payload: Result<Json<CreateBlockRequest>, JsonRejection>,
) -> Result<Json<BlockResponse>, SchedulingError> {
    let request = parse_body(payload)?;
    let BlockWithSlots { block, slots } =
        call(&state, move |service| service.create_block(request.into())).await?;
    Ok(Json(BlockResponse {
        message: "Block created successfully".into(),
        block,
        slots,
    }))
}

async fn get_blocks<T: SlotService>(
    State(state): State<AppState<T>>,
) -> Result<Json<Vec<Block>>, SchedulingError> {
    Ok(Json(call(&state, |service| service.list_blocks()).await?))
}

async fn get_block<T: SlotService>(
    State(state): State<AppState<T>>,
    Path(block_id): Path<String>,
) -> Result<Json<BlockWithSlots>, SchedulingError> {
    Ok(Json(
        call(&state, move |service| service.get_block(block_id)).await?,
    ))
}
