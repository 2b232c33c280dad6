//! Per-resource HTTP handlers.
//!
//! Every handler is request-validate, one transaction against the store,
//! respond. Storage errors map onto statuses here: NotFound -> 404,
//! Constraint -> 409, everything else -> 500; request validation failures
//! are 422 before the store is touched.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::model::connector::{ConnectorUpdate, OverloadDimension, Technique};
use crate::model::exercise::{Exercise, ExerciseState, ExerciseStateUpdate, ExerciseUpdate};
use crate::model::instrument::{Instrument, InstrumentDetail, InstrumentUpdate};
use crate::model::practice::{
    ExerciseInstance, ExerciseInstanceUpdate, ExerciseLog, ExerciseLogUpdate, Parameters,
    Practice, PracticeUpdate,
};
use crate::model::tuning::{Tuning, TuningDetail, TuningUpdate};
use crate::model::{CompletionStatus, DomainType, FatigueProfile, QualityRating, SessionType};
use crate::server::AppState;
use crate::storage::store::DbStats;
use crate::storage::Txn;
use crate::{Error, Result};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn storage_error(err: Error) -> ApiError {
    let status = match &err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Constraint(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn unprocessable(message: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Run one operation inside a single transaction against the shared store.
async fn with_store<T, F>(state: &AppState, f: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce(&Txn<'_>) -> Result<T>,
{
    let mut store = state.store.lock().await;
    store.with_txn(f).map_err(storage_error)
}

#[derive(Deserialize)]
pub struct ListParams {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl ListParams {
    fn bounds(&self) -> (usize, usize) {
        (self.skip.unwrap_or(0), self.limit.unwrap_or(100))
    }
}

// ========== Health ==========

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn health_db(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let store = state.store.lock().await;
    match store.ping() {
        Ok(()) => Json(serde_json::json!({"status": "ok", "database": "connected"})),
        Err(e) => Json(serde_json::json!({"status": "error", "database": e.to_string()})),
    }
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Json<DbStats>, ApiError> {
    let stats = with_store(&state, |txn| txn.stats()).await?;
    Ok(Json(stats))
}

// ========== Instruments ==========

#[derive(Deserialize)]
pub struct InstrumentCreate {
    pub name: String,
    #[serde(flatten)]
    pub detail: InstrumentDetail,
}

fn validate_instrument_create(body: &InstrumentCreate) -> std::result::Result<(), ApiError> {
    if body.name.trim().is_empty() {
        return Err(unprocessable("name must not be empty"));
    }
    if let InstrumentDetail::Stringed { string_count, .. } = body.detail {
        if string_count < 1 {
            return Err(unprocessable("string_count must be at least 1"));
        }
    }
    Ok(())
}

pub async fn create_instrument(
    State(state): State<Arc<AppState>>,
    Json(body): Json<InstrumentCreate>,
) -> std::result::Result<(StatusCode, Json<Instrument>), ApiError> {
    validate_instrument_create(&body)?;
    let instrument =
        with_store(&state, |txn| txn.create_instrument(&body.name, &body.detail)).await?;
    Ok((StatusCode::CREATED, Json(instrument)))
}

pub async fn list_instruments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> std::result::Result<Json<Vec<Instrument>>, ApiError> {
    let (skip, limit) = params.bounds();
    let instruments = with_store(&state, |txn| txn.list_instruments(skip, limit)).await?;
    Ok(Json(instruments))
}

pub async fn get_instrument(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Instrument>, ApiError> {
    let instrument = with_store(&state, |txn| txn.get_instrument(id)).await?;
    Ok(Json(instrument))
}

pub async fn update_instrument(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<InstrumentUpdate>,
) -> std::result::Result<Json<Instrument>, ApiError> {
    if body.string_count == Some(0) {
        return Err(unprocessable("string_count must be at least 1"));
    }
    let instrument = with_store(&state, |txn| txn.update_instrument(id, &body)).await?;
    Ok(Json(instrument))
}

pub async fn delete_instrument(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.delete_instrument(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_instrument_practices(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Vec<Practice>>, ApiError> {
    let practices = with_store(&state, |txn| {
        txn.get_instrument(id)?;
        txn.practices_for_instrument(id)
    })
    .await?;
    Ok(Json(practices))
}

pub async fn list_instrument_techniques(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Vec<Technique>>, ApiError> {
    let techniques = with_store(&state, |txn| {
        txn.get_instrument(id)?;
        txn.techniques_for_instrument(id)
    })
    .await?;
    Ok(Json(techniques))
}

pub async fn link_instrument_technique(
    State(state): State<Arc<AppState>>,
    Path((id, technique_id)): Path<(i64, i64)>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.link_instrument_technique(id, technique_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlink_instrument_technique(
    State(state): State<Arc<AppState>>,
    Path((id, technique_id)): Path<(i64, i64)>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.unlink_instrument_technique(id, technique_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_instrument_tunings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Vec<Tuning>>, ApiError> {
    let tunings = with_store(&state, |txn| {
        txn.get_instrument(id)?;
        txn.tunings_for_instrument(id)
    })
    .await?;
    Ok(Json(tunings))
}

pub async fn link_instrument_tuning(
    State(state): State<Arc<AppState>>,
    Path((id, tuning_id)): Path<(i64, i64)>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.link_instrument_tuning(id, tuning_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlink_instrument_tuning(
    State(state): State<Arc<AppState>>,
    Path((id, tuning_id)): Path<(i64, i64)>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.unlink_instrument_tuning(id, tuning_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Tunings ==========

#[derive(Deserialize)]
pub struct TuningCreate {
    pub name: String,
    #[serde(flatten)]
    pub detail: TuningDetail,
}

pub async fn create_tuning(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TuningCreate>,
) -> std::result::Result<(StatusCode, Json<Tuning>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(unprocessable("name must not be empty"));
    }
    let tuning = with_store(&state, |txn| txn.create_tuning(&body.name, &body.detail)).await?;
    Ok((StatusCode::CREATED, Json(tuning)))
}

pub async fn list_tunings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> std::result::Result<Json<Vec<Tuning>>, ApiError> {
    let (skip, limit) = params.bounds();
    let tunings = with_store(&state, |txn| txn.list_tunings(skip, limit)).await?;
    Ok(Json(tunings))
}

pub async fn get_tuning(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Tuning>, ApiError> {
    let tuning = with_store(&state, |txn| txn.get_tuning(id)).await?;
    Ok(Json(tuning))
}

pub async fn update_tuning(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<TuningUpdate>,
) -> std::result::Result<Json<Tuning>, ApiError> {
    let tuning = with_store(&state, |txn| txn.update_tuning(id, &body)).await?;
    Ok(Json(tuning))
}

pub async fn delete_tuning(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.delete_tuning(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_tuning_instruments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Vec<Instrument>>, ApiError> {
    let instruments = with_store(&state, |txn| {
        txn.get_tuning(id)?;
        txn.instruments_for_tuning(id)
    })
    .await?;
    Ok(Json(instruments))
}

// ========== Exercises ==========

#[derive(Deserialize)]
pub struct ExerciseCreate {
    pub name: String,
    pub domains: Vec<DomainType>,
    #[serde(default)]
    pub technique_tags: Vec<String>,
    pub instrument_compatibility: Option<Vec<String>>,
}

pub async fn create_exercise(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExerciseCreate>,
) -> std::result::Result<(StatusCode, Json<Exercise>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(unprocessable("name must not be empty"));
    }
    let exercise = with_store(&state, |txn| {
        txn.create_exercise(
            &body.name,
            &body.domains,
            &body.technique_tags,
            body.instrument_compatibility.as_deref(),
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

pub async fn list_exercises(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> std::result::Result<Json<Vec<Exercise>>, ApiError> {
    let (skip, limit) = params.bounds();
    let exercises = with_store(&state, |txn| txn.list_exercises(skip, limit)).await?;
    Ok(Json(exercises))
}

pub async fn get_exercise(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Exercise>, ApiError> {
    let exercise = with_store(&state, |txn| txn.get_exercise(id)).await?;
    Ok(Json(exercise))
}

pub async fn update_exercise(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ExerciseUpdate>,
) -> std::result::Result<Json<Exercise>, ApiError> {
    let exercise = with_store(&state, |txn| txn.update_exercise(id, &body)).await?;
    Ok(Json(exercise))
}

pub async fn delete_exercise(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.delete_exercise(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Exercise State ==========

#[derive(Deserialize)]
pub struct ExerciseStateCreate {
    pub last_practiced_date: Option<NaiveDate>,
    #[serde(default)]
    pub rolling_minutes_7d: u32,
    #[serde(default)]
    pub rolling_minutes_28d: u32,
    #[serde(default)]
    pub mastery_estimate: f64,
    pub last_fatigue_profile: Option<FatigueProfile>,
}

fn validate_mastery(mastery: f64) -> std::result::Result<(), ApiError> {
    if !(0.0..=1.0).contains(&mastery) {
        return Err(unprocessable("mastery_estimate must be between 0.0 and 1.0"));
    }
    Ok(())
}

pub async fn create_exercise_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ExerciseStateCreate>,
) -> std::result::Result<(StatusCode, Json<ExerciseState>), ApiError> {
    validate_mastery(body.mastery_estimate)?;
    let exercise_state = with_store(&state, |txn| {
        txn.get_exercise(id)?;
        txn.create_exercise_state(
            id,
            body.last_practiced_date,
            body.rolling_minutes_7d,
            body.rolling_minutes_28d,
            body.mastery_estimate,
            body.last_fatigue_profile,
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(exercise_state)))
}

pub async fn get_exercise_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<ExerciseState>, ApiError> {
    let exercise_state = with_store(&state, |txn| {
        txn.get_exercise(id)?;
        txn.state_for_exercise(id)?
            .ok_or(Error::NotFound("exercise state"))
    })
    .await?;
    Ok(Json(exercise_state))
}

pub async fn update_exercise_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ExerciseStateUpdate>,
) -> std::result::Result<Json<ExerciseState>, ApiError> {
    if let Some(mastery) = body.mastery_estimate {
        validate_mastery(mastery)?;
    }
    let exercise_state = with_store(&state, |txn| txn.update_exercise_state(id, &body)).await?;
    Ok(Json(exercise_state))
}

pub async fn delete_exercise_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.delete_exercise_state(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_exercise_techniques(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Vec<Technique>>, ApiError> {
    let techniques = with_store(&state, |txn| {
        txn.get_exercise(id)?;
        txn.techniques_for_exercise(id)
    })
    .await?;
    Ok(Json(techniques))
}

pub async fn link_exercise_technique(
    State(state): State<Arc<AppState>>,
    Path((id, technique_id)): Path<(i64, i64)>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.link_exercise_technique(id, technique_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlink_exercise_technique(
    State(state): State<Arc<AppState>>,
    Path((id, technique_id)): Path<(i64, i64)>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.unlink_exercise_technique(id, technique_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_exercise_overload_dimensions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Vec<OverloadDimension>>, ApiError> {
    let dimensions = with_store(&state, |txn| {
        txn.get_exercise(id)?;
        txn.overload_dimensions_for_exercise(id)
    })
    .await?;
    Ok(Json(dimensions))
}

pub async fn link_exercise_overload_dimension(
    State(state): State<Arc<AppState>>,
    Path((id, dimension_id)): Path<(i64, i64)>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| {
        txn.link_exercise_overload_dimension(id, dimension_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlink_exercise_overload_dimension(
    State(state): State<Arc<AppState>>,
    Path((id, dimension_id)): Path<(i64, i64)>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| {
        txn.unlink_exercise_overload_dimension(id, dimension_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Techniques ==========

#[derive(Deserialize)]
pub struct ConnectorCreate {
    pub name: String,
    pub description: Option<String>,
}

pub async fn create_technique(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConnectorCreate>,
) -> std::result::Result<(StatusCode, Json<Technique>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(unprocessable("name must not be empty"));
    }
    let technique = with_store(&state, |txn| {
        txn.create_technique(&body.name, body.description.as_deref())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(technique)))
}

pub async fn list_techniques(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> std::result::Result<Json<Vec<Technique>>, ApiError> {
    let (skip, limit) = params.bounds();
    let techniques = with_store(&state, |txn| txn.list_techniques(skip, limit)).await?;
    Ok(Json(techniques))
}

pub async fn get_technique(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Technique>, ApiError> {
    let technique = with_store(&state, |txn| txn.get_technique(id)).await?;
    Ok(Json(technique))
}

pub async fn update_technique(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ConnectorUpdate>,
) -> std::result::Result<Json<Technique>, ApiError> {
    let technique = with_store(&state, |txn| txn.update_technique(id, &body)).await?;
    Ok(Json(technique))
}

pub async fn delete_technique(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.delete_technique(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_technique_exercises(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Vec<Exercise>>, ApiError> {
    let exercises = with_store(&state, |txn| {
        txn.get_technique(id)?;
        txn.exercises_for_technique(id)
    })
    .await?;
    Ok(Json(exercises))
}

pub async fn list_technique_instruments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Vec<Instrument>>, ApiError> {
    let instruments = with_store(&state, |txn| {
        txn.get_technique(id)?;
        txn.instruments_for_technique(id)
    })
    .await?;
    Ok(Json(instruments))
}

// ========== Overload Dimensions ==========

pub async fn create_overload_dimension(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConnectorCreate>,
) -> std::result::Result<(StatusCode, Json<OverloadDimension>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(unprocessable("name must not be empty"));
    }
    let dimension = with_store(&state, |txn| {
        txn.create_overload_dimension(&body.name, body.description.as_deref())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(dimension)))
}

pub async fn list_overload_dimensions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> std::result::Result<Json<Vec<OverloadDimension>>, ApiError> {
    let (skip, limit) = params.bounds();
    let dimensions = with_store(&state, |txn| txn.list_overload_dimensions(skip, limit)).await?;
    Ok(Json(dimensions))
}

pub async fn get_overload_dimension(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<OverloadDimension>, ApiError> {
    let dimension = with_store(&state, |txn| txn.get_overload_dimension(id)).await?;
    Ok(Json(dimension))
}

pub async fn update_overload_dimension(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ConnectorUpdate>,
) -> std::result::Result<Json<OverloadDimension>, ApiError> {
    let dimension = with_store(&state, |txn| txn.update_overload_dimension(id, &body)).await?;
    Ok(Json(dimension))
}

pub async fn delete_overload_dimension(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.delete_overload_dimension(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_overload_dimension_exercises(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Vec<Exercise>>, ApiError> {
    let exercises = with_store(&state, |txn| {
        txn.get_overload_dimension(id)?;
        txn.exercises_for_overload_dimension(id)
    })
    .await?;
    Ok(Json(exercises))
}

// ========== Practices ==========

#[derive(Deserialize)]
pub struct PracticeCreate {
    pub instrument_id: i64,
    pub session_date: NaiveDate,
    pub session_type: SessionType,
    pub total_minutes: u32,
}

pub async fn create_practice(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PracticeCreate>,
) -> std::result::Result<(StatusCode, Json<Practice>), ApiError> {
    if body.total_minutes < 1 {
        return Err(unprocessable("total_minutes must be at least 1"));
    }
    let practice = with_store(&state, |txn| {
        txn.create_practice(
            body.instrument_id,
            body.session_date,
            body.session_type,
            body.total_minutes,
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(practice)))
}

pub async fn list_practices(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> std::result::Result<Json<Vec<Practice>>, ApiError> {
    let (skip, limit) = params.bounds();
    let practices = with_store(&state, |txn| txn.list_practices(skip, limit)).await?;
    Ok(Json(practices))
}

pub async fn get_practice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Practice>, ApiError> {
    let practice = with_store(&state, |txn| txn.get_practice(id)).await?;
    Ok(Json(practice))
}

pub async fn update_practice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<PracticeUpdate>,
) -> std::result::Result<Json<Practice>, ApiError> {
    if body.total_minutes == Some(0) {
        return Err(unprocessable("total_minutes must be at least 1"));
    }
    let practice = with_store(&state, |txn| txn.update_practice(id, &body)).await?;
    Ok(Json(practice))
}

pub async fn delete_practice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.delete_practice(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Exercise Instances ==========

#[derive(Deserialize)]
pub struct ExerciseInstanceCreate {
    pub exercise_id: i64,
    pub sequence_order: u32,
    #[serde(default)]
    pub parameters: Parameters,
}

pub async fn create_exercise_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ExerciseInstanceCreate>,
) -> std::result::Result<(StatusCode, Json<ExerciseInstance>), ApiError> {
    if body.sequence_order < 1 {
        return Err(unprocessable("sequence_order must be at least 1"));
    }
    let instance = with_store(&state, |txn| {
        txn.get_practice(id)?;
        txn.create_exercise_instance(id, body.exercise_id, body.sequence_order, &body.parameters)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

pub async fn list_practice_instances(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Vec<ExerciseInstance>>, ApiError> {
    let instances = with_store(&state, |txn| {
        txn.get_practice(id)?;
        txn.instances_for_practice(id)
    })
    .await?;
    Ok(Json(instances))
}

pub async fn get_exercise_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<ExerciseInstance>, ApiError> {
    let instance = with_store(&state, |txn| txn.get_exercise_instance(id)).await?;
    Ok(Json(instance))
}

pub async fn update_exercise_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ExerciseInstanceUpdate>,
) -> std::result::Result<Json<ExerciseInstance>, ApiError> {
    if body.sequence_order == Some(0) {
        return Err(unprocessable("sequence_order must be at least 1"));
    }
    let instance = with_store(&state, |txn| txn.update_exercise_instance(id, &body)).await?;
    Ok(Json(instance))
}

pub async fn delete_exercise_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.delete_exercise_instance(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Exercise Logs ==========

#[derive(Deserialize)]
pub struct ExerciseLogCreate {
    pub completion_status: CompletionStatus,
    pub quality_rating: QualityRating,
    pub notes: Option<String>,
}

pub async fn create_exercise_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ExerciseLogCreate>,
) -> std::result::Result<(StatusCode, Json<ExerciseLog>), ApiError> {
    let log = with_store(&state, |txn| {
        txn.get_exercise_instance(id)?;
        txn.create_exercise_log(
            id,
            body.completion_status,
            body.quality_rating,
            body.notes.as_deref(),
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(log)))
}

pub async fn get_instance_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<ExerciseLog>, ApiError> {
    let log = with_store(&state, |txn| {
        txn.get_exercise_instance(id)?;
        txn.log_for_instance(id)?.ok_or(Error::NotFound("exercise log"))
    })
    .await?;
    Ok(Json(log))
}

pub async fn get_exercise_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<ExerciseLog>, ApiError> {
    let log = with_store(&state, |txn| txn.get_exercise_log(id)).await?;
    Ok(Json(log))
}

pub async fn update_exercise_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ExerciseLogUpdate>,
) -> std::result::Result<Json<ExerciseLog>, ApiError> {
    let log = with_store(&state, |txn| txn.update_exercise_log(id, &body)).await?;
    Ok(Json(log))
}

pub async fn delete_exercise_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> std::result::Result<StatusCode, ApiError> {
    with_store(&state, |txn| txn.delete_exercise_log(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
