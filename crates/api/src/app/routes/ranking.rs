//! Candidate-ranking endpoints: recruiter preference upsert, run creation
//! with reuse, listing, and detail.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use talentmatch_core::{RequisitionId, RunId};
use talentmatch_infra::{CandidateDirectory, PipelineTask, RecruiterPreferenceStore};
use talentmatch_runs::{CandidateRankingRun, RunStore};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/ranking/runs", post(create_ranking_run))
        .route("/ranking/runs/:run_id", get(ranking_run_detail))
        .route("/ranking/jobs/:job_id/runs", get(list_ranking_runs))
        .route("/ranking/jobs/:job_id/preference", post(upsert_recruiter_preference))
}

pub async fn upsert_recruiter_preference(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(_caller): Extension<CallerContext>,
    Path(job_id): Path<String>,
    Json(draft): Json<dto::RecruiterPreferenceUpsertRequest>,
) -> axum::response::Response {
    let Ok(requisition_id) = job_id.parse::<RequisitionId>() else {
        return ApiError::NotFound.into_response();
    };
    if services.directory.requisition(requisition_id).is_none() {
        return ApiError::NotFound.into_response();
    }

    let preference = match draft.validate(requisition_id) {
        Ok(preference) => preference,
        Err(errors) => return ApiError::Validation(errors).into_response(),
    };

    services.recruiter_prefs.upsert(preference.clone());
    (
        StatusCode::CREATED,
        Json(dto::recruiter_preference_to_json(&preference)),
    )
        .into_response()
}

pub async fn create_ranking_run(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(_caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateRankingRunRequest>,
) -> axum::response::Response {
    if !services.config.ranking_runs_enabled {
        return ApiError::FeatureDisabled("Candidate ranking is disabled.").into_response();
    }

    let requisition_id = match body.job_id.as_deref() {
        None | Some("") => {
            return ApiError::validation_field("job_id", "This field is required.").into_response();
        }
        Some(raw) => match raw.parse::<RequisitionId>() {
            Ok(id) => id,
            Err(_) => {
                return ApiError::validation_field("job_id", "Must be a valid UUID.").into_response();
            }
        },
    };

    if services.directory.requisition(requisition_id).is_none() {
        return ApiError::NotFound.into_response();
    }

    // Precondition for any ranking run: the recruiter preference must exist.
    // Checked before creation so no run record is left behind on rejection.
    if services.recruiter_prefs.preference_for(requisition_id).is_none() {
        return ApiError::validation_field("job_id", "No recruiter preference found for this job.")
            .into_response();
    }

    let batch_size = match body.batch_size {
        None => services.config.default_batch_size,
        Some(n) if n >= 1 => n as usize,
        Some(_) => {
            return ApiError::validation_field("batch_size", "Must be at least 1.").into_response();
        }
    };
    let force_recompute = body.force_recompute.unwrap_or(false);

    let run = CandidateRankingRun::new(requisition_id, batch_size, services.ranking_model.clone());
    let creation = match services.runs.create_ranking_or_reuse(run, force_recompute) {
        Ok(creation) => creation,
        Err(e) => return ApiError::from(e).into_response(),
    };

    if creation.reused {
        // Idempotent short-circuit: the existing COMPLETED run, unchanged.
        return (StatusCode::OK, Json(dto::ranking_run_created(&creation.run))).into_response();
    }

    services
        .launcher
        .launch(PipelineTask::RankCandidates(creation.run.id));

    (
        StatusCode::ACCEPTED,
        Json(dto::ranking_run_created(&creation.run)),
    )
        .into_response()
}

pub async fn list_ranking_runs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(_caller): Extension<CallerContext>,
    Path(job_id): Path<String>,
    Query(query): Query<dto::PageQuery>,
) -> axum::response::Response {
    let Ok(requisition_id) = job_id.parse::<RequisitionId>() else {
        return ApiError::NotFound.into_response();
    };

    let page = query.page();
    let page_size = services.config.page_size;
    let offset = (page - 1) * page_size;

    let (runs, total) = match services.runs.list_ranking(requisition_id, offset, page_size) {
        Ok(listed) => listed,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let results = runs.iter().map(dto::ranking_run_list_item).collect();
    (
        StatusCode::OK,
        Json(dto::page_envelope(total, page, page_size, results)),
    )
        .into_response()
}

pub async fn ranking_run_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(_caller): Extension<CallerContext>,
    Path(run_id): Path<String>,
) -> axum::response::Response {
    let Ok(run_id) = run_id.parse::<RunId>() else {
        return ApiError::NotFound.into_response();
    };

    match services.runs.ranking_run(run_id) {
        Ok(Some(run)) => (StatusCode::OK, Json(dto::ranking_run_detail(&run))).into_response(),
        Ok(None) => ApiError::NotFound.into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
