//! Matching-run endpoints and the synchronous preference preview.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use talentmatch_core::RunId;
use talentmatch_infra::{ActivePreferenceStore, JobCatalog, PipelineTask};
use talentmatch_matching::filter_jobs;
use talentmatch_runs::{MatchingRun, RunStore};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/preferences/match-jobs", post(match_jobs_preview))
        .route("/matching/runs", post(create_matching_run))
        .route("/matching/runs/list", get(list_matching_runs))
        .route("/matching/runs/:run_id", get(matching_run_detail))
}

pub async fn create_matching_run(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateMatchingRunRequest>,
) -> axum::response::Response {
    // Flag check comes first: no record may exist when the feature is off.
    if !services.config.matching_runs_enabled {
        return ApiError::FeatureDisabled("Matching runs are disabled.").into_response();
    }

    let Some(draft) = body.preferences else {
        return ApiError::validation_field("preferences", "This field is required and must be an object.")
            .into_response();
    };

    let preference = match draft.normalize() {
        Ok(preference) => preference,
        Err(errors) => return ApiError::Validation(errors.prefixed("preferences")).into_response(),
    };

    if draft.save_preference {
        services
            .active_prefs
            .upsert_active(caller.user_id(), preference.clone());
    }

    let run = MatchingRun::new(
        caller.user_id(),
        preference,
        body.candidate_profile.unwrap_or_else(|| serde_json::json!({})),
    );
    let run = match services.runs.insert_matching(run) {
        Ok(run) => run,
        Err(e) => return ApiError::from(e).into_response(),
    };

    services.launcher.launch(PipelineTask::MatchJobs(run.id));

    (StatusCode::ACCEPTED, Json(dto::matching_run_created(&run))).into_response()
}

pub async fn list_matching_runs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<dto::PageQuery>,
) -> axum::response::Response {
    let page = query.page();
    let page_size = services.config.page_size;
    let offset = (page - 1) * page_size;

    let (runs, total) = match services.runs.list_matching(caller.user_id(), offset, page_size) {
        Ok(listed) => listed,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let results = runs.iter().map(dto::matching_run_list_item).collect();
    (
        StatusCode::OK,
        Json(dto::page_envelope(total, page, page_size, results)),
    )
        .into_response()
}

pub async fn matching_run_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(run_id): Path<String>,
) -> axum::response::Response {
    let Ok(run_id) = run_id.parse::<RunId>() else {
        return ApiError::NotFound.into_response();
    };

    let run = match services.runs.matching_run(run_id) {
        Ok(run) => run,
        Err(e) => return ApiError::from(e).into_response(),
    };

    // Absent and not-owned are indistinguishable to the caller.
    match run {
        Some(run) if run.user_id == caller.user_id() => {
            (StatusCode::OK, Json(dto::matching_run_detail(&run))).into_response()
        }
        _ => ApiError::NotFound.into_response(),
    }
}

/// Synchronous preview: validate, normalize, optionally persist the active
/// preference, and return a page of deterministically filtered jobs. No run
/// is created.
pub async fn match_jobs_preview(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<dto::PageQuery>,
    Json(draft): Json<dto::MatchJobsPreviewRequest>,
) -> axum::response::Response {
    let preference = match draft.normalize() {
        Ok(preference) => preference,
        Err(field_errors) => return ApiError::Validation(field_errors).into_response(),
    };

    if draft.save_preference {
        services
            .active_prefs
            .upsert_active(caller.user_id(), preference.clone());
    }

    let corpus = services.catalog.all_jobs();
    let outcome = filter_jobs(&corpus, &preference, services.config.max_agent_jobs);

    let page = query.page();
    let page_size = services.config.page_size;
    let results: Vec<_> = outcome
        .jobs
        .iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(dto::job_to_json)
        .collect();

    let mut envelope = dto::page_envelope(outcome.metrics.ordered_count, page, page_size, results);
    envelope["preference"] = dto::preference_to_json(&preference);
    (StatusCode::OK, Json(envelope)).into_response()
}
