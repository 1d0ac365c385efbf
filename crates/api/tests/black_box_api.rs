use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use talentmatch_api::app::services::{AppServices, build_services};
use talentmatch_api::config::AppConfig;
use talentmatch_auth::JwtClaims;
use talentmatch_core::{CandidateId, RequisitionId, UserId};
use talentmatch_infra::WorkerHandle;
use talentmatch_matching::{ApplyType, CompanySize, EmploymentType, JobPosting, WorkMode};
use talentmatch_ranking::{CandidateProfile, CollegeTier, PlatformSignal, Requisition};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
    _worker: WorkerHandle,
}

impl TestServer {
    async fn spawn(config: AppConfig) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let (services, worker) = build_services(config);
        let app = talentmatch_api::app::build_app(services.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
            _worker: worker,
        }
    }

    async fn spawn_default() -> Self {
        Self::spawn(test_config()).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

fn mint_jwt(user_id: UserId) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        issued_at: now - ChronoDuration::minutes(1),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn bangalore_job(listing_ref: &str) -> JobPosting {
    JobPosting {
        id: talentmatch_core::JobId::new(),
        listing_ref: listing_ref.to_string(),
        title: format!("Backend Engineer {listing_ref}"),
        company_name: "Acme".to_string(),
        location: "Bangalore, India".to_string(),
        work_mode: WorkMode::Remote,
        employment_type: EmploymentType::FullTime,
        internship_duration_weeks: None,
        company_size: CompanySize::Startup,
        stipend_min: Some(Decimal::from(30_000)),
        stipend_max: Some(Decimal::from(50_000)),
        stipend_currency: "INR".to_string(),
        job_url: format!("https://jobs.example/{listing_ref}"),
        apply_url: Some(format!("https://jobs.example/{listing_ref}/apply")),
        apply_type: Some(ApplyType::EasyApply),
        description: "x".repeat(200),
        published_at: chrono::NaiveDate::from_ymd_opt(2025, 6, 1),
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
    }
}

fn onsite_job(listing_ref: &str) -> JobPosting {
    JobPosting {
        work_mode: WorkMode::Onsite,
        location: "Delhi".to_string(),
        ..bangalore_job(listing_ref)
    }
}

fn preferences_payload() -> serde_json::Value {
    json!({
        "work_mode": "REMOTE",
        "employment_type": "FULL_TIME",
        "location": "Bangalore",
        "company_size": "STARTUP",
    })
}

fn seed_requisition(srv: &TestServer) -> RequisitionId {
    let requisition_id = RequisitionId::new();
    srv.services.directory.insert_requisition(Requisition {
        id: requisition_id,
        job_description: "rust backend role with distributed systems".to_string(),
        created_at: Utc::now(),
    });
    requisition_id
}

fn seed_candidate(srv: &TestServer, requisition_id: RequisitionId, name: &str, rating: f64) {
    srv.services.directory.insert_candidate(CandidateProfile {
        id: CandidateId::new(),
        requisition_id,
        name: name.to_string(),
        email: format!("{name}@example.com"),
        college_tier: Some(CollegeTier::Tier1),
        experience_years: Some(1.0),
        platform_signals: vec![PlatformSignal {
            platform: "codeforces".to_string(),
            metric: "rating".to_string(),
            value: rating,
        }],
        skills_text: "rust backend distributed systems".to_string(),
        projects_text: String::new(),
        created_at: Utc::now(),
    });
}

fn recruiter_preference_payload() -> serde_json::Value {
    json!({
        "college_tiers": ["TIER_1", "TIER_2"],
        "min_experience_years": 0.0,
        "max_experience_years": 2.0,
        "number_of_openings": 1,
        "coding_platform_criteria": [
            {"platform": "codeforces", "metric": "rating", "operator": "gte", "value": 1400}
        ],
    })
}

async fn poll_run_detail(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    path: &str,
) -> serde_json::Value {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let res = client
            .get(format!("{base_url}{path}"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "polling must always succeed");
        let body: serde_json::Value = res.json().await.unwrap();
        let status = body["status"].as_str().unwrap().to_string();
        if status == "COMPLETED" || status == "FAILED" {
            return body;
        }
        assert!(Instant::now() < deadline, "run did not reach a terminal state");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn health_is_open_but_runs_require_auth() {
    let srv = TestServer::spawn_default().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/matching/runs/list", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn matching_run_lifecycle_create_poll_complete() {
    let srv = TestServer::spawn_default().await;
    srv.services.catalog.insert(bangalore_job("match-1"));
    srv.services.catalog.insert(onsite_job("other-1"));

    let token = mint_jwt(UserId::new());
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/matching/runs", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "preferences": preferences_payload() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["status"], "PENDING");
    assert!(created["submitted_at"].is_string());
    let run_id = created["run_id"].as_str().unwrap().to_string();

    let detail = poll_run_detail(
        &client,
        &srv.base_url,
        &token,
        &format!("/matching/runs/{run_id}"),
    )
    .await;

    assert_eq!(detail["status"], "COMPLETED");
    assert_eq!(detail["filtered_jobs_count"], 1);
    assert!(detail["error"].is_null());
    assert_eq!(
        detail["timings"]["deterministic_metrics"]["after_primary_filters"],
        1
    );

    let top_jobs = detail["top_jobs"].as_array().unwrap();
    assert_eq!(top_jobs.len(), 1);
    assert_eq!(top_jobs[0]["rank"], 1);
    assert_eq!(top_jobs[0]["listing_ref"], "match-1");
    // Scores cross the wire as decimal strings.
    assert!(top_jobs[0]["selection_probability"].is_string());
    assert_eq!(detail["preference_used"]["location"], "bangalore");
}

#[tokio::test]
async fn validation_reports_every_violation_at_once() {
    let srv = TestServer::spawn_default().await;
    let token = mint_jwt(UserId::new());
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/matching/runs", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "preferences": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    let fields = body["fields"].as_object().unwrap();
    for field in [
        "preferences.work_mode",
        "preferences.employment_type",
        "preferences.location",
        "preferences.company_size",
    ] {
        assert!(fields.contains_key(field), "missing {field}");
    }
}

#[tokio::test]
async fn disabled_matching_flag_short_circuits_before_any_record() {
    let srv = TestServer::spawn(AppConfig {
        matching_runs_enabled: false,
        ..test_config()
    })
    .await;
    let user = UserId::new();
    let token = mint_jwt(user);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/matching/runs", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "preferences": preferences_payload() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = client
        .get(format!("{}/matching/runs/list", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn run_detail_is_owner_scoped() {
    let srv = TestServer::spawn_default().await;
    srv.services.catalog.insert(bangalore_job("match-1"));

    let owner_token = mint_jwt(UserId::new());
    let other_token = mint_jwt(UserId::new());
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/matching/runs", srv.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({ "preferences": preferences_payload() }))
        .send()
        .await
        .unwrap();
    let created: serde_json::Value = res.json().await.unwrap();
    let run_id = created["run_id"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/matching/runs/{run_id}", srv.base_url))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn matching_run_list_is_newest_first() {
    let srv = TestServer::spawn_default().await;
    let user = UserId::new();
    let token = mint_jwt(user);
    let client = reqwest::Client::new();

    let mut created_ids = Vec::new();
    for _ in 0..3 {
        let res = client
            .post(format!("{}/matching/runs", srv.base_url))
            .bearer_auth(&token)
            .json(&json!({ "preferences": preferences_payload() }))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = res.json().await.unwrap();
        created_ids.push(body["run_id"].as_str().unwrap().to_string());
    }

    let res = client
        .get(format!("{}/matching/runs/list", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 3);

    let listed: Vec<_> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["run_id"].as_str().unwrap().to_string())
        .collect();
    let newest_first: Vec<_> = created_ids.iter().rev().cloned().collect();
    assert_eq!(listed, newest_first);
}

#[tokio::test]
async fn ranking_run_completes_and_is_reused_unless_forced() {
    let srv = TestServer::spawn_default().await;
    let requisition_id = seed_requisition(&srv);
    seed_candidate(&srv, requisition_id, "alice", 1600.0);
    seed_candidate(&srv, requisition_id, "bob", 1450.0);

    let token = mint_jwt(UserId::new());
    let client = reqwest::Client::new();

    // Upsert the recruiter preference through the API.
    let res = client
        .post(format!(
            "{}/ranking/jobs/{requisition_id}/preference",
            srv.base_url
        ))
        .bearer_auth(&token)
        .json(&recruiter_preference_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/ranking/runs", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "job_id": requisition_id.to_string(), "batch_size": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let created: serde_json::Value = res.json().await.unwrap();
    let run_id = created["run_id"].as_str().unwrap().to_string();

    let detail = poll_run_detail(
        &client,
        &srv.base_url,
        &token,
        &format!("/ranking/runs/{run_id}"),
    )
    .await;
    assert_eq!(detail["status"], "COMPLETED");
    assert_eq!(detail["total_candidates"], 2);
    assert_eq!(detail["processed_candidates"], 2);
    assert_eq!(detail["shortlisted_count"], 1);
    let results = detail["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["rank"], 1);
    assert_eq!(results[0]["is_shortlisted"], true);
    assert!(results[0]["final_score"].is_string());

    // Same job, force_recompute=false: idempotent short-circuit.
    let res = client
        .post(format!("{}/ranking/runs", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "job_id": requisition_id.to_string(), "force_recompute": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let reused: serde_json::Value = res.json().await.unwrap();
    assert_eq!(reused["run_id"].as_str().unwrap(), run_id);
    assert_eq!(reused["status"], "COMPLETED");

    // force_recompute=true always starts a new run; the old one stays.
    let res = client
        .post(format!("{}/ranking/runs", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "job_id": requisition_id.to_string(), "force_recompute": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let forced: serde_json::Value = res.json().await.unwrap();
    assert_ne!(forced["run_id"].as_str().unwrap(), run_id);

    let res = client
        .get(format!("{}/ranking/runs/{run_id}", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn ranking_run_without_preference_creates_nothing() {
    let srv = TestServer::spawn_default().await;
    let requisition_id = seed_requisition(&srv);

    let token = mint_jwt(UserId::new());
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/ranking/runs", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "job_id": requisition_id.to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/ranking/jobs/{requisition_id}/runs", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn preview_filters_without_creating_a_run() {
    let srv = TestServer::spawn_default().await;
    srv.services.catalog.insert(bangalore_job("match-1"));
    srv.services.catalog.insert(onsite_job("other-1"));

    let token = mint_jwt(UserId::new());
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/preferences/match-jobs", srv.base_url))
        .bearer_auth(&token)
        .json(&preferences_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["preference"]["location"], "bangalore");
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["listing_ref"], "match-1");
    assert_eq!(results[0]["stipend_min"], "30000");

    let res = client
        .get(format!("{}/matching/runs/list", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 0);
}
