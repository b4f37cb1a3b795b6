//! HTTP request handlers for the HR back-office API.
//!
//! This module contains the handler functions for all API endpoints.
//! Store access is synchronous, so every core call runs on the blocking
//! pool.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::{Stream, StreamExt};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{HrError, HrResult};
use crate::leave::LeaveApplication;
use crate::models::Notification;

use super::request::{
    BalanceQuery, DecisionRequest, PunchBatch, RecomputeRequest, WeekQuery, WindowQuery,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/leave/requests", post(submit_leave_handler))
        .route("/leave/requests/:emp_id", get(history_handler))
        .route("/leave/approvals/pending/:approver", get(pending_handler))
        .route("/leave/approvals/:id/decision", post(decide_handler))
        .route("/leave/balances/:emp_id", get(balances_handler))
        .route("/leave/chain/:emp_id", get(chain_handler))
        .route("/attendance/:emp_id/recompute", post(recompute_handler))
        .route("/attendance/:emp_id/week", get(week_handler))
        .route("/attendance/:emp_id/window", get(window_handler))
        .route("/punches", post(ingest_handler))
        .route("/notifications/:emp_id/stream", get(notification_stream_handler))
        .with_state(state)
}

/// Runs a store-bound closure on the blocking pool.
async fn blocking<T, F>(f: F) -> HrResult<T>
where
    F: FnOnce() -> HrResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| HrError::internal(format!("blocking task failed: {}", e)))?
}

/// Turns a core result into a JSON response, logging the outcome.
fn respond<T: Serialize>(
    correlation_id: Uuid,
    operation: &'static str,
    started: Instant,
    success: StatusCode,
    result: HrResult<T>,
) -> Response {
    match result {
        Ok(body) => {
            info!(
                correlation_id = %correlation_id,
                operation,
                duration_us = started.elapsed().as_micros(),
                "request completed"
            );
            (success, Json(body)).into_response()
        }
        Err(err) => {
            if matches!(err, HrError::Internal { .. }) {
                error!(correlation_id = %correlation_id, operation, error = %err, "request failed");
            } else {
                warn!(correlation_id = %correlation_id, operation, error = %err, "request rejected");
            }
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Maps a body rejection to a structured 400.
fn json_rejection(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // serde's message names the offending field
            let body_text = err.body_text();
            warn!(correlation_id = %correlation_id, error = %body_text, "JSON data error");
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "JSON syntax error");
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::bad_request(error).into_response()
}

/// Maps a query-string rejection to a structured 400.
fn query_rejection(correlation_id: Uuid, rejection: QueryRejection) -> Response {
    let body_text = rejection.body_text();
    warn!(correlation_id = %correlation_id, error = %body_text, "query string rejected");
    ApiErrorResponse::bad_request(ApiError::validation_error(body_text)).into_response()
}

/// Handler for GET /health.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Handler for POST /leave/requests.
async fn submit_leave_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeaveApplication>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing leave submission");
    let application = match payload {
        Ok(Json(application)) => application,
        Err(rejection) => return json_rejection(correlation_id, rejection),
    };

    let started = Instant::now();
    let engine = state.engine().clone();
    let result = blocking(move || engine.apply(application, Utc::now())).await;
    respond(correlation_id, "submit_leave", started, StatusCode::CREATED, result)
}

/// Handler for POST /leave/approvals/:id/decision.
async fn decide_handler(
    State(state): State<AppState>,
    approval_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let Ok(Path(approval_id)) = approval_id else {
        return ApiErrorResponse::bad_request(ApiError::validation_error(
            "approval id must be an integer",
        ))
        .into_response();
    };
    info!(correlation_id = %correlation_id, approval_id, "Processing leave decision");
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return json_rejection(correlation_id, rejection),
    };

    let started = Instant::now();
    let engine = state.engine().clone();
    let result = blocking(move || {
        engine.decide(approval_id, request.decision, request.remarks, Utc::now())
    })
    .await;
    respond(correlation_id, "decide_leave", started, StatusCode::OK, result)
}

/// Handler for GET /leave/balances/:emp_id.
async fn balances_handler(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return query_rejection(correlation_id, rejection),
    };
    let started = Instant::now();
    let engine = state.engine().clone();
    let result = blocking(move || {
        let year = query
            .year
            .unwrap_or_else(|| engine.current_year(Utc::now()));
        engine.balance_summary(&emp_id, year)
    })
    .await;
    respond(correlation_id, "balance_summary", started, StatusCode::OK, result)
}

/// Handler for GET /leave/chain/:emp_id.
async fn chain_handler(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let engine = state.engine().clone();
    let result = blocking(move || engine.reporting_chain(&emp_id)).await;
    respond(correlation_id, "reporting_chain", started, StatusCode::OK, result)
}

/// Handler for GET /leave/requests/:emp_id.
async fn history_handler(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let engine = state.engine().clone();
    let result = blocking(move || engine.history(&emp_id)).await;
    respond(correlation_id, "leave_history", started, StatusCode::OK, result)
}

/// Handler for GET /leave/approvals/pending/:approver.
async fn pending_handler(
    State(state): State<AppState>,
    Path(approver): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let engine = state.engine().clone();
    let result = blocking(move || engine.pending_queue(&approver)).await;
    respond(correlation_id, "pending_queue", started, StatusCode::OK, result)
}

/// Handler for POST /attendance/:emp_id/recompute.
async fn recompute_handler(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
    payload: Result<Json<RecomputeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return json_rejection(correlation_id, rejection),
    };

    let started = Instant::now();
    let aggregator = state.aggregator().clone();
    let result = blocking(move || {
        let date = request
            .date
            .unwrap_or_else(|| aggregator.today(Utc::now()));
        aggregator.recompute_day(&emp_id, date)
    })
    .await;
    respond(correlation_id, "recompute_day", started, StatusCode::OK, result)
}

/// Handler for GET /attendance/:emp_id/week.
async fn week_handler(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
    query: Result<Query<WeekQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return query_rejection(correlation_id, rejection),
    };
    let started = Instant::now();
    let aggregator = state.aggregator().clone();
    let result = blocking(move || {
        let mode = query.mode.unwrap_or(aggregator.settings().weekly_mode);
        aggregator.week_with_mode(&emp_id, Utc::now(), mode)
    })
    .await;
    respond(correlation_id, "weekly_attendance", started, StatusCode::OK, result)
}

/// Handler for GET /attendance/:emp_id/window.
async fn window_handler(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return query_rejection(correlation_id, rejection),
    };
    let started = Instant::now();
    let days = query.days.unwrap_or(state.default_trailing_days());
    let aggregator = state.aggregator().clone();
    let result = blocking(move || aggregator.trailing_window(&emp_id, Utc::now(), days)).await;
    respond(correlation_id, "trailing_window", started, StatusCode::OK, result)
}

/// Handler for POST /punches.
///
/// Stores the batch, then refreshes the projection for every day it touched.
async fn ingest_handler(
    State(state): State<AppState>,
    payload: Result<Json<PunchBatch>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let batch = match payload {
        Ok(Json(batch)) => batch,
        Err(rejection) => return json_rejection(correlation_id, rejection),
    };
    info!(correlation_id = %correlation_id, records = batch.records.len(), "Processing punch batch");

    let started = Instant::now();
    let ingestor = state.ingestor().clone();
    let aggregator = state.aggregator().clone();
    let result = blocking(move || {
        let report = ingestor.ingest(&batch.records)?;
        if let Err(e) = aggregator.recompute_touched(&report) {
            warn!(error = %e, touched = report.touched.len(), "recompute after ingest failed");
        }
        Ok(report)
    })
    .await;
    respond(correlation_id, "ingest_punches", started, StatusCode::OK, result)
}

/// Handler for GET /notifications/:emp_id/stream.
///
/// Registers a channel for the caller; it stays reachable until the stream
/// is dropped and the next delivery to it fails.
async fn notification_stream_handler(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (tx, rx) = unbounded_channel::<Notification>();
    state.registry().register_channel(&emp_id, Arc::new(tx));
    info!(emp_id = %emp_id, "notification channel registered");

    let stream = UnboundedReceiverStream::new(rx)
        .map(|notification| Event::default().event("notification").json_data(notification));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::{ConfigLoader, HrConfig};
    use crate::models::{Employee, LeaveBalance, LeaveType, ReportingEdge, Role};
    use crate::notify::InMemoryChannelRegistry;
    use crate::store::Store;

    fn employee(emp_id: &str, role: Role) -> Employee {
        Employee {
            emp_id: emp_id.to_string(),
            name: emp_id.to_string(),
            role,
            active: true,
            device_user_id: None,
        }
    }

    fn create_test_state() -> AppState {
        let loader = ConfigLoader::from_config(HrConfig::default()).unwrap();
        let store = Store::open_in_memory().unwrap();
        let state = AppState::new(
            store.clone(),
            &loader,
            Arc::new(InMemoryChannelRegistry::default()),
        );
        let year = state.engine().current_year(Utc::now());
        store
            .write(|tx| {
                tx.upsert_employee(&employee("EMP001", Role::Employee))?;
                tx.upsert_employee(&employee("MGR001", Role::Manager))?;
                tx.insert_reporting_edge(&ReportingEdge::primary("EMP001", "MGR001"))?;
                tx.upsert_leave_type(&LeaveType {
                    name: "casual".to_string(),
                    active: true,
                })?;
                tx.insert_balance(&LeaveBalance::allot("EMP001", "casual", year, Decimal::new(12, 0)))
            })
            .unwrap();
        state
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_uri(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(create_router(create_test_state()), get_uri("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_submit_leave_returns_created() {
        let router = create_router(create_test_state());
        let (status, body) = send(
            router,
            post_json(
                "/leave/requests",
                json!({
                    "emp_id": "EMP001",
                    "leave_type": "casual",
                    "start_date": "2026-10-26",
                    "end_date": "2026-10-27",
                    "day_count": "2"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["request"]["status"], "pending");
        assert_eq!(body["approval"]["approver_emp_id"], "MGR001");
        assert_eq!(body["approval"]["level"], 1);
    }

    #[tokio::test]
    async fn test_submit_leave_malformed_json() {
        let router = create_router(create_test_state());
        let request = Request::builder()
            .method("POST")
            .uri("/leave/requests")
            .header("Content-Type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_submit_leave_missing_field_is_validation_error() {
        let router = create_router(create_test_state());
        let (status, body) = send(
            router,
            post_json(
                "/leave/requests",
                json!({ "emp_id": "EMP001", "leave_type": "casual" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_decide_non_numeric_id_is_validation_error() {
        let router = create_router(create_test_state());
        let (status, body) = send(
            router,
            post_json("/leave/approvals/abc/decision", json!({ "decision": "approved" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_decide_unknown_approval_is_not_found() {
        let router = create_router(create_test_state());
        let (status, body) = send(
            router,
            post_json("/leave/approvals/999/decision", json!({ "decision": "rejected" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_window_out_of_range_is_validation_error() {
        let router = create_router(create_test_state());
        let (status, body) = send(router, get_uri("/attendance/EMP001/window?days=0")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_window_non_numeric_days_is_validation_error() {
        let router = create_router(create_test_state());
        let (status, body) = send(router, get_uri("/attendance/EMP001/window?days=abc")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["message"].as_str().unwrap().contains("query string"));
    }

    #[tokio::test]
    async fn test_balances_non_numeric_year_is_validation_error() {
        let router = create_router(create_test_state());
        let (status, body) = send(router, get_uri("/leave/balances/EMP001?year=x")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_week_unknown_mode_is_validation_error() {
        let router = create_router(create_test_state());
        let (status, body) = send(router, get_uri("/attendance/EMP001/week?mode=fortnight")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_chain_lists_supervisors_nearest_first() {
        let router = create_router(create_test_state());
        let (status, body) = send(router.clone(), get_uri("/leave/chain/EMP001")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report_type"], "primary");
        assert_eq!(body["supervisors"], json!(["MGR001"]));

        let (status, body) = send(router.clone(), get_uri("/leave/chain/MGR001")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["supervisors"], json!([]));

        let (status, _) = send(router, get_uri("/leave/chain/NOBODY")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_recompute_unknown_employee_is_not_found() {
        let router = create_router(create_test_state());
        let (status, _) = send(
            router,
            post_json("/attendance/NOBODY/recompute", json!({ "date": "2026-10-19" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_recompute_day_without_punches_is_absent() {
        let router = create_router(create_test_state());
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let (status, body) = send(
            router,
            post_json("/attendance/EMP001/recompute", json!({ "date": date })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Absent");
        assert_eq!(body["total_hours"], "00:00");
    }
}
