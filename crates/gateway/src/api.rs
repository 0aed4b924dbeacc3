//! Schedule editor endpoints.
//!
//! - `GET  /fetch_xml?date=YYYY-MM-DD`: current schedule (first call backs it up)
//! - `POST /validate_schedule`: rule check of an edited sequence
//! - `POST /update_schedule`: rebuild one channel and commit
//! - `GET  /rules`: compiled rule listing

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use chrono::{Local, NaiveDate};
use epgedit_core::{Error, ProgramEntry};
use epgedit_rules::{NeighbourOutcome, RuleEngine, RuleSet, ValidationVerdict};
use epgedit_schedule::{
    RebuildOptions, apply_request, draft_document, filter_by_date, parse_request, render_document,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::SharedState;
use crate::error::ApiError;

fn xml_response(xml: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

// ── Fetch ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FetchQuery {
    #[serde(default)]
    pub date: Option<String>,
}

pub async fn fetch_xml(
    State(state): State<SharedState>,
    Query(query): Query<FetchQuery>,
) -> Result<Response, ApiError> {
    let date = query
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|e| Error::malformed(format!("invalid date '{d}': {e}")))
        })
        .transpose()?;

    state.ensure_backup().await?;

    let document = state.store.load_document().await?;
    let document = match date {
        Some(day) => filter_by_date(&document, day),
        None => document,
    };
    debug!(programs = document.programs.len(), ?date, "Serving schedule");
    Ok(xml_response(render_document(&document)?))
}

// ── Validate ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub schedule: Vec<ProgramEntry>,
}

async fn load_engine(state: &SharedState) -> Result<RuleEngine, ApiError> {
    let sources = state.store.load_rule_sources().await?;
    let rules = RuleSet::from_sources(&sources)?;
    Ok(RuleEngine::new(rules).with_slots(state.config.schedule.slot_table()))
}

pub async fn validate_schedule(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<ValidationVerdict>, ApiError> {
    let request: ValidateRequest = serde_json::from_slice(&body)?;
    info!(entries = request.schedule.len(), "Validation requested");

    let engine = load_engine(&state).await?;
    let verdict = engine.validate(&request.schedule);

    if !verdict.valid {
        // The verdict is still returned when the draft cannot be parked.
        if let Err(e) = state.store.save_draft(&draft_document(&request.schedule)).await {
            warn!(error = %e, "Failed to save draft of invalid schedule");
        }
    }

    Ok(Json(verdict))
}

// ── Update ────────────────────────────────────────────────────────────────

pub async fn update_schedule(
    State(state): State<SharedState>,
    body: String,
) -> Result<Response, ApiError> {
    let request = parse_request(&body)?;
    info!(
        channel = %request.channel_id,
        items = request.programs.len(),
        source = request.source_url.as_deref().unwrap_or("-"),
        "Schedule update received"
    );

    let _guard = state.update_lock.lock().await;

    let document = state.store.load_document().await?;
    let options = RebuildOptions::now(state.config.schedule.generation_offset());
    let rebuilt = apply_request(&document, &request, &options)?;
    let xml = render_document(&rebuilt)?;

    state.store.save_document(&rebuilt).await?;
    if let Err(e) = state.store.archive(&rebuilt, Local::now().naive_local()).await {
        warn!(error = %e, "Schedule saved but archiving failed");
    }

    Ok(xml_response(xml))
}

// ── Rules ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct PlacementRuleDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub precedence: i64,
    pub permitted_slots: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NeighbourRuleDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub invalidates: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RuleListResponse {
    /// In evaluation order.
    pub placement: Vec<PlacementRuleDto>,
    pub neighbour: Vec<NeighbourRuleDto>,
    pub disabled: usize,
}

pub async fn list_rules(State(state): State<SharedState>) -> Result<Json<RuleListResponse>, ApiError> {
    let engine = load_engine(&state).await?;
    let rules = engine.rules();

    Ok(Json(RuleListResponse {
        placement: rules
            .placement_rules()
            .iter()
            .map(|r| PlacementRuleDto {
                id: r.id.clone(),
                title: r.title.clone(),
                description: r.description.clone(),
                precedence: r.precedence,
                permitted_slots: r.permitted_slots.clone(),
            })
            .collect(),
        neighbour: rules
            .neighbour_rules()
            .iter()
            .map(|r| NeighbourRuleDto {
                id: r.id.clone(),
                title: r.title.clone(),
                description: r.description.clone(),
                invalidates: r.outcome == NeighbourOutcome::Invalid,
            })
            .collect(),
        disabled: rules.disabled_count(),
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorResponse;
    use crate::{GatewayState, build_router};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use epgedit_config::AppConfig;
    use epgedit_core::{Channel, RuleSources, ScheduleDocument, ScheduleStore, parse_xmltv_time};
    use epgedit_store::MemoryStore;
    use http_body_util::BodyExt;
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn program(channel: &str, id: &str, genre: &str, start: &str) -> ProgramEntry {
        let start = parse_xmltv_time(start).unwrap();
        ProgramEntry {
            channel_id: channel.into(),
            program_id: id.into(),
            title: format!("{id} title"),
            description: String::new(),
            genre: genre.into(),
            rating: "PG".into(),
            duration_minutes: 30,
            filler_minutes: 5,
            rule_annotation: String::new(),
            start,
            stop: start + chrono::Duration::minutes(35),
            slot: None,
        }
    }

    fn document() -> ScheduleDocument {
        ScheduleDocument {
            attributes: vec![],
            date: None,
            channels: vec![
                Channel { id: "C1".into(), display_name: "One".into(), icon: None },
                Channel { id: "C2".into(), display_name: "Two".into(), icon: None },
            ],
            programs: vec![
                program("C1", "P1", "Drama", "20240301000000"),
                program("C1", "P2", "Horror", "20240301003500"),
                program("C2", "X1", "Kids", "20240302070000"),
            ],
        }
    }

    async fn test_state() -> (SharedState, MemoryStore) {
        let store = MemoryStore::with_document(document());
        store
            .set_rules(RuleSources {
                placement: json!([{
                    "Rule Id": 1,
                    "Rule Title": "Horror late",
                    "Rule Short Desc": "Horror only late",
                    "Rule Precedence": 5,
                    "Condition": {"AND": [{"Field": "genres", "Expression": "==", "Value": "Horror"}]},
                    "Result": {"End Result": ["Late Night"]}
                }]),
                neighbour: json!([{
                    "Rule Id": 7,
                    "Rule Title": "Genre spacing",
                    "Rule Desc": "Same genre back to back",
                    "Conditions": {"AND": [{
                        "Left Parameter": "current_movie_genres",
                        "Expression": "==",
                        "Right Parameter": "previous_movie_genres"
                    }]},
                    "Result": {"End Result": "Invalid"}
                }]),
            })
            .await;
        let mut config = AppConfig::default();
        config.storage.backend = "memory".into();
        let state = Arc::new(GatewayState::new(config, Arc::new(store.clone())));
        (state, store)
    }

    async fn body_bytes(response: Response) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn fetch_creates_one_backup_per_process() {
        let (state, store) = test_state().await;

        for _ in 0..2 {
            let req = Request::builder().uri("/fetch_xml").body(Body::empty()).unwrap();
            let response = build_router(state.clone()).oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "application/xml");
        }

        assert_eq!(store.backups().await.len(), 1);
    }

    #[tokio::test]
    async fn fetch_filters_by_date() {
        let (state, _) = test_state().await;
        let req = Request::builder()
            .uri("/fetch_xml?date=2024-03-02")
            .body(Body::empty())
            .unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let xml = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
        let doc = epgedit_schedule::parse_document(&xml).unwrap();
        assert_eq!(doc.channels.len(), 2);
        assert_eq!(doc.programs.len(), 1);
        assert_eq!(doc.programs[0].program_id, "X1");
    }

    #[tokio::test]
    async fn fetch_rejects_bad_date() {
        let (state, _) = test_state().await;
        let req = Request::builder()
            .uri("/fetch_xml?date=03/02/2024")
            .body(Body::empty())
            .unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn valid_schedule_passes_without_draft() {
        let (state, store) = test_state().await;
        let payload = json!({"schedule": [
            {"movieId": "P1", "channelId": "C1", "genres": "Drama", "pc_rating": "PG",
             "duration": "30", "adSlateLength": "5",
             "start": "20240301190000", "stop": "20240301193500", "timeslot": "Prime Time"}
        ]});
        let req = Request::builder()
            .method("POST")
            .uri("/validate_schedule")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let verdict: ValidationVerdict = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(verdict.valid);
        assert!(store.draft().await.is_none());
    }

    #[tokio::test]
    async fn invalid_schedule_reports_and_parks_draft() {
        let (state, store) = test_state().await;
        let payload = json!({"schedule": [
            {"movieId": "P2", "channelId": "C1", "genres": "Horror",
             "start": "20240301190000", "stop": "20240301193500", "timeslot": "Prime Time"},
            {"movieId": "P3", "channelId": "C1", "genres": "Horror",
             "start": "20240301223000", "stop": "20240301230500"}
        ]});
        let req = Request::builder()
            .method("POST")
            .uri("/validate_schedule")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["valid"], false);
        let failures = json["invalidMovies"].as_array().unwrap();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0]["movieId"], "P2");
        assert_eq!(
            failures[0]["reason"],
            "Title cannot be placed in Prime Time due to rule: Horror only late"
        );
        assert_eq!(failures[1]["movieId"], "P3");
        assert_eq!(failures[1]["reason"], "Neighbour rule violated: Same genre back to back");

        let draft = store.draft().await.unwrap();
        assert_eq!(draft.programs.len(), 2);
    }

    #[tokio::test]
    async fn malformed_validation_payload_is_400() {
        let (state, _) = test_state().await;
        let req = Request::builder()
            .method("POST")
            .uri("/validate_schedule")
            .body(Body::from("{\"schedule\": 3}"))
            .unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(!err.detail.is_empty());
    }

    #[tokio::test]
    async fn update_rebuilds_saves_and_archives() {
        let (state, store) = test_state().await;
        let body = "<ScheduleRequest><xml_url>local</xml_url><channel_id>C1</channel_id><programs>\
            <Program><id>P2</id><channel_id>C1</channel_id><additional_ad_slate_length>10</additional_ad_slate_length></Program>\
            <Program><id>P1</id><channel_id>C1</channel_id></Program>\
            </programs></ScheduleRequest>";
        let req = Request::builder()
            .method("POST")
            .uri("/update_schedule")
            .header(header::CONTENT_TYPE, "application/xml")
            .body(Body::from(body))
            .unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let xml = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
        let returned = epgedit_schedule::parse_document(&xml).unwrap();
        let saved = store.load_document().await.unwrap();
        assert_eq!(returned, saved);

        let c1: Vec<&ProgramEntry> = saved.programs_for("C1").collect();
        assert_eq!(c1[0].program_id, "P2");
        assert_eq!(c1[0].filler_minutes, 15);
        assert_eq!(c1[1].start, c1[0].stop);
        assert!(saved.date.as_deref().unwrap().ends_with("+0530"));
        assert_eq!(store.archives().await.len(), 1);
    }

    #[tokio::test]
    async fn update_with_unknown_program_is_404_and_leaves_schedule() {
        let (state, store) = test_state().await;
        let body = "<ScheduleRequest><channel_id>C1</channel_id><programs>\
            <Program><id>P404</id><channel_id>C1</channel_id></Program>\
            </programs></ScheduleRequest>";
        let req = Request::builder()
            .method("POST")
            .uri("/update_schedule")
            .body(Body::from(body))
            .unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let err: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(err.detail.contains("P404"));
        assert_eq!(store.load_document().await.unwrap(), document());
        assert!(store.archives().await.is_empty());
    }

    #[tokio::test]
    async fn update_with_out_of_range_filler_is_400_and_leaves_schedule() {
        let (state, store) = test_state().await;
        let body = "<ScheduleRequest><channel_id>C1</channel_id><programs>\
            <Program><id>P1</id><channel_id>C1</channel_id>\
            <additional_ad_slate_length>1000000000000</additional_ad_slate_length></Program>\
            </programs></ScheduleRequest>";
        let req = Request::builder()
            .method("POST")
            .uri("/update_schedule")
            .body(Body::from(body))
            .unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.load_document().await.unwrap(), document());
        assert!(store.archives().await.is_empty());
    }

    #[tokio::test]
    async fn update_with_broken_xml_is_400() {
        let (state, _) = test_state().await;
        let req = Request::builder()
            .method("POST")
            .uri("/update_schedule")
            .body(Body::from("<ScheduleRequest><channel_id>C1"))
            .unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_document_is_503() {
        let store = MemoryStore::new();
        let state = Arc::new(GatewayState::new(AppConfig::default(), Arc::new(store)));
        let req = Request::builder().uri("/fetch_xml").body(Body::empty()).unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn rules_are_listed() {
        let (state, _) = test_state().await;
        let req = Request::builder().uri("/rules").body(Body::empty()).unwrap();
        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let list: RuleListResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(list.placement.len(), 1);
        assert_eq!(list.placement[0].permitted_slots, vec!["Late Night"]);
        assert!(list.neighbour[0].invalidates);
        assert_eq!(list.disabled, 0);
    }
}
