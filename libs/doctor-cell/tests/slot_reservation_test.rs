use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::{DoctorError, Released};
use doctor_cell::services::doctor::{DoctorService, MAX_SLOT_WRITE_ATTEMPTS};
use doctor_cell::services::slots::SlotKey;
use shared_utils::test_utils::{MockStoreRows, TestConfig};

const DOC_ID: &str = "doc-1";

fn service_for(server: &MockServer) -> DoctorService {
    DoctorService::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config())
}

fn key(date: &str, time: &str) -> SlotKey {
    SlotKey {
        date: date.to_string(),
        time: time.to_string(),
    }
}

fn doctor_with(slots: serde_json::Value, version: i64) -> serde_json::Value {
    let mut row = MockStoreRows::doctor_row(DOC_ID, "richard@happyodent.com");
    row["slots_booked"] = slots;
    row["slots_version"] = json!(version);
    row
}

#[tokio::test]
async fn test_reserve_free_slot_bumps_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_with(json!({}), 4)])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("slots_version", "eq.4"))
        .and(body_partial_json(json!({
            "slots_booked": { "15-06-2025": ["10:00 AM"] },
            "slots_version": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_with(json!({ "15-06-2025": ["10:00 AM"] }), 5)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let doctor = service_for(&server)
        .reserve_slot(DOC_ID, &key("15-06-2025", "10:00 AM"))
        .await
        .unwrap();

    assert!(doctor.slots_booked.is_booked("15-06-2025", "10:00 AM"));
    assert_eq!(doctor.slots_version, 5);
}

#[tokio::test]
async fn test_reserve_taken_slot_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_with(json!({ "15-06-2025": ["10:00 AM"] }), 1)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = service_for(&server)
        .reserve_slot(DOC_ID, &key("15-06-2025", "10:00 AM"))
        .await;
    assert_matches!(result, Err(DoctorError::SlotTaken));
}

#[tokio::test]
async fn test_reserve_on_unavailable_doctor() {
    let server = MockServer::start().await;
    let mut row = doctor_with(json!({}), 0);
    row["available"] = json!(false);
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&server)
        .await;

    let result = service_for(&server)
        .reserve_slot(DOC_ID, &key("15-06-2025", "10:00 AM"))
        .await;
    assert_matches!(result, Err(DoctorError::NotAvailable));
}

#[tokio::test]
async fn test_reserve_retries_after_lost_race() {
    let server = MockServer::start().await;

    // First read sees version 0; by the time the write lands another booking moved it to 1.
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_with(json!({}), 0)])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_with(json!({ "15-06-2025": ["11:00 AM"] }), 1)
        ])))
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(query_param("slots_version", "eq.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(query_param("slots_version", "eq.1"))
        .and(body_partial_json(json!({
            "slots_booked": { "15-06-2025": ["11:00 AM", "10:00 AM"] },
            "slots_version": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_with(json!({ "15-06-2025": ["11:00 AM", "10:00 AM"] }), 2)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let doctor = service_for(&server)
        .reserve_slot(DOC_ID, &key("15-06-2025", "10:00 AM"))
        .await
        .unwrap();
    assert_eq!(doctor.slots_version, 2);
}

#[tokio::test]
async fn test_reserve_lost_race_to_same_slot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_with(json!({}), 0)])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_with(json!({ "15-06-2025": ["10:00 AM"] }), 1)
        ])))
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let result = service_for(&server)
        .reserve_slot(DOC_ID, &key("15-06-2025", "10:00 AM"))
        .await;
    assert_matches!(result, Err(DoctorError::SlotTaken));
}

#[tokio::test]
async fn test_reserve_gives_up_when_always_contended() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_with(json!({}), 0)])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(MAX_SLOT_WRITE_ATTEMPTS as u64)
        .mount(&server)
        .await;

    let result = service_for(&server)
        .reserve_slot(DOC_ID, &key("15-06-2025", "10:00 AM"))
        .await;
    assert_matches!(result, Err(DoctorError::Contended));
}

#[tokio::test]
async fn test_release_keeps_other_times() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_with(json!({ "15-06-2025": ["10:00 AM", "11:00 AM"] }), 3)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(query_param("slots_version", "eq.3"))
        .and(body_partial_json(json!({
            "slots_booked": { "15-06-2025": ["11:00 AM"] },
            "slots_version": 4
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_with(json!({ "15-06-2025": ["11:00 AM"] }), 4)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = service_for(&server)
        .release_slot(DOC_ID, "15-06-2025", "10:00 AM")
        .await
        .unwrap();
    assert_eq!(outcome, Released::Released);
}

#[tokio::test]
async fn test_release_missing_date_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_with(json!({}), 0)])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = service_for(&server)
        .release_slot(DOC_ID, "15-06-2025", "10:00 AM")
        .await
        .unwrap();
    assert_eq!(outcome, Released::DateMissing);
}
