use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::Address;
use patient_cell::models::{Billing, PatientError, PatientIntake};
use patient_cell::services::PatientService;
use shared_utils::form::UploadedImage;
use shared_utils::test_utils::{MockStoreRows, TestConfig};

fn service_for(server: &MockServer) -> PatientService {
    PatientService::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config())
}

async fn no_existing_patients(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let server = MockServer::start().await;

    let result = service_for(&server).register("Asha", "asha@example.com", "password").await;
    assert_matches!(result, Err(PatientError::WeakPassword));
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::patient_row("p1", "asha@example.com")
        ])))
        .mount(&server)
        .await;

    let result = service_for(&server).register("Asha", "Asha@Example.com", "Sm1le!now").await;
    assert_matches!(result, Err(PatientError::EmailTaken));
}

#[tokio::test]
async fn test_register_stores_hash_not_password() {
    let server = MockServer::start().await;
    no_existing_patients(&server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .and(body_partial_json(json!({ "email": "asha@example.com", "gender": "Not Selected" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::patient_row("p1", "asha@example.com")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let patient = service_for(&server).register("Asha", "asha@example.com", "Sm1le!now").await.unwrap();
    assert_eq!(patient.id, "p1");

    let requests = server.received_requests().await.unwrap();
    let insert = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let body: serde_json::Value = serde_json::from_slice(&insert.body).unwrap();
    assert!(body["password_hash"].as_str().unwrap().starts_with("$argon2"));
    assert!(!insert.body.windows(9).any(|w| w == b"Sm1le!now"));
}

#[tokio::test]
async fn test_intake_survives_failed_upload() {
    let server = MockServer::start().await;
    no_existing_patients(&server).await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/.+"))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .and(body_partial_json(json!({ "image": null, "total": 600.0, "balance_due": 600.0 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::patient_row("p9", "ravi@example.com")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let intake = PatientIntake {
        name: "Ravi Kumar".to_string(),
        email: "ravi@example.com".to_string(),
        phone: "9000000000".to_string(),
        dob: "1985-01-01".to_string(),
        gender: "Male".to_string(),
        address: Address::default(),
        billing: Billing {
            fees: 500.0,
            xray: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let image = UploadedImage {
        file_name: Some("ravi.jpg".to_string()),
        content_type: "image/jpeg".to_string(),
        data: b"JPEG".to_vec(),
    };

    let (patient, password) = service_for(&server).create_patient(intake, Some(image)).await.unwrap();
    assert_eq!(patient.id, "p9");
    assert!(password.starts_with("ravikumar"));
}
