use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};

use crate::jwt::TOKEN_ISSUER;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub admin_email: String,
    pub admin_password: String,
    pub clinic_utc_offset_minutes: i32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            admin_email: "admin@happyodent.com".to_string(),
            admin_password: "admin-password".to_string(),
            clinic_utc_offset_minutes: 0,
        }
    }
}

impl TestConfig {
    /// Point the store client at a wiremock server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            admin_email: self.admin_email.clone(),
            admin_password: self.admin_password.clone(),
            storage_bucket: "images".to_string(),
            clinic_utc_offset_minutes: self.clinic_utc_offset_minutes,
            cookie_secure: false,
            cors_origins: vec!["http://localhost:5173".to_string()],
            port: 4000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", Role::User)
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Role::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::User)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: self.role,
            issued_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iss": TOKEN_ISSUER,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Rows shaped like the `doctors`, `patients` and `appointments` tables.
pub struct MockStoreRows;

impl MockStoreRows {
    pub fn doctor_row(id: &str, email: &str) -> Value {
        json!({
            "id": id,
            "name": "Dr. Richard James",
            "email": email,
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$placeholder",
            "image": "http://localhost:54321/storage/v1/object/public/images/doctors/richard.png",
            "speciality": "General Dentist",
            "degree": "BDS",
            "experience": "4 Years",
            "about": "Focuses on preventive dental care.",
            "available": true,
            "fees": 500.0,
            "address": { "line1": "17th Cross, Richmond", "line2": "Circle, Ring Road" },
            "slots_booked": {},
            "slots_version": 0,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn patient_row(id: &str, email: &str) -> Value {
        json!({
            "id": id,
            "name": "Asha Mehta",
            "email": email,
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$placeholder",
            "image": null,
            "address": { "line1": "", "line2": "" },
            "gender": "Not Selected",
            "dob": "Not Selected",
            "phone": "0000000000",
            "medical_history": "",
            "assigned_doctor": null,
            "appointment_date": null,
            "appointment_time": null,
            "fees": 0.0,
            "xray": false,
            "treatment": "",
            "cost_of_treatment": 0.0,
            "medicine": 0.0,
            "received": 0.0,
            "total": 0.0,
            "balance_due": 0.0,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn appointment_row(id: &str, user_id: &str, doc_id: &str, slot_date: &str, slot_time: &str) -> Value {
        json!({
            "id": id,
            "user_id": user_id,
            "doc_id": doc_id,
            "slot_date": slot_date,
            "slot_time": slot_time,
            "user_data": { "id": user_id, "name": "Asha Mehta", "email": "asha@example.com", "phone": "0000000000", "image": null, "dob": "Not Selected" },
            "doc_data": { "id": doc_id, "name": "Dr. Richard James", "email": "richard@happyodent.com", "image": null, "speciality": "General Dentist", "degree": "BDS", "fees": 500.0, "address": { "line1": "", "line2": "" } },
            "amount": 500.0,
            "created_at": "2025-01-01T00:00:00Z",
            "cancelled": false,
            "payment": false,
            "is_completed": false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let app_config = TestConfig::with_supabase_url("http://127.0.0.1:9999").to_app_config();

        assert_eq!(app_config.supabase_url, "http://127.0.0.1:9999");
        assert_eq!(app_config.supabase_service_key, "test-service-key");
        assert!(app_config.is_configured());
        assert!(app_config.is_admin_login_configured());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        assert_eq!(user.role, Role::Doctor);

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.role, Role::Doctor);
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let token = JwtTestUtils::create_test_token(&TestUser::default(), "test-secret", Some(1));
        assert_eq!(token.split('.').count(), 3);
    }
}
