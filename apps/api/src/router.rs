use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "HappyOdent API is running" }))
        .nest("/api/admin", admin_api(state.clone()))
        .nest("/api/doctor", doctor_api(state.clone()))
        .nest("/api/user", user_api(state))
}

fn admin_api(state: Arc<AppConfig>) -> Router {
    Router::new()
        .merge(auth_cell::router::admin_routes(state.clone()))
        .merge(doctor_cell::router::admin_routes(state.clone()))
        .merge(patient_cell::router::admin_routes(state.clone()))
        .merge(appointment_cell::router::admin_routes(state))
}

fn doctor_api(state: Arc<AppConfig>) -> Router {
    Router::new()
        .merge(auth_cell::router::doctor_routes(state.clone()))
        .merge(doctor_cell::router::doctor_routes(state.clone()))
        .merge(appointment_cell::router::doctor_routes(state))
}

fn user_api(state: Arc<AppConfig>) -> Router {
    Router::new()
        .merge(auth_cell::router::user_routes(state.clone()))
        .merge(patient_cell::router::user_routes(state.clone()))
        .merge(appointment_cell::router::user_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            supabase_url: "http://127.0.0.1:9".to_string(),
            supabase_service_key: "service-key".to_string(),
            jwt_secret: "router-test-secret".to_string(),
            admin_email: "admin@happyodent.com".to_string(),
            admin_password: "admin-password".to_string(),
            storage_bucket: "images".to_string(),
            clinic_utc_offset_minutes: 0,
            cookie_secure: false,
            cors_origins: vec![],
            port: 4000,
        })
    }

    async fn call(method: &str, uri: &str) -> (StatusCode, String) {
        let response = create_router(test_state())
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    #[tokio::test]
    async fn test_liveness() {
        let (status, body) = call("GET", "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "HappyOdent API is running");
    }

    #[tokio::test]
    async fn test_protected_routes_need_a_session() {
        for (method, uri) in [
            ("GET", "/api/admin/all-doctors"),
            ("GET", "/api/admin/dashboard"),
            ("GET", "/api/doctor/appointments"),
            ("GET", "/api/doctor/profile"),
            ("GET", "/api/user/get-profile"),
            ("POST", "/api/user/book-appointment"),
        ] {
            let (status, body) = call(method, uri).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
            assert!(body.contains("Not Authorized, Login again"));
        }
    }

    #[tokio::test]
    async fn test_logout_is_public() {
        let (status, _) = call("POST", "/api/doctor/logout").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = call("GET", "/api/nurse/list").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
