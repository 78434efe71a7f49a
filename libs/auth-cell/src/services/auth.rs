use tracing::{debug, info, warn};

use doctor_cell::services::DoctorService;
use patient_cell::services::PatientService;
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_utils::jwt::issue_token;
use shared_utils::password::verify_password;

use crate::models::{AuthError, Session};

/// Credential checks for the three portals. Each success yields a signed
/// session token for the matching role.
pub struct AuthService {
    config: AppConfig,
    doctors: DoctorService,
    patients: PatientService,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
            doctors: DoctorService::new(config),
            patients: PatientService::new(config),
        }
    }

    pub fn admin_login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if !self.config.is_admin_login_configured() {
            warn!("Admin login attempted but admin credentials are not configured");
            return Err(AuthError::AdminDisabled);
        }

        if email.trim() != self.config.admin_email || password != self.config.admin_password {
            warn!("Rejected admin login for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(
            &self.config.admin_email,
            Some(&self.config.admin_email),
            Role::Admin,
            &self.config.jwt_secret,
        )?;
        info!("Admin signed in");

        Ok(Session {
            subject: self.config.admin_email.clone(),
            token,
        })
    }

    pub async fn doctor_login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingDetails);
        }
        debug!("Doctor login attempt for {}", email);

        let doctor = self
            .doctors
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password_matches(password, &doctor.password_hash) {
            warn!("Rejected doctor login for {}", doctor.email);
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(&doctor.id, Some(&doctor.email), Role::Doctor, &self.config.jwt_secret)?;
        info!("Doctor {} signed in", doctor.id);

        Ok(Session {
            subject: doctor.id,
            token,
        })
    }

    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> Result<Session, AuthError> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingDetails);
        }

        let patient = self.patients.register(name, email, password).await?;
        let token = issue_token(&patient.id, Some(&patient.email), Role::User, &self.config.jwt_secret)?;

        Ok(Session {
            subject: patient.id,
            token,
        })
    }

    pub async fn user_login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingDetails);
        }
        debug!("User login attempt for {}", email);

        let patient = self
            .patients
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !password_matches(password, &patient.password_hash) {
            warn!("Rejected user login for {}", patient.email);
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(&patient.id, Some(&patient.email), Role::User, &self.config.jwt_secret)?;
        info!("User {} signed in", patient.id);

        Ok(Session {
            subject: patient.id,
            token,
        })
    }
}

// Unparseable stored hashes count as a mismatch.
fn password_matches(password: &str, hash: &str) -> bool {
    verify_password(password, hash).unwrap_or_else(|e| {
        warn!("Stored password hash could not be read: {}", e);
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_utils::jwt::validate_token;
    use shared_utils::test_utils::TestConfig;

    #[test]
    fn test_admin_login_issues_admin_token() {
        let config = TestConfig::default().to_app_config();
        let session = AuthService::new(&config)
            .admin_login(&config.admin_email, &config.admin_password)
            .unwrap();

        let user = validate_token(&session.token, &config.jwt_secret).unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.email.as_deref(), Some(config.admin_email.as_str()));
    }

    #[test]
    fn test_admin_login_rejects_wrong_password() {
        let config = TestConfig::default().to_app_config();
        let result = AuthService::new(&config).admin_login(&config.admin_email, "guess");
        assert_matches!(result, Err(AuthError::InvalidCredentials));
    }

    #[test]
    fn test_admin_login_disabled_without_credentials() {
        let mut config = TestConfig::default().to_app_config();
        config.admin_password.clear();
        let result = AuthService::new(&config).admin_login(&config.admin_email, "");
        assert_matches!(result, Err(AuthError::AdminDisabled));
    }

    #[test]
    fn test_garbage_hash_is_a_mismatch() {
        assert!(!password_matches("secret", "not-a-hash"));
    }
}
