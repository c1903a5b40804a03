//! crates/booking_core/src/auth.rs
//!
//! Demo authentication flows on top of the session manager.
//!
//! Credentials are trusted: passwords are only compared with their confirmation
//! and never stored or verified.

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{User, UserId};
use crate::ports::PortError;
use crate::session::SessionManager;

/// The code every SMS login accepts.
pub const DEMO_SMS_CODE: &str = "1234";

const FALLBACK_EMAIL: &str = "user@example.com";
const FALLBACK_NAME: &str = "User";
const PHONE_USER_NAME: &str = "Mobile User";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    ValidationFailure(String),
    #[error("This email is already registered. Please log in.")]
    EmailTaken,
    #[error("No active session")]
    NoSession,
    #[error(transparent)]
    Port(#[from] PortError),
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub user: User,
    pub needs_onboarding: bool,
}

impl From<User> for LoginOutcome {
    fn from(user: User) -> Self {
        Self {
            needs_onboarding: !user.completed_onboarding,
            user,
        }
    }
}

/// Fields collected by the onboarding form. The email is read-only there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnboardingProfile {
    pub name: String,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub avatar: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    sessions: SessionManager,
}

impl AuthService {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }

    /// Restores the stored identity for `email`, or creates one on the spot.
    pub async fn login(&self, email: &str) -> AuthResult<LoginOutcome> {
        if let Some(existing) = self.sessions.find_by_email(email).await? {
            let user = self.sessions.save(existing).await?;
            info!(user_id = %user.id, "Session restored.");
            return Ok(user.into());
        }

        let email = email.trim();
        let email = if email.is_empty() { FALLBACK_EMAIL } else { email };
        let user = self
            .sessions
            .save(User::new(UserId::generate(), name_from_email(email), email))
            .await?;
        info!(user_id = %user.id, "Created identity on first login.");
        Ok(user.into())
    }

    /// Creates a new identity. Nothing is written when validation fails.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> AuthResult<LoginOutcome> {
        if password != confirmation {
            return Err(AuthError::ValidationFailure(
                "Passwords do not match.".to_string(),
            ));
        }
        if self.sessions.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let email = email.trim();
        let user = self
            .sessions
            .save(User::new(UserId::generate(), name_from_email(email), email))
            .await?;
        info!(user_id = %user.id, "User registered.");
        Ok(user.into())
    }

    /// Sends (pretends to send) the SMS code. Returns it so the demo can show it.
    pub fn request_sms_code(&self, phone: &str) -> AuthResult<&'static str> {
        if phone.trim().is_empty() {
            return Err(AuthError::ValidationFailure(
                "A phone number is required.".to_string(),
            ));
        }
        info!("SMS code issued.");
        Ok(DEMO_SMS_CODE)
    }

    /// Pretends to email a recovery link. Nothing is stored and the session is untouched.
    ///
    /// Returns the address the link went to, whether or not an account uses it.
    pub fn request_password_reset(&self, email: &str) -> AuthResult<String> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::ValidationFailure(
                "An email is required.".to_string(),
            ));
        }
        info!("Password recovery link issued.");
        Ok(email.to_string())
    }

    pub async fn login_with_phone(&self, phone: &str, code: &str) -> AuthResult<LoginOutcome> {
        if code.trim() != DEMO_SMS_CODE {
            return Err(AuthError::ValidationFailure("Incorrect code.".to_string()));
        }

        let mut user = User::new(UserId::generate(), PHONE_USER_NAME, "");
        user.phone = Some(phone.trim().to_string());
        let user = self.sessions.save(user).await?;
        info!(user_id = %user.id, "Phone login.");
        Ok(user.into())
    }

    pub async fn complete_onboarding(&self, profile: OnboardingProfile) -> AuthResult<User> {
        let mut user = self
            .sessions
            .current_user()
            .await?
            .ok_or(AuthError::NoSession)?;

        user.name = profile.name;
        user.surname = profile.surname;
        user.phone = profile.phone;
        user.birth_date = profile.birth_date;
        user.avatar = profile.avatar;
        user.completed_onboarding = true;

        let user = self.sessions.save(user).await?;
        info!(user_id = %user.id, "Onboarding completed.");
        Ok(user)
    }

    pub async fn logout(&self) -> AuthResult<()> {
        self.sessions.clear().await?;
        Ok(())
    }
}

fn name_from_email(email: &str) -> String {
    match email.split('@').next() {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => FALLBACK_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::ports::SessionStore;
    use std::sync::Arc;

    fn service() -> (Arc<MemoryStore>, AuthService) {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(SessionManager::new(store.clone()));
        (store, auth)
    }

    #[tokio::test]
    async fn mismatched_confirmation_stores_nothing() {
        let (store, auth) = service();

        let err = auth.register("ana@x.com", "secret", "secreT").await.unwrap_err();
        assert!(matches!(err, AuthError::ValidationFailure(_)));
        assert!(store.load_users().await.unwrap().is_empty());
        assert!(store.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn registering_a_known_email_is_refused() {
        let (store, auth) = service();
        auth.register("ana@x.com", "a", "a").await.unwrap();

        let err = auth.register("ANA@x.com", "b", "b").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
        assert_eq!(store.load_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_reuses_the_identity_found_by_email() {
        let (_, auth) = service();
        let registered = auth.register("ana@x.com", "a", "a").await.unwrap();
        assert!(registered.needs_onboarding);
        assert_eq!(registered.user.name, "ana");

        auth.logout().await.unwrap();
        let again = auth.login("Ana@X.com").await.unwrap();
        assert_eq!(again.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn login_with_blank_email_uses_the_fallback_identity() {
        let (_, auth) = service();
        let outcome = auth.login("  ").await.unwrap();
        assert_eq!(outcome.user.email, "user@example.com");
        assert_eq!(outcome.user.name, "user");
    }

    #[tokio::test]
    async fn phone_login_checks_the_demo_code() {
        let (store, auth) = service();
        assert_eq!(auth.request_sms_code("11 99999-0000").unwrap(), DEMO_SMS_CODE);

        let err = auth.login_with_phone("11 99999-0000", "0000").await.unwrap_err();
        assert!(matches!(err, AuthError::ValidationFailure(_)));
        assert!(store.load_session().await.unwrap().is_none());

        let outcome = auth.login_with_phone("11 99999-0000", "1234").await.unwrap();
        assert_eq!(outcome.user.phone.as_deref(), Some("11 99999-0000"));
        assert!(outcome.user.email.is_empty());
    }

    #[tokio::test]
    async fn password_reset_needs_an_email_and_changes_nothing() {
        let (store, auth) = service();
        let err = auth.request_password_reset("   ").unwrap_err();
        assert!(matches!(err, AuthError::ValidationFailure(_)));

        assert_eq!(
            auth.request_password_reset(" ana@x.com ").unwrap(),
            "ana@x.com"
        );
        assert!(store.load_users().await.unwrap().is_empty());
        assert!(store.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn onboarding_requires_a_session_and_marks_completion() {
        let (_, auth) = service();
        let profile = OnboardingProfile {
            name: "Ana".to_string(),
            surname: Some("Souza".to_string()),
            phone: Some("555".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1990, 2, 1),
            avatar: None,
        };

        assert!(matches!(
            auth.complete_onboarding(profile.clone()).await.unwrap_err(),
            AuthError::NoSession
        ));

        auth.login("ana@x.com").await.unwrap();
        let user = auth.complete_onboarding(profile).await.unwrap();
        assert!(user.completed_onboarding);
        assert_eq!(user.surname.as_deref(), Some("Souza"));
        assert_eq!(user.email, "ana@x.com");

        auth.logout().await.unwrap();
        assert!(!auth.login("ana@x.com").await.unwrap().needs_onboarding);
    }
}
