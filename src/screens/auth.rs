//! Login and registration flows.
//!
//! All form validation happens here, before any network call; the session
//! service only ever sees well-formed input.

use crate::errors::AppError;
use crate::models::Profile;
use crate::session::Session;
use crate::store::{insert_row, tables, RecordStore, SessionService};

/// Registration form state.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub username: String,
    pub full_name: Option<String>,
}

/// Rough structural check, matching what the sign-up form enforces.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Sign in with email and password.
pub async fn sign_in(
    sessions: &dyn SessionService,
    email: &str,
    password: &str,
) -> Result<Session, AppError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Please enter both email and password.".to_string(),
        ));
    }
    sessions.sign_in(email.trim(), password).await
}

/// Create an account, then its profile row.
pub async fn register(
    sessions: &dyn SessionService,
    records: &dyn RecordStore,
    form: &RegisterForm,
) -> Result<(Session, Profile), AppError> {
    if form.email.trim().is_empty()
        || form.password.is_empty()
        || form.confirm_password.is_empty()
        || form.username.trim().is_empty()
    {
        return Err(AppError::Validation("Please fill in all fields.".to_string()));
    }
    if form.password != form.confirm_password {
        return Err(AppError::Validation("Passwords do not match.".to_string()));
    }
    if !is_valid_email(form.email.trim()) {
        return Err(AppError::Validation(
            "Please enter a valid email address.".to_string(),
        ));
    }

    let session = sessions.sign_up(form.email.trim(), &form.password).await?;

    let profile = Profile {
        id: session.user_id.clone(),
        username: form.username.trim().to_string(),
        full_name: form.full_name.clone(),
        bio: None,
        avatar_url: None,
    };
    let stored: Profile = insert_row(records, tables::PROFILES, &profile).await?;

    Ok((session, stored))
}
