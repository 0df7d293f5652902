//! Login, signup, logout.
//!
//! A successful login writes the session marker. Signup only registers
//! the account; the user logs in afterwards.

use std::path::Path;

use crate::backend::{ComplianceBackend, Credentials};
use crate::session::SessionContext;

use super::CommandError;

fn validate(credentials: &Credentials) -> Result<(), CommandError> {
    let missing: Vec<&str> = [
        ("username", credentials.username.trim()),
        ("email", credentials.email.trim()),
        ("password", credentials.password.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(CommandError::Validation(format!(
            "Missing {}",
            missing.join(", ")
        )));
    }
    if !credentials.email.contains('@') {
        return Err(CommandError::Validation(format!(
            "Invalid email address: {}",
            credentials.email
        )));
    }
    Ok(())
}

pub async fn login<B: ComplianceBackend>(
    backend: &B,
    session_path: &Path,
    credentials: &Credentials,
) -> Result<SessionContext, CommandError> {
    validate(credentials)?;
    let reply = backend.login(credentials).await.inspect_err(|e| {
        tracing::warn!(username = %credentials.username, error = %e, "Login rejected");
    })?;

    let username = reply
        .username
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| credentials.username.clone());
    let session = SessionContext::logged_in(username);
    session.save(session_path)?;

    tracing::info!(username = ?session.username, "Logged in");
    Ok(session)
}

pub async fn signup<B: ComplianceBackend>(
    backend: &B,
    credentials: &Credentials,
) -> Result<String, CommandError> {
    validate(credentials)?;
    let reply = backend.signup(credentials).await.inspect_err(|e| {
        tracing::warn!(username = %credentials.username, error = %e, "Signup rejected");
    })?;

    tracing::info!(username = %credentials.username, "Account registered");
    Ok(if reply.message.is_empty() {
        "User registered successfully".to_string()
    } else {
        reply.message
    })
}

pub fn logout(session_path: &Path) -> Result<(), CommandError> {
    SessionContext::clear(session_path)?;
    tracing::info!("Logged out");
    Ok(())
}
