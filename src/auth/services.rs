use anyhow::Context;
use tracing::{info, warn};

use super::{
    dto::{SigninRequest, SignupRequest},
    repo_types::{NewUser, User, DEFAULT_ABOUT, DEFAULT_AVATAR, DEFAULT_NAME},
};
use crate::{
    error::AppError,
    state::AppState,
    store::{bounded, StoreError},
    validation::{check_text, check_url, is_valid_email, normalize_email, MIN_PASSWORD_LEN},
};

fn require_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }
    if !is_valid_email(email) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(())
}

/// Creates an account. The plaintext password is hashed off the async
/// runtime and dropped; only the hash reaches the store.
pub async fn register(state: &AppState, req: SignupRequest) -> Result<User, AppError> {
    let email = normalize_email(&req.email);
    require_credentials(&email, &req.password)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let name = req.name.unwrap_or_else(|| DEFAULT_NAME.to_string());
    let about = req.about.unwrap_or_else(|| DEFAULT_ABOUT.to_string());
    let avatar = req.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string());
    check_text("name", &name)?;
    check_text("about", &about)?;
    check_url("avatar", &avatar)?;

    let hasher = state.hasher.clone();
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .context("password hashing task failed")??;

    let new = NewUser {
        email,
        password_hash,
        name,
        about,
        avatar,
    };
    let user = bounded(state.store_timeout(), state.users.create(new))
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => {
                warn!("signup with an already registered email");
                AppError::Conflict("Email already registered".into())
            }
            other => other.into(),
        })?;

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Checks credentials and issues a session token. Unknown email and wrong
/// password produce the same error.
pub async fn login(state: &AppState, req: SigninRequest) -> Result<(String, User), AppError> {
    let email = normalize_email(&req.email);
    require_credentials(&email, &req.password)?;

    let invalid = || AppError::Unauthenticated("Invalid credentials".into());

    let found = bounded(state.store_timeout(), state.users.find_by_email(&email)).await?;

    // unknown emails pay the same hashing cost as wrong passwords
    let hasher = state.hasher.clone();
    let password = req.password;
    let stored = found.as_ref().map(|u| u.password_hash.clone());
    let ok = tokio::task::spawn_blocking(move || match stored {
        Some(stored) => hasher.verify(&password, &stored),
        None => hasher.verify_absent(&password),
    })
    .await
    .context("password verification task failed")?;

    let user = match found {
        Some(user) if ok => user,
        Some(user) => {
            warn!(user_id = %user.id, "login with invalid password");
            return Err(invalid());
        }
        None => {
            warn!("login with unknown email");
            return Err(invalid());
        }
    };

    let token = state.jwt.issue(user.id, Some(&user.email))?;
    info!(user_id = %user.id, "user logged in");
    Ok((token, user))
}
