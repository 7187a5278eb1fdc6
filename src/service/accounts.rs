//! Registration, login checks and profile updates.

use crate::db::models::DbUser;
use crate::db::sqlite::Storage;
use crate::error::PivotError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

pub fn hash_password(password: &str) -> Result<String, PivotError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PivotError::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, PivotError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PivotError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Create a user and their (empty) session cursor. Duplicate username or
/// email surfaces as a validation error.
pub async fn register(
    storage: &Storage,
    username: &str,
    email: &str,
    password: &str,
) -> Result<i64, PivotError> {
    validate_username(username)?;
    if email.len() > 120 || !email.contains('@') {
        return Err(PivotError::Validation("invalid email address".to_string()));
    }
    if password.len() < 8 {
        return Err(PivotError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    let hash = hash_password(password)?;
    let user_id = match storage.create_user(username, email, &hash).await {
        Ok(id) => id,
        Err(e) if e.is_unique_violation() => {
            return Err(PivotError::Validation(
                "username or email is already taken".to_string(),
            ));
        }
        Err(e) => return Err(e),
    };
    storage.ensure_cursor(user_id).await?;
    Ok(user_id)
}

/// Look up the user and verify the password. Unknown username and wrong
/// password are indistinguishable to the caller.
pub async fn authenticate(
    storage: &Storage,
    username: &str,
    password: &str,
) -> Result<DbUser, PivotError> {
    let user = storage
        .user_by_username(username)
        .await?
        .ok_or(PivotError::InvalidCredentials)?;
    if !verify_password(password, &user.password_hash)? {
        return Err(PivotError::InvalidCredentials);
    }
    Ok(user)
}

/// Update username, about-me text and the set of studied languages.
/// Everything is validated before the single transactional write, so a
/// rejected request leaves the profile untouched. An empty `about_me`
/// clears the field; `None` keeps it.
pub async fn update_profile(
    storage: &Storage,
    user: &DbUser,
    username: Option<&str>,
    about_me: Option<&str>,
    languages: Option<&[String]>,
) -> Result<(), PivotError> {
    let new_username = username.unwrap_or(&user.username);
    validate_username(new_username)?;
    if let Some(about) = about_me
        && about.len() > 140
    {
        return Err(PivotError::Validation(
            "about_me must be at most 140 characters".to_string(),
        ));
    }
    let about = match about_me {
        Some("") => None,
        Some(about) => Some(about),
        None => user.about_me.as_deref(),
    };

    let mut ids = None;
    if let Some(isos) = languages {
        let mut resolved = Vec::with_capacity(isos.len());
        for iso in isos {
            let language = storage
                .language_by_iso(iso)
                .await?
                .ok_or_else(|| PivotError::Validation(format!("unknown language code `{iso}`")))?;
            resolved.push(language.id);
        }
        ids = Some(resolved);
    }

    match storage
        .update_profile(user.id, new_username, about, ids.as_deref())
        .await
    {
        Ok(()) => Ok(()),
        Err(e) if e.is_unique_violation() => Err(PivotError::Validation(
            "username is already taken".to_string(),
        )),
        Err(e) => Err(e),
    }
}

fn validate_username(username: &str) -> Result<(), PivotError> {
    if username.is_empty() || username.len() > 64 {
        return Err(PivotError::Validation(
            "username must be between 1 and 64 characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("mypassword").expect("hashing failed");
        assert!(verify_password("mypassword", &hash).expect("verify failed"));
        assert!(!verify_password("notmypassword", &hash).expect("verify failed"));
    }
}
