use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::{Gender, User};
use crate::store::Store;

const NAME_LENGTH_MESSAGE: &str = "Username must be between 4 and 22 characters";
const PASSWORD_LENGTH_MESSAGE: &str = "Password must be between 6 and 60 characters";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(hash: &str, candidate: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Registers an account and opens a session for it.
///
/// All field problems are collected into one validation map before any
/// uniqueness check or write happens.
pub async fn register(
    store: &dyn Store,
    name: Option<String>,
    password: Option<String>,
    password_confirm: Option<String>,
    gender: Option<String>,
) -> AppResult<(User, Uuid)> {
    let mut errors = FieldErrors::new();

    let name = name.unwrap_or_default();
    if name.is_empty() {
        errors.insert("name", "Username is required");
    } else if !(4..=22).contains(&name.chars().count()) {
        errors.insert("name", NAME_LENGTH_MESSAGE);
    }

    let password = password.unwrap_or_default();
    if password.is_empty() {
        errors.insert("password", "Password is required");
    } else if !(6..=60).contains(&password.chars().count()) {
        errors.insert("password", PASSWORD_LENGTH_MESSAGE);
    }

    if password_confirm.as_deref() != Some(password.as_str()) {
        errors.insert("passwordConfirm", "Password is not confirmed");
    }

    let gender = match gender.as_deref().map(Gender::parse) {
        Some(Some(gender)) => Some(gender),
        _ => {
            errors.insert("gender", "Please, select gender");
            None
        }
    };

    if errors.is_empty() && store.user_name_taken(&name).await? {
        errors.insert("name", "User with this name already exists");
    }
    errors.into_result()?;

    let user = User::new(name, hash_password(&password)?, gender.unwrap());
    store.insert_user(&user).await?;

    let token = open_session(store, &user).await?;
    tracing::info!(user = %user.name, "User registered");
    Ok((user, token))
}

/// Verifies credentials and opens a session. Unknown names and wrong
/// passwords are indistinguishable to the caller.
pub async fn login(store: &dyn Store, name: &str, password: &str) -> AppResult<(User, Uuid)> {
    let user = store
        .user_by_name(name)
        .await?
        .filter(|user| verify_password(&user.password_hash, password))
        .ok_or(AppError::Unauthenticated)?;

    let token = open_session(store, &user).await?;
    Ok((user, token))
}

async fn open_session(store: &dyn Store, user: &User) -> AppResult<Uuid> {
    let token = Uuid::new_v4();
    store.insert_session(token, user.id).await?;
    Ok(token)
}

pub async fn logout(store: &dyn Store, token: Uuid) -> AppResult<()> {
    store.delete_session(token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("123456789").unwrap();
        assert_ne!(hash, "123456789");
        assert!(verify_password(&hash, "123456789"));
        assert!(!verify_password(&hash, "wrong"));
        assert!(!verify_password("not a hash", "123456789"));
    }

    #[tokio::test]
    async fn test_register_collects_all_field_errors() {
        let store = MemoryStore::new();
        let result = register(
            &store,
            Some("aq".to_string()),
            Some("12".to_string()),
            Some("12".to_string()),
            None,
        )
        .await;

        match result {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.get("name"), Some(NAME_LENGTH_MESSAGE));
                assert_eq!(errors.get("password"), Some(PASSWORD_LENGTH_MESSAGE));
                assert_eq!(errors.get("gender"), Some("Please, select gender"));
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_unconfirmed_password() {
        let store = MemoryStore::new();
        let result = register(
            &store,
            Some("newUser1337".to_string()),
            Some("123456789".to_string()),
            Some("different".to_string()),
            Some("male".to_string()),
        )
        .await;

        match result {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.get("passwordConfirm"), Some("Password is not confirmed"));
                assert_eq!(errors.get("name"), None);
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_taken_name() {
        let store = MemoryStore::new();
        register(
            &store,
            Some("newUser1337".to_string()),
            Some("123456789".to_string()),
            Some("123456789".to_string()),
            Some("male".to_string()),
        )
        .await
        .unwrap();

        let result = register(
            &store,
            Some("newUser1337".to_string()),
            Some("987654321".to_string()),
            Some("987654321".to_string()),
            Some("female".to_string()),
        )
        .await;

        match result {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.get("name"), Some("User with this name already exists"));
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_login_and_session_flow() {
        let store = MemoryStore::new();
        let (user, _) = register(
            &store,
            Some("user".to_string()),
            Some("123456789".to_string()),
            Some("123456789".to_string()),
            Some("male".to_string()),
        )
        .await
        .unwrap();

        let (logged_in, token) = login(&store, "user", "123456789").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(store.session_user(token).await.unwrap().unwrap().id, user.id);

        logout(&store, token).await.unwrap();
        assert!(store.session_user(token).await.unwrap().is_none());

        assert!(matches!(
            login(&store, "user", "wrong").await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            login(&store, "nobody", "123456789").await,
            Err(AppError::Unauthenticated)
        ));
    }
}
