use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        claims::Identity,
        dto::{LoginRequest, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::UserRepo,
        repo_types::NewUser,
    },
    error::AppError,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates an account. No token is issued; the client logs in separately.
pub async fn register(users: &dyn UserRepo, req: RegisterRequest) -> Result<PublicUser, AppError> {
    let name = req.name.trim();
    let email = normalize_email(&req.email);
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::MissingField);
    }

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    if req.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = hash_password(&req.password)?;

    // The unique index settles concurrent registrations for the same email.
    let user = users
        .insert(NewUser {
            name: name.to_string(),
            email,
            password_hash,
            is_admin: req.is_admin.unwrap_or(false),
        })
        .await?
        .ok_or_else(|| {
            warn!("email registered concurrently");
            AppError::DuplicateEmail
        })?;

    info!(user_id = %user.id, email = %user.email, is_admin = user.is_admin, "user registered");
    Ok(PublicUser::from(user))
}

/// Verifies credentials and issues a session token.
///
/// An unknown email and a wrong password fail identically.
pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<(String, PublicUser), AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::MissingField);
    }

    let Some(user) = users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.sign(Identity {
        id: user.id,
        is_admin: user.is_admin,
    })?;

    info!(user_id = %user.id, "user logged in");
    Ok((token, PublicUser::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_keys, MemoryStore};

    fn register_req(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            is_admin: None,
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@x.com"));
        assert!(!is_valid_email("ax.com"));
    }

    #[tokio::test]
    async fn register_normalizes_and_hides_hash() {
        let store = MemoryStore::default();
        let user = register(&store, register_req(" A ", "  A@X.com ", "secret1"))
            .await
            .expect("register");
        assert_eq!(user.name, "A");
        assert_eq!(user.email, "a@x.com");
        assert!(!user.is_admin);

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["isAdmin"], false);

        let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
    }

    #[tokio::test]
    async fn register_requires_all_fields() {
        let store = MemoryStore::default();
        for req in [
            register_req("", "a@x.com", "secret1"),
            register_req("A", "   ", "secret1"),
            register_req("A", "a@x.com", ""),
        ] {
            let err = register(&store, req).await.unwrap_err();
            assert!(matches!(err, AppError::MissingField));
        }
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn register_rejects_short_password_and_bad_email() {
        let store = MemoryStore::default();
        let err = register(&store, register_req("A", "a@x.com", "12345")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = register(&store, register_req("A", "not-an-email", "secret1")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_email_is_case_insensitive() {
        let store = MemoryStore::default();
        register(&store, register_req("A", "a@x.com", "secret1")).await.unwrap();

        for email in ["a@x.com", "A@X.COM", " a@X.com"] {
            let err = register(&store, register_req("Other", email, "secret2"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::DuplicateEmail));
        }
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn register_keeps_admin_flag() {
        let store = MemoryStore::default();
        let mut req = register_req("C", "c@x.com", "secret3");
        req.is_admin = Some(true);
        let user = register(&store, req).await.unwrap();
        assert!(user.is_admin);
    }

    #[tokio::test]
    async fn login_issues_token_for_identity() {
        let store = MemoryStore::default();
        let keys = test_keys();
        let mut req = register_req("C", "c@x.com", "secret3");
        req.is_admin = Some(true);
        let registered = register(&store, req).await.unwrap();

        let (token, user) = login(&store, &keys, login_req("C@x.com", "secret3"))
            .await
            .expect("login");
        assert_eq!(user, registered);

        let claims = keys.verify(&token).expect("token verifies");
        assert_eq!(claims.sub, registered.id);
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let store = MemoryStore::default();
        let keys = test_keys();
        register(&store, register_req("A", "a@x.com", "secret1")).await.unwrap();

        let wrong_password = login(&store, &keys, login_req("a@x.com", "secret2"))
            .await
            .unwrap_err();
        let unknown_email = login(&store, &keys, login_req("nobody@x.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_email, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.status_code(), unknown_email.status_code());
    }

    #[tokio::test]
    async fn login_requires_fields() {
        let store = MemoryStore::default();
        let err = login(&store, &test_keys(), login_req("", "x")).await.unwrap_err();
        assert!(matches!(err, AppError::MissingField));
    }
}
