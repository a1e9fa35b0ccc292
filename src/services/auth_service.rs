use bcrypt::{hash, verify};
use serde::{Deserialize, Serialize};

use crate::models::{Account, AccountInfo};
use crate::state::AppState;
use crate::utils::{normalize_email, now_millis, AppError};

const MIN_PASSWORD_LEN: usize = 6;

// Request/Response structures
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GoogleLoginRequest {
    /// ID token returned by Google Sign-In
    pub credential: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: AccountInfo,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub success: bool,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<AccountInfo>,
}

fn open_session(state: &AppState, account: &Account) -> Result<AuthResponse, AppError> {
    let token = state.sessions.create(&account.email)?;
    Ok(AuthResponse {
        success: true,
        token,
        user: AccountInfo::from(account),
    })
}

// Email/password registration
pub async fn signup(state: &AppState, request: &SignupRequest) -> Result<AuthResponse, AppError> {
    let store = state.store()?;
    let email = normalize_email(&request.email);

    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidRequest("A valid email is required".to_string()));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if store.find_account(&email).await?.is_some() {
        return Err(AppError::Conflict("An account with this email already exists".to_string()));
    }

    let password_hash = hash(&request.password, state.config.bcrypt_cost)?;
    let now = now_millis();
    let account = Account {
        email: email.clone(),
        password_hash: Some(password_hash),
        name: request.name.clone().filter(|n| !n.trim().is_empty()),
        google_id: None,
        provider: "email".to_string(),
        created_at: now,
        last_login: Some(now),
    };
    store.insert_account(&account).await?;

    log::info!("✅ Account registered: {} (provider: email)", email);
    open_session(state, &account)
}

// Email/password login
pub async fn login_email(state: &AppState, request: &LoginRequest) -> Result<AuthResponse, AppError> {
    let store = state.store()?;
    let email = normalize_email(&request.email);

    let mut account = store
        .find_account(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let stored_hash = account.password_hash.as_ref().ok_or_else(|| {
        AppError::Unauthorized("This account uses Google login. Please sign in with Google.".to_string())
    })?;

    if !verify(&request.password, stored_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    account.last_login = Some(now_millis());
    if let Err(e) = store.update_account(&account).await {
        log::warn!("⚠️  Failed to record last login for {}: {}", email, e);
    }

    open_session(state, &account)
}

// Google Sign-In: creates the account on first use
pub async fn login_google(
    state: &AppState,
    request: &GoogleLoginRequest,
) -> Result<AuthResponse, AppError> {
    let store = state.store()?;
    if request.credential.trim().is_empty() {
        return Err(AppError::InvalidRequest("credential is required".to_string()));
    }

    let identity = state.google.verify(&request.credential).await?;
    let email = normalize_email(&identity.email);
    let now = now_millis();

    let account = match store.find_account(&email).await? {
        Some(mut account) => {
            if account.google_id.is_none() {
                account.google_id = Some(identity.google_id);
            }
            if account.name.is_none() {
                account.name = identity.name;
            }
            account.last_login = Some(now);
            store.update_account(&account).await?;
            account
        }
        None => {
            let account = Account {
                email: email.clone(),
                password_hash: None,
                name: identity.name,
                google_id: Some(identity.google_id),
                provider: "google".to_string(),
                created_at: now,
                last_login: Some(now),
            };
            store.insert_account(&account).await?;
            log::info!("✅ Account registered: {} (provider: google)", email);
            account
        }
    };

    open_session(state, &account)
}

pub async fn me(state: &AppState, email: &str) -> Result<AccountInfo, AppError> {
    let account = state
        .store()?
        .find_account(email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;
    Ok(AccountInfo::from(&account))
}

/// Drops the server-side session. Unknown or missing tokens are not an error.
pub fn logout(state: &AppState, token: Option<&str>) -> bool {
    token.map(|t| state.sessions.revoke(t)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_state;

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: "secret123".to_string(),
            name: Some("Marta".to_string()),
        }
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let state = test_state();
        let created = signup(&state, &signup_request(" Marta@Salon.com ")).await.unwrap();
        assert_eq!(created.user.email, "marta@salon.com");
        assert_eq!(state.sessions.resolve(&created.token).as_deref(), Some("marta@salon.com"));

        let logged_in = login_email(
            &state,
            &LoginRequest { email: "marta@salon.com".into(), password: "secret123".into() },
        )
        .await
        .unwrap();
        assert_ne!(logged_in.token, created.token);
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicates_and_short_passwords() {
        let state = test_state();
        signup(&state, &signup_request("a@x.com")).await.unwrap();

        let duplicate = signup(&state, &signup_request("A@X.com")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let short = signup(
            &state,
            &SignupRequest { email: "b@x.com".into(), password: "123".into(), name: None },
        )
        .await;
        assert!(matches!(short, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let state = test_state();
        signup(&state, &signup_request("a@x.com")).await.unwrap();
        let result = login_email(
            &state,
            &LoginRequest { email: "a@x.com".into(), password: "nope".into() },
        )
        .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_google_login_creates_then_reuses_account() {
        let state = test_state();
        let request = GoogleLoginRequest { credential: "google:owner@gmail.com".into() };
        let first = login_google(&state, &request).await.unwrap();
        assert_eq!(first.user.provider, "google");

        let second = login_google(&state, &request).await.unwrap();
        assert_eq!(second.user.email, "owner@gmail.com");

        let password_login = login_email(
            &state,
            &LoginRequest { email: "owner@gmail.com".into(), password: "whatever".into() },
        )
        .await;
        match password_login {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("Google")),
            other => panic!("unexpected result: {:?}", other.map(|r| r.token)),
        }
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let state = test_state();
        let created = signup(&state, &signup_request("a@x.com")).await.unwrap();
        assert!(logout(&state, Some(&created.token)));
        assert!(state.sessions.resolve(&created.token).is_none());
        assert!(!logout(&state, Some(&created.token)));
        assert!(!logout(&state, None));
    }
}
