use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit,
    config::AppConfig,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest, SessionUser},
    error::{AppError, AppResult, conflict_on_unique},
    middleware::auth::AuthUser,
    models::{Role, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_registration(payload: &RegisterRequest) -> AppResult<()> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("a valid email is required"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(config: &AppConfig, user: &SessionUser) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.to_string(),
        name: user.name.clone(),
        email: user.email.clone(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    validate_registration(&payload)?;
    let RegisterRequest {
        name,
        email,
        password,
        role,
    } = payload;
    let email = email.trim().to_ascii_lowercase();
    let role = role.unwrap_or(Role::Customer);
    let password_hash = hash_password(&password)?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name.trim())
    .bind(email.as_str())
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(&state.pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Email is already taken"))?;

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("User created", user, None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = email.trim().to_ascii_lowercase();
    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let role = user
        .role
        .parse::<Role>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    let session = SessionUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role,
    };
    let token = issue_token(&state.config, &session)?;

    audit::record(
        &state.pool,
        Some(session.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": session.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            user: session,
        },
        Some(Meta::empty()),
    ))
}

pub fn session(user: &AuthUser) -> ApiResponse<SessionUser> {
    ApiResponse::success(
        "Session",
        SessionUser {
            id: user.user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        },
        Some(Meta::empty()),
    )
}
