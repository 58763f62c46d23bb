//! Unauthenticated auth endpoints. These are the only routes allowed to
//! mutate credential state, and they do so exclusively through the
//! orchestrator in `sewa-auth`.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use sewa_auth::{
    AuthError, CheckAuthOutcome, LoginOutcome, PasswordResetOutcome, RegisterRequest,
};

use crate::app::dto::{
    ActivationData, ActivationRequest, ApiResponse, CheckAuthData, EmailRequest, LoginData,
    LoginRequest, NewPasswordRequest, RegisterData,
};
use crate::app::{dto, errors, services::AppServices};
use crate::middleware;

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/refresh-token", post(refresh_token))
        .route("/forget-password", post(forget_password))
        .route("/new-password", post(new_password))
        .route("/activation-token-request", post(activation_token_request))
        .route("/activation", post(activation))
        .route("/check-auth", post(check_auth))
}

/// Session cookies are httpOnly + SameSite=Strict; lifetime enforcement is
/// the token's own expiry, not the cookie's.
fn auth_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Response {
    match services.auth.login(&body.email, &body.password).await {
        Ok(LoginOutcome::Active(session)) => {
            let jar = jar
                .add(auth_cookie("access-token", session.access_token.clone()))
                .add(auth_cookie("refresh-token", session.refresh_token));

            let data = LoginData {
                id: session.user.id,
                name: session.user.name,
                email: session.user.email,
                role: session.user.role,
                access_token: session.access_token,
            };
            (jar, Json(ApiResponse::ok("login success", data))).into_response()
        }
        // Soft: directs the user to activate; no cookies, and nothing about
        // whether the password matched beyond this point.
        Ok(LoginOutcome::Inactive) => (
            StatusCode::OK,
            Json(ApiResponse::fail("account is not active")),
        )
            .into_response(),
        // Uniform message for unknown email and wrong password, to avoid
        // account enumeration.
        Err(AuthError::NotFound) | Err(AuthError::InvalidCredential) => {
            errors::json_fail(StatusCode::BAD_REQUEST, "email or password is wrong")
        }
        Err(e) => errors::auth_error_response(e),
    }
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> Response {
    let request = RegisterRequest {
        name: body.name,
        email: body.email,
        phone: body.phone,
        role: body.role,
        password: body.password,
    };

    match services.auth.register(request).await {
        Ok(user) => Json(ApiResponse::ok(
            "register success",
            RegisterData {
                name: user.name,
                email: user.email,
            },
        ))
        .into_response(),
        Err(e) => errors::auth_error_response(e),
    }
}

pub async fn refresh_token(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
) -> Response {
    let presented = jar.get("refresh-token").map(|c| c.value().to_string());

    match services.auth.refresh(presented.as_deref()).await {
        Ok(access_token) => {
            let jar = jar.add(auth_cookie("access-token", access_token));
            (jar, Json(ApiResponse::ok_empty("access token refreshed"))).into_response()
        }
        // Silent-renewal path: one generic message for absent, expired,
        // malformed, and revoked tokens alike.
        Err(AuthError::Unauthorized) => errors::json_fail(
            StatusCode::UNAUTHORIZED,
            "refresh token is invalid or expired",
        ),
        Err(e) => errors::auth_error_response(e),
    }
}

pub async fn forget_password(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<EmailRequest>,
) -> Response {
    match services.auth.forgot_password(&body.email).await {
        Ok(()) => Json(ApiResponse::ok_empty("password reset link sent")).into_response(),
        Err(AuthError::NotFound) => errors::json_fail(StatusCode::BAD_REQUEST, "email not found"),
        Err(e) => errors::auth_error_response(e),
    }
}

pub async fn new_password(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewPasswordRequest>,
) -> Response {
    match services
        .auth
        .set_new_password(&body.token, &body.password)
        .await
    {
        Ok(PasswordResetOutcome::Updated) => {
            Json(ApiResponse::ok_empty("password updated")).into_response()
        }
        // Reached from a user-facing form: soft failures with wording the
        // form can render inline.
        Ok(PasswordResetOutcome::LinkExpired) => {
            (StatusCode::OK, Json(ApiResponse::fail("token has expired"))).into_response()
        }
        Ok(PasswordResetOutcome::LinkInvalid) => {
            (StatusCode::OK, Json(ApiResponse::fail("token is invalid"))).into_response()
        }
        Err(e) => errors::auth_error_response(e),
    }
}

pub async fn activation_token_request(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<EmailRequest>,
) -> Response {
    match services.auth.activation_token_request(&body.email).await {
        Ok(()) => Json(ApiResponse::ok_empty("activation request sent")).into_response(),
        Err(e) => errors::auth_error_response(e),
    }
}

pub async fn activation(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ActivationRequest>,
) -> Response {
    match services.auth.activate(&body.token).await {
        Ok(user) => Json(ApiResponse::ok(
            "user activated",
            ActivationData {
                name: user.name,
                email: user.email,
                active: user.is_active,
            },
        ))
        .into_response(),
        Err(e) => errors::auth_error_response(e),
    }
}

/// Session probe, polled by clients. Soft `{success:false}` for the expected
/// negatives; never a hard error for "simply not logged in".
pub async fn check_auth(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Response {
    let bearer = middleware::extract_bearer(&headers);

    match services.auth.check_auth(bearer.as_deref()).await {
        Ok(CheckAuthOutcome::Authenticated { email, role }) => Json(ApiResponse::ok(
            "authenticated",
            CheckAuthData { email, role },
        ))
        .into_response(),
        Ok(CheckAuthOutcome::Anonymous) => {
            (StatusCode::OK, Json(ApiResponse::fail("unauthenticated"))).into_response()
        }
        Err(e) => errors::auth_error_response(e),
    }
}
