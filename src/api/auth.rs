use actix_web::{get, post, web, HttpResponse};
use tracing::{info, instrument};

use crate::auth::jwt::{build_access_token_cookie, build_logout_cookie, JwtUtils};
use crate::auth::Session;
use crate::db::Storage;
use crate::entity::user::Role;
use crate::model::auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, SessionResponse};
use crate::model::global_error::{AppError, ErrorCode, ValidationFieldError};
use crate::store::user::check_password;

#[utoipa::path(
    post,
    path = "/auth/register",
    summary = "계정 등록",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "등록 성공", body = RegisterResponse),
        (status = 400, description = "필수값 누락 또는 중복 사용자명", body = crate::model::global_error::ErrorResponse),
    ),
    tag = "auth",
)]
#[post("/auth/register")]
#[instrument(skip(body, storage), fields(username = %body.username))]
pub async fn register(
    body: web::Json<RegisterRequest>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    validate_register_request(&body.username, &body.password)?;

    let created = storage
        .users
        .save_user(&body.username, &body.password, Role::User)
        .await?;

    if !created {
        return Err(AppError::bad_request(ErrorCode::DuplicateUsername));
    }

    info!("계정 등록 완료");
    Ok(HttpResponse::Created().json(RegisterResponse {
        username: body.username.clone(),
        role: Role::User,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    summary = "로그인",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공, accessToken 쿠키 발급", body = LoginResponse),
        (status = 400, description = "잘못된 자격 증명", body = crate::model::global_error::ErrorResponse),
    ),
    tag = "auth",
)]
#[post("/auth/login")]
#[instrument(skip(body, storage, jwt), fields(username = %body.username))]
pub async fn login(
    body: web::Json<LoginRequest>,
    storage: web::Data<Storage>,
    jwt: web::Data<JwtUtils>,
) -> Result<HttpResponse, AppError> {
    // 어느 값이 틀렸는지는 알려주지 않는다
    let role = storage
        .users
        .authenticate(&body.username, &body.password)
        .await?
        .ok_or_else(|| AppError::bad_request(ErrorCode::InvalidCredentials))?;

    let token = jwt.generate_token(&body.username, role)?;

    info!(%role, "로그인 성공");
    Ok(HttpResponse::Ok()
        .cookie(build_access_token_cookie(&token, jwt.ttl()))
        .json(LoginResponse {
            username: body.username.clone(),
            role,
        }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    summary = "로그아웃",
    responses(
        (status = 204, description = "accessToken 쿠키 삭제"),
    ),
    tag = "auth",
)]
#[post("/auth/logout")]
pub async fn logout() -> HttpResponse {
    HttpResponse::NoContent()
        .cookie(build_logout_cookie())
        .finish()
}

#[utoipa::path(
    get,
    path = "/api/session",
    summary = "현재 세션 조회",
    responses(
        (status = 200, description = "로그인 상태", body = SessionResponse),
    ),
    tag = "auth",
)]
#[get("/session")]
pub async fn get_session(session: Session) -> HttpResponse {
    HttpResponse::Ok().json(SessionResponse::from(&session))
}

fn validate_register_request(username: &str, password: &str) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if username.trim().is_empty() {
        errors.push(ValidationFieldError::new("username", "사용자명은 필수입니다."));
    }

    if let Err(reason) = check_password(password) {
        errors.push(ValidationFieldError::new("password", reason));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::validate_register_request;
    use crate::model::global_error::AppError;

    #[test]
    fn both_fields_are_required() {
        match validate_register_request(" ", "") {
            Err(AppError::ValidationError(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["username", "password"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(validate_register_request("alice", "pw1").is_ok());
    }

    #[test]
    fn password_must_fit_bcrypt_input() {
        let long = "a".repeat(72);
        for password in [long.as_str(), "pw\0"] {
            match validate_register_request("alice", password) {
                Err(AppError::ValidationError(errors)) => assert_eq!(errors[0].field, "password"),
                other => panic!("unexpected: {:?}", other),
            }
        }
    }
}
