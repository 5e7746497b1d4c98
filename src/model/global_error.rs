use actix_multipart::MultipartError;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // 400 BAD REQUEST
    ValidationError,
    DuplicateUsername,
    InvalidCredentials,
    InvalidForm,

    // 401 UNAUTHORIZED
    LoginRequired,
    ExpiredSession,
    InvalidSession,

    // 403 FORBIDDEN
    NotEnoughPermission,

    // 404 NOT FOUND
    MemberNotFound,
    ReportNotFound,
    ImageNotFound,

    // 413 PAYLOAD TOO LARGE
    ImageTooLarge,

    // 500 SERVER ERRORS
    StorageError,
    InternalError,
    TokenGenerationFailed,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "유효성 검증에 실패했습니다",
            ErrorCode::DuplicateUsername => "이미 존재하는 사용자명입니다",
            ErrorCode::InvalidCredentials => "잘못된 자격 증명입니다",
            ErrorCode::InvalidForm => "요청 양식을 읽을 수 없습니다",

            ErrorCode::LoginRequired => "로그인이 필요합니다",
            ErrorCode::ExpiredSession => "로그인 세션이 만료되었습니다",
            ErrorCode::InvalidSession => "유효하지 않은 로그인 세션입니다",

            ErrorCode::NotEnoughPermission => "권한이 부족합니다",

            ErrorCode::MemberNotFound => "사용자를 찾을 수 없습니다",
            ErrorCode::ReportNotFound => "신고를 찾을 수 없습니다",
            ErrorCode::ImageNotFound => "첨부 이미지를 찾을 수 없습니다",

            ErrorCode::ImageTooLarge => "이미지 크기가 허용 한도를 넘었습니다",

            ErrorCode::StorageError => "저장소 오류가 발생했습니다",
            ErrorCode::InternalError => "내부 서버 오류가 발생했습니다",
            ErrorCode::TokenGenerationFailed => "토큰 생성에 실패했습니다",
        }
    }

    pub fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            ErrorCode::ValidationError |
            ErrorCode::DuplicateUsername |
            ErrorCode::InvalidCredentials |
            ErrorCode::InvalidForm => StatusCode::BAD_REQUEST,

            ErrorCode::LoginRequired |
            ErrorCode::ExpiredSession |
            ErrorCode::InvalidSession => StatusCode::UNAUTHORIZED,

            ErrorCode::NotEnoughPermission => StatusCode::FORBIDDEN,

            ErrorCode::MemberNotFound |
            ErrorCode::ReportNotFound |
            ErrorCode::ImageNotFound => StatusCode::NOT_FOUND,

            ErrorCode::ImageTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            ErrorCode::StorageError |
            ErrorCode::InternalError |
            ErrorCode::TokenGenerationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

impl ValidationFieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    ApiError(ErrorCode, Option<String>),

    #[error("{}", ErrorCode::ValidationError.message())]
    ValidationError(Vec<ValidationFieldError>),
}

impl AppError {
    pub fn new(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }

    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        AppError::ApiError(code, Some(detail.into()))
    }

    pub fn bad_request(code: ErrorCode) -> Self {
        Self::new(code)
    }

    pub fn unauthorized(code: ErrorCode) -> Self {
        Self::new(code)
    }

    pub fn forbidden(code: ErrorCode) -> Self {
        Self::new(code)
    }

    pub fn not_found(code: ErrorCode) -> Self {
        Self::new(code)
    }

    pub fn internal_error(code: ErrorCode) -> Self {
        Self::new(code)
    }

    pub fn validation(field: &str, message: &str) -> Self {
        AppError::ValidationError(vec![ValidationFieldError::new(field, message)])
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::ApiError(code, _) => *code,
            AppError::ValidationError(_) => ErrorCode::ValidationError,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ValidationFieldError>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        self.code().status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.code();
        let (detail, errors) = match self {
            AppError::ApiError(_, detail) => (detail.clone(), Vec::new()),
            AppError::ValidationError(errors) => (None, errors.clone()),
        };

        HttpResponse::build(code.status_code()).json(ErrorResponse {
            code: format!("{:?}", code),
            message: code.message().to_string(),
            detail,
            errors,
        })
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        if let StoreError::InvalidPassword(reason) = err {
            return AppError::validation("password", reason);
        }
        error!("저장소 오류: {}", err);
        AppError::new(ErrorCode::StorageError)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        error!("토큰 생성 실패: {}", err);
        AppError::new(ErrorCode::TokenGenerationFailed)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::with_detail(ErrorCode::InvalidForm, err.to_string())
    }
}
