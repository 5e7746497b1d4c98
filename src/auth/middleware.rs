use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web::Data,
    Error, HttpMessage,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use tracing::{debug, warn};

use super::jwt::{JwtUtils, TokenVerifyResult, ACCESS_TOKEN_COOKIE};
use super::session::Session;
use crate::db::Storage;
use crate::model::global_error::{AppError, ErrorCode};

/// 쿠키 또는 Bearer 헤더의 토큰으로 `Session`을 만들어 요청 확장에 넣는다.
/// 토큰이 없으면 `LoggedOut`, 잘못되었거나 만료되었으면 핸들러를 거치지 않고 401.
pub struct AuthMiddleware;

// 미들웨어 팩토리
impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match resolve_session(&req).await {
                Ok(session) => {
                    req.extensions_mut().insert(session);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn resolve_session(req: &ServiceRequest) -> Result<Session, AppError> {
    let Some(token) = extract_token(req) else {
        return Ok(Session::LoggedOut);
    };

    let jwt = req
        .app_data::<Data<JwtUtils>>()
        .ok_or_else(|| AppError::internal_error(ErrorCode::InternalError))?;
    let storage = req
        .app_data::<Data<Storage>>()
        .ok_or_else(|| AppError::internal_error(ErrorCode::InternalError))?;

    let claims = match jwt.verify_token(&token) {
        TokenVerifyResult::Valid(claims) => claims,
        TokenVerifyResult::Expired => return Err(AppError::unauthorized(ErrorCode::ExpiredSession)),
        TokenVerifyResult::Invalid => return Err(AppError::unauthorized(ErrorCode::InvalidSession)),
    };

    // 삭제된 계정이나 바뀐 역할이 바로 반영되도록 계정 테이블에서 다시 확인
    match storage.users.find(&claims.sub).await? {
        Some(account) => {
            debug!(username = %account.username, role = %account.role, "세션 확인");
            Ok(Session::LoggedIn {
                username: account.username,
                role: account.role,
            })
        }
        None => {
            warn!(username = %claims.sub, "존재하지 않는 계정의 토큰");
            Err(AppError::unauthorized(ErrorCode::InvalidSession))
        }
    }
}
