use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};

use crate::entity::user::Role;
use crate::model::global_error::{AppError, ErrorCode};

/// 요청 하나에 대한 로그인 상태. 인증 미들웨어가 요청 확장에 넣어 두고
/// 핸들러는 추출자로 받아 쓴다.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn { username: String, role: Role },
}

impl Session {
    pub fn username(&self) -> Option<&str> {
        match self {
            Session::LoggedOut => None,
            Session::LoggedIn { username, .. } => Some(username),
        }
    }

    /// 로그인 상태이고 역할이 일치하면 사용자명을 돌려준다.
    pub fn require_role(&self, required: Role) -> Result<&str, AppError> {
        match self {
            Session::LoggedOut => Err(AppError::unauthorized(ErrorCode::LoginRequired)),
            Session::LoggedIn { username, role } if *role == required => Ok(username),
            Session::LoggedIn { .. } => Err(AppError::forbidden(ErrorCode::NotEnoughPermission)),
        }
    }

    pub fn require_login(&self) -> Result<(&str, Role), AppError> {
        match self {
            Session::LoggedOut => Err(AppError::unauthorized(ErrorCode::LoginRequired)),
            Session::LoggedIn { username, role } => Ok((username, *role)),
        }
    }
}

impl FromRequest for Session {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(req.extensions().get::<Session>().cloned().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in(role: Role) -> Session {
        Session::LoggedIn {
            username: "alice".to_string(),
            role,
        }
    }

    #[test]
    fn logged_out_session_requires_login() {
        let err = Session::LoggedOut.require_role(Role::User).unwrap_err();
        assert_eq!(err.code(), ErrorCode::LoginRequired);
        assert!(Session::LoggedOut.require_login().is_err());
    }

    #[test]
    fn roles_do_not_cross() {
        assert_eq!(logged_in(Role::User).require_role(Role::User).unwrap(), "alice");
        assert_eq!(
            logged_in(Role::User).require_role(Role::Admin).unwrap_err().code(),
            ErrorCode::NotEnoughPermission
        );
        assert_eq!(
            logged_in(Role::Admin).require_role(Role::User).unwrap_err().code(),
            ErrorCode::NotEnoughPermission
        );
    }
}
