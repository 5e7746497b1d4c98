pub mod auth;
pub mod global_error;
pub mod report;
pub mod user;

pub use auth::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, SessionResponse};
pub use global_error::{AppError, ErrorCode, ValidationFieldError};
