pub mod jwt;
pub mod middleware;
pub mod session;

pub use jwt::JwtUtils;
pub use middleware::AuthMiddleware;
pub use session::Session;
