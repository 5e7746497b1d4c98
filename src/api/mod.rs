pub(crate) mod auth;
pub(crate) mod dashboard;
pub(crate) mod health_check;
pub(crate) mod report;

pub use crate::api::auth::{get_session, login, logout, register};
pub use crate::api::dashboard::{delete_user, export_reports, list_reports, list_users, reset_password};
pub use crate::api::report::{get_report_image, list_my_reports, submit_report, update_report};
