use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(title = "Campus Incident Reporting API"),
    paths(
        api::health_check::health_check,
        api::auth::register,
        api::auth::login,
        api::auth::logout,
        api::auth::get_session,
        api::report::submit_report,
        api::report::list_my_reports,
        api::report::update_report,
        api::report::get_report_image,
        api::dashboard::list_reports,
        api::dashboard::export_reports,
        api::dashboard::list_users,
        api::dashboard::reset_password,
        api::dashboard::delete_user,
    ),
    tags(
        (name = "auth", description = "계정 등록, 로그인, 세션"),
        (name = "report", description = "일반 사용자 신고 제출과 수정"),
        (name = "dashboard", description = "관리자 신고 조회와 계정 관리"),
    )
)]
pub struct ApiDoc;
