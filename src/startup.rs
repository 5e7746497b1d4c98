use actix_web::web::{self, scope};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::auth::AuthMiddleware;
use crate::docs::ApiDoc;

/// 라우트 등록. `Storage`, `JwtUtils`, `Settings`는 호출하는 쪽에서 `app_data`로 넣는다.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api::health_check::health_check)
        .service(api::register)
        .service(api::login)
        .service(api::logout)
        .service(
            scope("/api")
                .wrap(AuthMiddleware)
                .service(api::get_session)
                .service(api::submit_report)
                .service(api::list_my_reports)
                .service(api::update_report)
                .service(api::get_report_image)
                .service(api::list_reports)
                .service(api::export_reports)
                .service(api::list_users)
                .service(api::reset_password)
                .service(api::delete_user),
        )
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
}
