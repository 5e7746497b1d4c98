use actix_web::{get, web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::Storage;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    image_dir_ready: bool,
}

#[utoipa::path(
    get,
    path = "/health-check",
    responses(
        (status = 200, description = "서버가 정상 동작 중", body = HealthResponse),
        (status = 503, description = "이미지 디렉터리 없음", body = HealthResponse),
    ),
    tag = "health check",
)]
#[get("/health-check")]
pub async fn health_check(storage: web::Data<Storage>) -> HttpResponse {
    let image_dir_ready = tokio::fs::metadata(storage.incidents.image_dir())
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    if image_dir_ready {
        HttpResponse::Ok().json(HealthResponse { status: "OK".to_string(), image_dir_ready })
    } else {
        HttpResponse::ServiceUnavailable().json(HealthResponse { status: "DEGRADED".to_string(), image_dir_ready })
    }
}
