use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{delete, get, put, web, HttpResponse};
use tracing::{error, info, instrument};

use crate::auth::Session;
use crate::db::Storage;
use crate::entity::incident::{IncidentType, Model as IncidentReport};
use crate::entity::user::Role;
use crate::model::global_error::{AppError, ErrorCode};
use crate::model::report::{ReportFilterQuery, ReportResponse};
use crate::model::user::{AccountResponse, ResetPasswordRequest, UsersQuery};
use crate::store::table::encode_rows;
use crate::store::ReportFilter;
use crate::store::user::check_password;

pub const EXPORT_FILENAME: &str = "incident_reports.csv";

#[utoipa::path(
    get,
    path = "/api/admin/reports",
    summary = "전체 신고 조회 (필터)",
    params(ReportFilterQuery),
    responses(
        (status = 200, description = "필터된 신고 목록", body = Vec<ReportResponse>),
        (status = 403, description = "관리자 전용"),
    ),
    tag = "dashboard",
)]
#[get("/admin/reports")]
pub async fn list_reports(
    session: Session,
    query: web::Query<ReportFilterQuery>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    session.require_role(Role::Admin)?;

    let reports: Vec<ReportResponse> = filtered_reports(&storage, &query)
        .await?
        .into_iter()
        .map(ReportResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(reports))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/export",
    summary = "필터된 신고 CSV 내려받기",
    params(ReportFilterQuery),
    responses(
        (status = 200, description = "신고 테이블과 같은 열 구성의 CSV", content_type = "text/csv"),
        (status = 403, description = "관리자 전용"),
    ),
    tag = "dashboard",
)]
#[get("/admin/reports/export")]
#[instrument(skip(session, query, storage), fields(admin = session.username()))]
pub async fn export_reports(
    session: Session,
    query: web::Query<ReportFilterQuery>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    session.require_role(Role::Admin)?;

    let reports = filtered_reports(&storage, &query).await?;
    let bytes = encode_rows(&reports, true).map_err(|e| {
        error!("CSV 내보내기 실패: {}", e);
        AppError::internal_error(ErrorCode::InternalError)
    })?;

    info!(rows = reports.len(), "신고 내보내기");
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(EXPORT_FILENAME.to_string())],
        })
        .body(bytes))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    summary = "등록된 계정 목록",
    params(UsersQuery),
    responses(
        (status = 200, description = "계정 목록 (기본은 비밀번호 가림)", body = Vec<AccountResponse>),
        (status = 403, description = "관리자 전용"),
    ),
    tag = "dashboard",
)]
#[get("/admin/users")]
pub async fn list_users(
    session: Session,
    query: web::Query<UsersQuery>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    session.require_role(Role::Admin)?;

    let users: Vec<AccountResponse> = storage
        .users
        .load_users()
        .await?
        .into_iter()
        .map(|u| AccountResponse::from_model(u, query.reveal))
        .collect();

    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{username}/password",
    summary = "계정 비밀번호 재설정",
    params(
        ("username" = String, Path, description = "대상 사용자명"),
    ),
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "재설정 완료"),
        (status = 400, description = "새 비밀번호 누락"),
        (status = 404, description = "사용자 없음"),
    ),
    tag = "dashboard",
)]
#[put("/admin/users/{username}/password")]
#[instrument(skip(session, body, storage), fields(admin = session.username()))]
pub async fn reset_password(
    session: Session,
    path: web::Path<String>,
    body: web::Json<ResetPasswordRequest>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    session.require_role(Role::Admin)?;
    let username = path.into_inner();

    if let Err(reason) = check_password(&body.new_password) {
        return Err(AppError::validation("newPassword", reason));
    }

    if !storage.users.reset_password(&username, &body.new_password).await? {
        return Err(AppError::not_found(ErrorCode::MemberNotFound));
    }

    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{username}",
    summary = "계정 삭제",
    params(
        ("username" = String, Path, description = "대상 사용자명"),
    ),
    responses(
        (status = 204, description = "삭제 완료"),
        (status = 404, description = "사용자 없음"),
    ),
    tag = "dashboard",
)]
#[delete("/admin/users/{username}")]
#[instrument(skip(session, storage), fields(admin = session.username()))]
pub async fn delete_user(
    session: Session,
    path: web::Path<String>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    session.require_role(Role::Admin)?;

    if !storage.users.delete_user(&path.into_inner()).await? {
        return Err(AppError::not_found(ErrorCode::MemberNotFound));
    }

    Ok(HttpResponse::NoContent().finish())
}

async fn filtered_reports(
    storage: &Storage,
    query: &ReportFilterQuery,
) -> Result<Vec<IncidentReport>, AppError> {
    let filter = parse_filter(query)?;
    Ok(filter.apply(storage.incidents.load_incidents().await?))
}

fn parse_filter(query: &ReportFilterQuery) -> Result<ReportFilter, AppError> {
    let incident_type = match query.incident_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) if raw.eq_ignore_ascii_case("all") => None,
        Some(raw) => Some(
            raw.parse::<IncidentType>()
                .map_err(|_| AppError::validation("type", "알 수 없는 사고 유형입니다."))?,
        ),
    };

    Ok(ReportFilter {
        username: query.username.clone(),
        incident_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(username: Option<&str>, incident_type: Option<&str>) -> ReportFilterQuery {
        ReportFilterQuery {
            username: username.map(str::to_string),
            incident_type: incident_type.map(str::to_string),
        }
    }

    #[test]
    fn all_and_missing_type_mean_no_type_filter() {
        assert!(parse_filter(&query(None, None)).unwrap().incident_type.is_none());
        assert!(parse_filter(&query(None, Some("All"))).unwrap().incident_type.is_none());
        assert!(parse_filter(&query(None, Some(""))).unwrap().incident_type.is_none());
    }

    #[test]
    fn exact_type_is_parsed() {
        let filter = parse_filter(&query(Some("al"), Some("Chemical Spill"))).unwrap();
        assert_eq!(filter.incident_type, Some(IncidentType::ChemicalSpill));
        assert_eq!(filter.username.as_deref(), Some("al"));
    }

    #[test]
    fn unknown_type_is_a_validation_error() {
        let err = parse_filter(&query(None, Some("Flood"))).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }
}
