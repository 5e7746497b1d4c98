use actix_multipart::{Field, Multipart};
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{get, post, put, web, HttpResponse};
use bytes::BytesMut;
use futures_util::{StreamExt, TryStreamExt};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::Session;
use crate::configuration::Settings;
use crate::db::Storage;
use crate::entity::incident::IncidentType;
use crate::entity::user::Role;
use crate::model::global_error::{AppError, ErrorCode, ValidationFieldError};
use crate::model::report::{ReportResponse, SubmitReportForm, UpdateReportRequest};
use crate::store::{IncidentUpdate, NewIncident};
use crate::util::upload::{image_content_type, is_allowed_image};

const TEXT_FIELD_LIMIT: usize = 64 * 1024;

#[derive(Debug, Default)]
struct SubmissionForm {
    incident_type: Option<String>,
    location: String,
    description: String,
    auto_location: Option<String>,
    image: Option<UploadedImage>,
}

#[derive(Debug)]
struct UploadedImage {
    filename: String,
    bytes: BytesMut,
}

#[utoipa::path(
    post,
    path = "/api/reports",
    summary = "사고 신고 제출",
    request_body(content = SubmitReportForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "신고 저장 성공", body = ReportResponse),
        (status = 400, description = "필수값 누락 또는 허용되지 않는 이미지", body = crate::model::global_error::ErrorResponse),
        (status = 401, description = "로그인 필요"),
        (status = 403, description = "일반 사용자 전용"),
    ),
    tag = "report",
)]
#[post("/reports")]
#[instrument(skip(payload, storage, settings, session), fields(username = session.username()))]
pub async fn submit_report(
    session: Session,
    payload: Multipart,
    storage: web::Data<Storage>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, AppError> {
    let username = session.require_role(Role::User)?;

    let form = read_submission(payload, settings.max_upload_bytes).await?;
    let incident_type = validate_submission(&form)?;

    // 이미지를 먼저 저장하고, 그 파일명으로 행을 기록한다
    let image = match &form.image {
        Some(upload) => storage.incidents.save_image(&upload.filename, &upload.bytes).await?,
        None => String::new(),
    };

    let report = storage
        .incidents
        .save_incident(NewIncident {
            username: username.to_string(),
            incident_type,
            location: form.location,
            auto_location: form.auto_location,
            description: form.description,
            image,
        })
        .await?;

    info!(report_id = %report.id, "신고 접수 완료");
    Ok(HttpResponse::Created().json(ReportResponse::from(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/mine",
    summary = "내 신고 목록",
    responses(
        (status = 200, description = "내 신고 목록", body = Vec<ReportResponse>),
    ),
    tag = "report",
)]
#[get("/reports/mine")]
pub async fn list_my_reports(
    session: Session,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let username = session.require_role(Role::User)?;

    let reports: Vec<ReportResponse> = storage
        .incidents
        .list_for_user(username)
        .await?
        .into_iter()
        .map(ReportResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(reports))
}

#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    summary = "내 신고 수정",
    params(
        ("id" = Uuid, Path, description = "신고 ID"),
    ),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "수정된 신고", body = ReportResponse),
        (status = 404, description = "신고 없음 또는 본인 신고 아님"),
    ),
    tag = "report",
)]
#[put("/reports/{id}")]
#[instrument(skip(body, storage, session), fields(username = session.username()))]
pub async fn update_report(
    session: Session,
    path: web::Path<Uuid>,
    body: web::Json<UpdateReportRequest>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let username = session.require_role(Role::User)?;
    let report_id = path.into_inner();
    let body = body.into_inner();

    validate_required(&body.location, &body.description)?;

    storage
        .incidents
        .find(report_id)
        .await?
        .filter(|r| r.username == username)
        .ok_or_else(|| AppError::not_found(ErrorCode::ReportNotFound))?;

    let updated = storage
        .incidents
        .update_incident(
            report_id,
            IncidentUpdate {
                incident_type: body.incident_type,
                location: body.location,
                description: body.description,
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::ReportNotFound))?;

    Ok(HttpResponse::Ok().json(ReportResponse::from(updated)))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}/image",
    summary = "첨부 이미지 조회",
    params(
        ("id" = Uuid, Path, description = "신고 ID"),
    ),
    responses(
        (status = 200, description = "이미지 바이트", content_type = "image/*"),
        (status = 404, description = "신고 또는 이미지 없음"),
    ),
    tag = "report",
)]
#[get("/reports/{id}/image")]
pub async fn get_report_image(
    session: Session,
    path: web::Path<Uuid>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let (username, role) = session.require_login()?;

    // 다른 사용자의 신고는 존재 여부도 드러내지 않는다
    let report = storage
        .incidents
        .find(path.into_inner())
        .await?
        .filter(|r| role == Role::Admin || r.username == username)
        .ok_or_else(|| AppError::not_found(ErrorCode::ReportNotFound))?;

    let bytes = storage
        .incidents
        .read_image(&report.image)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::ImageNotFound))?;

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, image_content_type(&report.image)))
        .body(bytes))
}

async fn read_submission(mut payload: Multipart, max_upload_bytes: usize) -> Result<SubmissionForm, AppError> {
    let mut form = SubmissionForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or_default()
                    .to_string();
                let bytes = read_field(&mut field, max_upload_bytes, ErrorCode::ImageTooLarge).await?;

                // 파일을 고르지 않은 빈 파트는 무시
                if !filename.is_empty() && !bytes.is_empty() {
                    form.image = Some(UploadedImage { filename, bytes });
                }
            }
            "type" | "location" | "description" | "auto_location" => {
                let bytes = read_field(&mut field, TEXT_FIELD_LIMIT, ErrorCode::InvalidForm).await?;
                let value = String::from_utf8(bytes.to_vec())
                    .map_err(|_| AppError::with_detail(ErrorCode::InvalidForm, format!("{} 필드가 UTF-8이 아닙니다", name)))?;

                match name.as_str() {
                    "type" => form.incident_type = Some(value),
                    "location" => form.location = value,
                    "description" => form.description = value,
                    _ => form.auto_location = Some(value),
                }
            }
            _ => {
                // 모르는 필드는 읽고 버린다
                while let Some(chunk) = field.next().await {
                    chunk?;
                }
            }
        }
    }

    Ok(form)
}

async fn read_field(field: &mut Field, limit: usize, too_large: ErrorCode) -> Result<BytesMut, AppError> {
    let mut buf = BytesMut::new();

    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if buf.len() + chunk.len() > limit {
            return Err(AppError::new(too_large));
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}

fn validate_submission(form: &SubmissionForm) -> Result<IncidentType, AppError> {
    let mut errors = Vec::new();

    let incident_type = match form.incident_type.as_deref() {
        None => {
            errors.push(ValidationFieldError::new("type", "사고 유형은 필수입니다."));
            None
        }
        Some(raw) => match raw.parse::<IncidentType>() {
            Ok(t) => Some(t),
            Err(_) => {
                errors.push(ValidationFieldError::new("type", "알 수 없는 사고 유형입니다."));
                None
            }
        },
    };

    if form.location.is_empty() {
        errors.push(ValidationFieldError::new("location", "위치는 필수입니다."));
    }

    if form.description.is_empty() {
        errors.push(ValidationFieldError::new("description", "설명은 필수입니다."));
    }

    if let Some(image) = &form.image {
        if !is_allowed_image(&image.filename) {
            errors.push(ValidationFieldError::new("image", "jpg, jpeg, png 이미지만 첨부할 수 있습니다."));
        }
    }

    match incident_type {
        Some(t) if errors.is_empty() => Ok(t),
        _ => Err(AppError::ValidationError(errors)),
    }
}

fn validate_required(location: &str, description: &str) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if location.is_empty() {
        errors.push(ValidationFieldError::new("location", "위치는 필수입니다."));
    }

    if description.is_empty() {
        errors.push(ValidationFieldError::new("description", "설명은 필수입니다."));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(location: &str, description: &str) -> SubmissionForm {
        SubmissionForm {
            incident_type: Some("Fire".to_string()),
            location: location.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    fn fields(err: AppError) -> Vec<String> {
        match err {
            AppError::ValidationError(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn complete_form_yields_selected_type() {
        let mut f = form("Block B", "smoke seen");
        f.incident_type = Some("Chemical Spill".to_string());
        assert_eq!(validate_submission(&f).unwrap(), IncidentType::ChemicalSpill);
    }

    #[test]
    fn empty_location_and_description_are_rejected() {
        let err = validate_submission(&form("", "")).unwrap_err();
        assert_eq!(fields(err), vec!["location", "description"]);
    }

    #[test]
    fn whitespace_counts_as_present() {
        assert_eq!(validate_submission(&form(" ", " ")).unwrap(), IncidentType::Fire);
        assert!(validate_required(" ", "\t").is_ok());
    }

    #[test]
    fn unknown_type_and_disallowed_image_are_rejected() {
        let mut f = form("Block B", "smoke");
        f.incident_type = Some("Flood".to_string());
        f.image = Some(UploadedImage {
            filename: "clip.gif".to_string(),
            bytes: BytesMut::from(&b"GIF89a"[..]),
        });

        let err = validate_submission(&f).unwrap_err();
        assert_eq!(fields(err), vec!["type", "image"]);
    }

    #[test]
    fn edit_requires_location_and_description() {
        assert!(validate_required("Lab 3", "acid").is_ok());
        assert_eq!(fields(validate_required("Lab 3", "").unwrap_err()), vec!["description"]);
    }
}
