use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entity::incident::{IncidentType, Model as IncidentReport};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: Uuid,
    pub timestamp: String,
    pub username: String,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub location: String,
    pub auto_location: String,
    pub description: String,
    pub image: Option<String>,
}

impl From<IncidentReport> for ReportResponse {
    fn from(model: IncidentReport) -> Self {
        let image = model.has_image().then(|| model.image.clone());
        Self {
            id: model.id,
            timestamp: model.timestamp,
            username: model.username,
            incident_type: model.incident_type,
            location: model.location,
            auto_location: model.auto_location,
            description: model.description,
            image,
        }
    }
}

/// 신고 제출 multipart 양식 (문서용)
#[allow(dead_code)]
#[derive(Deserialize, ToSchema)]
pub struct SubmitReportForm {
    #[serde(rename = "type")]
    incident_type: IncidentType,
    location: String,
    description: String,
    /// 단말기 위치. 비어 있으면 "Unavailable"
    auto_location: Option<String>,
    /// jpg, jpeg, png
    #[schema(format = Binary)]
    image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateReportRequest {
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportFilterQuery {
    /// 사용자명 부분 일치 (대소문자 무시)
    pub username: Option<String>,
    /// 사고 유형 또는 "All"
    #[serde(rename = "type")]
    pub incident_type: Option<String>,
}
