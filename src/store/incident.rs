use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs;
use tracing::{info, instrument};
use uuid::Uuid;

use super::StoreError;
use super::table::CsvTable;
use crate::entity::incident::{IncidentType, Model as IncidentReport};
use crate::util::upload::sanitize_filename;

pub const UNAVAILABLE_LOCATION: &str = "Unavailable";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const IMAGE_PREFIX_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone)]
pub struct NewIncident {
    pub username: String,
    pub incident_type: IncidentType,
    pub location: String,
    pub auto_location: Option<String>,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone)]
pub struct IncidentUpdate {
    pub incident_type: IncidentType,
    pub location: String,
    pub description: String,
}

/// 관리자 대시보드 필터. `None`은 조건 없음.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub username: Option<String>,
    pub incident_type: Option<IncidentType>,
}

impl ReportFilter {
    pub fn matches(&self, report: &IncidentReport) -> bool {
        let username_ok = match self.username.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => report
                .username
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        };
        let type_ok = self
            .incident_type
            .is_none_or(|t| report.incident_type == t);

        username_ok && type_ok
    }

    pub fn apply(&self, reports: Vec<IncidentReport>) -> Vec<IncidentReport> {
        reports.into_iter().filter(|r| self.matches(r)).collect()
    }
}

pub struct IncidentStore {
    table: CsvTable<IncidentReport>,
    image_dir: PathBuf,
}

impl IncidentStore {
    pub fn new(path: impl Into<PathBuf>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            table: CsvTable::new(path),
            image_dir: image_dir.into(),
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub async fn ensure_image_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.image_dir)
            .await
            .map_err(|e| StoreError::io(&self.image_dir, e))
    }

    pub async fn load_incidents(&self) -> Result<Vec<IncidentReport>, StoreError> {
        self.table.load().await
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<IncidentReport>, StoreError> {
        Ok(self.load_incidents().await?.into_iter().find(|r| r.id == id))
    }

    pub async fn list_for_user(&self, username: &str) -> Result<Vec<IncidentReport>, StoreError> {
        Ok(self
            .load_incidents()
            .await?
            .into_iter()
            .filter(|r| r.username == username)
            .collect())
    }

    #[instrument(skip(self, incident), fields(username = %incident.username))]
    pub async fn save_incident(&self, incident: NewIncident) -> Result<IncidentReport, StoreError> {
        let auto_location = incident
            .auto_location
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| UNAVAILABLE_LOCATION.to_string());

        let report = IncidentReport {
            id: Uuid::new_v4(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            username: incident.username,
            incident_type: incident.incident_type,
            location: incident.location,
            auto_location,
            description: incident.description,
            image: incident.image,
        };

        let _guard = self.table.lock().await;
        self.table.append(&report).await?;

        info!(report_id = %report.id, "사고 신고 저장 완료");
        Ok(report)
    }

    /// 유형, 위치, 설명만 덮어쓴다. 해당 ID가 없으면 `None`.
    #[instrument(skip(self, update))]
    pub async fn update_incident(
        &self,
        id: Uuid,
        update: IncidentUpdate,
    ) -> Result<Option<IncidentReport>, StoreError> {
        let _guard = self.table.lock().await;
        let mut reports = self.table.load().await?;

        let Some(report) = reports.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        report.incident_type = update.incident_type;
        report.location = update.location;
        report.description = update.description;
        let updated = report.clone();

        self.table.rewrite(&reports).await?;
        info!("사고 신고 수정 완료");
        Ok(Some(updated))
    }

    /// `<YYYYMMDDHHMMSS>_<파일명>`으로 저장하고 그 이름을 돌려준다.
    /// 같은 초에 같은 이름으로 올라오면 덮어쓴다.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save_image(&self, original_filename: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let filename = format!(
            "{}_{}",
            Local::now().format(IMAGE_PREFIX_FORMAT),
            sanitize_filename(original_filename)
        );
        let path = self.image_dir.join(&filename);

        fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        info!(%filename, "이미지 저장 완료");
        Ok(filename)
    }

    pub async fn read_image(&self, filename: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if filename.is_empty() || sanitize_filename(filename) != filename {
            return Ok(None);
        }

        let path = self.image_dir.join(filename);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, IncidentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = IncidentStore::new(
            dir.path().join("incident_reports.csv"),
            dir.path().join("incident_images"),
        );
        store.ensure_image_dir().await.unwrap();
        (dir, store)
    }

    fn new_incident(username: &str, incident_type: IncidentType) -> NewIncident {
        NewIncident {
            username: username.to_string(),
            incident_type,
            location: "Block B".to_string(),
            auto_location: None,
            description: "smoke seen".to_string(),
            image: String::new(),
        }
    }

    #[tokio::test]
    async fn save_incident_appends_row_with_defaults() {
        let (_dir, store) = store().await;

        let saved = store
            .save_incident(new_incident("alice", IncidentType::Fire))
            .await
            .unwrap();

        let rows = store.load_incidents().await.unwrap();
        assert_eq!(rows, vec![saved.clone()]);
        assert_eq!(saved.username, "alice");
        assert_eq!(saved.incident_type, IncidentType::Fire);
        assert_eq!(saved.auto_location, UNAVAILABLE_LOCATION);
        assert_eq!(saved.image, "");
        assert_eq!(saved.timestamp.len(), "2025-01-01 00:00:00".len());
    }

    #[tokio::test]
    async fn blank_auto_location_becomes_unavailable() {
        let (_dir, store) = store().await;
        let mut incident = new_incident("alice", IncidentType::Other);
        incident.auto_location = Some("   ".to_string());

        let saved = store.save_incident(incident).await.unwrap();
        assert_eq!(saved.auto_location, UNAVAILABLE_LOCATION);

        let mut incident = new_incident("alice", IncidentType::Other);
        incident.auto_location = Some("3.54,103.42".to_string());
        let saved = store.save_incident(incident).await.unwrap();
        assert_eq!(saved.auto_location, "3.54,103.42");
    }

    #[tokio::test]
    async fn update_touches_only_editable_fields() {
        let (_dir, store) = store().await;
        let mut incident = new_incident("alice", IncidentType::Fire);
        incident.auto_location = Some("1,2".to_string());
        incident.image = "20250101000000_a.jpg".to_string();
        let first = store.save_incident(incident).await.unwrap();
        let second = store
            .save_incident(new_incident("bob", IncidentType::Injury))
            .await
            .unwrap();

        let updated = store
            .update_incident(
                first.id,
                IncidentUpdate {
                    incident_type: IncidentType::ChemicalSpill,
                    location: "Lab 3".to_string(),
                    description: "acid".to_string(),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, first.id);
        assert_eq!(updated.timestamp, first.timestamp);
        assert_eq!(updated.username, first.username);
        assert_eq!(updated.auto_location, first.auto_location);
        assert_eq!(updated.image, first.image);
        assert_eq!(updated.incident_type, IncidentType::ChemicalSpill);
        assert_eq!(updated.location, "Lab 3");
        assert_eq!(updated.description, "acid");

        let rows = store.load_incidents().await.unwrap();
        assert_eq!(rows, vec![updated, second]);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_none() {
        let (_dir, store) = store().await;
        store
            .save_incident(new_incident("alice", IncidentType::Fire))
            .await
            .unwrap();

        let result = store
            .update_incident(
                Uuid::new_v4(),
                IncidentUpdate {
                    incident_type: IncidentType::Other,
                    location: "x".to_string(),
                    description: "y".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn image_is_written_verbatim_and_readable() {
        let (dir, store) = store().await;

        let name = store.save_image("../evil/fire.png", b"\x89PNG").await.unwrap();
        assert!(name.ends_with("_.._evil_fire.png"));
        assert_eq!(&name[14..15], "_");
        assert!(dir.path().join("incident_images").join(&name).is_file());

        assert_eq!(store.read_image(&name).await.unwrap().unwrap(), b"\x89PNG");
        assert!(store.read_image("../incident_reports.csv").await.unwrap().is_none());
        assert!(store.read_image("missing.png").await.unwrap().is_none());
    }

    #[test]
    fn filter_by_username_substring_is_case_insensitive() {
        let report = |name: &str, t| IncidentReport {
            id: Uuid::new_v4(),
            timestamp: String::new(),
            username: name.to_string(),
            incident_type: t,
            location: String::new(),
            auto_location: UNAVAILABLE_LOCATION.to_string(),
            description: String::new(),
            image: String::new(),
        };
        let reports = vec![
            report("Alice", IncidentType::Fire),
            report("malice", IncidentType::Injury),
            report("bob", IncidentType::Fire),
        ];

        let by_name = ReportFilter {
            username: Some("ALI".to_string()),
            incident_type: None,
        };
        let names: Vec<_> = by_name
            .apply(reports.clone())
            .into_iter()
            .map(|r| r.username)
            .collect();
        assert_eq!(names, vec!["Alice", "malice"]);

        let by_type = ReportFilter {
            username: None,
            incident_type: Some(IncidentType::Fire),
        };
        assert_eq!(by_type.apply(reports.clone()).len(), 2);

        let both = ReportFilter {
            username: Some("ali".to_string()),
            incident_type: Some(IncidentType::Fire),
        };
        assert_eq!(both.apply(reports.clone()).len(), 1);

        assert_eq!(ReportFilter::default().apply(reports).len(), 3);
    }
}
