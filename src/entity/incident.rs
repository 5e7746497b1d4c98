use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::table::Record;

/// `incident_reports.csv` 한 행.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "Id")]
    pub id: Uuid,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Type")]
    pub incident_type: IncidentType,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Auto_Location")]
    pub auto_location: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Image")]
    pub image: String,
}

impl Record for Model {
    const HEADERS: &'static [&'static str] = &[
        "Id",
        "Timestamp",
        "Username",
        "Type",
        "Location",
        "Auto_Location",
        "Description",
        "Image",
    ];
}

impl Model {
    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum IncidentType {
    Fire,
    Injury,
    #[serde(rename = "Chemical Spill")]
    ChemicalSpill,
    Other,
}

impl IncidentType {
    pub const ALL: [IncidentType; 4] = [
        IncidentType::Fire,
        IncidentType::Injury,
        IncidentType::ChemicalSpill,
        IncidentType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::Fire => "Fire",
            IncidentType::Injury => "Injury",
            IncidentType::ChemicalSpill => "Chemical Spill",
            IncidentType::Other => "Other",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownIncidentType(pub String);

impl fmt::Display for UnknownIncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "알 수 없는 사고 유형: {}", self.0)
    }
}

impl std::error::Error for UnknownIncidentType {}

impl FromStr for IncidentType {
    type Err = UnknownIncidentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IncidentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownIncidentType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::IncidentType;

    #[test]
    fn parses_every_display_name() {
        for t in IncidentType::ALL {
            assert_eq!(t.as_str().parse::<IncidentType>().unwrap(), t);
        }
    }

    #[test]
    fn rejects_variant_identifier_and_wrong_case() {
        assert!("ChemicalSpill".parse::<IncidentType>().is_err());
        assert!("fire".parse::<IncidentType>().is_err());
    }

    #[test]
    fn chemical_spill_serializes_with_space() {
        let json = serde_json::to_string(&IncidentType::ChemicalSpill).unwrap();
        assert_eq!(json, "\"Chemical Spill\"");
    }
}
