use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Male,
            2 => Self::Female,
            _ => Self::Unknown,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Male => 1,
            Self::Female => 2,
            Self::Unknown => 0,
        }
    }
}

impl From<u8> for Sex {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<Sex> for u8 {
    fn from(sex: Sex) -> Self {
        sex.code()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum AffectedStatus {
    #[default]
    Unknown,
    Unaffected,
    Affected,
}

impl AffectedStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Unaffected,
            2 => Self::Affected,
            _ => Self::Unknown,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Unaffected => 1,
            Self::Affected => 2,
        }
    }
}

impl From<u8> for AffectedStatus {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<AffectedStatus> for u8 {
    fn from(status: AffectedStatus) -> Self {
        status.code()
    }
}

/// One row of a pedigree: an individual plus references to its parents.
/// Parent ids either point at another record in the same call or are absent;
/// dangling references are tolerated and degrade the layout instead of
/// aborting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedigreeRecord {
    #[serde(alias = "familyId")]
    pub family_id: String,
    #[serde(alias = "individualId")]
    pub individual_id: String,
    #[serde(default, alias = "paternalId", skip_serializing_if = "Option::is_none")]
    pub paternal_id: Option<String>,
    #[serde(default, alias = "maternalId", skip_serializing_if = "Option::is_none")]
    pub maternal_id: Option<String>,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub affected: AffectedStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deceased: Option<bool>,
}

impl PedigreeRecord {
    pub fn new(family_id: &str, individual_id: &str) -> Self {
        Self {
            family_id: family_id.to_string(),
            individual_id: individual_id.to_string(),
            paternal_id: None,
            maternal_id: None,
            sex: Sex::Unknown,
            affected: AffectedStatus::Unknown,
            deceased: None,
        }
    }

    pub fn with_parents(mut self, paternal: &str, maternal: &str) -> Self {
        self.paternal_id = Some(paternal.to_string());
        self.maternal_id = Some(maternal.to_string());
        self
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn is_founder(&self) -> bool {
        self.paternal_id.is_none() && self.maternal_id.is_none()
    }

    pub fn parent_ids(&self) -> impl Iterator<Item = &str> {
        self.paternal_id
            .as_deref()
            .into_iter()
            .chain(self.maternal_id.as_deref())
    }
}
