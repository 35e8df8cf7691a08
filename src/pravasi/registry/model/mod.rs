use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

mod seed;

pub use seed::seed_state;

/// Identifier of a [`WorkYear`].
pub type YearId = String;
/// Identifier of an [`EstablishmentMaster`].
pub type MasterId = String;
/// Identifier of a [`YearlyEstablishment`].
pub type YearlyEstablishmentId = String;
/// Identifier of a [`WorkerRegistration`].
pub type WorkerId = String;

/// Version written into every persisted snapshot.
pub const SCHEMA_VERSION: u32 = 1;

/// Establishment categories offered when registering a master record.
pub const ESTABLISHMENT_TYPES: [&str; 6] = [
    "Brick Kiln",
    "Construction Site",
    "Rice Mill",
    "Pharma Unit",
    "Logistics Hub",
    "Other",
];

/// Lifecycle of a work year. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum YearStatus {
    Active,
    Closed,
}

/// One annual registration cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkYear {
    pub id: YearId,
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: YearStatus,
}

impl WorkYear {
    pub fn is_closed(&self) -> bool {
        self.status == YearStatus::Closed
    }
}

/// Year-independent identity of an employer or site operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentMaster {
    pub id: MasterId,
    pub name: String,
    pub registration_number: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Activation of a master establishment for one work year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyEstablishment {
    pub id: YearlyEstablishmentId,
    pub year_id: YearId,
    pub master_id: MasterId,
    pub site_address: String,
    pub owner_name: String,
    pub owner_mobile: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single worker's registration for one cycle at one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRegistration {
    pub id: WorkerId,
    pub year_id: YearId,
    pub establishment_id: YearlyEstablishmentId,
    pub name: String,
    pub father_name: String,
    pub age: u8,
    pub gender: Gender,
    pub caste: String,
    pub mobile: String,
    pub aadhaar_number: String,
    pub native_state: String,
    pub nature_of_work: String,
    pub joining_date: NaiveDate,
    pub expected_end_date: NaiveDate,
    pub has_family_at_site: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A dependent living with a worker at the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    pub id: String,
    pub worker_reg_id: WorkerId,
    pub name: String,
    pub relation: String,
    pub age: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceMode {
    Cash,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    Other,
}

/// Append-only cash advance ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRecord {
    pub id: String,
    pub worker_reg_id: WorkerId,
    pub amount: f64,
    pub date: NaiveDate,
    pub mode: AdvanceMode,
    pub remarks: String,
}

/// Full registry snapshot. This is the unit that gets persisted and synced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    pub years: Vec<WorkYear>,
    pub current_year_id: YearId,
    pub establishments: Vec<EstablishmentMaster>,
    pub yearly_establishments: Vec<YearlyEstablishment>,
    pub workers: Vec<WorkerRegistration>,
    pub family_members: Vec<FamilyMember>,
    #[serde(default)]
    pub advances: Vec<AdvanceRecord>,
    #[serde(
        default,
        alias = "googleSheetUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub integration_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

fn legacy_schema_version() -> u32 {
    1
}

impl AppState {
    /// An empty registry with no years.
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            years: Vec::new(),
            current_year_id: String::new(),
            establishments: Vec::new(),
            yearly_establishments: Vec::new(),
            workers: Vec::new(),
            family_members: Vec::new(),
            advances: Vec::new(),
            integration_endpoint: None,
            last_synced_at: None,
        }
    }

    pub fn year(&self, id: &str) -> Option<&WorkYear> {
        self.years.iter().find(|year| year.id == id)
    }

    pub fn master(&self, id: &str) -> Option<&EstablishmentMaster> {
        self.establishments.iter().find(|master| master.id == id)
    }

    pub fn yearly_establishment(&self, id: &str) -> Option<&YearlyEstablishment> {
        self.yearly_establishments.iter().find(|link| link.id == id)
    }

    pub fn worker(&self, id: &str) -> Option<&WorkerRegistration> {
        self.workers.iter().find(|worker| worker.id == id)
    }

    pub fn current_year(&self) -> Option<&WorkYear> {
        self.year(&self.current_year_id)
    }

    /// Checks the invariants that must hold for a snapshot to be usable.
    pub fn check_integrity(&self) -> std::result::Result<(), String> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(format!(
                "snapshot schema version {} is newer than supported version {SCHEMA_VERSION}",
                self.schema_version
            ));
        }
        if !self.years.is_empty() && self.current_year().is_none() {
            return Err(format!(
                "current year '{}' does not match any stored year",
                self.current_year_id
            ));
        }
        Ok(())
    }
}
