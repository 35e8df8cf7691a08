//! Typed inputs for every registry mutation.
//!
//! Each command is validated field by field before the store sees it, so the
//! store only has to check cross-entity rules.

use chrono::NaiveDate;

use crate::pravasi::registry::error::{RegistryError, Result};
use crate::pravasi::registry::model::{AdvanceMode, Gender, WorkerRegistration};
use crate::pravasi::registry::validation::{
    MAX_FAMILY_MEMBER_AGE, Validate, require_text, validate_aadhaar, validate_worker_age,
};

/// Opens a new registration cycle.
#[derive(Debug, Clone)]
pub struct NewYear {
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Validate for NewYear {
    fn validate(&self) -> Result<()> {
        require_text("label", &self.label)?;
        if self.end_date <= self.start_date {
            return Err(RegistryError::validation(
                "endDate",
                format!(
                    "{} must be after start date {}",
                    self.end_date, self.start_date
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewEstablishment {
    pub name: String,
    pub registration_number: String,
    pub kind: String,
}

impl Validate for NewEstablishment {
    fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("registrationNumber", &self.registration_number)
    }
}

/// Activates a master establishment for a work year.
#[derive(Debug, Clone)]
pub struct LinkEstablishment {
    pub master_id: String,
    pub year_id: String,
    pub site_address: String,
    pub owner_name: String,
    pub owner_mobile: String,
}

impl Validate for LinkEstablishment {
    fn validate(&self) -> Result<()> {
        require_text("masterId", &self.master_id)?;
        require_text("yearId", &self.year_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewWorker {
    pub year_id: String,
    pub establishment_id: String,
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
    pub notes: Option<String>,
}

impl Validate for NewWorker {
    fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        validate_worker_age(self.age)?;
        validate_aadhaar(&self.aadhaar_number)
    }
}

/// Partial update of a worker registration. `None` leaves a field unchanged.
///
/// The owning year cannot be changed; a registration belongs to exactly one
/// cycle for its whole life.
#[derive(Debug, Clone, Default)]
pub struct WorkerUpdate {
    pub establishment_id: Option<String>,
    pub name: Option<String>,
    pub father_name: Option<String>,
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    pub caste: Option<String>,
    pub mobile: Option<String>,
    pub aadhaar_number: Option<String>,
    pub native_state: Option<String>,
    pub nature_of_work: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub has_family_at_site: Option<bool>,
    /// An empty string clears the notes.
    pub notes: Option<String>,
}

impl WorkerUpdate {
    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Self::default()
        }
    }

    /// Applies the present fields onto `worker`.
    pub fn apply_to(self, worker: &mut WorkerRegistration) {
        if let Some(value) = self.establishment_id {
            worker.establishment_id = value;
        }
        if let Some(value) = self.name {
            worker.name = value.trim().to_string();
        }
        if let Some(value) = self.father_name {
            worker.father_name = value;
        }
        if let Some(value) = self.age {
            worker.age = value;
        }
        if let Some(value) = self.gender {
            worker.gender = value;
        }
        if let Some(value) = self.caste {
            worker.caste = value;
        }
        if let Some(value) = self.mobile {
            worker.mobile = value;
        }
        if let Some(value) = self.aadhaar_number {
            worker.aadhaar_number = value;
        }
        if let Some(value) = self.native_state {
            worker.native_state = value;
        }
        if let Some(value) = self.nature_of_work {
            worker.nature_of_work = value;
        }
        if let Some(value) = self.joining_date {
            worker.joining_date = value;
        }
        if let Some(value) = self.expected_end_date {
            worker.expected_end_date = value;
        }
        if let Some(value) = self.has_family_at_site {
            worker.has_family_at_site = value;
        }
        if let Some(value) = self.notes {
            worker.notes = normalize_notes(Some(value));
        }
    }
}

impl Validate for WorkerUpdate {
    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(establishment_id) = &self.establishment_id {
            require_text("establishmentId", establishment_id)?;
        }
        if let Some(age) = self.age {
            validate_worker_age(age)?;
        }
        if let Some(aadhaar) = &self.aadhaar_number {
            validate_aadhaar(aadhaar)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewFamilyMember {
    pub worker_reg_id: String,
    pub name: String,
    pub relation: String,
    pub age: u8,
    pub notes: Option<String>,
}

impl Validate for NewFamilyMember {
    fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("relation", &self.relation)?;
        if self.age > MAX_FAMILY_MEMBER_AGE {
            return Err(RegistryError::validation(
                "age",
                format!("{} exceeds {MAX_FAMILY_MEMBER_AGE}", self.age),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewAdvance {
    pub worker_reg_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub mode: AdvanceMode,
    pub remarks: String,
}

impl Validate for NewAdvance {
    fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(RegistryError::validation(
                "amount",
                format!("{} must be a positive amount", self.amount),
            ));
        }
        Ok(())
    }
}

/// Worker search criteria used by [`RegistryStore::query_workers`].
///
/// [`RegistryStore::query_workers`]: crate::store::RegistryStore::query_workers
#[derive(Debug, Clone, Default)]
pub struct WorkerFilter {
    pub text: Option<String>,
    pub establishment_id: Option<String>,
}

impl WorkerFilter {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            establishment_id: None,
        }
    }

    /// Name matches case-insensitively; mobile and Aadhaar match as typed.
    pub fn matches(&self, worker: &WorkerRegistration) -> bool {
        if let Some(establishment_id) = &self.establishment_id {
            if &worker.establishment_id != establishment_id {
                return false;
            }
        }

        match self.text.as_deref() {
            None => true,
            Some(text) if text.trim().is_empty() => true,
            Some(text) => {
                worker.name.to_lowercase().contains(&text.to_lowercase())
                    || worker.mobile.contains(text)
                    || worker.aadhaar_number.contains(text)
            }
        }
    }
}

pub(crate) fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|value| !value.trim().is_empty())
}
