//! The registry store: sole owner of the aggregate state.
//!
//! Every mutation runs against a working copy of the snapshot. The copy is
//! persisted through the configured [`SnapshotStore`] and only then replaces
//! the live state, so a rejected operation or a failed save leaves nothing
//! behind.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::pravasi::registry::command::{
    LinkEstablishment, NewAdvance, NewEstablishment, NewFamilyMember, NewWorker, NewYear,
    WorkerFilter, WorkerUpdate, normalize_notes,
};
use crate::pravasi::registry::error::{RegistryError, Result};
use crate::pravasi::registry::model::{
    AdvanceRecord, AppState, EstablishmentMaster, FamilyMember, Gender, WorkYear,
    WorkerRegistration, YearStatus, YearlyEstablishment,
};
use crate::pravasi::registry::persistence::{SnapshotStore, load_or_seed};
use crate::pravasi::registry::validation::{Validate, validate_url};

/// Aggregates shown on the dashboard for one work year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearStatistics {
    pub worker_count: usize,
    pub establishment_count: usize,
    pub family_count: usize,
    pub total_advances: f64,
}

/// A yearly establishment joined with its master's name.
#[derive(Debug, Clone, Copy)]
pub struct LinkedEstablishment<'a> {
    pub link: &'a YearlyEstablishment,
    /// `"Unknown"` when the master record cannot be resolved.
    pub master_name: &'a str,
}

pub struct RegistryStore<P: SnapshotStore> {
    state: AppState,
    persistence: P,
}

impl<P: SnapshotStore> RegistryStore<P> {
    /// Loads the persisted snapshot, or the seed dataset when none is usable.
    pub fn open(persistence: P) -> Self {
        let state = load_or_seed(&persistence);
        Self { state, persistence }
    }

    /// Wraps an existing snapshot without touching the persistence slot.
    pub fn with_state(state: AppState, persistence: P) -> Self {
        Self { state, persistence }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn current_year(&self) -> Option<&WorkYear> {
        self.state.current_year()
    }

    fn commit<T>(&mut self, op: impl FnOnce(&mut AppState) -> Result<T>) -> Result<T> {
        let mut next = self.state.clone();
        let value = op(&mut next)?;
        self.persistence.save(&next)?;
        self.state = next;
        Ok(value)
    }

    // ---- work years -----------------------------------------------------

    #[instrument(level = "info", skip_all, fields(label = %command.label))]
    pub fn add_year(&mut self, command: NewYear) -> Result<WorkYear> {
        command.validate()?;
        let year = WorkYear {
            id: new_id(),
            label: command.label.trim().to_string(),
            start_date: command.start_date,
            end_date: command.end_date,
            status: YearStatus::Active,
        };

        self.commit(|state| {
            state.years.push(year.clone());
            state.current_year_id = year.id.clone();
            Ok(())
        })?;
        info!(year_id = %year.id, "opened new work year");
        Ok(year)
    }

    #[instrument(level = "info", skip(self))]
    pub fn switch_current_year(&mut self, year_id: &str) -> Result<()> {
        self.commit(|state| {
            let year = state
                .year(year_id)
                .ok_or_else(|| RegistryError::not_found("work year", year_id))?;
            state.current_year_id = year.id.clone();
            Ok(())
        })
    }

    /// Finalizes a cycle. Closing an already closed year is a no-op.
    #[instrument(level = "info", skip(self))]
    pub fn close_year(&mut self, year_id: &str) -> Result<()> {
        let year = self
            .state
            .year(year_id)
            .ok_or_else(|| RegistryError::not_found("work year", year_id))?;
        if year.is_closed() {
            return Ok(());
        }

        self.commit(|state| {
            if let Some(year) = state.years.iter_mut().find(|year| year.id == year_id) {
                year.status = YearStatus::Closed;
            }
            Ok(())
        })?;
        info!("work year closed");
        Ok(())
    }

    // ---- establishments -------------------------------------------------

    #[instrument(level = "info", skip_all, fields(name = %command.name))]
    pub fn add_establishment_master(
        &mut self,
        command: NewEstablishment,
    ) -> Result<EstablishmentMaster> {
        command.validate()?;
        let master = EstablishmentMaster {
            id: new_id(),
            name: command.name.trim().to_string(),
            registration_number: command.registration_number.trim().to_string(),
            kind: command.kind,
        };

        self.commit(|state| {
            state.establishments.push(master.clone());
            Ok(())
        })?;
        info!(master_id = %master.id, "registered establishment master");
        Ok(master)
    }

    #[instrument(
        level = "info",
        skip_all,
        fields(master_id = %command.master_id, year_id = %command.year_id)
    )]
    pub fn link_establishment_to_year(
        &mut self,
        command: LinkEstablishment,
    ) -> Result<YearlyEstablishment> {
        command.validate()?;
        let LinkEstablishment {
            master_id,
            year_id,
            site_address,
            owner_name,
            owner_mobile,
        } = command;

        let link = self.commit(|state| {
            if state.master(&master_id).is_none() {
                return Err(RegistryError::not_found("establishment", &master_id));
            }
            open_year(state, &year_id)?;
            if state
                .yearly_establishments
                .iter()
                .any(|link| link.master_id == master_id && link.year_id == year_id)
            {
                return Err(RegistryError::Conflict(format!(
                    "establishment '{master_id}' is already active in year '{year_id}'"
                )));
            }

            let link = YearlyEstablishment {
                id: new_id(),
                year_id,
                master_id,
                site_address,
                owner_name,
                owner_mobile,
            };
            state.yearly_establishments.push(link.clone());
            Ok(link)
        })?;
        info!(link_id = %link.id, "establishment activated for year");
        Ok(link)
    }

    // ---- workers --------------------------------------------------------

    #[instrument(
        level = "info",
        skip_all,
        fields(year_id = %command.year_id, establishment_id = %command.establishment_id)
    )]
    pub fn register_worker(&mut self, command: NewWorker) -> Result<WorkerRegistration> {
        command.validate()?;

        let worker = self.commit(|state| {
            open_year(state, &command.year_id)?;
            resolve_link_in_year(state, &command.establishment_id, &command.year_id)?;

            let worker = WorkerRegistration {
                id: new_id(),
                year_id: command.year_id,
                establishment_id: command.establishment_id,
                name: command.name.trim().to_string(),
                father_name: command.father_name,
                age: command.age,
                gender: command.gender,
                caste: command.caste,
                mobile: command.mobile,
                aadhaar_number: command.aadhaar_number,
                native_state: command.native_state,
                nature_of_work: command.nature_of_work,
                joining_date: command.joining_date,
                expected_end_date: command.expected_end_date,
                has_family_at_site: command.has_family_at_site,
                notes: normalize_notes(command.notes),
            };
            state.workers.push(worker.clone());
            Ok(worker)
        })?;
        info!(worker_id = %worker.id, "worker registered");
        Ok(worker)
    }

    #[instrument(level = "info", skip(self, update))]
    pub fn update_worker(
        &mut self,
        worker_id: &str,
        update: WorkerUpdate,
    ) -> Result<WorkerRegistration> {
        update.validate()?;

        self.commit(|state| {
            let current = state
                .worker(worker_id)
                .ok_or_else(|| RegistryError::not_found("worker", worker_id))?;
            let year_id = current.year_id.clone();
            open_year(state, &year_id)?;

            if let Some(establishment_id) = &update.establishment_id {
                resolve_link_in_year(state, establishment_id, &year_id)?;
            }
            if update.has_family_at_site == Some(false)
                && state
                    .family_members
                    .iter()
                    .any(|member| member.worker_reg_id == worker_id)
            {
                return Err(RegistryError::InvalidState(format!(
                    "worker '{worker_id}' still has family members on site"
                )));
            }

            let worker = state
                .workers
                .iter_mut()
                .find(|worker| worker.id == worker_id)
                .ok_or_else(|| RegistryError::not_found("worker", worker_id))?;
            update.apply_to(worker);
            Ok(worker.clone())
        })
    }

    /// Workers of `year_id` matching `filter`, in registration order.
    pub fn query_workers(&self, year_id: &str, filter: &WorkerFilter) -> Vec<&WorkerRegistration> {
        self.state
            .workers
            .iter()
            .filter(|worker| worker.year_id == year_id && filter.matches(worker))
            .collect()
    }

    // ---- family members -------------------------------------------------

    #[instrument(level = "info", skip_all, fields(worker_id = %command.worker_reg_id))]
    pub fn add_family_member(&mut self, command: NewFamilyMember) -> Result<FamilyMember> {
        command.validate()?;

        self.commit(|state| {
            let worker = state
                .worker(&command.worker_reg_id)
                .ok_or_else(|| RegistryError::not_found("worker", &command.worker_reg_id))?;
            open_year(state, &worker.year_id)?;
            if !worker.has_family_at_site {
                return Err(RegistryError::InvalidState(format!(
                    "worker '{}' is not registered with family at site",
                    worker.id
                )));
            }

            let member = FamilyMember {
                id: new_id(),
                worker_reg_id: command.worker_reg_id,
                name: command.name.trim().to_string(),
                relation: command.relation.trim().to_string(),
                age: command.age,
                notes: normalize_notes(command.notes),
            };
            state.family_members.push(member.clone());
            Ok(member)
        })
    }

    /// Removes a family member. Returns `false` when it was already absent.
    #[instrument(level = "info", skip(self))]
    pub fn delete_family_member(&mut self, member_id: &str) -> Result<bool> {
        let Some(member) = self
            .state
            .family_members
            .iter()
            .find(|member| member.id == member_id)
        else {
            return Ok(false);
        };

        if let Some(worker) = self.state.worker(&member.worker_reg_id) {
            open_year(&self.state, &worker.year_id)?;
        }

        self.commit(|state| {
            state.family_members.retain(|member| member.id != member_id);
            Ok(())
        })?;
        Ok(true)
    }

    pub fn family_of(&self, worker_id: &str) -> Vec<&FamilyMember> {
        self.state
            .family_members
            .iter()
            .filter(|member| member.worker_reg_id == worker_id)
            .collect()
    }

    // ---- advances -------------------------------------------------------

    /// Appends a ledger entry. Advances are never edited or removed.
    #[instrument(level = "info", skip_all, fields(worker_id = %command.worker_reg_id))]
    pub fn record_advance(&mut self, command: NewAdvance) -> Result<AdvanceRecord> {
        command.validate()?;

        self.commit(|state| {
            let worker = state
                .worker(&command.worker_reg_id)
                .ok_or_else(|| RegistryError::not_found("worker", &command.worker_reg_id))?;
            open_year(state, &worker.year_id)?;

            let advance = AdvanceRecord {
                id: new_id(),
                worker_reg_id: command.worker_reg_id,
                amount: command.amount,
                date: command.date,
                mode: command.mode,
                remarks: command.remarks,
            };
            state.advances.push(advance.clone());
            Ok(advance)
        })
    }

    pub fn advances_of(&self, worker_id: &str) -> Vec<&AdvanceRecord> {
        self.state
            .advances
            .iter()
            .filter(|advance| advance.worker_reg_id == worker_id)
            .collect()
    }

    // ---- integration settings -------------------------------------------

    /// Sets or clears the webhook endpoint used by the sync adapter.
    #[instrument(level = "info", skip(self))]
    pub fn set_integration_endpoint(&mut self, endpoint: Option<String>) -> Result<()> {
        let endpoint = endpoint
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if let Some(url) = &endpoint {
            validate_url("integrationEndpoint", url)?;
        }

        self.commit(|state| {
            state.integration_endpoint = endpoint;
            Ok(())
        })
    }

    pub fn record_sync(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.commit(|state| {
            state.last_synced_at = Some(at);
            Ok(())
        })
    }

    // ---- read models ----------------------------------------------------

    /// Masters whose name or registration number contains `text`, ignoring case.
    pub fn search_establishments(&self, text: &str) -> Vec<&EstablishmentMaster> {
        let needle = text.trim().to_lowercase();
        self.state
            .establishments
            .iter()
            .filter(|master| {
                master.name.to_lowercase().contains(&needle)
                    || master.registration_number.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn year_establishments(&self, year_id: &str) -> Vec<LinkedEstablishment<'_>> {
        self.state
            .yearly_establishments
            .iter()
            .filter(|link| link.year_id == year_id)
            .map(|link| LinkedEstablishment {
                link,
                master_name: self
                    .state
                    .master(&link.master_id)
                    .map(|master| master.name.as_str())
                    .unwrap_or("Unknown"),
            })
            .collect()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn compute_year_statistics(&self, year_id: &str) -> Result<YearStatistics> {
        if self.state.year(year_id).is_none() {
            return Err(RegistryError::not_found("work year", year_id));
        }

        let worker_ids: Vec<&str> = self
            .state
            .workers
            .iter()
            .filter(|worker| worker.year_id == year_id)
            .map(|worker| worker.id.as_str())
            .collect();
        let in_year = |worker_id: &String| worker_ids.contains(&worker_id.as_str());

        Ok(YearStatistics {
            worker_count: worker_ids.len(),
            establishment_count: self
                .state
                .yearly_establishments
                .iter()
                .filter(|link| link.year_id == year_id)
                .count(),
            family_count: self
                .state
                .family_members
                .iter()
                .filter(|member| in_year(&member.worker_reg_id))
                .count(),
            total_advances: self
                .state
                .advances
                .iter()
                .filter(|advance| in_year(&advance.worker_reg_id))
                .map(|advance| advance.amount)
                .sum(),
        })
    }

    /// Worker counts per native state, in order of first appearance.
    pub fn native_state_breakdown(&self, year_id: &str) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for worker in self.state.workers.iter().filter(|w| w.year_id == year_id) {
            match counts
                .iter_mut()
                .find(|(state, _)| *state == worker.native_state)
            {
                Some((_, count)) => *count += 1,
                None => counts.push((worker.native_state.clone(), 1)),
            }
        }
        counts
    }

    /// Worker counts per gender. Every gender is listed, even at zero.
    pub fn gender_breakdown(&self, year_id: &str) -> Vec<(Gender, usize)> {
        Gender::ALL
            .iter()
            .map(|gender| {
                let count = self
                    .state
                    .workers
                    .iter()
                    .filter(|w| w.year_id == year_id && w.gender == *gender)
                    .count();
                (*gender, count)
            })
            .collect()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Resolves a year that still accepts changes.
fn open_year<'a>(state: &'a AppState, year_id: &str) -> Result<&'a WorkYear> {
    let year = state
        .year(year_id)
        .ok_or_else(|| RegistryError::not_found("work year", year_id))?;
    if year.is_closed() {
        return Err(RegistryError::InvalidState(format!(
            "work year '{}' is closed and read-only",
            year.label
        )));
    }
    Ok(year)
}

fn resolve_link_in_year<'a>(
    state: &'a AppState,
    link_id: &str,
    year_id: &str,
) -> Result<&'a YearlyEstablishment> {
    state
        .yearly_establishments
        .iter()
        .find(|link| link.id == link_id && link.year_id == year_id)
        .ok_or_else(|| RegistryError::not_found("yearly establishment", link_id))
}
