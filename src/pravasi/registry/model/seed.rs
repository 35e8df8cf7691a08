use chrono::NaiveDate;

use super::{
    AdvanceMode, AdvanceRecord, AppState, EstablishmentMaster, FamilyMember, Gender,
    SCHEMA_VERSION, WorkYear, WorkerRegistration, YearStatus, YearlyEstablishment,
};

/// Sample dataset installed when no snapshot has been persisted yet.
pub fn seed_state() -> AppState {
    AppState {
        schema_version: SCHEMA_VERSION,
        years: vec![
            WorkYear {
                id: "y1".into(),
                label: "2023-24".into(),
                start_date: date(2023, 4, 1),
                end_date: date(2024, 3, 31),
                status: YearStatus::Closed,
            },
            WorkYear {
                id: "y2".into(),
                label: "2024-25".into(),
                start_date: date(2024, 4, 1),
                end_date: date(2025, 3, 31),
                status: YearStatus::Active,
            },
        ],
        current_year_id: "y2".into(),
        establishments: vec![
            EstablishmentMaster {
                id: "em1".into(),
                name: "RR Bricks Co".into(),
                registration_number: "REG-001".into(),
                kind: "Brick Kiln".into(),
            },
            EstablishmentMaster {
                id: "em2".into(),
                name: "Skyline Construction".into(),
                registration_number: "REG-002".into(),
                kind: "Construction Site".into(),
            },
        ],
        yearly_establishments: vec![
            YearlyEstablishment {
                id: "ye1".into(),
                year_id: "y2".into(),
                master_id: "em1".into(),
                site_address: "Moinabad Road, RR Dist".into(),
                owner_name: "Venkatesh Rao".into(),
                owner_mobile: "9876543210".into(),
            },
            YearlyEstablishment {
                id: "ye2".into(),
                year_id: "y1".into(),
                master_id: "em1".into(),
                site_address: "Chevella Cross, RR Dist".into(),
                owner_name: "Venkatesh Rao".into(),
                owner_mobile: "9876543210".into(),
            },
        ],
        workers: vec![
            WorkerRegistration {
                id: "w1".into(),
                year_id: "y2".into(),
                establishment_id: "ye1".into(),
                name: "Rahul Kumar".into(),
                father_name: "Ram Singh".into(),
                age: 32,
                gender: Gender::Male,
                caste: "OBC".into(),
                mobile: "9000012345".into(),
                aadhaar_number: "123456789012".into(),
                native_state: "Bihar".into(),
                nature_of_work: "Masonry".into(),
                joining_date: date(2024, 5, 10),
                expected_end_date: date(2025, 1, 10),
                has_family_at_site: true,
                notes: None,
            },
            WorkerRegistration {
                id: "w2".into(),
                year_id: "y2".into(),
                establishment_id: "ye1".into(),
                name: "Sanjay Singh".into(),
                father_name: "Vijay Singh".into(),
                age: 28,
                gender: Gender::Male,
                caste: "General".into(),
                mobile: "9000012346".into(),
                aadhaar_number: "987654321098".into(),
                native_state: "Uttar Pradesh".into(),
                nature_of_work: "Helper".into(),
                joining_date: date(2024, 6, 15),
                expected_end_date: date(2024, 12, 15),
                has_family_at_site: false,
                notes: None,
            },
        ],
        family_members: vec![
            FamilyMember {
                id: "f1".into(),
                worker_reg_id: "w1".into(),
                name: "Anita Devi".into(),
                relation: "Spouse".into(),
                age: 28,
                notes: None,
            },
            FamilyMember {
                id: "f2".into(),
                worker_reg_id: "w1".into(),
                name: "Bittu".into(),
                relation: "Son".into(),
                age: 4,
                notes: None,
            },
        ],
        advances: vec![AdvanceRecord {
            id: "a1".into(),
            worker_reg_id: "w1".into(),
            amount: 5000.0,
            date: date(2024, 5, 15),
            mode: AdvanceMode::Cash,
            remarks: "Relocation assistance".into(),
        }],
        integration_endpoint: None,
        last_synced_at: None,
    }
}

// Seed dates are fixed literals.
fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
