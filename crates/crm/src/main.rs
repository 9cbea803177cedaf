//! Walkthrough of a full customer journey against an in-memory database.
//!
//! `CRM_CONFIG` may point at a TOML file (see [`crm::config`]); its session
//! settings are used, the database is always replaced by an in-memory one.

use std::path::Path;
use std::sync::Arc;

use crm::config::CrmConfig;
use crm::lifecycle::CrmSystem;
use crm::model::{
    to_record, ContractCreate, ContractFilter, CustomerCreate, EmployeeCreate, EventCreate,
    EventFilter, EventUpdate, Role,
};
use crm::session::{Argon2Hasher, MemoryTokenStore, Principal};
use crm::telemetry::setup_tracing;
use crm::CrmError;
use chrono::{Duration, Utc};
use entity_store::{DatabaseConfig, Page};
use secrecy::SecretString;
use tracing::{error, info, info_span, warn};

const DEMO_PASSWORD: &str = "Demo-Passw0rd!";

fn demo_config() -> Result<CrmConfig, String> {
    let mut config = match std::env::var_os("CRM_CONFIG") {
        Some(path) => CrmConfig::from_file(Path::new(&path)).map_err(|e| e.to_string())?,
        None => CrmConfig::default(),
    };
    config.database = DatabaseConfig::in_memory();
    if !config.session.has_secret() {
        warn!("No session secret configured, using a throwaway one");
        config.session.secret = SecretString::from("crm-walkthrough-secret");
    }
    Ok(config)
}

fn staff(number: &str, name: &str, role: Role) -> EmployeeCreate {
    EmployeeCreate {
        full_name: name.to_string(),
        email: format!("{}@epic-events.example", number.to_lowercase()),
        employee_number: number.to_string(),
        role,
        password: SecretString::from(DEMO_PASSWORD),
    }
}

fn login(system: &CrmSystem, number: &str) -> Result<Principal, CrmError> {
    let (principal, _) = system
        .sessions
        .login(number, &SecretString::from(DEMO_PASSWORD))?;
    info!(employee = %principal.id(), role = %principal.role(), "Logged in");
    Ok(principal)
}

fn run(system: &CrmSystem) -> Result<(), CrmError> {
    // Admin sets up the team
    let support_id = info_span!("team_setup").in_scope(|| -> Result<_, CrmError> {
        system
            .employees
            .bootstrap_admin(staff("ADM001", "Alex Admin", Role::Admin))?;
        let admin = login(system, "ADM001")?;
        system
            .employees
            .create(&admin, staff("EMP001", "Sam Sales", Role::Sales))?;
        let support = system
            .employees
            .create(&admin, staff("EMP002", "Sue Support", Role::Support))?;
        system
            .employees
            .create(&admin, staff("EMP003", "Stan Support", Role::Support))?;
        Ok(support.id)
    })?;

    // Sales brings in a customer and closes a deal
    let event = info_span!("sales").in_scope(|| -> Result<_, CrmError> {
        let sales = login(system, "EMP001")?;
        let customer = system.customers.create(
            &sales,
            CustomerCreate {
                full_name: "Kevin Casey".into(),
                email: "kevin@abc-corp.example".into(),
                company: "ABC Corp".into(),
                phone: "+33 6 12 34 56 78".into(),
                sales_contact_id: None,
            },
        )?;
        let contract = system.contracts.create(
            &sales,
            ContractCreate {
                customer_id: customer.id,
                total_amount: 1000,
                remaining_amount: None,
            },
        )?;
        let (contract, _) = system.contracts.sign(&sales, contract.id)?;

        let start = Utc::now() + Duration::days(30);
        let event = system.events.create(
            &sales,
            EventCreate {
                contract_id: contract.id,
                name: "ABC Corp launch party".into(),
                start,
                end: start + Duration::hours(4),
                location: "Paris".into(),
                attendees: 75,
                notes: "Needs a DJ".into(),
            },
        )?;
        info!(customer = %customer.id, contract = %contract.id, event = %event.id, "Deal closed");
        Ok(event)
    })?;

    // Admin puts support in charge
    info_span!("assignment").in_scope(|| -> Result<_, CrmError> {
        let admin = login(system, "ADM001")?;
        let (_, outcome) = system.events.assign_support(&admin, event.id, support_id)?;
        info!(event = %event.id, ?outcome, "Support assigned");
        Ok(())
    })?;

    // Only the assigned support employee may edit the event
    info_span!("event_edits").in_scope(|| -> Result<_, CrmError> {
        let assigned = login(system, "EMP002")?;
        let moved = EventUpdate {
            location: Some("Lyon".into()),
            ..EventUpdate::default()
        };
        let updated = system.events.update(&assigned, event.id, moved.clone())?;
        info!(event = %updated.id, location = %updated.location, "Event updated");

        let other = login(system, "EMP003")?;
        match system.events.update(&other, event.id, moved) {
            Err(e @ CrmError::PermissionDenied { .. }) => {
                info!(error = %e, "Unassigned support refused as expected")
            }
            Err(e) => return Err(e),
            Ok(_) => error!("Unassigned support was allowed to edit the event"),
        }

        let record = to_record(&system.events.get(&other, event.id)?)?;
        info!(event = %serde_json::Value::Object(record), "Final event");

        let upcoming = system.events.list(
            &other,
            &EventFilter::upcoming(Utc::now(), Duration::days(60)),
            Page::all(),
        )?;
        let totals = system.contracts.totals(&other, &ContractFilter::default())?;
        info!(
            upcoming_events = upcoming.len(),
            contracts = totals.contracts,
            revenue = totals.total_amount,
            outstanding = totals.remaining_amount,
            "Books"
        );
        Ok(())
    })?;

    system.sessions.logout()
}

fn main() -> Result<(), String> {
    setup_tracing();

    info!("Starting CRM walkthrough");

    let config = demo_config()?;
    let system = CrmSystem::new(
        &config,
        Arc::new(Argon2Hasher),
        Box::new(MemoryTokenStore::default()),
    )
    .map_err(|e| e.to_string())?;

    if let Err(e) = run(&system) {
        error!(error = %e, kind = ?e.kind(), "Walkthrough failed");
        return Err(e.to_string());
    }

    info!("Walkthrough completed successfully");
    Ok(())
}
