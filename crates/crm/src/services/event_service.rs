//! # Event Service
//!
//! Events are organised by the owner of a signed contract. An admin puts a
//! support employee in charge, who from then on is the one (besides an admin)
//! allowed to edit the event.

use entity_store::{Criteria, Database, Page, Repository};
use tracing::{debug, info, instrument};

use crate::audit;
use crate::authz::{self, Action, Resource, ResourceType};
use crate::error::CrmError;
use crate::events::EventAction;
use crate::model::{Contract, Employee, EmployeeId, Event, EventCreate, EventFilter, EventId, EventUpdate};
use crate::schema::timestamp;
use crate::session::Principal;
use crate::validation;
use crate::workflow::{self, SupportAssignment};

#[derive(Clone)]
pub struct EventService {
    db: Database,
}

impl EventService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Organise an event for a signed contract.
    #[instrument(skip(self, params), fields(principal = %principal.id(), contract = %params.contract_id))]
    pub fn create(&self, principal: &Principal, params: EventCreate) -> Result<Event, CrmError> {
        let params = check_create(params)?;
        let event = self.db.transaction(|tx| -> Result<Event, CrmError> {
            let contract = Repository::<Contract>::new(tx).get_by_id(params.contract_id)?;
            authz::require(principal, Action::Create, &Resource::event_for(&contract))?;
            workflow::ensure_signed(&contract)?;
            Repository::<Event>::new(tx).create(params)
        })?;
        info!(event = %event.id, contract = %event.contract_id, "Event created");
        Ok(event)
    }

    pub fn get(&self, principal: &Principal, id: EventId) -> Result<Event, CrmError> {
        let (event, contract) = self.db.with_conn(|conn| -> Result<_, CrmError> {
            let event = Repository::<Event>::new(conn).get_by_id(id)?;
            let contract = Repository::<Contract>::new(conn).get_by_id(event.contract_id)?;
            Ok((event, contract))
        })?;
        authz::require(principal, Action::Read, &Resource::event(&event, &contract))?;
        Ok(event)
    }

    pub fn list(
        &self,
        principal: &Principal,
        filter: &EventFilter,
        page: Page,
    ) -> Result<Vec<Event>, CrmError> {
        let any_event = Resource {
            kind: ResourceType::Event,
            owner: None,
            assignee: None,
        };
        authz::require(principal, Action::Read, &any_event)?;

        let mut criteria = Criteria::new();
        if let Some(contract_id) = filter.contract_id {
            criteria = criteria.eq("contract_id", contract_id);
        }
        if let Some(support) = filter.support_contact_id {
            criteria = criteria.eq("support_contact_id", support);
        }
        if filter.unassigned {
            criteria = criteria.is_null("support_contact_id");
        }
        if let Some(from) = filter.starts_from {
            criteria = criteria.ge("start_at", timestamp(from));
        }
        if let Some(until) = filter.starts_until {
            criteria = criteria.le("start_at", timestamp(until));
        }
        if let Some(at) = filter.ended_before {
            criteria = criteria.lt("end_at", timestamp(at));
        }
        self.db.with_conn(|conn| -> Result<Vec<Event>, CrmError> {
            let criteria = match filter.customer_id {
                Some(customer_id) => {
                    let contracts = Repository::<Contract>::new(conn)
                        .filter_by(&Criteria::new().eq("customer_id", customer_id))?;
                    criteria.is_in("contract_id", contracts.into_iter().map(|c| c.id))
                }
                None => criteria,
            };
            Ok(Repository::<Event>::new(conn).list(&criteria, page)?)
        })
    }

    /// Put a support employee in charge of the event. Assigning the current
    /// support contact again changes nothing.
    #[instrument(skip(self), fields(principal = %principal.id()))]
    pub fn assign_support(
        &self,
        principal: &Principal,
        id: EventId,
        support: EmployeeId,
    ) -> Result<(Event, SupportAssignment), CrmError> {
        let (event, outcome) = self.db.transaction(|tx| -> Result<_, CrmError> {
            let events = Repository::<Event>::new(tx);
            let event = events.get_by_id(id)?;
            let contract = Repository::<Contract>::new(tx).get_by_id(event.contract_id)?;
            authz::require(principal, Action::AssignSupport, &Resource::event(&event, &contract))?;

            let target = Repository::<Employee>::new(tx).get_by_id(support)?;
            let outcome = workflow::plan_support_assignment(event.support_contact_id, &target)?;
            if outcome == SupportAssignment::Unchanged {
                debug!(event = %id, %support, "Support contact already assigned");
                return Ok((event, outcome));
            }
            let (event, _) = events.perform_action(id, EventAction::AssignSupport { support })?;
            Ok((event, outcome))
        })?;
        if outcome != SupportAssignment::Unchanged {
            audit::support_assigned(principal, &event, outcome);
        }
        Ok((event, outcome))
    }

    /// Edit the event's details. Allowed for the assigned support contact and
    /// for admins.
    #[instrument(skip(self, update), fields(principal = %principal.id()))]
    pub fn update(
        &self,
        principal: &Principal,
        id: EventId,
        update: EventUpdate,
    ) -> Result<Event, CrmError> {
        let update = check_update(update)?;
        self.db.transaction(|tx| -> Result<Event, CrmError> {
            let events = Repository::<Event>::new(tx);
            let event = events.get_by_id(id)?;
            let contract = Repository::<Contract>::new(tx).get_by_id(event.contract_id)?;
            authz::require(principal, Action::Update, &Resource::event(&event, &contract))?;
            events.update(id, update)
        })
    }

    #[instrument(skip(self), fields(principal = %principal.id()))]
    pub fn delete(&self, principal: &Principal, id: EventId) -> Result<(), CrmError> {
        self.db.transaction(|tx| -> Result<(), CrmError> {
            let events = Repository::<Event>::new(tx);
            let event = events.get_by_id(id)?;
            let contract = Repository::<Contract>::new(tx).get_by_id(event.contract_id)?;
            authz::require(principal, Action::Delete, &Resource::event(&event, &contract))?;
            Ok(events.delete(id)?)
        })?;
        info!(event = %id, "Event deleted");
        Ok(())
    }
}

fn check_create(params: EventCreate) -> Result<EventCreate, CrmError> {
    validation::event_window(params.start, params.end)?;
    validation::attendees(params.attendees)?;
    Ok(EventCreate {
        name: validation::required("event name", &params.name)?,
        location: validation::required("location", &params.location)?,
        notes: params.notes.trim().to_owned(),
        ..params
    })
}

fn check_update(update: EventUpdate) -> Result<EventUpdate, CrmError> {
    if let (Some(start), Some(end)) = (update.start, update.end) {
        validation::event_window(start, end)?;
    }
    if let Some(attendees) = update.attendees {
        validation::attendees(attendees)?;
    }
    Ok(EventUpdate {
        name: update
            .name
            .map(|name| validation::required("event name", &name))
            .transpose()?,
        location: update
            .location
            .map(|location| validation::required("location", &location))
            .transpose()?,
        notes: update.notes.map(|notes| notes.trim().to_owned()),
        ..update
    })
}
