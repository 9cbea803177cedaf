//! StoreEntity implementation for [`Event`].

use entity_store::row::{get, get_opt};
use entity_store::rusqlite::types::Value;
use entity_store::rusqlite::Row;
use entity_store::{StoreEntity, StoreError};

use crate::error::CrmError;
use crate::model::{ContractId, EmployeeId, Event, EventCreate, EventId, EventUpdate};
use crate::schema::{parse_timestamp, timestamp};
use crate::validation;

#[derive(Debug, Clone)]
pub enum EventAction {
    /// Put `support` on the event. The caller has already checked the role
    /// and decided the assignment is a change.
    AssignSupport { support: EmployeeId },
}

impl StoreEntity for Event {
    type Id = EventId;
    type Create = EventCreate;
    type Update = EventUpdate;
    type Action = EventAction;
    /// The previous support contact.
    type ActionResult = Option<EmployeeId>;
    type Error = CrmError;

    const TABLE: &'static str = "events";
    const ENTITY: &'static str = "Event";
    const COLUMNS: &'static [&'static str] = &[
        "contract_id",
        "name",
        "start_at",
        "end_at",
        "location",
        "attendees",
        "notes",
        "support_contact_id",
    ];

    fn id(&self) -> EventId {
        self.id
    }

    fn from_create_params(id: EventId, params: EventCreate) -> Result<Self, CrmError> {
        Ok(Self {
            id,
            contract_id: params.contract_id,
            name: params.name,
            start: params.start,
            end: params.end,
            location: params.location,
            attendees: params.attendees,
            notes: params.notes,
            support_contact_id: None,
        })
    }

    fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        let start: String = get(row, 3, Self::TABLE, "start_at")?;
        let end: String = get(row, 4, Self::TABLE, "end_at")?;
        Ok(Self {
            id: EventId::from(get::<i64>(row, 0, Self::TABLE, "id")?),
            contract_id: ContractId::from(get::<i64>(row, 1, Self::TABLE, "contract_id")?),
            name: get(row, 2, Self::TABLE, "name")?,
            start: parse_timestamp(&start, Self::TABLE, "start_at")?,
            end: parse_timestamp(&end, Self::TABLE, "end_at")?,
            location: get(row, 5, Self::TABLE, "location")?,
            attendees: get(row, 6, Self::TABLE, "attendees")?,
            notes: get(row, 7, Self::TABLE, "notes")?,
            support_contact_id: get_opt::<i64>(row, 8, Self::TABLE, "support_contact_id")?
                .map(EmployeeId::from),
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.contract_id.into(),
            Value::Text(self.name.clone()),
            timestamp(self.start),
            timestamp(self.end),
            Value::Text(self.location.clone()),
            Value::Integer(i64::from(self.attendees)),
            Value::Text(self.notes.clone()),
            self.support_contact_id.into(),
        ]
    }

    fn on_update(&mut self, update: EventUpdate) -> Result<(), CrmError> {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(start) = update.start {
            self.start = start;
        }
        if let Some(end) = update.end {
            self.end = end;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(attendees) = update.attendees {
            self.attendees = attendees;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        Ok(())
    }

    fn handle_action(&mut self, action: EventAction) -> Result<Option<EmployeeId>, CrmError> {
        match action {
            EventAction::AssignSupport { support } => {
                Ok(self.support_contact_id.replace(support))
            }
        }
    }

    fn validate(&self) -> Result<(), CrmError> {
        validation::non_empty("event name", &self.name)?;
        validation::non_empty("location", &self.location)?;
        validation::event_window(self.start, self.end)?;
        validation::attendees(self.attendees)?;
        Ok(())
    }
}
