//! StoreEntity implementation for [`Customer`].

use chrono::Utc;
use entity_store::row::{get, get_opt};
use entity_store::rusqlite::types::Value;
use entity_store::rusqlite::Row;
use entity_store::{StoreEntity, StoreError};

use crate::error::CrmError;
use crate::model::{Customer, CustomerCreate, CustomerId, CustomerUpdate, EmployeeId};
use crate::schema::{optional_timestamp, parse_optional_timestamp, parse_timestamp, timestamp};
use crate::validation;

#[derive(Debug, Clone)]
pub enum CustomerAction {
    /// Hand the customer to another sales employee (or to nobody).
    TransferOwnership(Option<EmployeeId>),
}

impl StoreEntity for Customer {
    type Id = CustomerId;
    type Create = CustomerCreate;
    type Update = CustomerUpdate;
    type Action = CustomerAction;
    /// The previous owner.
    type ActionResult = Option<EmployeeId>;
    type Error = CrmError;

    const TABLE: &'static str = "customers";
    const ENTITY: &'static str = "Customer";
    const COLUMNS: &'static [&'static str] = &[
        "full_name",
        "email",
        "company",
        "phone",
        "sales_contact_id",
        "created_at",
        "last_contact",
    ];

    fn id(&self) -> CustomerId {
        self.id
    }

    fn from_create_params(id: CustomerId, params: CustomerCreate) -> Result<Self, CrmError> {
        Ok(Self {
            id,
            full_name: params.full_name,
            email: params.email,
            company: params.company,
            phone: params.phone,
            sales_contact_id: params.sales_contact_id,
            created_at: Utc::now(),
            last_contact: None,
        })
    }

    fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        let created_at: String = get(row, 6, Self::TABLE, "created_at")?;
        let last_contact: Option<String> = get_opt(row, 7, Self::TABLE, "last_contact")?;
        Ok(Self {
            id: CustomerId::from(get::<i64>(row, 0, Self::TABLE, "id")?),
            full_name: get(row, 1, Self::TABLE, "full_name")?,
            email: get(row, 2, Self::TABLE, "email")?,
            company: get(row, 3, Self::TABLE, "company")?,
            phone: get(row, 4, Self::TABLE, "phone")?,
            sales_contact_id: get_opt::<i64>(row, 5, Self::TABLE, "sales_contact_id")?
                .map(EmployeeId::from),
            created_at: parse_timestamp(&created_at, Self::TABLE, "created_at")?,
            last_contact: parse_optional_timestamp(last_contact, Self::TABLE, "last_contact")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.full_name.clone()),
            Value::Text(self.email.clone()),
            Value::Text(self.company.clone()),
            Value::Text(self.phone.clone()),
            self.sales_contact_id.into(),
            timestamp(self.created_at),
            optional_timestamp(self.last_contact),
        ]
    }

    fn on_update(&mut self, update: CustomerUpdate) -> Result<(), CrmError> {
        if let Some(full_name) = update.full_name {
            self.full_name = full_name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(company) = update.company {
            self.company = company;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(last_contact) = update.last_contact {
            self.last_contact = Some(last_contact);
        }
        Ok(())
    }

    fn handle_action(&mut self, action: CustomerAction) -> Result<Option<EmployeeId>, CrmError> {
        match action {
            CustomerAction::TransferOwnership(owner) => {
                Ok(std::mem::replace(&mut self.sales_contact_id, owner))
            }
        }
    }

    fn validate(&self) -> Result<(), CrmError> {
        validation::non_empty("name", &self.full_name)?;
        validation::non_empty("company", &self.company)?;
        validation::email(&self.email)?;
        validation::phone(&self.phone)?;
        Ok(())
    }
}
