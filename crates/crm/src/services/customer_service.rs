//! # Customer Service
//!
//! A sales employee owns the customers they register. Only the owner (or an
//! admin) may change or delete a customer; only an admin may hand it to
//! someone else.

use chrono::Utc;
use entity_store::{Criteria, Database, Page, Repository};
use tracing::{info, instrument};

use crate::audit;
use crate::authz::{self, Action, Resource};
use crate::customers::CustomerAction;
use crate::error::CrmError;
use crate::model::{Customer, CustomerCreate, CustomerId, CustomerUpdate, Employee, EmployeeId, Role};
use crate::session::Principal;
use crate::validation;
use crate::workflow;

#[derive(Clone)]
pub struct CustomerService {
    db: Database,
}

impl CustomerService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a customer. A sales employee always becomes the owner; an
    /// admin may name a sales owner or leave the customer unowned.
    #[instrument(skip(self, params), fields(principal = %principal.id()))]
    pub fn create(&self, principal: &Principal, params: CustomerCreate) -> Result<Customer, CrmError> {
        let mut params = check_create(params)?;
        authz::require(principal, Action::Create, &Resource::new_customer())?;
        if principal.role() == Role::Sales {
            params.sales_contact_id = Some(principal.id());
        }

        let customer = self.db.transaction(|tx| -> Result<Customer, CrmError> {
            if let Some(owner) = params.sales_contact_id {
                let owner = Repository::<Employee>::new(tx).get_by_id(owner)?;
                workflow::ensure_sales_contact(&owner)?;
            }
            Repository::<Customer>::new(tx).create(params)
        })?;
        info!(customer = %customer.id, owner = ?customer.sales_contact_id, "Customer created");
        Ok(customer)
    }

    pub fn get(&self, principal: &Principal, id: CustomerId) -> Result<Customer, CrmError> {
        let customer = self.db.with_conn(|conn| -> Result<Customer, CrmError> {
            Ok(Repository::<Customer>::new(conn).get_by_id(id)?)
        })?;
        authz::require(principal, Action::Read, &Resource::customer(&customer))?;
        Ok(customer)
    }

    /// Customers in id order, optionally only those owned by `owner`.
    pub fn list(
        &self,
        principal: &Principal,
        owner: Option<EmployeeId>,
        page: Page,
    ) -> Result<Vec<Customer>, CrmError> {
        authz::require(principal, Action::Read, &Resource::new_customer())?;
        let criteria = match owner {
            Some(owner) => Criteria::new().eq("sales_contact_id", owner),
            None => Criteria::new(),
        };
        self.db.with_conn(|conn| -> Result<Vec<Customer>, CrmError> {
            Ok(Repository::<Customer>::new(conn).list(&criteria, page)?)
        })
    }

    #[instrument(skip(self, update), fields(principal = %principal.id()))]
    pub fn update(
        &self,
        principal: &Principal,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Customer, CrmError> {
        let update = check_update(update)?;
        self.db.transaction(|tx| -> Result<Customer, CrmError> {
            let customers = Repository::<Customer>::new(tx);
            let customer = customers.get_by_id(id)?;
            authz::require(principal, Action::Update, &Resource::customer(&customer))?;
            customers.update(id, update)
        })
    }

    /// Remove a customer. Refused while any contract refers to it.
    #[instrument(skip(self), fields(principal = %principal.id()))]
    pub fn delete(&self, principal: &Principal, id: CustomerId) -> Result<(), CrmError> {
        self.db.transaction(|tx| -> Result<(), CrmError> {
            let customers = Repository::<Customer>::new(tx);
            let customer = customers.get_by_id(id)?;
            authz::require(principal, Action::Delete, &Resource::customer(&customer))?;
            Ok(customers.delete(id)?)
        })?;
        info!(customer = %id, "Customer deleted");
        Ok(())
    }

    /// Give the customer to another sales employee. Existing contracts keep
    /// the owner they were drawn up with.
    #[instrument(skip(self), fields(principal = %principal.id()))]
    pub fn transfer_ownership(
        &self,
        principal: &Principal,
        id: CustomerId,
        new_owner: EmployeeId,
    ) -> Result<Customer, CrmError> {
        let (customer, previous) = self.db.transaction(|tx| -> Result<_, CrmError> {
            let customers = Repository::<Customer>::new(tx);
            let customer = customers.get_by_id(id)?;
            authz::require(principal, Action::TransferOwnership, &Resource::customer(&customer))?;
            let owner = Repository::<Employee>::new(tx).get_by_id(new_owner)?;
            workflow::ensure_sales_contact(&owner)?;
            customers.perform_action(id, CustomerAction::TransferOwnership(Some(new_owner)))
        })?;
        audit::ownership_transferred(principal, &customer, previous);
        Ok(customer)
    }
}

fn check_create(params: CustomerCreate) -> Result<CustomerCreate, CrmError> {
    Ok(CustomerCreate {
        full_name: validation::required("name", &params.full_name)?,
        email: validation::normalize_email(&params.email)?,
        company: validation::required("company", &params.company)?,
        phone: validation::phone(&params.phone)?,
        sales_contact_id: params.sales_contact_id,
    })
}

fn check_update(update: CustomerUpdate) -> Result<CustomerUpdate, CrmError> {
    if let Some(at) = update.last_contact.filter(|at| *at > Utc::now()) {
        return Err(CrmError::validation(format!(
            "last contact {} is in the future",
            at.to_rfc3339()
        )));
    }
    Ok(CustomerUpdate {
        full_name: update
            .full_name
            .map(|name| validation::required("name", &name))
            .transpose()?,
        email: update
            .email
            .map(|email| validation::normalize_email(&email))
            .transpose()?,
        company: update
            .company
            .map(|company| validation::required("company", &company))
            .transpose()?,
        phone: update
            .phone
            .map(|phone| validation::phone(&phone))
            .transpose()?,
        last_contact: update.last_contact,
    })
}
