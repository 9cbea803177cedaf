//! # Employee Service
//!
//! Staff management. Every mutation is Admin-only; passwords are checked for
//! strength and hashed with the injected [`PasswordHasher`] before anything is
//! written.

use std::sync::Arc;

use entity_store::{Criteria, Database, Page, Repository};
use tracing::{info, instrument};

use crate::audit;
use crate::authz::{self, Action, Resource};
use crate::error::CrmError;
use crate::model::{
    Contract, Customer, Employee, EmployeeChanges, EmployeeCreate, EmployeeId, EmployeeUpdate,
    Event, NewEmployee, Role,
};
use crate::session::{PasswordHasher, Principal};
use crate::validation;
use crate::workflow::{self, Responsibilities};

#[derive(Clone)]
pub struct EmployeeService {
    db: Database,
    hasher: Arc<dyn PasswordHasher>,
}

impl EmployeeService {
    pub fn new(db: Database, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { db, hasher }
    }

    /// Create the first administrator of an empty database. Refused once any
    /// employee exists.
    #[instrument(skip(self, params))]
    pub fn bootstrap_admin(&self, params: EmployeeCreate) -> Result<Employee, CrmError> {
        if params.role != Role::Admin {
            return Err(CrmError::validation("the first employee must be an admin"));
        }
        let new = self.hash(check_create(params)?)?;
        let employee = self.db.transaction(|tx| -> Result<Employee, CrmError> {
            let employees = Repository::<Employee>::new(tx);
            if employees.count()? > 0 {
                return Err(CrmError::workflow(
                    "employees already exist, log in as an administrator instead",
                ));
            }
            employees.create(new)
        })?;
        audit::admin_bootstrapped(&employee);
        Ok(employee)
    }

    #[instrument(skip(self, params), fields(principal = %principal.id()))]
    pub fn create(&self, principal: &Principal, params: EmployeeCreate) -> Result<Employee, CrmError> {
        let params = check_create(params)?;
        authz::require(principal, Action::Create, &Resource::employee())?;
        let new = self.hash(params)?;

        let employee = self.db.transaction(|tx| -> Result<Employee, CrmError> {
            Repository::<Employee>::new(tx).create(new)
        })?;
        info!(employee = %employee.id, role = %employee.role, "Employee created");
        audit::employee_created(principal, &employee);
        Ok(employee)
    }

    pub fn get(&self, principal: &Principal, id: EmployeeId) -> Result<Employee, CrmError> {
        authz::require(principal, Action::Read, &Resource::employee())?;
        self.db.with_conn(|conn| -> Result<Employee, CrmError> {
            Ok(Repository::<Employee>::new(conn).get_by_id(id)?)
        })
    }

    /// Look an employee up by their employee number.
    pub fn find_by_number(
        &self,
        principal: &Principal,
        employee_number: &str,
    ) -> Result<Option<Employee>, CrmError> {
        authz::require(principal, Action::Read, &Resource::employee())?;
        let criteria = Criteria::new().eq("employee_number", employee_number.trim().to_owned());
        self.db.with_conn(|conn| -> Result<Option<Employee>, CrmError> {
            Ok(Repository::<Employee>::new(conn)
                .filter_by(&criteria)?
                .into_iter()
                .next())
        })
    }

    /// Employees in id order, optionally only one department.
    pub fn list(
        &self,
        principal: &Principal,
        role: Option<Role>,
        page: Page,
    ) -> Result<Vec<Employee>, CrmError> {
        authz::require(principal, Action::Read, &Resource::employee())?;
        let criteria = match role {
            Some(role) => Criteria::new().eq("role", role.as_str().to_owned()),
            None => Criteria::new(),
        };
        self.db.with_conn(|conn| -> Result<Vec<Employee>, CrmError> {
            Ok(Repository::<Employee>::new(conn).list(&criteria, page)?)
        })
    }

    /// Edit an employee. Moving someone out of sales or support is refused
    /// while they still own customers or contracts, or support events.
    #[instrument(skip(self, update), fields(principal = %principal.id()))]
    pub fn update(
        &self,
        principal: &Principal,
        id: EmployeeId,
        update: EmployeeUpdate,
    ) -> Result<Employee, CrmError> {
        let update = check_update(update)?;
        authz::require(principal, Action::Update, &Resource::employee())?;
        let password_hash = match &update.password {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };
        let changes = EmployeeChanges {
            full_name: update.full_name,
            email: update.email,
            employee_number: update.employee_number,
            role: update.role,
            password_hash,
        };

        let employee = self.db.transaction(|tx| -> Result<Employee, CrmError> {
            let employees = Repository::<Employee>::new(tx);
            if let Some(role) = changes.role {
                let current = employees.get_by_id(id)?;
                let owner = Criteria::new().eq("sales_contact_id", id);
                let held = Responsibilities {
                    owned: Repository::<Customer>::new(tx).count_matching(&owner)?
                        + Repository::<Contract>::new(tx).count_matching(&owner)?,
                    assigned: Repository::<Event>::new(tx)
                        .count_matching(&Criteria::new().eq("support_contact_id", id))?,
                };
                workflow::ensure_role_change(&current, role, held)?;
            }
            employees.update(id, changes)
        })?;
        audit::employee_updated(principal, &employee);
        Ok(employee)
    }

    /// Remove an employee. Their customers become unowned; an employee who
    /// still holds contracts or events cannot be removed.
    #[instrument(skip(self), fields(principal = %principal.id()))]
    pub fn delete(&self, principal: &Principal, id: EmployeeId) -> Result<(), CrmError> {
        authz::require(principal, Action::Delete, &Resource::employee())?;
        self.db.transaction(|tx| -> Result<(), CrmError> {
            Ok(Repository::<Employee>::new(tx).delete(id)?)
        })?;
        audit::employee_deleted(principal, id);
        Ok(())
    }

    fn hash(&self, params: EmployeeCreate) -> Result<NewEmployee, CrmError> {
        Ok(NewEmployee {
            password_hash: self.hasher.hash(&params.password)?,
            full_name: params.full_name,
            email: params.email,
            employee_number: params.employee_number,
            role: params.role,
        })
    }
}

fn check_create(params: EmployeeCreate) -> Result<EmployeeCreate, CrmError> {
    validation::password_strength(&params.password)?;
    Ok(EmployeeCreate {
        full_name: validation::required("full name", &params.full_name)?,
        email: validation::normalize_email(&params.email)?,
        employee_number: validation::required("employee number", &params.employee_number)?,
        role: params.role,
        password: params.password,
    })
}

fn check_update(update: EmployeeUpdate) -> Result<EmployeeUpdate, CrmError> {
    if let Some(password) = &update.password {
        validation::password_strength(password)?;
    }
    Ok(EmployeeUpdate {
        full_name: update
            .full_name
            .map(|name| validation::required("full name", &name))
            .transpose()?,
        email: update
            .email
            .map(|email| validation::normalize_email(&email))
            .transpose()?,
        employee_number: update
            .employee_number
            .map(|number| validation::required("employee number", &number))
            .transpose()?,
        role: update.role,
        password: update.password,
    })
}
