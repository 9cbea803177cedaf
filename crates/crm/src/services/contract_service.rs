//! # Contract Service
//!
//! Contracts are drawn up by the customer's owner, who inherits ownership of
//! the contract too. Signing is one-way. Payments only ever lower the
//! remaining amount and are recorded by an admin.

use entity_store::{Criteria, Database, Page, Repository};
use tracing::{info, instrument};

use crate::audit;
use crate::authz::{self, Action, Resource, ResourceType};
use crate::contracts::{ContractAction, ContractActionResult};
use crate::error::CrmError;
use crate::model::{
    Contract, ContractCreate, ContractFilter, ContractId, ContractTotals, ContractUpdate, Customer,
    NewContract,
};
use crate::session::Principal;
use crate::validation;
use crate::workflow::Transition;

#[derive(Clone)]
pub struct ContractService {
    db: Database,
}

fn any_contract() -> Resource {
    Resource {
        kind: ResourceType::Contract,
        owner: None,
        assignee: None,
    }
}

/// The action result did not match the action; only reachable through a bug
/// in the entity implementation.
fn mismatched(action: &str) -> CrmError {
    CrmError::Storage(format!("unexpected result for contract action {action}"))
}

fn criteria_for(filter: &ContractFilter) -> Criteria {
    let mut criteria = Criteria::new();
    if let Some(customer_id) = filter.customer_id {
        criteria = criteria.eq("customer_id", customer_id);
    }
    if let Some(owner) = filter.sales_contact_id {
        criteria = criteria.eq("sales_contact_id", owner);
    }
    if let Some(signed) = filter.signed {
        criteria = criteria.eq("signed", signed);
    }
    match filter.outstanding {
        Some(true) => criteria.gt("remaining_amount", 0i64),
        Some(false) => criteria.eq("remaining_amount", 0i64),
        None => criteria,
    }
}

/// Stored amounts are never negative.
fn cents(sum: i64) -> u64 {
    u64::try_from(sum).unwrap_or_default()
}

impl ContractService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Draw up a draft contract. `remaining_amount` defaults to the total.
    #[instrument(skip(self), fields(principal = %principal.id()))]
    pub fn create(&self, principal: &Principal, params: ContractCreate) -> Result<Contract, CrmError> {
        let remaining_amount = params.remaining_amount.unwrap_or(params.total_amount);
        validation::contract_amounts(params.total_amount, remaining_amount)?;

        let contract = self.db.transaction(|tx| -> Result<Contract, CrmError> {
            let customer = Repository::<Customer>::new(tx).get_by_id(params.customer_id)?;
            authz::require(principal, Action::Create, &Resource::contract_for(&customer))?;
            Repository::<Contract>::new(tx).create(NewContract {
                customer_id: customer.id,
                sales_contact_id: customer.sales_contact_id,
                total_amount: params.total_amount,
                remaining_amount,
            })
        })?;
        info!(contract = %contract.id, customer = %contract.customer_id, "Contract created");
        Ok(contract)
    }

    pub fn get(&self, principal: &Principal, id: ContractId) -> Result<Contract, CrmError> {
        let contract = self.db.with_conn(|conn| -> Result<Contract, CrmError> {
            Ok(Repository::<Contract>::new(conn).get_by_id(id)?)
        })?;
        authz::require(principal, Action::Read, &Resource::contract(&contract))?;
        Ok(contract)
    }

    pub fn list(
        &self,
        principal: &Principal,
        filter: &ContractFilter,
        page: Page,
    ) -> Result<Vec<Contract>, CrmError> {
        authz::require(principal, Action::Read, &any_contract())?;
        let criteria = criteria_for(filter);
        self.db.with_conn(|conn| -> Result<Vec<Contract>, CrmError> {
            Ok(Repository::<Contract>::new(conn).list(&criteria, page)?)
        })
    }

    /// Count, revenue and outstanding balance of the matching contracts.
    pub fn totals(
        &self,
        principal: &Principal,
        filter: &ContractFilter,
    ) -> Result<ContractTotals, CrmError> {
        authz::require(principal, Action::Read, &any_contract())?;
        let criteria = criteria_for(filter);
        self.db.with_conn(|conn| -> Result<ContractTotals, CrmError> {
            let contracts = Repository::<Contract>::new(conn);
            Ok(ContractTotals {
                contracts: contracts.count_matching(&criteria)?,
                total_amount: cents(contracts.sum("total_amount", &criteria)?),
                remaining_amount: cents(contracts.sum("remaining_amount", &criteria)?),
            })
        })
    }

    /// Change the total. It may not drop below what is still owed.
    #[instrument(skip(self), fields(principal = %principal.id()))]
    pub fn update(
        &self,
        principal: &Principal,
        id: ContractId,
        update: ContractUpdate,
    ) -> Result<Contract, CrmError> {
        if let Some(total) = update.total_amount {
            validation::amount("total amount", total)?;
        }
        self.db.transaction(|tx| -> Result<Contract, CrmError> {
            let contracts = Repository::<Contract>::new(tx);
            let contract = contracts.get_by_id(id)?;
            authz::require(principal, Action::Update, &Resource::contract(&contract))?;
            contracts.update(id, update)
        })
    }

    /// Mark the contract signed. Signing it again is a no-op reported as
    /// [`Transition::Unchanged`].
    #[instrument(skip(self), fields(principal = %principal.id()))]
    pub fn sign(
        &self,
        principal: &Principal,
        id: ContractId,
    ) -> Result<(Contract, Transition), CrmError> {
        let (contract, result) = self.db.transaction(|tx| -> Result<_, CrmError> {
            let contracts = Repository::<Contract>::new(tx);
            let contract = contracts.get_by_id(id)?;
            authz::require(principal, Action::Sign, &Resource::contract(&contract))?;
            contracts.perform_action(id, ContractAction::Sign)
        })?;
        let ContractActionResult::Sign(transition) = result else {
            return Err(mismatched("sign"));
        };
        if transition == Transition::Applied {
            audit::contract_signed(principal, &contract);
        }
        Ok((contract, transition))
    }

    /// Set the remaining amount after a payment. The new value must lie in
    /// `0..=remaining`; a larger value leaves the contract untouched.
    #[instrument(skip(self), fields(principal = %principal.id()))]
    pub fn record_payment(
        &self,
        principal: &Principal,
        id: ContractId,
        remaining_amount: u64,
    ) -> Result<Contract, CrmError> {
        validation::amount("remaining amount", remaining_amount)?;
        let (contract, result) = self.db.transaction(|tx| -> Result<_, CrmError> {
            let contracts = Repository::<Contract>::new(tx);
            let contract = contracts.get_by_id(id)?;
            authz::require(principal, Action::RecordPayment, &Resource::contract(&contract))?;
            contracts.perform_action(id, ContractAction::RecordPayment { remaining_amount })
        })?;
        let ContractActionResult::RecordPayment(paid) = result else {
            return Err(mismatched("record payment"));
        };
        audit::payment_recorded(principal, &contract, paid);
        Ok(contract)
    }

    /// Remove a contract. Refused while any event refers to it.
    #[instrument(skip(self), fields(principal = %principal.id()))]
    pub fn delete(&self, principal: &Principal, id: ContractId) -> Result<(), CrmError> {
        self.db.transaction(|tx| -> Result<(), CrmError> {
            let contracts = Repository::<Contract>::new(tx);
            let contract = contracts.get_by_id(id)?;
            authz::require(principal, Action::Delete, &Resource::contract(&contract))?;
            Ok(contracts.delete(id)?)
        })?;
        info!(contract = %id, "Contract deleted");
        Ok(())
    }
}
