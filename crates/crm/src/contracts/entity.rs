//! StoreEntity implementation for [`Contract`].
//!
//! `validate` re-checks `remaining <= total` on every write, and the actions
//! delegate to the workflow rules, so no code path can persist a contract that
//! breaks the amount invariants or un-signs it.

use chrono::Utc;
use entity_store::row::{get, get_opt, get_u64};
use entity_store::rusqlite::types::Value;
use entity_store::rusqlite::Row;
use entity_store::{StoreEntity, StoreError};

use super::actions::{ContractAction, ContractActionResult};
use crate::error::CrmError;
use crate::model::{Contract, ContractId, ContractUpdate, CustomerId, EmployeeId, NewContract};
use crate::schema::{amount, parse_timestamp, timestamp};
use crate::validation;
use crate::workflow::{self, ContractState};

impl StoreEntity for Contract {
    type Id = ContractId;
    type Create = NewContract;
    type Update = ContractUpdate;
    type Action = ContractAction;
    type ActionResult = ContractActionResult;
    type Error = CrmError;

    const TABLE: &'static str = "contracts";
    const ENTITY: &'static str = "Contract";
    const COLUMNS: &'static [&'static str] = &[
        "customer_id",
        "sales_contact_id",
        "total_amount",
        "remaining_amount",
        "signed",
        "created_at",
    ];

    fn id(&self) -> ContractId {
        self.id
    }

    fn from_create_params(id: ContractId, params: NewContract) -> Result<Self, CrmError> {
        Ok(Self {
            id,
            customer_id: params.customer_id,
            sales_contact_id: params.sales_contact_id,
            total_amount: params.total_amount,
            remaining_amount: params.remaining_amount,
            signed: false,
            created_at: Utc::now(),
        })
    }

    fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        let created_at: String = get(row, 6, Self::TABLE, "created_at")?;
        Ok(Self {
            id: ContractId::from(get::<i64>(row, 0, Self::TABLE, "id")?),
            customer_id: CustomerId::from(get::<i64>(row, 1, Self::TABLE, "customer_id")?),
            sales_contact_id: get_opt::<i64>(row, 2, Self::TABLE, "sales_contact_id")?
                .map(EmployeeId::from),
            total_amount: get_u64(row, 3, Self::TABLE, "total_amount")?,
            remaining_amount: get_u64(row, 4, Self::TABLE, "remaining_amount")?,
            signed: get(row, 5, Self::TABLE, "signed")?,
            created_at: parse_timestamp(&created_at, Self::TABLE, "created_at")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.customer_id.into(),
            self.sales_contact_id.into(),
            amount(self.total_amount),
            amount(self.remaining_amount),
            Value::from(self.signed),
            timestamp(self.created_at),
        ]
    }

    fn on_update(&mut self, update: ContractUpdate) -> Result<(), CrmError> {
        if let Some(total_amount) = update.total_amount {
            workflow::validate_total_change(total_amount, self.remaining_amount)?;
            self.total_amount = total_amount;
        }
        Ok(())
    }

    fn handle_action(&mut self, action: ContractAction) -> Result<ContractActionResult, CrmError> {
        match action {
            ContractAction::Sign => {
                let transition = workflow::sign(ContractState::of(self))?;
                self.signed = true;
                Ok(ContractActionResult::Sign(transition))
            }
            ContractAction::RecordPayment { remaining_amount } => {
                let paid = workflow::validate_payment(
                    self.total_amount,
                    self.remaining_amount,
                    remaining_amount,
                )?;
                self.remaining_amount = remaining_amount;
                Ok(ContractActionResult::RecordPayment(paid))
            }
        }
    }

    fn validate(&self) -> Result<(), CrmError> {
        validation::amount("total amount", self.total_amount)?;
        if self.remaining_amount > self.total_amount {
            return Err(CrmError::workflow(format!(
                "remaining amount {} exceeds total amount {}",
                self.remaining_amount, self.total_amount
            )));
        }
        Ok(())
    }
}
