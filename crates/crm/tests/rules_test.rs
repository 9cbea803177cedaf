use chrono::{DateTime, Duration, Utc};
use crm::model::{
    Contract, ContractCreate, ContractFilter, ContractTotals, ContractUpdate, Customer,
    CustomerCreate, CustomerId, CustomerUpdate, EventCreate, EventFilter, Role,
};
use crm::session::Principal;
use crm::testing::TestCrm;
use crm::validation::MAX_AMOUNT;
use crm::workflow::Transition;
use crm::ErrorKind;
use entity_store::Page;

/// CRM with one sales employee (EMP001) owning one customer.
struct Fixture {
    crm: TestCrm,
    sales: Principal,
    customer: Customer,
}

fn fixture() -> Fixture {
    let crm = TestCrm::new().expect("Failed to start CRM");
    crm.hire("EMP001", Role::Sales).expect("Failed to hire sales");
    let sales = crm.login_as("EMP001").expect("Sales login failed");
    let customer = crm
        .system
        .customers
        .create(
            &sales,
            CustomerCreate {
                full_name: "Kevin Casey".to_string(),
                email: "kevin@abc-corp.example".to_string(),
                company: "ABC Corp".to_string(),
                phone: "0612345678".to_string(),
                sales_contact_id: None,
            },
        )
        .expect("Failed to create customer");
    Fixture {
        crm,
        sales,
        customer,
    }
}

impl Fixture {
    fn contract(&self, total_amount: u64) -> Contract {
        self.crm
            .system
            .contracts
            .create(
                &self.sales,
                ContractCreate {
                    customer_id: self.customer.id,
                    total_amount,
                    remaining_amount: None,
                },
            )
            .expect("Failed to create contract")
    }

    fn event_for(&self, contract: &Contract) -> EventCreate {
        let start = Utc::now() + Duration::days(10);
        EventCreate {
            contract_id: contract.id,
            name: "Seminar".to_string(),
            start,
            end: start + Duration::hours(8),
            location: "Nantes".to_string(),
            attendees: 40,
            notes: String::new(),
        }
    }
}

#[test]
fn test_payment_above_total_is_rejected_and_changes_nothing() {
    let f = fixture();
    let contract = f.contract(1000);
    let admin = &f.crm.admin;

    let err = f
        .crm
        .system
        .contracts
        .record_payment(admin, contract.id, 1500)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WorkflowViolation);

    let stored = f.crm.system.contracts.get(admin, contract.id).unwrap();
    assert_eq!(stored.remaining_amount, 1000);
}

#[test]
fn test_payments_only_lower_the_remaining_amount() {
    let f = fixture();
    let contract = f.contract(1000);
    let admin = &f.crm.admin;
    let contracts = &f.crm.system.contracts;

    let paid = contracts.record_payment(admin, contract.id, 600).unwrap();
    assert_eq!(paid.remaining_amount, 600);

    let err = contracts.record_payment(admin, contract.id, 700).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WorkflowViolation);

    let settled = contracts.record_payment(admin, contract.id, 0).unwrap();
    assert!(settled.is_fully_paid());

    // Sales may not record payments, even on their own contracts
    let err = contracts.record_payment(&f.sales, contract.id, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[test]
fn test_contract_total_cannot_drop_below_remaining() {
    let f = fixture();
    let contract = f.contract(1000);
    let contracts = &f.crm.system.contracts;

    let err = contracts
        .update(
            &f.sales,
            contract.id,
            ContractUpdate {
                total_amount: Some(900),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WorkflowViolation);

    let raised = contracts
        .update(
            &f.sales,
            contract.id,
            ContractUpdate {
                total_amount: Some(1200),
            },
        )
        .unwrap();
    assert_eq!(raised.total_amount, 1200);
    assert_eq!(raised.remaining_amount, 1000);
}

#[test]
fn test_remaining_above_total_at_creation_is_invalid() {
    let f = fixture();
    let err = f
        .crm
        .system
        .contracts
        .create(
            &f.sales,
            ContractCreate {
                customer_id: f.customer.id,
                total_amount: 100,
                remaining_amount: Some(101),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_signing_is_idempotent() {
    let f = fixture();
    let contract = f.contract(1000);
    let contracts = &f.crm.system.contracts;

    let (_, first) = contracts.sign(&f.sales, contract.id).unwrap();
    let (signed, second) = contracts.sign(&f.sales, contract.id).unwrap();
    assert_eq!(first, Transition::Applied);
    assert_eq!(second, Transition::Unchanged);
    assert!(signed.signed);
}

#[test]
fn test_event_on_unsigned_contract_leaves_no_row() {
    let f = fixture();
    let contract = f.contract(1000);

    let err = f
        .crm
        .system
        .events
        .create(&f.sales, f.event_for(&contract))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WorkflowViolation);
    assert_eq!(err.to_string(), "workflow violation: contract not signed");

    let events = f
        .crm
        .system
        .events
        .list(&f.crm.admin, &EventFilter::default(), Page::all())
        .unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_event_with_bad_window_is_invalid() {
    let f = fixture();
    let contract = f.contract(1000);
    f.crm.system.contracts.sign(&f.sales, contract.id).unwrap();

    let mut params = f.event_for(&contract);
    params.end = params.start;
    let err = f.crm.system.events.create(&f.sales, params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_non_owner_cannot_update_customer() {
    let f = fixture();
    f.crm.hire("EMP009", Role::Sales).unwrap();
    let intruder = f.crm.login_as("EMP009").unwrap();

    let err = f
        .crm
        .system
        .customers
        .update(
            &intruder,
            f.customer.id,
            CustomerUpdate {
                company: Some("Stolen Ltd".to_string()),
                ..CustomerUpdate::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let stored = f.crm.system.customers.get(&intruder, f.customer.id).unwrap();
    assert_eq!(stored, f.customer);

    // The owner can
    let updated = f
        .crm
        .system
        .customers
        .update(
            &f.sales,
            f.customer.id,
            CustomerUpdate {
                company: Some("ABC Group".to_string()),
                ..CustomerUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.company, "ABC Group");
}

#[test]
fn test_customer_with_contract_cannot_be_deleted() {
    let f = fixture();
    f.contract(1000);

    let err = f
        .crm
        .system
        .customers
        .delete(&f.sales, f.customer.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferentialIntegrityViolation);

    assert!(f.crm.system.customers.get(&f.sales, f.customer.id).is_ok());
}

#[test]
fn test_customer_without_contracts_can_be_deleted_by_owner() {
    let f = fixture();
    f.crm.system.customers.delete(&f.sales, f.customer.id).unwrap();

    let err = f
        .crm
        .system
        .customers
        .get(&f.sales, f.customer.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_support_cannot_create_customers() {
    let f = fixture();
    f.crm.hire("EMP002", Role::Support).unwrap();
    let support = f.crm.login_as("EMP002").unwrap();

    let err = f
        .crm
        .system
        .customers
        .create(
            &support,
            CustomerCreate {
                full_name: "Dana".to_string(),
                email: "dana@example.com".to_string(),
                company: "Dana Inc".to_string(),
                phone: "0612345679".to_string(),
                sales_contact_id: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[test]
fn test_duplicate_customer_email_is_a_uniqueness_violation() {
    let f = fixture();
    let err = f
        .crm
        .system
        .customers
        .create(
            &f.sales,
            CustomerCreate {
                full_name: "Kevin Again".to_string(),
                email: "KEVIN@abc-corp.example".to_string(),
                company: "ABC Corp".to_string(),
                phone: "0612345678".to_string(),
                sales_contact_id: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UniquenessViolation);
}

#[test]
fn test_ownership_transfer() {
    let f = fixture();
    let new_owner = f.crm.hire("EMP004", Role::Sales).unwrap();
    let support = f.crm.hire("EMP005", Role::Support).unwrap();
    let customers = &f.crm.system.customers;

    let err = customers
        .transfer_ownership(&f.sales, f.customer.id, new_owner.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let err = customers
        .transfer_ownership(&f.crm.admin, f.customer.id, support.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WorkflowViolation);

    let moved = customers
        .transfer_ownership(&f.crm.admin, f.customer.id, new_owner.id)
        .unwrap();
    assert_eq!(moved.sales_contact_id, Some(new_owner.id));

    // The previous owner lost write access
    let err = customers
        .update(&f.sales, f.customer.id, CustomerUpdate::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[test]
fn test_contract_filters() {
    let f = fixture();
    let contracts = &f.crm.system.contracts;
    let admin = &f.crm.admin;
    let draft = f.contract(100);
    let signed = f.contract(200);
    let paid = f.contract(300);
    contracts.sign(&f.sales, signed.id).unwrap();
    contracts.sign(&f.sales, paid.id).unwrap();
    contracts.record_payment(admin, paid.id, 0).unwrap();

    let ids = |filter: ContractFilter| -> Vec<_> {
        contracts
            .list(admin, &filter, Page::all())
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect()
    };

    assert_eq!(
        ids(ContractFilter {
            signed: Some(false),
            ..ContractFilter::default()
        }),
        vec![draft.id]
    );
    assert_eq!(
        ids(ContractFilter {
            signed: Some(true),
            outstanding: Some(true),
            ..ContractFilter::default()
        }),
        vec![signed.id]
    );
    assert_eq!(
        ids(ContractFilter {
            outstanding: Some(false),
            ..ContractFilter::default()
        }),
        vec![paid.id]
    );
    assert_eq!(
        ids(ContractFilter {
            customer_id: Some(f.customer.id),
            ..ContractFilter::default()
        })
        .len(),
        3
    );

    let first_page = contracts
        .list(admin, &ContractFilter::default(), Page::new(2, 0))
        .unwrap();
    assert_eq!(first_page.len(), 2);
}

#[test]
fn test_amounts_beyond_storage_range_are_invalid() {
    let f = fixture();
    let contracts = &f.crm.system.contracts;

    let err = contracts
        .create(
            &f.sales,
            ContractCreate {
                customer_id: f.customer.id,
                total_amount: u64::MAX,
                remaining_amount: Some(1 << 63),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(contracts
        .list(&f.crm.admin, &ContractFilter::default(), Page::all())
        .unwrap()
        .is_empty());

    let contract = f.contract(1000);
    let err = contracts
        .update(
            &f.sales,
            contract.id,
            ContractUpdate {
                total_amount: Some(u64::MAX),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let largest = contracts
        .update(
            &f.sales,
            contract.id,
            ContractUpdate {
                total_amount: Some(MAX_AMOUNT),
            },
        )
        .unwrap();
    let stored = contracts.get(&f.sales, contract.id).unwrap();
    assert_eq!(stored, largest);
    assert_eq!(stored.total_amount, MAX_AMOUNT);
}

#[test]
fn test_only_the_owner_signs_a_contract() {
    let f = fixture();
    let contract = f.contract(1000);
    f.crm.hire("EMP009", Role::Sales).unwrap();
    let other = f.crm.login_as("EMP009").unwrap();

    let err = f
        .crm
        .system
        .contracts
        .sign(&other, contract.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let stored = f.crm.system.contracts.get(&other, contract.id).unwrap();
    assert!(!stored.signed);
}

#[test]
fn test_sales_cannot_draw_up_contracts_for_other_customers() {
    let f = fixture();
    f.crm.hire("EMP009", Role::Sales).unwrap();
    let other = f.crm.login_as("EMP009").unwrap();

    let err = f
        .crm
        .system
        .contracts
        .create(
            &other,
            ContractCreate {
                customer_id: f.customer.id,
                total_amount: 100,
                remaining_amount: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(f
        .crm
        .system
        .contracts
        .list(&f.crm.admin, &ContractFilter::default(), Page::all())
        .unwrap()
        .is_empty());
}

#[test]
fn test_sales_cannot_create_events_on_other_contracts() {
    let f = fixture();
    let contract = f.contract(1000);
    f.crm.system.contracts.sign(&f.sales, contract.id).unwrap();
    f.crm.hire("EMP009", Role::Sales).unwrap();
    let other = f.crm.login_as("EMP009").unwrap();

    let err = f
        .crm
        .system
        .events
        .create(&other, f.event_for(&contract))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let events = f
        .crm
        .system
        .events
        .list(&f.crm.admin, &EventFilter::default(), Page::all())
        .unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_contract_with_event_cannot_be_deleted() {
    let f = fixture();
    let contract = f.contract(1000);
    f.crm.system.contracts.sign(&f.sales, contract.id).unwrap();
    f.crm
        .system
        .events
        .create(&f.sales, f.event_for(&contract))
        .unwrap();

    let err = f
        .crm
        .system
        .contracts
        .delete(&f.crm.admin, contract.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferentialIntegrityViolation);
    assert!(f.crm.system.contracts.get(&f.crm.admin, contract.id).is_ok());
}

#[test]
fn test_no_principal_after_logout() {
    let f = fixture();
    assert_eq!(f.crm.system.current_principal().unwrap(), f.sales);

    f.crm.system.sessions.logout().unwrap();
    let err = f.crm.system.current_principal().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[test]
fn test_contract_totals() {
    let f = fixture();
    let contracts = &f.crm.system.contracts;
    let admin = &f.crm.admin;
    f.contract(100);
    let signed = f.contract(200);
    let paid = f.contract(300);
    contracts.sign(&f.sales, signed.id).unwrap();
    contracts.sign(&f.sales, paid.id).unwrap();
    contracts.record_payment(admin, signed.id, 150).unwrap();
    contracts.record_payment(admin, paid.id, 0).unwrap();

    let all = contracts.totals(admin, &ContractFilter::default()).unwrap();
    assert_eq!(all.contracts, 3);
    assert_eq!(all.total_amount, 600);
    assert_eq!(all.remaining_amount, 250);
    assert_eq!(all.collected(), 350);

    let outstanding_signed = contracts
        .totals(
            &f.sales,
            &ContractFilter {
                signed: Some(true),
                outstanding: Some(true),
                ..ContractFilter::default()
            },
        )
        .unwrap();
    assert_eq!(outstanding_signed.contracts, 1);
    assert_eq!(outstanding_signed.total_amount, 200);
    assert_eq!(outstanding_signed.remaining_amount, 150);

    let none = contracts
        .totals(
            admin,
            &ContractFilter {
                customer_id: Some(CustomerId::from(999)),
                ..ContractFilter::default()
            },
        )
        .unwrap();
    assert_eq!(none, ContractTotals::default());
}

#[test]
fn test_event_queries_by_customer_and_date() {
    let f = fixture();
    let now = Utc::now();
    let other_customer = f
        .crm
        .system
        .customers
        .create(
            &f.sales,
            CustomerCreate {
                full_name: "Dana Lee".to_string(),
                email: "dana@lee-events.example".to_string(),
                company: "Lee Events".to_string(),
                phone: "0698765432".to_string(),
                sales_contact_id: None,
            },
        )
        .unwrap();
    let ours = f.contract(1000);
    let theirs = f
        .crm
        .system
        .contracts
        .create(
            &f.sales,
            ContractCreate {
                customer_id: other_customer.id,
                total_amount: 500,
                remaining_amount: None,
            },
        )
        .unwrap();
    f.crm.system.contracts.sign(&f.sales, ours.id).unwrap();
    f.crm.system.contracts.sign(&f.sales, theirs.id).unwrap();

    let event_at = |contract: &Contract, start: DateTime<Utc>| {
        let params = EventCreate {
            start,
            end: start + Duration::hours(4),
            ..f.event_for(contract)
        };
        f.crm.system.events.create(&f.sales, params).unwrap()
    };
    let past = event_at(&ours, now - Duration::days(10));
    let soon = event_at(&ours, now + Duration::days(5));
    let later = event_at(&theirs, now + Duration::days(60));

    let ids = |filter: EventFilter| -> Vec<_> {
        f.crm
            .system
            .events
            .list(&f.crm.admin, &filter, Page::all())
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect()
    };

    assert_eq!(
        ids(EventFilter {
            customer_id: Some(f.customer.id),
            ..EventFilter::default()
        }),
        vec![past.id, soon.id]
    );
    assert!(ids(EventFilter {
        customer_id: Some(CustomerId::from(999)),
        ..EventFilter::default()
    })
    .is_empty());
    assert_eq!(ids(EventFilter::upcoming(now, Duration::days(30))), vec![soon.id]);
    assert_eq!(ids(EventFilter::past(now)), vec![past.id]);
    assert_eq!(
        ids(EventFilter::between(now - Duration::days(11), now + Duration::days(61))),
        vec![past.id, soon.id, later.id]
    );
    assert_eq!(
        ids(EventFilter {
            customer_id: Some(other_customer.id),
            ..EventFilter::upcoming(now, Duration::days(90))
        }),
        vec![later.id]
    );
}
