use entity_store::row::{get, get_opt};
use entity_store::rusqlite::types::Value;
use entity_store::rusqlite::Row;
use entity_store::{Criteria, Database, DatabaseConfig, Page, Repository, StoreEntity, StoreError};

// --- Test Entity ---

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS simple_users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    is_admin INTEGER NOT NULL,
    mentor_id INTEGER REFERENCES simple_users(id) ON DELETE RESTRICT
);";

#[derive(Clone, Debug, PartialEq)]
struct SimpleUser {
    id: i64,
    name: String,
    email: String,
    is_admin: bool,
    mentor_id: Option<i64>,
}

#[derive(Debug)]
struct SimpleUserCreate {
    name: String,
    email: String,
    mentor_id: Option<i64>,
}

#[derive(Debug, Default)]
struct SimpleUserUpdate {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug)]
enum UserAction {
    PromoteToAdmin,
}

#[derive(Debug, thiserror::Error)]
enum SimpleUserError {
    #[error("name must not be empty")]
    EmptyName,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StoreEntity for SimpleUser {
    type Id = i64;
    type Create = SimpleUserCreate;
    type Update = SimpleUserUpdate;
    type Action = UserAction;
    type ActionResult = bool;
    type Error = SimpleUserError;

    const TABLE: &'static str = "simple_users";
    const ENTITY: &'static str = "SimpleUser";
    const COLUMNS: &'static [&'static str] = &["name", "email", "is_admin", "mentor_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_create_params(id: i64, params: SimpleUserCreate) -> Result<Self, Self::Error> {
        Ok(Self {
            id,
            name: params.name,
            email: params.email,
            is_admin: false,
            mentor_id: params.mentor_id,
        })
    }

    fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: get(row, 0, Self::TABLE, "id")?,
            name: get(row, 1, Self::TABLE, "name")?,
            email: get(row, 2, Self::TABLE, "email")?,
            is_admin: get(row, 3, Self::TABLE, "is_admin")?,
            mentor_id: get_opt(row, 4, Self::TABLE, "mentor_id")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.name.clone().into(),
            self.email.clone().into(),
            self.is_admin.into(),
            self.mentor_id.into(),
        ]
    }

    fn on_update(&mut self, update: SimpleUserUpdate) -> Result<(), Self::Error> {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        Ok(())
    }

    fn handle_action(&mut self, action: UserAction) -> Result<bool, Self::Error> {
        match action {
            UserAction::PromoteToAdmin => {
                if self.is_admin {
                    Ok(false)
                } else {
                    self.is_admin = true;
                    Ok(true)
                }
            }
        }
    }

    fn validate(&self) -> Result<(), Self::Error> {
        if self.name.trim().is_empty() {
            return Err(SimpleUserError::EmptyName);
        }
        Ok(())
    }
}

fn user(name: &str) -> SimpleUserCreate {
    SimpleUserCreate {
        name: name.into(),
        email: format!("{}@example.com", name.to_lowercase()),
        mentor_id: None,
    }
}

fn setup() -> Database {
    Database::in_memory(SCHEMA).unwrap()
}

fn create(db: &Database, params: SimpleUserCreate) -> Result<SimpleUser, SimpleUserError> {
    db.transaction(|tx| Repository::<SimpleUser>::new(tx).create(params))
}

fn count(db: &Database) -> u64 {
    db.with_conn(|conn| Repository::<SimpleUser>::new(conn).count())
        .unwrap()
}

// --- Tests ---

#[test]
fn test_full_lifecycle() {
    let db = setup();

    // 1. Create
    let alice = create(&db, user("Alice")).unwrap();
    assert_eq!(alice.id, 1);

    // 2. Action: promote
    let (promoted, changed) = db
        .transaction(|tx| {
            Repository::<SimpleUser>::new(tx).perform_action(alice.id, UserAction::PromoteToAdmin)
        })
        .unwrap();
    assert!(changed);
    assert!(promoted.is_admin);

    // 3. Action again is a no-op
    let (_, changed_again) = db
        .transaction(|tx| {
            Repository::<SimpleUser>::new(tx).perform_action(alice.id, UserAction::PromoteToAdmin)
        })
        .unwrap();
    assert!(!changed_again);

    // 4. Partial update only touches provided fields
    let updated = db
        .transaction(|tx| {
            Repository::<SimpleUser>::new(tx).update(
                alice.id,
                SimpleUserUpdate {
                    name: Some("Bob".into()),
                    ..Default::default()
                },
            )
        })
        .unwrap();
    assert_eq!(updated.name, "Bob");
    assert_eq!(updated.email, "alice@example.com");
    assert!(updated.is_admin);

    let stored = db
        .with_conn(|conn| Repository::<SimpleUser>::new(conn).get_by_id(alice.id))
        .unwrap();
    assert_eq!(stored, updated);
    assert!(stored.same_identity(&alice));

    // 5. Delete
    db.transaction(|tx| Repository::<SimpleUser>::new(tx).delete(alice.id))
        .unwrap();
    let exists = db
        .with_conn(|conn| Repository::<SimpleUser>::new(conn).exists(alice.id))
        .unwrap();
    assert!(!exists);
}

#[test]
fn test_missing_ids_are_not_found() {
    let db = setup();
    let get = db.with_conn(|conn| Repository::<SimpleUser>::new(conn).get_by_id(42));
    assert!(matches!(get, Err(StoreError::NotFound { entity: "SimpleUser", .. })));

    let update = db.transaction(|tx| {
        Repository::<SimpleUser>::new(tx).update(42, SimpleUserUpdate::default())
    });
    assert!(matches!(update, Err(SimpleUserError::Store(StoreError::NotFound { .. }))));

    let delete = db.transaction(|tx| Repository::<SimpleUser>::new(tx).delete(42));
    assert!(matches!(delete, Err(StoreError::NotFound { .. })));
}

#[test]
fn test_duplicate_email_is_uniqueness_violation() {
    let db = setup();
    create(&db, user("Alice")).unwrap();
    let err = create(&db, user("Alice")).unwrap_err();
    assert!(matches!(
        err,
        SimpleUserError::Store(StoreError::UniquenessViolation { entity: "SimpleUser", .. })
    ));
    assert_eq!(count(&db), 1);
}

#[test]
fn test_referenced_row_cannot_be_deleted() {
    let db = setup();
    let mentor = create(&db, user("Mentor")).unwrap();
    create(
        &db,
        SimpleUserCreate {
            mentor_id: Some(mentor.id),
            ..user("Mentee")
        },
    )
    .unwrap();

    let err = db
        .transaction(|tx| Repository::<SimpleUser>::new(tx).delete(mentor.id))
        .unwrap_err();
    assert!(matches!(err, StoreError::ReferentialIntegrityViolation { .. }));
    assert_eq!(count(&db), 2);
}

#[test]
fn test_validation_failure_writes_nothing() {
    let db = setup();
    let err = create(&db, user("   ")).unwrap_err();
    assert!(matches!(err, SimpleUserError::EmptyName));
    assert_eq!(count(&db), 0);

    let alice = create(&db, user("Alice")).unwrap();
    let err = db
        .transaction(|tx| {
            Repository::<SimpleUser>::new(tx).update(
                alice.id,
                SimpleUserUpdate {
                    name: Some(String::new()),
                    email: Some("changed@example.com".into()),
                },
            )
        })
        .unwrap_err();
    assert!(matches!(err, SimpleUserError::EmptyName));

    let stored = db
        .with_conn(|conn| Repository::<SimpleUser>::new(conn).get_by_id(alice.id))
        .unwrap();
    assert_eq!(stored, alice);
}

#[test]
fn test_failed_unit_of_work_leaves_no_partial_writes() {
    let db = setup();
    let result: Result<(), SimpleUserError> = db.transaction(|tx| {
        let users = Repository::<SimpleUser>::new(tx);
        users.create(user("Alice"))?;
        users.create(user("Bob"))?;
        // Duplicate of the first insert aborts the whole unit.
        users.create(user("Alice"))?;
        Ok(())
    });
    assert!(result.is_err());
    assert_eq!(count(&db), 0);
}

#[test]
fn test_ids_are_never_reused() {
    let db = setup();
    let first = create(&db, user("First")).unwrap();
    db.transaction(|tx| Repository::<SimpleUser>::new(tx).delete(first.id))
        .unwrap();
    let second = create(&db, user("Second")).unwrap();
    assert_eq!(second.id, first.id + 1);
}

#[test]
fn test_list_filter_and_paginate() {
    let db = setup();
    let mentor = create(&db, user("Mentor")).unwrap();
    for name in ["A", "B", "C", "D"] {
        create(
            &db,
            SimpleUserCreate {
                mentor_id: Some(mentor.id),
                ..user(name)
            },
        )
        .unwrap();
    }

    db.with_conn(|conn| {
        let users = Repository::<SimpleUser>::new(conn);

        let all = users.list(&Criteria::new(), Page::all())?;
        let ids: Vec<i64> = all.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        let page = users.list(&Criteria::new(), Page::new(2, 1))?;
        let names: Vec<&str> = page.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);

        let past_end = users.list(&Criteria::new(), Page::new(10, 50))?;
        assert!(past_end.is_empty());

        let mentored = users.filter_by(&Criteria::new().eq("mentor_id", mentor.id))?;
        assert_eq!(mentored.len(), 4);

        let unmentored = users.filter_by(&Criteria::new().is_null("mentor_id"))?;
        assert_eq!(unmentored.len(), 1);
        assert_eq!(unmentored[0].id, mentor.id);

        let exact = users.filter_by(
            &Criteria::new()
                .eq("mentor_id", mentor.id)
                .eq("name", "C".to_string()),
        )?;
        assert_eq!(exact.len(), 1);

        let later = users.count_matching(&Criteria::new().gt("id", 3_i64))?;
        assert_eq!(later, 2);

        let unknown = users.filter_by(&Criteria::new().eq("password", 1_i64));
        assert!(matches!(unknown, Err(StoreError::UnknownColumn { .. })));
        Ok::<_, StoreError>(())
    })
    .unwrap();
}

#[test]
fn test_file_database_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("nested").join("store.db"),
        ..DatabaseConfig::default()
    };

    let created = {
        let db = Database::open(&config, SCHEMA).unwrap();
        assert_eq!(db.path(), config.path.as_path());
        create(&db, user("Durable")).unwrap()
    };

    let db = Database::open(&config, SCHEMA).unwrap();
    let found = db
        .with_conn(|conn| Repository::<SimpleUser>::new(conn).find(created.id))
        .unwrap();
    assert_eq!(found, Some(created));
}

#[test]
fn test_ranges_and_sums() {
    let db = setup();
    let mentor = create(&db, user("Mentor")).unwrap();
    for name in ["A", "B", "C"] {
        create(
            &db,
            SimpleUserCreate {
                mentor_id: Some(mentor.id),
                ..user(name)
            },
        )
        .unwrap();
    }

    db.with_conn(|conn| {
        let users = Repository::<SimpleUser>::new(conn);

        let middle = users.filter_by(&Criteria::new().ge("id", 2_i64).lt("id", 4_i64))?;
        let names: Vec<&str> = middle.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);

        let picked = users.filter_by(&Criteria::new().is_in("id", [1_i64, 4]))?;
        assert_eq!(picked.len(), 2);
        assert!(users
            .filter_by(&Criteria::new().is_in("id", Vec::<i64>::new()))?
            .is_empty());

        assert_eq!(users.sum("mentor_id", &Criteria::new())?, 3 * mentor.id);
        assert_eq!(users.sum("mentor_id", &Criteria::new().gt("id", 100_i64))?, 0);

        let err = users.sum("password", &Criteria::new()).unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));
        Ok::<_, StoreError>(())
    })
    .unwrap();
}
