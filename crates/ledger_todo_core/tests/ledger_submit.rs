use ledger_todo_core::db::open_db_in_memory;
use ledger_todo_core::{
    Authority, ContractError, CreateTodo, Entry, LedgerService, LedgerServiceError, Phase,
    Session, SignedTransaction, SqliteStreamRepository, StreamId, StreamRepository, TodoPatch,
    TodoState, TransactionEnvelope,
};
use rusqlite::Connection;
use serde_json::json;

fn onboard(conn: &mut Connection, name: &str) -> Session {
    let identity = LedgerService::new(conn)
        .onboard_identity(name, Authority::single("secp256k1", format!("{name}-pub")))
        .expect("onboarding should succeed");
    Session::new(identity)
}

fn load_todo(conn: &Connection, id: &StreamId) -> TodoState {
    let record = SqliteStreamRepository::new(conn)
        .get_stream(id)
        .expect("get should succeed")
        .expect("todo stream should exist");
    TodoState::from_document(&record.state).expect("stream should hold a todo")
}

fn create_todo(conn: &mut Connection, session: &Session) -> StreamId {
    let tx = session.create(&CreateTodo::new("Buy milk", "2% milk", "2024-01-01"));
    let receipt = LedgerService::new(conn)
        .submit(&session.sign(tx, "sig"))
        .expect("create should commit");
    receipt.new[0].clone()
}

fn rejection(err: LedgerServiceError) -> (Phase, ContractError) {
    match err {
        LedgerServiceError::Rejected { phase, reason } => (phase, reason),
        other => panic!("expected rejection, got {other}"),
    }
}

#[test]
fn create_persists_todo_with_owner_authority() {
    let mut conn = open_db_in_memory().expect("in-memory db should open");
    let owner = onboard(&mut conn, "alice");

    let tx = owner.create(&CreateTodo::new("Buy milk", "2% milk", "2024-01-01"));
    let receipt = LedgerService::new(&mut conn)
        .submit(&owner.sign(tx, "sig"))
        .expect("create should commit");

    assert_eq!(receipt.new.len(), 1);
    assert!(receipt.updated.is_empty());
    let id = receipt.stream().expect("receipt should name the new stream").clone();
    assert!(id.is_well_formed());

    let stored = SqliteStreamRepository::new(&conn)
        .get_stream(&id)
        .expect("get should succeed")
        .expect("todo should exist");
    assert_eq!(
        stored.state,
        json!({
            "owner": owner.identity().as_str(),
            "name": "Buy milk",
            "body": "2% milk",
            "dueDate": "2024-01-01",
            "type": "todo.todo",
            "sharedWith": []
        })
    );
    assert_eq!(
        stored.authority,
        Some(Authority::single("secp256k1", "alice-pub"))
    );
}

#[test]
fn unsigned_or_unregistered_transactions_are_self_signed() {
    let mut conn = open_db_in_memory().expect("in-memory db should open");
    let owner = onboard(&mut conn, "alice");
    let tx = owner.create(&CreateTodo::new("a", "b", "c"));

    let unsigned = SignedTransaction::new(tx.clone());
    let err = LedgerService::new(&mut conn)
        .submit(&unsigned)
        .expect_err("unsigned tx should be rejected");
    assert_eq!(
        rejection(err),
        (Phase::Verify, ContractError::UnauthorizedTransaction)
    );

    let mut flagged = owner.sign(tx, "sig");
    flagged.self_sign = true;
    let err = LedgerService::new(&mut conn)
        .submit(&flagged)
        .expect_err("flagged tx should be rejected");
    assert_eq!(err.rejection(), Some(&ContractError::UnauthorizedTransaction));

    let stranger = Session::new(StreamId::mint());
    let tx = stranger.create(&CreateTodo::new("a", "b", "c"));
    let err = LedgerService::new(&mut conn)
        .submit(&stranger.sign(tx, "sig"))
        .expect_err("unregistered signer should be rejected");
    assert_eq!(err.rejection(), Some(&ContractError::UnauthorizedTransaction));
}

#[test]
fn owner_update_replaces_only_given_fields() {
    let mut conn = open_db_in_memory().expect("in-memory db should open");
    let owner = onboard(&mut conn, "alice");
    let todo = create_todo(&mut conn, &owner);

    let patch = TodoPatch {
        body: Some("oat milk".to_string()),
        ..TodoPatch::default()
    };
    let receipt = LedgerService::new(&mut conn)
        .submit(&owner.sign(owner.update(&todo, &patch), "sig"))
        .expect("owner update should commit");
    assert_eq!(receipt.updated, vec![todo.clone()]);

    let state = load_todo(&conn, &todo);
    assert_eq!(state.name, "Buy milk");
    assert_eq!(state.body, "oat milk");
    assert_eq!(state.owner, *owner.identity());
}

#[test]
fn update_by_other_identity_is_rejected_and_state_unchanged() {
    let mut conn = open_db_in_memory().expect("in-memory db should open");
    let owner = onboard(&mut conn, "alice");
    let intruder = onboard(&mut conn, "mallory");
    let todo = create_todo(&mut conn, &owner);
    let before = load_todo(&conn, &todo);

    let patch = TodoPatch {
        name: Some("pwned".to_string()),
        ..TodoPatch::default()
    };
    let err = LedgerService::new(&mut conn)
        .submit(&intruder.sign(intruder.update(&todo, &patch), "sig"))
        .expect_err("intruder update should be rejected");

    assert_eq!(
        rejection(err),
        (Phase::Vote, ContractError::NotOwner(Entry::Update))
    );
    assert_eq!(load_todo(&conn, &todo), before);
}

#[test]
fn share_appends_recipient_every_time() {
    let mut conn = open_db_in_memory().expect("in-memory db should open");
    let owner = onboard(&mut conn, "alice");
    let todo = create_todo(&mut conn, &owner);
    let recipient = StreamId::new("a".repeat(64));

    let tx = owner.sign(owner.share(&todo, &recipient), "sig");
    LedgerService::new(&mut conn)
        .submit(&tx)
        .expect("first share should commit");
    assert_eq!(load_todo(&conn, &todo).shared_with, vec![recipient.clone()]);

    LedgerService::new(&mut conn)
        .submit(&tx)
        .expect("second share should commit");
    assert_eq!(
        load_todo(&conn, &todo).shared_with,
        vec![recipient.clone(), recipient]
    );
}

#[test]
fn share_with_short_recipient_is_rejected_in_verify() {
    let mut conn = open_db_in_memory().expect("in-memory db should open");
    let owner = onboard(&mut conn, "alice");
    let todo = create_todo(&mut conn, &owner);

    let tx = owner.sign(owner.share(&todo, &StreamId::new("short")), "sig");
    let err = LedgerService::new(&mut conn)
        .submit(&tx)
        .expect_err("short recipient should be rejected");
    assert_eq!(
        rejection(err),
        (Phase::Verify, ContractError::MissingRecipient)
    );
    assert!(load_todo(&conn, &todo).shared_with.is_empty());
}

#[test]
fn malformed_entries_are_rejected() {
    let mut conn = open_db_in_memory().expect("in-memory db should open");
    let owner = onboard(&mut conn, "alice");

    let mut envelope = TransactionEnvelope::new("archive");
    envelope
        .inputs
        .insert(owner.identity().to_string(), json!({}));
    let err = LedgerService::new(&mut conn)
        .submit(&owner.sign(envelope.clone(), "sig"))
        .expect_err("unknown entry should be rejected");
    assert_eq!(
        err.rejection(),
        Some(&ContractError::UnknownEntry("archive".to_string()))
    );

    envelope.entry = None;
    let err = LedgerService::new(&mut conn)
        .submit(&owner.sign(envelope, "sig"))
        .expect_err("missing entry should be rejected");
    assert_eq!(err.rejection(), Some(&ContractError::MissingEntry));
}

#[test]
fn blank_identity_name_is_refused() {
    let mut conn = open_db_in_memory().expect("in-memory db should open");
    let err = LedgerService::new(&mut conn)
        .onboard_identity("  ", Authority::single("rsa", "k"))
        .expect_err("blank name should be refused");
    assert!(matches!(err, LedgerServiceError::InvalidIdentity(_)));
}

#[test]
fn owner_update_keeps_keys_written_by_other_parties() {
    let mut conn = open_db_in_memory().expect("in-memory db should open");
    let owner = onboard(&mut conn, "alice");
    let todo = create_todo(&mut conn, &owner);

    let repo = SqliteStreamRepository::new(&conn);
    let mut document = repo
        .get_stream(&todo)
        .expect("get should succeed")
        .expect("todo should exist")
        .state;
    document["priority"] = json!(2);
    repo.update_state(&todo, &document)
        .expect("annotated state should be written");

    let patch = TodoPatch {
        name: Some("Buy oat milk".to_string()),
        ..TodoPatch::default()
    };
    LedgerService::new(&mut conn)
        .submit(&owner.sign(owner.update(&todo, &patch), "sig"))
        .expect("owner update should commit");

    let stored = SqliteStreamRepository::new(&conn)
        .get_stream(&todo)
        .expect("get should succeed")
        .expect("todo should exist")
        .state;
    assert_eq!(stored["name"], json!("Buy oat milk"));
    assert_eq!(stored["priority"], json!(2));
}
