//! Durable local state survives reopen.

use rakhwala_core::{AccessCodeStore, LocalStore, RedbLocalStore, SessionContext};
use rakhwala_proto::{AccessCode, AuthSession, UserId};
use tempfile::tempdir;

#[test]
fn access_code_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.redb");
    let code = AccessCode::new(765_432).unwrap();

    {
        let store = RedbLocalStore::open(&path).unwrap();
        store.store_access_code_if_absent(code).unwrap();
    }

    let store = RedbLocalStore::open(&path).unwrap();
    assert_eq!(AccessCodeStore::new(store).current().unwrap(), Some(code));
}

#[test]
fn session_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.redb");

    {
        let store = RedbLocalStore::open(&path).unwrap();
        let mut ctx = SessionContext::new(AuthSession::default(), AccessCode::new(100_000).unwrap());
        ctx.sign_in(&store, UserId::new("uid-42")).unwrap();
    }

    let store = RedbLocalStore::open(&path).unwrap();
    let session = store.load_session().unwrap();
    assert_eq!(session.active_user(), Some(&UserId::new("uid-42")));
}
