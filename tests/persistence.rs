#![allow(non_snake_case)]
use lootcase::{
    App,
    ManualClock,
    ScriptedDraws,
    storage::{
        JsonFileSnapshotStorage,
        SledSnapshotStorage,
        SnapshotStorage,
    },
    test_helpers::*,
};
use tempdir::TempDir;

fn load_app<S: SnapshotStorage>(
    ctx: &TestContext,
    storage: S,
) -> App<S, ScriptedDraws, ManualClock> {
    App::load(
        fixture_catalog(),
        ctx.config(),
        storage,
        ScriptedDraws::new([0.1, 0.0]),
        ctx.clock(),
    )
    .unwrap()
}

#[tokio::test]
async fn app__json_profile_is_resumed_by_the_next_run() {
    let ctx = TestContext::new();
    let temp_dir = TempDir::new("lootcase_json_resume").unwrap();
    // given
    let opened = {
        let storage = JsonFileSnapshotStorage::in_dir(temp_dir.path()).unwrap();
        let mut app = load_app(&ctx, storage);
        app.open_case(FREE_CASE, 1).await.unwrap();
        app.open_case(FIXTURE_CASE, 2).await.unwrap()
    };

    // when
    let storage = JsonFileSnapshotStorage::in_dir(temp_dir.path()).unwrap();
    let app = load_app(&ctx, storage);

    // then
    let session = app.session();
    assert_eq!(session.ledger(), &opened.ledger);
    assert_eq!(session.inventory().len(), 3);
    assert!(!app.free_case_status().ready);
}

fn sled_db(temp_dir: &TempDir) -> sled::Db {
    sled::Config::default()
        .path(temp_dir.path())
        .open()
        .expect("open sled db")
}

#[tokio::test]
async fn app__sled_profile_is_resumed_and_ids_keep_counting() {
    let ctx = TestContext::new();
    let temp_dir = TempDir::new("lootcase_sled_resume").unwrap();
    let db = sled_db(&temp_dir);
    // given
    {
        let storage = SledSnapshotStorage::new(&db).unwrap();
        let mut app = load_app(&ctx, storage);
        let first = app.open_case(FIXTURE_CASE, 1).await.unwrap().items[0].id;
        app.sell_item(first).unwrap();
    }

    // when
    let storage = SledSnapshotStorage::new(&db).unwrap();
    let mut app = load_app(&ctx, storage);
    let next = app.open_case(FIXTURE_CASE, 1).await.unwrap().items[0].id;

    // then
    assert_eq!(next.0, 1);
    assert_eq!(app.session().inventory().len(), 1);
    assert_eq!(app.storage().latest_revision().unwrap(), Some(2));
}
