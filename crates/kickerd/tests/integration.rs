//! Integration tests for kickerd
//!
//! These tests drive the poll loop end to end against a mock media server
//! and a real SQLite policy store.

use chrono::{DateTime, Local, TimeZone};
use kicker_api::{IdentityMode, NowPlayingItem, PlayState, PlayStateCommand, Session};
use kicker_config::{Config, parse_config};
use kicker_core::{Kicker, KickerEvent};
use kicker_host_api::{MediaCall, MockMediaServer};
use kicker_store::{SqliteStore, Store};
use kicker_util::{DeviceId, EntityId, ItemId, SessionId, WallClock};
use std::sync::Arc;
use std::time::Duration;

fn make_test_config(max_watch_secs: u64, extra: &str) -> Config {
    parse_config(&format!(
        r#"
        config_version = 1

        [server]
        url = "http://localhost:8096"
        api_key = "test-key"

        [service]
        check_interval_seconds = 60

        [quota]
        max_watch_seconds = {}
        {}

        [enforcement]
        restricted_message = "restricted"
        over_quota_message = "over"
        quota_restored_message = "restored"
        replacement_item_id = "calm-item"
        "#,
        max_watch_secs, extra
    ))
    .unwrap()
}

fn kid_watching_movie() -> Session {
    Session {
        id: SessionId::new("s-kid"),
        user_id: Some("U1".into()),
        user_name: Some("kid".into()),
        device_id: Some(DeviceId::new("tv")),
        device_name: Some("Living room".into()),
        now_playing_item: Some(NowPlayingItem {
            id: ItemId::new("movie-1"),
            item_type: "Movie".into(),
            name: Some("Loud Movie".into()),
        }),
        play_state: PlayState { is_paused: false },
        supported_commands: vec!["DisplayMessage".into(), "PlayMediaSource".into()],
        supports_media_control: true,
    }
}

fn morning() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap()
}

fn setup(config: &Config) -> (Kicker, Arc<MockMediaServer>) {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    store
        .add_restriction(IdentityMode::User, &EntityId::new("U1"), "movie")
        .unwrap();

    let server = Arc::new(MockMediaServer::new().with_sessions(vec![kid_watching_movie()]));
    let kicker = Kicker::new(config, server.clone(), store, morning());
    (kicker, server)
}

fn stop_count(server: &MockMediaServer) -> usize {
    server
        .commands()
        .iter()
        .filter(|c| {
            matches!(
                c,
                MediaCall::SetPlayState {
                    command: PlayStateCommand::Stop,
                    ..
                }
            )
        })
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_hour_quota_at_one_minute_cycles() {
    let config = make_test_config(3600, "");
    let (mut kicker, server) = setup(&config);
    let u1 = EntityId::new("U1");

    // Cycles 0..59: 60 credited minutes, no enforcement yet
    for _ in 0..60 {
        let events = kicker.run_cycle(morning()).await;
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, KickerEvent::QuotaExceeded { .. }))
        );
    }
    kicker.settle().await;

    assert_eq!(kicker.accrued(&u1), Some(Duration::from_secs(3600)));
    assert_eq!(stop_count(&server), 0);

    // Cycle 60 and every one after it enforce without accruing
    for cycle in 1..=3 {
        let events = kicker.run_cycle(morning()).await;
        assert!(matches!(
            events[..],
            [KickerEvent::QuotaExceeded { .. }]
        ));
        kicker.settle().await;
        assert_eq!(stop_count(&server), cycle);
    }
    assert_eq!(kicker.accrued(&u1), Some(Duration::from_secs(3600)));

    let commands = server.commands();
    let over_notices = commands
        .iter()
        .filter(|c| matches!(c, MediaCall::SendMessage { text, .. } if text == "over"))
        .count();
    assert_eq!(over_notices, 3);
    assert!(commands.contains(&MediaCall::PlayItem {
        session_id: SessionId::new("s-kid"),
        item_id: ItemId::new("calm-item"),
    }));
}

#[tokio::test(start_paused = true)]
async fn test_replacement_item_is_not_counted() {
    let config = make_test_config(60, "");
    let (mut kicker, server) = setup(&config);

    kicker.run_cycle(morning()).await;
    kicker.run_cycle(morning()).await;
    kicker.settle().await;
    assert_eq!(stop_count(&server), 1);

    // The client obeyed: it now plays the replacement item
    let mut calm = kid_watching_movie();
    calm.now_playing_item = Some(NowPlayingItem {
        id: ItemId::new("calm-item"),
        item_type: "Movie".into(),
        name: None,
    });
    server.set_sessions(vec![calm]);

    let events = kicker.run_cycle(morning()).await;
    kicker.settle().await;

    assert!(events.is_empty());
    assert_eq!(stop_count(&server), 1);
}

#[test]
fn test_malformed_reset_time_falls_back_to_midnight() {
    let config = make_test_config(3600, r#"reset_time = "25:99""#);
    assert_eq!(config.quota.reset_time, Some(WallClock::MIDNIGHT));

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let server = Arc::new(MockMediaServer::new());
    let kicker = Kicker::new(&config, server, store, morning());

    assert_eq!(
        kicker.next_reset(),
        Some(Local.with_ymd_and_hms(2025, 6, 11, 0, 0, 0).unwrap())
    );
}

#[test]
fn test_absent_reset_time_disables_reset() {
    let config = make_test_config(3600, "");
    assert_eq!(config.quota.reset_time, None);

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let kicker = Kicker::new(&config, Arc::new(MockMediaServer::new()), store, morning());
    assert_eq!(kicker.next_reset(), None);
}

#[tokio::test]
async fn test_failed_fetch_leaves_accrual_untouched() {
    let config = make_test_config(3600, "");
    let (mut kicker, server) = setup(&config);
    let u1 = EntityId::new("U1");

    kicker.run_cycle(morning()).await;
    assert_eq!(kicker.accrued(&u1), Some(Duration::from_secs(60)));

    *server.fail_list.lock().unwrap() = true;
    for _ in 0..5 {
        let events = kicker.run_cycle(morning()).await;
        assert!(events.is_empty());
    }
    assert_eq!(kicker.accrued(&u1), Some(Duration::from_secs(60)));

    *server.fail_list.lock().unwrap() = false;
    kicker.run_cycle(morning()).await;
    assert_eq!(kicker.accrued(&u1), Some(Duration::from_secs(120)));
}

#[tokio::test(start_paused = true)]
async fn test_daily_reset_restores_quota() {
    let config = make_test_config(3600, r#"reset_time = "21:30""#);
    let (mut kicker, server) = setup(&config);
    let u1 = EntityId::new("U1");

    for _ in 0..61 {
        kicker.run_cycle(morning()).await;
    }
    kicker.settle().await;
    assert!(stop_count(&server) > 0);

    let reset_at = Local.with_ymd_and_hms(2025, 6, 10, 21, 30, 0).unwrap();
    server.set_sessions(vec![]);
    server.clear_calls();

    let events = kicker.run_cycle(reset_at).await;
    kicker.settle().await;

    assert!(matches!(
        events[..],
        [KickerEvent::QuotaReset {
            entities_cleared: 1,
            ..
        }]
    ));
    assert_eq!(kicker.accrued(&u1), None);
    assert_eq!(
        kicker.next_reset(),
        Some(Local.with_ymd_and_hms(2025, 6, 11, 21, 30, 0).unwrap())
    );
    assert_eq!(
        server.commands(),
        vec![MediaCall::SendMessage {
            session_id: SessionId::new("s-kid"),
            text: "restored".into(),
        }]
    );

    // Watching again starts a fresh period with a fresh notice
    server.set_sessions(vec![kid_watching_movie()]);
    let events = kicker.run_cycle(reset_at).await;
    kicker.settle().await;

    assert!(matches!(events[0], KickerEvent::EntityRestricted { .. }));
    assert_eq!(kicker.accrued(&u1), Some(Duration::from_secs(60)));
}

#[tokio::test]
async fn test_device_mode_tracks_devices() {
    let config = make_test_config(3600, r#"track_by = "device""#);
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    store
        .add_restriction(IdentityMode::Device, &EntityId::new("tv"), "movie")
        .unwrap();

    let mut other_user = kid_watching_movie();
    other_user.id = SessionId::new("s-parent");
    other_user.user_id = Some("U2".into());

    let server = Arc::new(
        MockMediaServer::new().with_sessions(vec![kid_watching_movie(), other_user]),
    );
    let mut kicker = Kicker::new(&config, server, store, morning());

    kicker.run_cycle(morning()).await;

    // Both sessions play on the same device and share its counter
    assert_eq!(
        kicker.accrued(&EntityId::new("tv")),
        Some(Duration::from_secs(120))
    );
    assert_eq!(kicker.accrued(&EntityId::new("U1")), None);
}

#[tokio::test]
async fn test_store_on_disk_shared_with_admin_edits() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join(kicker_util::DATABASE_FILENAME);

    let store = Arc::new(SqliteStore::open(&db_path).unwrap());
    let server = Arc::new(MockMediaServer::new().with_sessions(vec![kid_watching_movie()]));
    let mut kicker = Kicker::new(&make_test_config(3600, ""), server, store.clone(), morning());

    kicker.run_cycle(morning()).await;
    assert_eq!(kicker.accrued(&EntityId::new("U1")), None);

    // An administrator restricts the kid while the service runs
    let admin = SqliteStore::open(&db_path).unwrap();
    admin
        .add_restriction(IdentityMode::User, &EntityId::new("U1"), "Movie")
        .unwrap();

    kicker.run_cycle(morning()).await;
    assert_eq!(
        kicker.accrued(&EntityId::new("U1")),
        Some(Duration::from_secs(60))
    );
}
