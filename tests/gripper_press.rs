// Integration tests for the gripper-press open/grab sequencer

use gripper_gpio::components::gripper_press::{GripperPress, PressConfig, PressPosition};
use gripper_gpio::hardware::PinWrite;
use gripper_gpio::{Context, Dependencies, DriverError, Extra, Gripper, SimBoard};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tokio_test::assert_ok;

fn levels(pins: &[(&str, bool)]) -> Option<BTreeMap<String, bool>> {
    Some(pins.iter().map(|(p, l)| (p.to_string(), *l)).collect())
}

fn setup(config: PressConfig) -> (SimBoard, GripperPress) {
    let board = SimBoard::new("local", ["g", "o", "w", "solo"]);
    let deps = Dependencies::new().with_board(Arc::new(board.clone()));
    let press = GripperPress::new("press", &config, &deps).unwrap();
    (board, press)
}

fn with_wait(grab_ms: u64, open_ms: u64) -> PressConfig {
    PressConfig {
        board: "local".into(),
        grab_pins: levels(&[("g", true)]),
        open_pins: levels(&[("o", true)]),
        wait_pins: levels(&[("w", false)]),
        grab_time_ms: Some(grab_ms),
        open_time_ms: Some(open_ms),
        ..Default::default()
    }
}

fn w(pin: &str, high: bool) -> PinWrite {
    PinWrite::new(pin, high)
}

#[tokio::test(start_paused = true)]
async fn test_initial_state_makes_first_grab_a_noop() {
    let (board, mut press) = setup(with_wait(100, 100));
    let ctx = Context::background();
    assert_eq!(press.position(), PressPosition::Grabbed);
    let held = press.grab(&ctx, &Extra::default()).await.unwrap();
    assert!(!held);
    assert!(board.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_grab_sequence_order() {
    let (board, mut press) = setup(with_wait(1500, 100));
    let ctx = Context::background();
    let start = Instant::now();
    assert_ok!(press.grab(&ctx, &Extra::forced()).await);
    assert!(start.elapsed() >= Duration::from_millis(1500));
    assert_eq!(
        board.writes(),
        vec![
            w("w", false), // wait active
            w("o", false), // open inactive
            w("g", true),  // grab active
            w("g", false), // grab released after hold
            w("w", true),  // wait released
        ]
    );
    assert_eq!(press.position(), PressPosition::Grabbed);
}

#[tokio::test(start_paused = true)]
async fn test_open_sequence_order() {
    let (board, mut press) = setup(with_wait(100, 2000));
    let ctx = Context::background();
    let start = Instant::now();
    assert_ok!(press.open(&ctx, &Extra::default()).await);
    assert!(start.elapsed() >= Duration::from_millis(2000));
    assert_eq!(
        board.writes(),
        vec![w("w", false), w("g", false), w("o", true), w("o", false), w("w", true)]
    );
    assert_eq!(press.position(), PressPosition::Open);
}

#[tokio::test(start_paused = true)]
async fn test_second_open_is_noop() {
    let (board, mut press) = setup(with_wait(100, 100));
    let ctx = Context::background();
    press.open(&ctx, &Extra::default()).await.unwrap();
    board.clear_writes();
    press.open(&ctx, &Extra::default()).await.unwrap();
    assert!(board.writes().is_empty());

    press.grab(&ctx, &Extra::default()).await.unwrap();
    board.clear_writes();
    press.grab(&ctx, &Extra::default()).await.unwrap();
    assert!(board.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_force_replays_full_sequence() {
    let (board, mut press) = setup(with_wait(100, 100));
    let ctx = Context::background();
    press.open(&ctx, &Extra::default()).await.unwrap();
    let first = board.writes();
    board.clear_writes();
    press.open(&ctx, &Extra::forced()).await.unwrap();
    assert_eq!(board.writes(), first);
}

#[tokio::test(start_paused = true)]
async fn test_zero_hold_leaves_pins_asserted() {
    let (board, mut press) = setup(with_wait(0, 0));
    let ctx = Context::background();
    let start = Instant::now();
    press.grab(&ctx, &Extra::forced()).await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(board.writes(), vec![w("w", false), w("o", false), w("g", true)]);
    assert_eq!(board.level("g"), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_zero_seconds_disables_role_holds() {
    let config = PressConfig { seconds: Some(0), ..with_wait(500, 500) };
    let (board, mut press) = setup(config);
    press.open(&Context::background(), &Extra::default()).await.unwrap();
    assert_eq!(board.writes(), vec![w("w", false), w("g", false), w("o", true)]);
}

#[tokio::test(start_paused = true)]
async fn test_default_hold_is_three_seconds() {
    let config = PressConfig { grab_time_ms: None, open_time_ms: None, ..with_wait(0, 0) };
    let (_board, mut press) = setup(config);
    let start = Instant::now();
    press.open(&Context::background(), &Extra::default()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn test_without_wait_pins() {
    let config = PressConfig { wait_pins: None, ..with_wait(100, 100) };
    let (board, mut press) = setup(config);
    press.grab(&Context::background(), &Extra::forced()).await.unwrap();
    assert_eq!(board.writes(), vec![w("o", false), w("g", true), w("g", false)]);
}

#[tokio::test(start_paused = true)]
async fn test_pin_failure_aborts_without_rollback() {
    let (board, mut press) = setup(with_wait(100, 100));
    board.fail_pin("g");
    let err = press.grab(&Context::background(), &Extra::forced()).await.unwrap_err();
    assert!(matches!(err, DriverError::PinWrite(_)));
    // wait and open writes already happened and stay in place
    assert_eq!(board.writes(), vec![w("w", false), w("o", false)]);
    assert_eq!(board.level("w"), Some(false));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_hold_releases_pins() {
    let (board, mut press) = setup(with_wait(10_000, 10_000));
    let (ctx, cancel) = Context::with_cancel();
    let task = tokio::spawn(async move {
        let result = press.open(&ctx, &Extra::default()).await;
        (result, press)
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();
    let (result, press) = task.await.unwrap();
    assert!(matches!(result, Err(DriverError::Cancelled)));
    assert_eq!(press.position(), PressPosition::Open);
    assert_eq!(
        board.writes(),
        vec![w("w", false), w("g", false), w("o", true), w("o", false), w("w", true)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_single_pin_pulses_for_seconds() {
    let config = PressConfig {
        board: "local".into(),
        pin: "solo".into(),
        seconds: Some(2),
        ..Default::default()
    };
    let (board, mut press) = setup(config);
    let ctx = Context::background();
    let start = Instant::now();
    press.open(&ctx, &Extra::default()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(2));
    press.grab(&ctx, &Extra::forced()).await.unwrap();
    assert_eq!(
        board.writes(),
        vec![w("solo", true), w("solo", false), w("solo", true), w("solo", false)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_single_pin_open_never_records_open() {
    let config = PressConfig {
        board: "local".into(),
        pin: "solo".into(),
        seconds: Some(1),
        ..Default::default()
    };
    let (board, mut press) = setup(config);
    let ctx = Context::background();

    press.open(&ctx, &Extra::default()).await.unwrap();
    assert_eq!(press.position(), PressPosition::Grabbed);
    board.clear_writes();

    // an unforced grab is skipped, a second open pulses again
    press.grab(&ctx, &Extra::default()).await.unwrap();
    assert!(board.writes().is_empty());
    press.open(&ctx, &Extra::default()).await.unwrap();
    assert_eq!(board.writes(), vec![w("solo", true), w("solo", false)]);
}

#[tokio::test(start_paused = true)]
async fn test_single_pin_active_low_without_hold() {
    let config = PressConfig {
        board: "local".into(),
        pin: "solo".into(),
        active_high: Some(false),
        seconds: Some(0),
        ..Default::default()
    };
    let (board, mut press) = setup(config);
    press.open(&Context::background(), &Extra::default()).await.unwrap();
    assert_eq!(board.writes(), vec![w("solo", false)]);
}

#[test]
fn test_missing_pin_fails_construction() {
    let board = SimBoard::new("local", ["g"]);
    let deps = Dependencies::new().with_board(Arc::new(board));
    let config = with_wait(1, 1);
    match GripperPress::new("press", &config, &deps) {
        Err(DriverError::PinNotFound { pin, .. }) => assert_eq!(pin, "o"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("construction should fail"),
    }
}
