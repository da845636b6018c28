//! APC220 configuration against a stub that only listens while SET is LOW.

use kroner_hub::config::DEFAULT_RADIO_SETTINGS;
use kroner_hub::radio::{RadioMode, RadioSession, RadioSettings, RadioTiming, Verification};

use crate::mock_hw::{Apc220Stub, MockClock, MockDelay, SharedPin};

fn radio(params: &str) -> (RadioSession<Apc220Stub, SharedPin, MockDelay, MockClock>, SharedPin) {
    let set = SharedPin::high();
    let stub = Apc220Stub::new(set.clone(), params);
    let session = RadioSession::new(stub, set.clone(), MockDelay::default(), MockClock::ticking());
    (session, set)
}

#[test]
fn boot_sequence_configures_and_reads_back() {
    let (mut r, set) = radio("434000 3 9 3 0");
    r.stream_mut().inject(b"noise before boot");

    r.initialize(9600, 500).unwrap();
    assert_eq!(r.stream().baud, Some(9600));
    assert!(set.get());

    assert_eq!(r.apply_settings(DEFAULT_RADIO_SETTINGS), Verification::Confirmed);
    assert_eq!(r.stream().params, "435000 3 9 3 0");

    assert_eq!(r.read_settings(500).as_str(), "PARA 435000 3 9 3 0");
    assert_eq!(r.stream().commands, ["WR 435000 3 9 3 0", "RD"]);

    assert!(set.get(), "SET released after configuration");
    assert_eq!(r.mode(), RadioMode::Operational);
    assert!(r.stream().air.is_empty(), "no command leaked over the air");
}

#[test]
fn forwarded_bytes_go_over_the_air_untouched() {
    let (mut r, _set) = radio("435000 3 9 3 0");
    r.initialize(9600, 500).unwrap();

    r.forward(b"RD\r\n").unwrap();
    assert_eq!(r.stream().air, b"RD\r\n");
    assert!(r.stream().commands.is_empty());
}

#[test]
fn typed_settings_round_trip_through_radio() {
    let (mut r, _set) = radio("435000 3 9 3 0");
    let s: RadioSettings = "PARA 470000 2 7 4 1".parse().unwrap();
    assert_eq!(r.apply(&s), Verification::Confirmed);

    let back: RadioSettings = r.read_settings(500).parse().unwrap();
    assert_eq!(back, s);
}

#[test]
fn write_waits_for_settle_times() {
    let set = SharedPin::high();
    let delay = MockDelay::default();
    let total = delay.total_ns.clone();
    let mut r = RadioSession::new(
        Apc220Stub::new(set.clone(), "435000 3 9 3 0"),
        set,
        delay,
        MockClock::ticking(),
    );

    assert_eq!(r.apply_settings("435000 3 9 3 0"), Verification::Confirmed);
    // write settle + exit settle
    assert_eq!(total.get(), 210 * 1_000_000);
}

#[test]
fn custom_timing_replaces_settle_delays() {
    let set = SharedPin::high();
    let delay = MockDelay::default();
    let total = delay.total_ns.clone();
    let mut r = RadioSession::new(
        Apc220Stub::new(set.clone(), "435000 3 9 3 0"),
        set.clone(),
        delay,
        MockClock::ticking(),
    )
    .with_timing(RadioTiming {
        write_settle_ms: 0,
        read_settle_ms: 5,
        exit_settle_ms: 1,
        write_window_ms: 50,
    });

    assert_eq!(r.apply_settings("435000 3 9 3 0"), Verification::Confirmed);
    assert_eq!(total.get(), 1_000_000);
    assert_eq!(r.read_settings(20).as_str(), "PARA 435000 3 9 3 0");
    assert_eq!(total.get(), 7 * 1_000_000);
    assert!(set.get());
}
