//! The hub's tasks on a cooperative scheduler, end to end: link tracking,
//! input scanning and the link → radio bridge.

use kroner_hub::app::commands::CommandOutcome;
use kroner_hub::app::console::{LineBuffer, route_line};
use kroner_hub::app::hub::{InputScanner, LinkState, accept_bridge_write, forward_bridge, track_link};
use kroner_hub::config::{SystemConfig, firmware_info};
use kroner_hub::inputs::{EdgeCaptureBank, KeyMatrix, MatrixScanner, RACE_KEYPAD, SwitchInput};
use kroner_hub::mailbox::Mailbox;
use kroner_hub::radio::{RadioSession, RadioTiming};
use kroner_hub::scheduler::{CooperativeScheduler, TaskScheduler};

use crate::mock_hw::{Apc220Stub, ColPin, KeypadSim, MockClock, MockDelay, MockLink, RowPin, SharedPin};

// ── Test rig ──────────────────────────────────────────────────

struct Hub {
    now: u32,
    link: MockLink,
    state: LinkState,
    scanner: InputScanner<'static, RowPin, ColPin, SharedPin>,
    bridge: Mailbox,
    radio: RadioSession<Apc220Stub, SharedPin, MockDelay, MockClock>,
}

fn link_task(h: &mut Hub) {
    track_link(&h.state, &mut h.link, h.now);
}

fn input_task(h: &mut Hub) {
    h.scanner.scan(h.now, &h.state, &mut h.link);
}

fn radio_task(h: &mut Hub) {
    forward_bridge(&h.bridge, &mut h.radio);
}

struct Rig {
    hub: Hub,
    sched: CooperativeScheduler<Hub>,
    keypad: KeypadSim,
    switches: [SharedPin; 3],
    gates: &'static EdgeCaptureBank<3>,
}

impl Rig {
    fn new() -> Self {
        let config = SystemConfig::default();
        let gates: &'static EdgeCaptureBank<3> = Box::leak(Box::new(EdgeCaptureBank::new(config.edge_debounce_ms)));
        let keypad = KeypadSim::default();
        let switches: [SharedPin; 3] = Default::default();

        let keys = KeyMatrix::new(RACE_KEYPAD, config.keypad_debounce_ms);
        let matrix = MatrixScanner::new(keypad.rows(), keypad.cols(), keys.keymap());
        let inputs = [0, 1, 2].map(|i| {
            SwitchInput::new(&format!("Input{}", i + 1), switches[i].clone(), config.switch_debounce_ms)
        });

        let set = SharedPin::high();
        let radio = RadioSession::new(
            Apc220Stub::new(set.clone(), "435000 3 9 3 0"),
            set,
            MockDelay::default(),
            MockClock::ticking(),
        )
        .with_timing(RadioTiming {
            write_settle_ms: 0,
            read_settle_ms: 0,
            exit_settle_ms: 0,
            write_window_ms: 50,
        });

        let mut sched = CooperativeScheduler::<Hub>::new();
        sched.add_task("Link", link_task, config.link_period_ms).unwrap();
        sched.add_task("Inputs", input_task, config.input_period_ms).unwrap();
        sched.add_task("Radio", radio_task, config.radio_period_ms).unwrap();

        Self {
            hub: Hub {
                now: 0,
                link: MockLink::default(),
                state: LinkState::new(),
                scanner: InputScanner::new(matrix, keys, inputs, gates),
                bridge: Mailbox::new(),
                radio,
            },
            sched,
            keypad,
            switches,
            gates,
        }
    }

    /// Advance to `until_ms` in 1 ms steps, updating the scheduler each step.
    fn run_until(&mut self, until_ms: u32) {
        while self.hub.now < until_ms {
            self.hub.now += 1;
            let now = self.hub.now;
            self.sched.update(now, &mut self.hub);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────

#[test]
fn connect_sends_info_then_initial_switch_states() {
    let mut rig = Rig::new();
    rig.switches[1].set(true);
    rig.run_until(1_000);
    assert!(rig.hub.link.info.is_empty());
    assert!(rig.hub.link.events.is_empty(), "nothing sent while disconnected");

    rig.hub.link.connected = true;
    rig.run_until(1_100);

    assert_eq!(rig.hub.link.info, [firmware_info().as_bytes().to_vec()]);
    let events = rig.hub.link.named_events();
    assert_eq!(events.len(), 3, "{events:?}");
    assert!(events[0].starts_with("Input1 OFF:"));
    assert!(events[1].starts_with("Input2 ON:"));
    assert!(events[2].starts_with("Input3 OFF:"));
}

#[test]
fn switch_changes_are_debounced_while_connected() {
    let mut rig = Rig::new();
    rig.hub.link.connected = true;
    rig.run_until(1_000);
    rig.hub.link.events.clear();

    rig.switches[0].set(true);
    rig.run_until(1_020);
    // Bounce back inside the 100 ms window: ignored.
    rig.switches[0].set(false);
    rig.run_until(1_060);
    rig.switches[0].set(true);
    rig.run_until(1_500);

    let events = rig.hub.link.named_events();
    assert_eq!(events.len(), 1, "{events:?}");
    assert!(events[0].starts_with("Input1 ON:"));
    assert!(rig.hub.scanner.switches()[0].is_on());
}

#[test]
fn keypad_reports_even_while_disconnected() {
    let mut rig = Rig::new();
    rig.run_until(1_000);

    rig.keypad.press(0, 0);
    rig.run_until(1_050);
    rig.keypad.release();
    rig.run_until(1_100);

    // Second press inside the 500 ms window is ignored.
    rig.keypad.press(0, 0);
    rig.run_until(1_150);
    rig.keypad.release();
    rig.run_until(1_700);

    rig.keypad.press(1, 1);
    rig.run_until(1_750);

    let events = rig.hub.link.named_events();
    assert_eq!(events.len(), 2, "{events:?}");
    assert!(events[0].starts_with("Inicio:"));
    assert!(events[1].starts_with("6 Segundos:"));
}

#[test]
fn gate_times_wait_for_a_connected_central() {
    let mut rig = Rig::new();
    rig.run_until(1_000);

    assert!(rig.gates.on_edge(0, 1_001));
    assert!(rig.gates.on_edge(1, 1_002));
    assert!(!rig.gates.on_edge(1, 1_003), "bounce rejected");
    rig.run_until(1_200);
    assert!(rig.gates.is_pending(), "kept until a central connects");
    assert!(rig.hub.link.gate_batches().is_empty());

    rig.hub.link.connected = true;
    rig.run_until(1_300);

    assert_eq!(rig.hub.link.gate_batches(), [[1_001, 1_002, 0, 0]]);
    assert!(!rig.gates.is_pending());
}

#[test]
fn bridge_payload_reaches_the_air_once() {
    let mut rig = Rig::new();
    rig.run_until(100);

    assert!(accept_bridge_write(&rig.hub.bridge, b"first", 101));
    assert!(accept_bridge_write(&rig.hub.bridge, b"second", 102));
    rig.run_until(1_000);

    assert_eq!(rig.hub.radio.stream().air, b"second", "last write wins");
    assert!(!rig.hub.bridge.is_ready());
}

#[test]
fn task_table_reflects_runs() {
    let mut rig = Rig::new();
    rig.run_until(1_000);

    let radio = rig.sched.task("Radio").unwrap();
    assert_eq!(radio.execution_count, 5);
    assert_eq!(radio.last_execution_ms, 1_000);

    rig.sched.disable_task("Inputs").unwrap();
    let before = rig.sched.task("Inputs").unwrap().execution_count;
    rig.run_until(2_000);
    assert_eq!(rig.sched.task("Inputs").unwrap().execution_count, before);
    assert_eq!(rig.sched.task_count(), 3);
}

#[test]
fn console_lines_feed_bridge_and_commands() {
    let mut rig = Rig::new();
    rig.run_until(100);

    let mut lines = LineBuffer::new();
    let mut outcomes = Vec::new();
    for &byte in b"BRIDGE salida\r\nFW Version\nRESET\n" {
        if let Some(line) = lines.push(byte) {
            outcomes.push(route_line(&line, &rig.hub.bridge, &mut rig.hub.link, rig.hub.now));
        }
    }
    assert_eq!(
        outcomes,
        [CommandOutcome::Done, CommandOutcome::Done, CommandOutcome::RestartRequested]
    );
    assert_eq!(rig.hub.link.info, [firmware_info().as_bytes().to_vec()]);

    rig.run_until(400);
    assert_eq!(rig.hub.radio.stream().air, b"salida");
}
