//! Porterbot host binary — scripted simulation run.
//!
//! Wires the workflow core to the simulation adapters and drives one
//! full two-stop delivery: pre-departure check, arrival signalling, a
//! wrong passcode, a deferred pickup, a sticky door on close, and the
//! end-of-trip summary. The buzzer bank is real — workers will try the
//! configured devices and log the usual fail-fast warnings when none
//! are reachable.
//!
//! ```text
//! RUST_LOG=info cargo run
//! ```

use anyhow::{Result, anyhow};
use log::{info, warn};

use porterbot::adapters::log_sink::LogEventSink;
use porterbot::adapters::memstore::MemStore;
use porterbot::adapters::sim::{SimDoorUnit, SimNavigation};
use porterbot::app::commands::AppCommand;
use porterbot::app::ports::{ConfigPort, NavigationPort};
use porterbot::app::service::DeliveryService;
use porterbot::config::SystemConfig;
use porterbot::device::modbus::TcpRegisterLink;
use porterbot::device::worker::{BuzzerBank, BuzzerWorker};
use porterbot::device::SignalTiming;
use porterbot::mission::Stage;
use porterbot::mission::plan::{DoorSlot, StopRequest};

/// Ticks the simulated site takes per navigation leg.
const TRAVEL_TICKS: u32 = 6;

/// Hard stop for the demo loop.
const MAX_TICKS: u32 = 10_000;

fn build_bank(config: &SystemConfig) -> BuzzerBank {
    let mut bank = BuzzerBank::new();
    for route in &config.buzzer_routes {
        let link = TcpRegisterLink::new(
            &route.host,
            config.buzzer_port,
            config.buzzer_unit_id,
            config.connect_timeout_ms,
        );
        let worker = BuzzerWorker::new(
            &route.host,
            link,
            SignalTiming {
                arm_settle_ms: config.arm_settle_ms,
            },
        );
        bank.add_route(&route.label_match, worker);
    }
    bank
}

/// Per-stop script state for the demo operator.
#[derive(Default)]
struct Script {
    auth_done: [bool; 2],
    deferred: bool,
    confirmed: [bool; 2],
}

impl Script {
    /// Play the operator's next move for the current stage.
    fn react(
        &mut self,
        service: &mut DeliveryService,
        door: &mut SimDoorUnit,
        store: &mut MemStore,
        sink: &mut LogEventSink,
    ) {
        match service.stage() {
            Stage::ArrivedAwaitingAuth(i) if !self.auth_done[i.min(1)] => {
                self.auth_done[i.min(1)] = true;
                service.handle_command(
                    AppCommand::SubmitPasscode("000000".to_string()),
                    door,
                    store,
                    sink,
                );
                service.handle_command(
                    AppCommand::SubmitPasscode("123456".to_string()),
                    door,
                    store,
                    sink,
                );
            }
            Stage::AwaitingPickupDecision(0) if !self.deferred => {
                self.deferred = true;
                service.handle_command(AppCommand::DeferToBase, door, store, sink);
            }
            Stage::AwaitingPickupDecision(i) if !self.confirmed[i.min(1)] => {
                self.confirmed[i.min(1)] = true;
                if i == 0 {
                    // Make the first close stick once so the verify
                    // retry loop shows up in the log.
                    door.stick_closes(1);
                }
                service.handle_command(AppCommand::ConfirmPickup, door, store, sink);
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut store = MemStore::new();
    let config = store.load().map_err(|e| anyhow!("config load: {e}"))?;
    let site_id = config.site_id;

    let mut bank = build_bank(&config);
    bank.start_all();

    let mut nav = SimNavigation::new(TRAVEL_TICKS);
    let mut door = SimDoorUnit::new();
    let mut sink = LogEventSink::new();
    let mut service = DeliveryService::new(config);

    info!("starting scripted two-stop delivery");
    service.handle_command(
        AppCommand::StartPlan(vec![
            StopRequest {
                destination: "ward-2 dock-a".to_string(),
                slot: DoorSlot::Upper,
            },
            StopRequest {
                destination: "ward-5 dock-b".to_string(),
                slot: DoorSlot::Lower,
            },
        ]),
        &mut door,
        &mut store,
        &mut sink,
    );

    let mut script = Script::default();
    let mut finished = false;
    for _ in 0..MAX_TICKS {
        nav.advance();
        service.tick(&mut nav, &mut door, &mut bank, &mut sink);
        script.react(&mut service, &mut door, &mut store, &mut sink);

        if service.stage() == Stage::Idle {
            finished = true;
            break;
        }
    }

    if finished {
        info!("simulation finished, robot idle at base");
        nav.go_to_charge(site_id);
    } else {
        warn!("simulation hit the tick limit before completing");
        nav.stop_navigation(site_id, true);
    }

    bank.shutdown();
    Ok(())
}
