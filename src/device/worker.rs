//! Per-device worker — exclusive, ordered buzzer I/O.
//!
//! One worker owns one [`RegisterLink`] and drains a bounded task
//! queue on a dedicated thread. All register traffic for one device
//! flows through that single consumer in submission order, which is
//! the whole concurrency story: two signal sequences can never
//! interleave their writes.
//!
//! ```text
//!  control loop ──try_send──▶ ┌───────────────┐
//!  (SignalPort)               │  task channel  │──receive──▶ drain
//!                             └───────────────┘             thread
//!                                                    arm → settle →
//!                                                    force → hold →
//!                                                    release
//! ```
//!
//! Failure discipline follows the link: a failed connect or write ends
//! the task (logged, connection discarded) — no in-task retry. The
//! notifier supplies the next attempt on its own schedule.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future;
use log::{debug, info, warn};

use super::{REG_ARMED, REG_FORCED, RegisterLink, SignalTiming};
use crate::app::ports::SignalPort;
use crate::error::DeviceError;

/// Task queue depth per worker. Signals are 30 s apart; a full queue
/// means the device has been unreachable for minutes and dropping is
/// correct.
const QUEUE_DEPTH: usize = 8;

type TaskQueue = Channel<CriticalSectionRawMutex, DeviceTask, QUEUE_DEPTH>;

/// One unit of work on the device thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceTask {
    /// Connectivity probe submitted by `start()`.
    Probe,
    /// Full signal sequence: arm, settle, assert, hold, release.
    Signal { hold_ms: u64 },
    /// Force the trigger register low (used on stop).
    Deassert,
    /// Close the connection.
    Disconnect,
    /// Terminate the drain thread after the queue ahead has drained.
    Shutdown,
}

/// Handle to one device worker.
pub struct BuzzerWorker {
    label: String,
    queue: Arc<TaskQueue>,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl BuzzerWorker {
    /// Create the worker and its drain thread. The thread parks on the
    /// empty queue; nothing touches the device until `start()`.
    pub fn new(
        label: &str,
        mut link: impl RegisterLink + Send + 'static,
        timing: SignalTiming,
    ) -> Self {
        let queue: Arc<TaskQueue> = Arc::new(Channel::new());
        let consumer = Arc::clone(&queue);
        let thread_label = label.to_string();

        let handle = thread::Builder::new()
            .name(format!("buzzer-{label}"))
            .spawn(move || drain_loop(&thread_label, &mut link, &consumer, timing));

        let handle = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                warn!("worker[{label}]: failed to spawn drain thread: {e}");
                None
            }
        };

        Self {
            label: label.to_string(),
            queue,
            running: Arc::new(AtomicBool::new(false)),
            handle,
        }
    }

    /// Flag the worker running and probe connectivity. Idempotent.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("worker[{}]: started", self.label);
        let _ = self.submit(DeviceTask::Probe);
    }

    /// Queue one signal sequence.
    pub fn signal_once(&self, hold_ms: u64) -> Result<(), DeviceError> {
        self.enqueue(DeviceTask::Signal { hold_ms })
    }

    /// Queue an arbitrary task. Refused once the worker is stopped;
    /// tasks already queued still drain.
    pub fn enqueue(&self, task: DeviceTask) -> Result<(), DeviceError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(DeviceError::NotRunning);
        }
        self.submit(task)
    }

    /// Stop the worker: release the trigger, drop the connection, end
    /// the drain thread, refuse all later submissions. Idempotent.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("worker[{}]: stopping", self.label);
        // Bypass the running check — these must land even though new
        // outside submissions are already refused.
        let _ = self.submit(DeviceTask::Deassert);
        let _ = self.submit(DeviceTask::Disconnect);
        let _ = self.submit(DeviceTask::Shutdown);
    }

    /// Wait for the drain thread to finish (call after `stop()`).
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn submit(&self, task: DeviceTask) -> Result<(), DeviceError> {
        self.queue.try_send(task).map_err(|_| {
            warn!("worker[{}]: task queue full, dropping {task:?}", self.label);
            DeviceError::QueueFull
        })
    }
}

fn drain_loop(label: &str, link: &mut impl RegisterLink, queue: &TaskQueue, timing: SignalTiming) {
    loop {
        let task = future::block_on(queue.receive());
        if task == DeviceTask::Shutdown {
            debug!("worker[{label}]: drain thread exiting");
            break;
        }
        run_task(link, task, timing);
    }
}

/// Execute one task against the link. Pure apart from the link and the
/// in-sequence delays, so tests drive it directly with zeroed timing.
pub(crate) fn run_task(link: &mut impl RegisterLink, task: DeviceTask, timing: SignalTiming) {
    match task {
        DeviceTask::Probe => match link.ensure_connected() {
            Ok(()) => info!("worker[{}]: probe ok", link.label()),
            Err(e) => warn!("worker[{}]: probe failed: {e}", link.label()),
        },
        DeviceTask::Signal { hold_ms } => run_signal(link, hold_ms, timing),
        DeviceTask::Deassert => {
            if let Err(e) = link.write_register(REG_FORCED, 0) {
                warn!("worker[{}]: deassert failed: {e}", link.label());
            }
        }
        DeviceTask::Disconnect => link.disconnect(),
        DeviceTask::Shutdown => {}
    }
}

/// Arm → settle → assert → hold → release. Each write requires a live
/// connection (the link reconnects inline); a failed write ends the
/// sequence — the trigger is only ever released by the final write or
/// by the `Deassert` queued at stop.
fn run_signal(link: &mut impl RegisterLink, hold_ms: u64, timing: SignalTiming) {
    if let Err(e) = link.write_register(REG_ARMED, 1) {
        warn!("worker[{}]: arm write failed: {e}", link.label());
        return;
    }
    sleep_ms(timing.arm_settle_ms);

    if let Err(e) = link.write_register(REG_FORCED, 1) {
        warn!("worker[{}]: trigger write failed: {e}", link.label());
        return;
    }
    sleep_ms(hold_ms);

    if let Err(e) = link.write_register(REG_FORCED, 0) {
        warn!("worker[{}]: release write failed: {e}", link.label());
    }
}

fn sleep_ms(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}

// ───────────────────────────────────────────────────────────────
// Buzzer bank — destination routing over a set of workers
// ───────────────────────────────────────────────────────────────

/// Routes destination labels to workers, one per configured buzzer.
/// A destination whose name contains a route's label fragment signals
/// that route's device; everything else is a logged no-op.
pub struct BuzzerBank {
    routes: Vec<(String, BuzzerWorker)>,
}

impl BuzzerBank {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn add_route(&mut self, label_match: &str, worker: BuzzerWorker) {
        self.routes.push((label_match.to_string(), worker));
    }

    pub fn start_all(&self) {
        for (_, worker) in &self.routes {
            worker.start();
        }
    }

    pub fn stop_all(&self) {
        for (_, worker) in &self.routes {
            worker.stop();
        }
    }

    /// Stop every worker and wait for their drain threads to exit.
    pub fn shutdown(self) {
        self.stop_all();
        for (_, worker) in self.routes {
            worker.join();
        }
    }

    fn worker_for(&self, destination: &str) -> Option<&BuzzerWorker> {
        self.routes
            .iter()
            .find(|(fragment, _)| destination.contains(fragment.as_str()))
            .map(|(_, worker)| worker)
    }
}

impl SignalPort for BuzzerBank {
    fn signal_once(&mut self, destination: &str, hold_ms: u64) {
        match self.worker_for(destination) {
            Some(worker) => {
                if let Err(e) = worker.signal_once(hold_ms) {
                    warn!("bank: signal for '{destination}' not queued: {e}");
                }
            }
            None => debug!("bank: no buzzer route for '{destination}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted link: records every write, fails the ones listed.
    #[derive(Clone)]
    struct ScriptedLink {
        writes: Arc<Mutex<Vec<(u16, u16)>>>,
        fail_writes: Arc<Mutex<Vec<(u16, u16)>>>,
        connect_ok: bool,
    }

    impl ScriptedLink {
        fn new() -> Self {
            Self {
                writes: Arc::new(Mutex::new(Vec::new())),
                fail_writes: Arc::new(Mutex::new(Vec::new())),
                connect_ok: true,
            }
        }

        fn failing_on(self, address: u16, value: u16) -> Self {
            self.fail_writes.lock().unwrap().push((address, value));
            self
        }

        fn recorded(&self) -> Vec<(u16, u16)> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl RegisterLink for ScriptedLink {
        fn label(&self) -> &str {
            "scripted"
        }
        fn ensure_connected(&mut self) -> Result<(), DeviceError> {
            if self.connect_ok {
                Ok(())
            } else {
                Err(DeviceError::ConnectFailed)
            }
        }
        fn write_register(&mut self, address: u16, value: u16) -> Result<(), DeviceError> {
            self.writes.lock().unwrap().push((address, value));
            if self.fail_writes.lock().unwrap().contains(&(address, value)) {
                return Err(DeviceError::WriteFailed);
            }
            Ok(())
        }
        fn disconnect(&mut self) {}
    }

    const NO_DELAY: SignalTiming = SignalTiming { arm_settle_ms: 0 };

    #[test]
    fn signal_sequence_order() {
        let mut link = ScriptedLink::new();
        run_task(&mut link, DeviceTask::Signal { hold_ms: 0 }, NO_DELAY);
        assert_eq!(
            link.recorded(),
            vec![(REG_ARMED, 1), (REG_FORCED, 1), (REG_FORCED, 0)]
        );
    }

    #[test]
    fn failed_arm_write_aborts_sequence() {
        let mut link = ScriptedLink::new().failing_on(REG_ARMED, 1);
        run_task(&mut link, DeviceTask::Signal { hold_ms: 0 }, NO_DELAY);
        assert_eq!(link.recorded(), vec![(REG_ARMED, 1)]);
    }

    #[test]
    fn failed_trigger_write_skips_release() {
        let mut link = ScriptedLink::new().failing_on(REG_FORCED, 1);
        run_task(&mut link, DeviceTask::Signal { hold_ms: 0 }, NO_DELAY);
        // The trigger never asserted, so no release is attempted here;
        // stop() covers the device with an unconditional deassert.
        assert_eq!(link.recorded(), vec![(REG_ARMED, 1), (REG_FORCED, 1)]);
    }

    #[test]
    fn stop_always_attempts_deassert() {
        // Simulate the aborted-sequence case end to end: the trigger
        // write fails, then stop() must still push a deassert through
        // the queue before the thread exits.
        let link = ScriptedLink::new().failing_on(REG_FORCED, 1);
        let probe = link.clone();

        let worker = BuzzerWorker::new("test", link, NO_DELAY);
        worker.start();
        worker.signal_once(0).unwrap();
        worker.stop();
        worker.join();

        let writes = probe.recorded();
        assert_eq!(
            writes.last(),
            Some(&(REG_FORCED, 0)),
            "trigger must end deasserted after stop()"
        );
    }

    #[test]
    fn start_is_idempotent() {
        let link = ScriptedLink::new();
        let probe = link.clone();
        let worker = BuzzerWorker::new("test", link, NO_DELAY);
        worker.start();
        worker.start();
        worker.start();
        worker.stop();
        worker.join();
        // Exactly one probe ran; writes only from the stop deassert.
        assert_eq!(probe.recorded(), vec![(REG_FORCED, 0)]);
    }

    #[test]
    fn submissions_refused_after_stop() {
        let worker = BuzzerWorker::new("test", ScriptedLink::new(), NO_DELAY);
        worker.start();
        worker.stop();
        assert_eq!(worker.signal_once(0), Err(DeviceError::NotRunning));
        assert_eq!(
            worker.enqueue(DeviceTask::Probe),
            Err(DeviceError::NotRunning)
        );
        worker.join();
    }

    #[test]
    fn tasks_execute_in_submission_order() {
        let link = ScriptedLink::new();
        let probe = link.clone();
        let worker = BuzzerWorker::new("test", link, NO_DELAY);
        worker.start();
        worker.signal_once(0).unwrap();
        worker.signal_once(0).unwrap();
        worker.stop();
        worker.join();

        let seq = vec![
            (REG_ARMED, 1),
            (REG_FORCED, 1),
            (REG_FORCED, 0),
            (REG_ARMED, 1),
            (REG_FORCED, 1),
            (REG_FORCED, 0),
            (REG_FORCED, 0), // stop deassert
        ];
        assert_eq!(probe.recorded(), seq);
    }

    #[test]
    fn bank_routes_by_label_fragment() {
        let link_a = ScriptedLink::new();
        let probe_a = link_a.clone();
        let link_b = ScriptedLink::new();
        let probe_b = link_b.clone();

        let mut bank = BuzzerBank::new();
        bank.add_route("dock-a", BuzzerWorker::new("a", link_a, NO_DELAY));
        bank.add_route("dock-b", BuzzerWorker::new("b", link_b, NO_DELAY));
        bank.start_all();

        bank.signal_once("ward-3 dock-b", 0);
        bank.signal_once("nowhere", 0);
        bank.stop_all();
        for (_, worker) in bank.routes.drain(..) {
            worker.join();
        }

        assert!(
            probe_a.recorded().starts_with(&[(REG_FORCED, 0)]),
            "dock-a device only sees its stop deassert"
        );
        assert!(probe_b.recorded().starts_with(&[(REG_ARMED, 1)]));
    }
}
