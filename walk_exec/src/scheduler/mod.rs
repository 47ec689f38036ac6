//! # Tick scheduler
//!
//! Runs a set of updaters once per period on a dedicated thread. Updaters are
//! registered and removed through a command queue which is drained at the
//! start of every tick, and are run in the order they were registered.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    mem,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex, PoisonError, RwLock,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, info, trace, warn};
use serde::Serialize;

pub use params::*;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Something run once per tick by the scheduler.
pub trait Updater: Send {
    fn update(&mut self, tick: u64);

    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Identifier of a registered updater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpdaterId(u64);

/// Timing statistics of the tick thread.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TickStats {
    pub num_ticks: u64,

    /// Units: seconds
    pub last_duration_s: f64,

    /// Units: seconds
    pub mean_duration_s: f64,

    /// Units: seconds
    pub max_duration_s: f64,

    pub num_overruns: u64,
    pub num_consec_overruns: u64,
}

/// Owner of the tick thread.
pub struct TickScheduler {
    params: SchedulerParams,
    shared: Arc<Shared>,

    fault_sender: Sender<SchedulerFault>,
    fault_receiver: Receiver<SchedulerFault>,

    thread_jh: Mutex<Option<JoinHandle<()>>>,
}

/// Cloneable handle used to register updaters with a scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Arc<Shared>,
}

struct Shared {
    commands: Mutex<Vec<Command>>,
    running: AtomicBool,
    next_id: AtomicU64,
    tick_count: AtomicU64,
    stats: RwLock<TickStats>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

enum Command {
    Register(UpdaterId, Box<dyn Updater>),
    Remove(UpdaterId),
}

/// Faults reported by the tick thread. The faulty tick is not retried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SchedulerFault {
    DeadlineExceeded {
        tick: u64,
        elapsed_s: f64,
        period_s: f64,
    },
    ConsecutiveOverruns {
        tick: u64,
        count: u64,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("The tick period must be positive and finite, found {0} s")]
    InvalidPeriod(f64),

    #[error("The tick thread is already running")]
    AlreadyRunning,

    #[error("Could not start the tick thread: {0}")]
    ThreadStartFailed(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TickScheduler {
    pub fn new(params: SchedulerParams) -> Result<Self, SchedulerError> {
        if !(params.period_s.is_finite() && params.period_s > 0.0) {
            return Err(SchedulerError::InvalidPeriod(params.period_s));
        }

        let (fault_sender, fault_receiver) = channel();

        Ok(Self {
            params,
            shared: Arc::new(Shared {
                commands: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
                next_id: AtomicU64::new(0),
                tick_count: AtomicU64::new(0),
                stats: RwLock::new(TickStats::default()),
            }),
            fault_sender,
            fault_receiver,
            thread_jh: Mutex::new(None),
        })
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    pub fn register(&self, updater: Box<dyn Updater>) -> UpdaterId {
        self.handle().register(updater)
    }

    pub fn remove(&self, id: UpdaterId) {
        self.handle().remove(id)
    }

    /// Start the tick thread.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut jh = self.thread_jh.lock().unwrap_or_else(PoisonError::into_inner);
        if jh.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.shared.running.store(true, Ordering::SeqCst);

        let shared = self.shared.clone();
        let params = self.params;
        let fault_sender = self.fault_sender.clone();

        let handle = thread::Builder::new()
            .name("tick".into())
            .spawn(move || tick_thread(shared, params, fault_sender))
            .map_err(|e| {
                self.shared.running.store(false, Ordering::SeqCst);
                SchedulerError::ThreadStartFailed(e)
            })?;

        info!(
            "Tick thread started with a {} s period ({})",
            self.params.period_s,
            if self.params.realtime { "realtime" } else { "back to back" }
        );

        *jh = Some(handle);
        Ok(())
    }

    /// Stop the tick thread and wait for it to exit. Registered updaters are
    /// dropped.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);

        let jh = self
            .thread_jh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(jh) = jh {
            if jh.join().is_err() {
                warn!("The tick thread panicked");
            }
            info!("Tick thread stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Take every fault reported since the last call.
    pub fn faults(&self) -> Vec<SchedulerFault> {
        self.fault_receiver.try_iter().collect()
    }

    pub fn stats(&self) -> TickStats {
        self.handle().stats()
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl SchedulerHandle {
    /// Queue an updater to be run from the next tick on.
    pub fn register(&self, updater: Box<dyn Updater>) -> UpdaterId {
        let id = UpdaterId(self.shared.next_id.fetch_add(1, Ordering::SeqCst));
        debug!("Registering updater \"{}\" as {:?}", updater.name(), id);
        self.commands().push(Command::Register(id, updater));
        id
    }

    /// Queue the removal of an updater, which is dropped on the next tick.
    pub fn remove(&self, id: UpdaterId) {
        self.commands().push(Command::Remove(id));
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.shared.tick_count.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> TickStats {
        *self.shared.stats.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn commands(&self) -> std::sync::MutexGuard<Vec<Command>> {
        self.shared
            .commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl TickStats {
    fn record(&mut self, duration_s: f64, overrun: bool) {
        self.num_ticks += 1;
        self.last_duration_s = duration_s;
        self.mean_duration_s += (duration_s - self.mean_duration_s) / self.num_ticks as f64;
        self.max_duration_s = self.max_duration_s.max(duration_s);

        if overrun {
            self.num_overruns += 1;
            self.num_consec_overruns += 1;
        } else {
            self.num_consec_overruns = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn tick_thread(shared: Arc<Shared>, params: SchedulerParams, fault_sender: Sender<SchedulerFault>) {
    let period = Duration::from_secs_f64(params.period_s);
    let mut updaters: Vec<(UpdaterId, Box<dyn Updater>)> = Vec::new();

    while shared.running.load(Ordering::SeqCst) {
        let tick_start = Instant::now();
        let tick = shared.tick_count.load(Ordering::SeqCst);

        // ---- COMMANDS ----

        let commands = mem::take(&mut *shared.commands.lock().unwrap_or_else(PoisonError::into_inner));
        for command in commands {
            match command {
                Command::Register(id, updater) => {
                    debug!("Updater \"{}\" added on tick {}", updater.name(), tick);
                    updaters.push((id, updater));
                }
                Command::Remove(id) => updaters.retain(|(i, u)| {
                    if *i == id {
                        debug!("Updater \"{}\" removed on tick {}", u.name(), tick);
                    }
                    *i != id
                }),
            }
        }

        // ---- UPDATE ----

        for (_, updater) in updaters.iter_mut() {
            updater.update(tick);
        }

        shared.tick_count.fetch_add(1, Ordering::SeqCst);

        // ---- TIMING ----

        let tick_dur = tick_start.elapsed();
        let overrun = tick_dur > period;

        let num_consec_overruns = {
            let mut stats = shared.stats.write().unwrap_or_else(PoisonError::into_inner);
            stats.record(tick_dur.as_secs_f64(), overrun);
            stats.num_consec_overruns
        };

        trace!("Tick {} took {:.06} s", tick, tick_dur.as_secs_f64());

        if overrun {
            warn!(
                "Tick {} overran by {:.06} s",
                tick,
                tick_dur.as_secs_f64() - params.period_s
            );
            fault_sender
                .send(SchedulerFault::DeadlineExceeded {
                    tick,
                    elapsed_s: tick_dur.as_secs_f64(),
                    period_s: params.period_s,
                })
                .ok();

            if params.max_consec_overruns > 0 && num_consec_overruns == params.max_consec_overruns {
                warn!("{} consecutive tick overruns", num_consec_overruns);
                fault_sender
                    .send(SchedulerFault::ConsecutiveOverruns {
                        tick,
                        count: num_consec_overruns,
                    })
                    .ok();
            }
        } else if params.realtime {
            if let Some(d) = period.checked_sub(tick_dur) {
                thread::sleep(d);
            }
        } else {
            thread::yield_now();
        }
    }

    debug!("Dropping {} updaters", updaters.len());
}
