//! Live elapsed-time display.
//!
//! While the session runs, a background task recomputes today's elapsed time
//! once per period and publishes it as `HH:MM:SS` on a watch channel. The task
//! is aborted as soon as the session leaves running.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::aggregate::live_seconds;
use crate::clock::{Clock, format_elapsed};

/// Inputs for recomputing elapsed time on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveClock {
    /// Seconds from today's closed segments.
    pub closed_seconds: u64,
    /// When the open segment started.
    pub since: NaiveTime,
}

impl LiveClock {
    pub fn elapsed_at(self, now: NaiveTime) -> u64 {
        self.closed_seconds + live_seconds(self.since, now)
    }
}

/// Publishes the running session's elapsed time.
pub struct Ticker<C> {
    clock: Arc<C>,
    period: Duration,
    handle: Option<JoinHandle<()>>,
    current: Option<LiveClock>,
    display: Arc<watch::Sender<String>>,
}

impl<C: Clock + 'static> Ticker<C> {
    /// [`Ticker::sync`] spawns onto the current tokio runtime.
    pub fn new(clock: Arc<C>, period: Duration) -> Self {
        let (display, _) = watch::channel(format_elapsed(0));
        Self {
            clock,
            period,
            handle: None,
            current: None,
            display: Arc::new(display),
        }
    }

    /// Receives the formatted elapsed time on every tick.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.display.subscribe()
    }

    pub const fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Matches the ticker to the session: `Some` starts or restarts ticking
    /// with new inputs, `None` cancels.
    pub fn sync(&mut self, live: Option<LiveClock>) {
        match live {
            Some(live) if self.current == Some(live) && self.is_running() => {}
            Some(live) => self.spawn(live),
            None => self.cancel(),
        }
    }

    fn spawn(&mut self, live: LiveClock) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }

        let clock = Arc::clone(&self.clock);
        let display = Arc::clone(&self.display);
        let period = self.period;
        debug!(since = %live.since, closed_seconds = live.closed_seconds, "ticker started");

        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let elapsed = live.elapsed_at(clock.now().time());
                display.send_replace(format_elapsed(elapsed));
            }
        }));
        self.current = Some(live);
    }

    /// Stops publishing. The last published value stays readable.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("ticker cancelled");
        }
        self.current = None;
    }
}

impl<C> Drop for Ticker<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
