//! Watch command: a live elapsed-time counter for the running session.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use punch_core::clock::Clock;
use punch_core::store::SegmentStore;
use punch_core::ticker::Ticker;
use punch_core::tracker::Tracker;
use tokio::time::{self, MissedTickBehavior};

/// How often the counter is redrawn.
const TICK: Duration = Duration::from_secs(1);

/// How often the store is re-read to notice actions taken elsewhere.
const REFRESH: Duration = Duration::from_secs(15);

/// Runs the counter until Ctrl-C or until the session stops running.
pub fn run<W: Write, S: SegmentStore, C: Clock + 'static>(
    writer: &mut W,
    tracker: &mut Tracker<S, Arc<C>>,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(watch(writer, tracker, TICK, REFRESH, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(%err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }))
}

/// Redraws the elapsed time on every tick until `shutdown` completes or the
/// session leaves running.
pub async fn watch<W, S, C, F>(
    writer: &mut W,
    tracker: &mut Tracker<S, Arc<C>>,
    tick: Duration,
    refresh: Duration,
    shutdown: F,
) -> Result<()>
where
    W: Write,
    S: SegmentStore,
    C: Clock + 'static,
    F: Future<Output = ()>,
{
    let mut ticker = Ticker::new(Arc::clone(tracker.clock()), tick);
    let mut display = ticker.subscribe();
    ticker.sync(tracker.live_clock());
    if !ticker.is_running() {
        let status = tracker.status();
        writeln!(
            writer,
            "Not running ({}). Run 'punch start' or 'punch resume' first.",
            status.label()
        )?;
        return Ok(());
    }
    writeln!(writer, "Watching today's time. Press Ctrl-C to stop.")?;

    let mut refresh = time::interval_at(time::Instant::now() + refresh, refresh);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                writeln!(writer)?;
                break;
            }
            changed = display.changed() => {
                if changed.is_err() {
                    break;
                }
                let elapsed = display.borrow_and_update().clone();
                write!(writer, "\r{elapsed}")?;
                writer.flush()?;
            }
            _ = refresh.tick() => {
                tracker.refresh().context("failed to refresh session")?;
                ticker.sync(tracker.live_clock());
                if !ticker.is_running() {
                    writeln!(writer)?;
                    writeln!(writer, "Session is now {}.", tracker.status())?;
                    break;
                }
            }
        }
    }

    ticker.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use punch_core::clock::{ClockTime, ManualClock};
    use punch_core::store::MemoryStore;

    use super::*;

    fn clock() -> Arc<ManualClock> {
        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        Arc::new(ManualClock::new(now))
    }

    fn time(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_exits_immediately() {
        let mut store = MemoryStore::new();
        let mut tracker = Tracker::load(&mut store, clock()).unwrap();
        let mut output = Vec::new();

        watch(
            &mut output,
            &mut tracker,
            TICK,
            REFRESH,
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Not running (Idle). Run 'punch start' or 'punch resume' first.\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn running_session_redraws_until_shutdown() {
        let mut store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        store
            .create(day, time("08:00"), Some(time("09:00")))
            .unwrap();
        store.create(day, time("09:00"), None).unwrap();
        let mut tracker = Tracker::load(&mut store, clock()).unwrap();
        let mut output = Vec::new();

        watch(
            &mut output,
            &mut tracker,
            TICK,
            REFRESH,
            time::sleep(Duration::from_millis(2500)),
        )
        .await
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Watching today's time. Press Ctrl-C to stop.\n"));
        assert!(output.contains("\r01:30:00"));
        assert!(output.ends_with('\n'));
    }
}
