use std::sync::{Arc, Mutex};
use std::time::Duration;

use quiz_core::{Countdown, CountdownState, CountdownStep};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// One second, the countdown resolution.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Per-question countdown driven by a tokio task.
///
/// At most one countdown is armed per timer: [`CountdownTimer::start`] stops
/// the previous one first. Dropping the timer cancels it.
pub struct CountdownTimer {
    period: Duration,
    countdown: Option<Arc<Mutex<Countdown>>>,
    task: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    /// Use a custom tick period; one period still counts as one second.
    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            countdown: None,
            task: None,
        }
    }

    /// Arm a countdown of `limit_secs` seconds.
    ///
    /// `on_tick` receives the remaining seconds after every tick, down to and
    /// including 0. `on_expire` runs once, right after the tick that reaches
    /// 0, and never after [`CountdownTimer::stop`] has taken effect. A zero
    /// limit never ticks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<T, E>(&mut self, limit_secs: u32, mut on_tick: T, on_expire: E)
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        self.stop();

        let countdown = Arc::new(Mutex::new(Countdown::armed(limit_secs)));
        let shared = Arc::clone(&countdown);
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let step = match shared.lock() {
                    Ok(mut countdown) => countdown.tick(),
                    Err(_) => None,
                };
                match step {
                    Some(CountdownStep::Tick { remaining }) => on_tick(remaining),
                    Some(CountdownStep::Expired) => {
                        on_tick(0);
                        on_expire();
                        return;
                    }
                    None => return,
                }
            }
        });

        tracing::debug!(limit_secs, "countdown armed");
        self.countdown = Some(countdown);
        self.task = Some(task);
    }

    /// Cancel future ticks. Calling it on a stopped timer does nothing.
    pub fn stop(&mut self) {
        if let Some(countdown) = self.countdown.as_ref() {
            if let Ok(mut countdown) = countdown.lock() {
                countdown.stop();
            }
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Seconds left on the armed countdown, if one was ever armed.
    #[must_use]
    pub fn remaining(&self) -> Option<u32> {
        self.countdown
            .as_ref()
            .and_then(|c| c.lock().ok().map(|c| c.remaining()))
    }

    /// State and remaining seconds, read together under one lock.
    #[must_use]
    pub fn status(&self) -> Option<(CountdownState, u32)> {
        self.countdown
            .as_ref()
            .and_then(|c| c.lock().ok().map(|c| (c.state(), c.remaining())))
    }

    /// The last tick has fired; `on_expire` has run or is about to.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self.status(), Some((CountdownState::Expired, _)))
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.countdown
            .as_ref()
            .and_then(|c| c.lock().ok().map(|c| c.is_running()))
            .unwrap_or(false)
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownTimer")
            .field("period", &self.period)
            .field("remaining", &self.remaining())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[derive(Debug, PartialEq, Eq)]
    enum Seen {
        Tick(u32),
        Expired,
    }

    fn arm(timer: &mut CountdownTimer, limit: u32) -> mpsc::UnboundedReceiver<Seen> {
        let (tx, rx) = mpsc::unbounded_channel();
        let tick_tx = tx.clone();
        timer.start(
            limit,
            move |remaining| {
                let _ = tick_tx.send(Seen::Tick(remaining));
            },
            move || {
                let _ = tx.send(Seen::Expired);
            },
        );
        rx
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Seen>) -> Vec<Seen> {
        let mut out = Vec::new();
        while let Ok(seen) = rx.try_recv() {
            out.push(seen);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_down_to_zero_and_expires_once() {
        let mut timer = CountdownTimer::new();
        let mut rx = arm(&mut timer, 3);

        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            seen.push(event);
        }

        assert_eq!(
            seen,
            vec![Seen::Tick(2), Seen::Tick(1), Seen::Tick(0), Seen::Expired]
        );
        assert_eq!(timer.remaining(), Some(0));
        assert!(!timer.is_running());
        assert!(timer.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_future_ticks_and_expiry() {
        let mut timer = CountdownTimer::new();
        let mut rx = arm(&mut timer, 5);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(timer.remaining(), Some(3));
        timer.stop();
        timer.stop();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(drain(&mut rx), vec![Seen::Tick(4), Seen::Tick(3)]);
        assert_eq!(timer.remaining(), Some(3));
        assert!(!timer.is_running());
        assert!(!timer.is_expired());
        assert_eq!(timer.status(), Some((CountdownState::Stopped, 3)));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_tears_down_the_previous_countdown() {
        let mut timer = CountdownTimer::new();
        let mut first = arm(&mut timer, 2);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let mut second = arm(&mut timer, 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(drain(&mut first), vec![Seen::Tick(1)]);
        assert_eq!(
            drain(&mut second),
            vec![Seen::Tick(1), Seen::Tick(0), Seen::Expired]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn custom_period_counts_one_second_per_period() {
        let mut timer = CountdownTimer::with_period(Duration::from_millis(10));
        let mut rx = arm(&mut timer, 30);

        tokio::time::sleep(Duration::from_millis(305)).await;
        let seen = drain(&mut rx);
        assert_eq!(seen.len(), 31);
        assert_eq!(seen.last(), Some(&Seen::Expired));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_cancels_it() {
        let mut timer = CountdownTimer::new();
        let mut rx = arm(&mut timer, 3);
        drop(timer);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn unarmed_timer_reports_nothing() {
        let mut timer = CountdownTimer::new();
        assert_eq!(timer.remaining(), None);
        assert!(!timer.is_running());
        timer.stop();
    }
}
