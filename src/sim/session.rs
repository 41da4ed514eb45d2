//! Fixed-interval tick scheduling
//!
//! A session implements [`Session`] and is driven by a [`TickScheduler`]. The
//! scheduler fires the game loop on every timer interval, measures how many
//! ticks actually landed in the last wall-clock second, and publishes that
//! count as the tick rate the movement code normalizes against.

use std::time::Instant;

use crate::consts::DEFAULT_TICK_RATE;

/// Per-tick timing snapshot handed to every session callback.
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    /// Ticks counted during the last completed second. Starts at the nominal
    /// rate until the first second has been measured.
    pub tick_rate: u32,
    /// Whole seconds the scheduler has been running.
    pub seconds_elapsed: u64,
}

/// The per-tick and per-interval hooks of a running game session.
pub trait Session {
    /// Called once per scheduler tick.
    fn game_loop(&mut self, ctx: TickContext);

    /// Called once each time a full second of wall-clock time has elapsed.
    fn on_second_elapsed(&mut self, _ctx: TickContext) {}

    /// Called once each time half a second of wall-clock time has elapsed.
    fn on_split_second_elapsed(&mut self, _ctx: TickContext) {}
}

/// Drives a [`Session`] at a fixed timer interval and measures the achieved
/// tick rate.
///
/// The scheduler does not own a thread or timer. The host calls
/// [`tick`](Self::tick) from its timer callback; tests call
/// [`advance`](Self::advance) directly with synthetic elapsed times.
#[derive(Debug)]
pub struct TickScheduler {
    running: bool,
    ticks: u32,
    tick_rate: u32,
    seconds_elapsed: u64,
    millis_into_second: u64,
    millis_into_half: u64,
    last_instant: Option<Instant>,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickScheduler {
    pub fn new() -> Self {
        Self {
            running: false,
            ticks: 0,
            tick_rate: DEFAULT_TICK_RATE,
            seconds_elapsed: 0,
            millis_into_second: 0,
            millis_into_half: 0,
            last_instant: None,
        }
    }

    /// Begin counting. Idempotent.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_instant = None;
        log::debug!("scheduler started");
    }

    /// Stop counting. Idempotent; ticks while stopped are ignored.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        log::debug!("scheduler stopped after {}s", self.seconds_elapsed);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Last measured ticks-per-second, or the nominal rate before the first
    /// full second.
    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn seconds_elapsed(&self) -> u64 {
        self.seconds_elapsed
    }

    fn context(&self) -> TickContext {
        TickContext {
            tick_rate: self.tick_rate,
            seconds_elapsed: self.seconds_elapsed,
        }
    }

    /// Timer entry point: measures real elapsed time since the previous call
    /// and advances by it.
    pub fn tick(&mut self, session: &mut impl Session) {
        let now = Instant::now();
        let elapsed_ms = match self.last_instant {
            Some(prev) => now.duration_since(prev).as_millis() as u64,
            None => 0,
        };
        self.last_instant = Some(now);
        self.advance(session, elapsed_ms);
    }

    /// Advance by a known elapsed time.
    ///
    /// Runs the game loop, then the second boundary (publish the tick count
    /// as the new rate, reset the counter, fire the callback), then the
    /// half-second boundary, then counts this tick. The half-second tracker
    /// is its own sub-timer, so it fires twice per second. Both accumulators
    /// reset to zero at their boundary rather than carrying a remainder.
    pub fn advance(&mut self, session: &mut impl Session, elapsed_ms: u64) {
        if !self.running {
            return;
        }

        session.game_loop(self.context());

        self.millis_into_second += elapsed_ms;
        self.millis_into_half += elapsed_ms;
        if self.millis_into_second >= 1000 {
            self.tick_rate = self.ticks;
            self.ticks = 0;
            self.millis_into_second = 0;
            self.seconds_elapsed += 1;
            log::trace!(
                "second {} elapsed, tick rate {}",
                self.seconds_elapsed,
                self.tick_rate
            );
            session.on_second_elapsed(self.context());
        }
        if self.millis_into_half >= 500 {
            self.millis_into_half = 0;
            session.on_split_second_elapsed(self.context());
        }

        self.ticks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSession {
        loops: u32,
        seconds: u32,
        splits: u32,
        last_rate: u32,
    }

    impl Session for CountingSession {
        fn game_loop(&mut self, ctx: TickContext) {
            self.loops += 1;
            self.last_rate = ctx.tick_rate;
        }

        fn on_second_elapsed(&mut self, ctx: TickContext) {
            self.seconds += 1;
            self.last_rate = ctx.tick_rate;
        }

        fn on_split_second_elapsed(&mut self, _ctx: TickContext) {
            self.splits += 1;
        }
    }

    fn run_millis(scheduler: &mut TickScheduler, session: &mut CountingSession, total_ms: u64) {
        for _ in 0..total_ms / 10 {
            scheduler.advance(session, 10);
        }
    }

    #[test]
    fn test_nominal_rate_before_first_second() {
        let scheduler = TickScheduler::new();
        assert_eq!(scheduler.tick_rate(), DEFAULT_TICK_RATE);
        assert_eq!(scheduler.seconds_elapsed(), 0);
    }

    #[test]
    fn test_ignores_ticks_while_stopped() {
        let mut scheduler = TickScheduler::new();
        let mut session = CountingSession::default();
        scheduler.advance(&mut session, 10);
        assert_eq!(session.loops, 0);

        scheduler.start();
        scheduler.start();
        scheduler.advance(&mut session, 10);
        assert_eq!(session.loops, 1);

        scheduler.stop();
        scheduler.advance(&mut session, 10);
        assert_eq!(session.loops, 1);
    }

    #[test]
    fn test_measures_tick_rate_over_one_second() {
        let mut scheduler = TickScheduler::new();
        let mut session = CountingSession::default();
        scheduler.start();

        run_millis(&mut scheduler, &mut session, 1000);

        // The boundary tick itself publishes before being counted, so 100
        // timer firings measure as 99.
        assert_eq!(scheduler.tick_rate(), 99);
        assert_eq!(scheduler.seconds_elapsed(), 1);
        assert_eq!(session.seconds, 1);
        assert_eq!(session.last_rate, 99);
    }

    #[test]
    fn test_split_second_fires_twice_per_second() {
        let mut scheduler = TickScheduler::new();
        let mut session = CountingSession::default();
        scheduler.start();

        run_millis(&mut scheduler, &mut session, 2000);
        assert_eq!(session.seconds, 2);
        assert_eq!(session.splits, 4);
        assert_eq!(session.loops, 200);
    }

    #[test]
    fn test_slow_ticks_measure_lower_rate() {
        let mut scheduler = TickScheduler::new();
        let mut session = CountingSession::default();
        scheduler.start();

        // 40ms per tick: 25 firings to the boundary
        for _ in 0..25 {
            scheduler.advance(&mut session, 40);
        }
        assert_eq!(scheduler.seconds_elapsed(), 1);
        assert_eq!(scheduler.tick_rate(), 24);
    }
}
