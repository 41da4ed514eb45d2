//! Headless demo: run a survival session for a few seconds and report the
//! measured tick rate and score.

use std::thread;
use std::time::Duration;

use shamble::SurvivalSession;
use shamble::consts::TIMER_INTERVAL_MS;
use shamble::input::KeyCode;
use shamble::sim::TickScheduler;

const DEMO_SECONDS: u64 = 5;

fn main() {
    env_logger::init();

    let mut session = match SurvivalSession::new(0xC0FFEE) {
        Ok(session) => session,
        Err(e) => {
            log::error!("failed to build session: {e}");
            std::process::exit(1);
        }
    };

    // Hold the trigger for the whole run; the fire interval throttles it
    session.press(KeyCode::SPACE);

    let mut scheduler = TickScheduler::new();
    scheduler.start();
    while scheduler.seconds_elapsed() < DEMO_SECONDS {
        scheduler.tick(&mut session);
        thread::sleep(Duration::from_millis(TIMER_INTERVAL_MS));
    }
    scheduler.stop();

    println!(
        "{}s at {} ticks/s: {} zombies on the map, score {}",
        scheduler.seconds_elapsed(),
        scheduler.tick_rate(),
        session.zombie_count(),
        session.score()
    );
}
