//! Cooperative shutdown owned by the scheduler.

mod common;

use std::time::Duration;

use common::{broadcasts, drain, simulation_with, starter_simulation, test_config};
use mudcore::sim::{start_simulation, TickOutcome};
use mudcore::world::seed::starter_world;

fn announce(seconds: u64) -> String {
    format!("*** The world will shut down in {} seconds. ***\n", seconds)
}

#[test]
fn twenty_second_countdown_announces_on_the_fives() {
    let (mut sim, mut rx) = starter_simulation();
    assert_eq!(sim.timebase().turns_per_second(), 10);
    assert_eq!(sim.request_shutdown(Some(20)), 20);

    let mut ticks = 0;
    while sim.tick() == TickOutcome::Continue {
        ticks += 1;
        assert!(ticks < 1000, "countdown never expired");
    }
    assert_eq!(ticks + 1, 201);
    assert_eq!(
        broadcasts(&drain(&mut rx)),
        vec![announce(20), announce(15), announce(10), announce(5)]
    );
    assert_eq!(sim.shutdown_remaining(), None);
}

#[test]
fn new_request_restarts_the_countdown() {
    let (mut sim, mut rx) = starter_simulation();
    sim.request_shutdown(Some(20));
    for _ in 0..60 {
        sim.tick();
    }
    assert_eq!(sim.shutdown_remaining(), Some(15));
    sim.request_shutdown(Some(30));
    sim.tick();
    assert_eq!(sim.shutdown_remaining(), Some(30));
    let seen = broadcasts(&drain(&mut rx));
    assert_eq!(seen.last(), Some(&announce(30)));
}

#[test]
fn cancel_stops_the_countdown_and_says_so() {
    let (mut sim, mut rx) = starter_simulation();
    sim.request_shutdown(Some(10));
    sim.tick();
    assert!(sim.cancel_shutdown());
    assert!(!sim.cancel_shutdown());
    for _ in 0..200 {
        assert_eq!(sim.tick(), TickOutcome::Continue);
    }
    assert_eq!(
        broadcasts(&drain(&mut rx)),
        vec![announce(10), "*** Shutdown cancelled. ***\n".to_string()]
    );
}

#[test]
fn default_delay_comes_from_config() {
    let mut cfg = test_config();
    cfg.admin.shutdown_default_seconds = 7;
    let (mut sim, _rx) = simulation_with(starter_world(), cfg);
    assert_eq!(sim.request_shutdown(None), 7);
    assert_eq!(sim.shutdown_remaining(), Some(7));
}

#[tokio::test]
async fn immediate_shutdown_stops_the_runner() {
    let mut cfg = test_config();
    cfg.timing.turn_milliseconds = 10;
    let (sim, _rx) = simulation_with(starter_world(), cfg);
    let (handle, done) = start_simulation(sim);

    assert_eq!(handle.shutdown(Some(0)).await, Some(0));
    let report = tokio::time::timeout(Duration::from_secs(5), done)
        .await
        .expect("runner stopped")
        .expect("runner task");
    assert!(report.final_save_ok);
    assert_eq!(handle.snapshot().await, None);
}

#[tokio::test]
async fn handle_cancels_a_pending_shutdown() {
    let mut cfg = test_config();
    cfg.timing.turn_milliseconds = 10;
    let (sim, _rx) = simulation_with(starter_world(), cfg);
    let (handle, done) = start_simulation(sim);

    assert_eq!(handle.cancel_shutdown().await, Some(false));
    handle.shutdown(Some(30)).await;
    assert_eq!(handle.cancel_shutdown().await, Some(true));
    let stats = handle.snapshot().await.expect("running");
    assert!(stats.turn < 3000);

    handle.shutdown(Some(0)).await;
    tokio::time::timeout(Duration::from_secs(5), done)
        .await
        .expect("runner stopped")
        .expect("runner task");
}
