use std::sync::mpsc;
use std::time::Duration;

use tempfile::tempdir;
use typedrill::clock::ManualClock;
use typedrill::config::Config;
use typedrill::keys::{KeyStroke, NamedKey};
use typedrill::metrics::Tier;
use typedrill::progress::{DrillId, ResultStore, SqliteResultStore, Trainer};
use typedrill::runtime::{ChannelEventSource, DrillEvent, Flow, Runner};
use typedrill::{Engine, SessionState};

// Headless run of the drill loop without a TTY: events arrive over a
// channel, results land in a real SQLite file.
#[test]
fn headless_drill_completes_and_saves() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("progress.db");
    let store = SqliteResultStore::open(&db).unwrap();

    let clock = ManualClock::new(0);
    let engine = Engine::new(&Config::default()).with_clock(clock.clone());
    let drill = DrillId::new("home-row", 4);
    let mut trainer = Trainer::new(engine, store, drill.clone());
    trainer.load(drill.clone(), Some("hi"));

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(5));

    for c in "hi".chars() {
        tx.send(DrillEvent::Key(KeyStroke::from_char(c))).unwrap();
    }

    let mut finished = None;
    for _ in 0..100u32 {
        clock.advance(100);
        match runner.dispatch(&mut trainer, runner.step()) {
            Flow::Finished(result) => {
                finished = Some(result);
                break;
            }
            Flow::Quit => break,
            Flow::Continue | Flow::Redraw => {}
        }
    }

    let result = finished.expect("drill should finish");
    assert_eq!(trainer.engine.state(), SessionState::Finished);
    assert_eq!(result.accuracy, 100);
    // 2 chars in 0.1s
    assert_eq!(result.wpm, 240);

    let stored = SqliteResultStore::open(&db).unwrap().get(&drill).unwrap();
    assert_eq!(stored, Some(result));
}

#[test]
fn headless_restart_after_finish() {
    let clock = ManualClock::new(0);
    let engine = Engine::new(&Config::default()).with_clock(clock.clone());
    let store = SqliteResultStore::open_in_memory().unwrap();
    let mut trainer = Trainer::new(engine, store, DrillId::custom("r"));
    trainer.load(DrillId::custom("r"), Some("ab"));

    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(1));

    for key in [
        KeyStroke::from_char('a'),
        KeyStroke::from_char('c'),
        KeyStroke::named(NamedKey::Enter),
    ] {
        clock.advance(50);
        runner.dispatch(&mut trainer, DrillEvent::Key(key));
    }

    assert_eq!(trainer.engine.state(), SessionState::Idle);
    assert_eq!(trainer.engine.session().target_text(), "ab");
    let saved = trainer.store().get(&DrillId::custom("r")).unwrap().unwrap();
    assert_eq!(saved.accuracy, 50);
    assert_eq!(saved.tier, Tier::NeedsPractice);
}

#[test]
fn live_wpm_refreshes_through_ticks() {
    let clock = ManualClock::new(0);
    let engine = Engine::new(&Config::default()).with_clock(clock.clone());
    let mut trainer = Trainer::new(
        engine,
        SqliteResultStore::open_in_memory().unwrap(),
        DrillId::custom("w"),
    );
    trainer.load(DrillId::custom("w"), Some("abcdefghijklmnop"));

    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(1));

    for c in "abcde".chars() {
        runner.dispatch(&mut trainer, DrillEvent::Key(KeyStroke::from_char(c)));
        clock.advance(100);
    }
    clock.set(1_000);
    assert_eq!(runner.dispatch(&mut trainer, DrillEvent::Tick), Flow::Redraw);
    assert_eq!(trainer.engine.snapshot().live_wpm, 60);
    assert_eq!(runner.dispatch(&mut trainer, DrillEvent::Tick), Flow::Continue);
}
