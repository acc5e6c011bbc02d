//! Property-based invariant tests for the session engine.
//!
//! Verifies, for arbitrary key sequences:
//! 1. The typed buffer never exceeds the target
//! 2. The error log length always equals the error count
//! 3. The error count never decreases within one session
//! 4. A finished session has a full buffer that stays full
//! 5. Accuracy never exceeds 100 and only drops below 0 through
//!    historical errors; consistency stays within 0..=100

use proptest::prelude::*;
use typedrill::clock::ManualClock;
use typedrill::config::Config;
use typedrill::keys::{KeyStroke, NamedKey};
use typedrill::metrics::{accuracy, consistency, wpm};
use typedrill::{Engine, SessionState};

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_key() -> impl Strategy<Value = KeyStroke> {
    prop_oneof![
        6 => prop::char::range('a', 'e').prop_map(KeyStroke::from_char),
        1 => Just(KeyStroke::from_char(' ')),
        2 => Just(KeyStroke::backspace()),
        1 => prop_oneof![
            Just(NamedKey::Enter),
            Just(NamedKey::Tab),
            Just(NamedKey::Left),
            Just(NamedKey::Shift),
        ]
        .prop_map(KeyStroke::named),
    ]
}

fn arb_target() -> impl Strategy<Value = String> {
    "[a-e ]{1,12}"
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn session_invariants_hold(
        target in arb_target(),
        keys in prop::collection::vec((arb_key(), 0u64..400), 0..60),
    ) {
        let clock = ManualClock::new(0);
        let mut engine = Engine::new(&Config::default()).with_clock(clock.clone());
        engine.load_target(Some(&target));
        let target_len = target.chars().count();

        let mut last_errors = 0;
        let mut finished_typed: Option<String> = None;

        for (key, gap) in keys {
            engine.handle_key(key);
            clock.advance(gap);
            engine.on_tick();

            let session = engine.session();
            prop_assert!(session.typed.len() <= target_len);
            prop_assert_eq!(session.error_log.len(), session.error_count);

            if session.state == SessionState::Idle && finished_typed.is_some() {
                // Enter restarted the attempt
                finished_typed = None;
                last_errors = 0;
            }
            prop_assert!(session.error_count >= last_errors);
            last_errors = session.error_count;

            if session.state == SessionState::Finished {
                prop_assert_eq!(session.typed.len(), target_len);
                let typed = session.typed_text();
                if let Some(prev) = &finished_typed {
                    prop_assert_eq!(prev, &typed);
                }
                finished_typed = Some(typed);
                prop_assert!(!engine.is_ticker_armed());
            }

            let snap = engine.snapshot();
            prop_assert!(snap.accuracy <= 100);
            prop_assert!(snap.accuracy >= 100 - 100 * snap.error_count as i32);
            if snap.error_count <= snap.typed.chars().count() {
                prop_assert!(snap.accuracy >= 0);
            }
            prop_assert!(snap.consistency <= 100);
        }
    }

    #[test]
    fn accuracy_without_errors_is_full(n in 0usize..10_000) {
        prop_assert_eq!(accuracy(n, 0), 100);
    }

    #[test]
    fn wpm_zero_boundaries(t in 0.0f64..10_000.0, c in 0usize..10_000) {
        prop_assert_eq!(wpm(t, 0), 0);
        prop_assert_eq!(wpm(0.0, c), 0);
    }

    #[test]
    fn consistency_is_a_percentage(times in prop::collection::vec(0u64..100_000, 0..40)) {
        let mut times = times;
        times.sort_unstable();
        prop_assert!(consistency(&times) <= 100);
    }
}
