//! Property tests for the countdown primitive.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use tomato_core::{Countdown, CountdownEvent, ManualScheduler};

fn started(duration: u64) -> (Countdown, Arc<ManualScheduler>, Arc<Mutex<Vec<CountdownEvent>>>) {
    let scheduler = Arc::new(ManualScheduler::new());
    let mut countdown = Countdown::new(duration, scheduler.clone());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    countdown.subscribe(move |e| sink.lock().unwrap().push(*e));
    countdown.start();
    (countdown, scheduler, events)
}

proptest! {
    #[test]
    fn d_ticks_give_d_increments_then_ended(duration in 0u64..200) {
        let (mut countdown, scheduler, events) = started(duration);

        let mut ticks = 0;
        while let Some(source) = scheduler.active() {
            countdown.on_tick(source);
            ticks += 1;
        }

        let events = events.lock().unwrap();
        let increments = events
            .iter()
            .filter(|e| matches!(e, CountdownEvent::Increment { .. }))
            .count();
        prop_assert_eq!(ticks, duration);
        prop_assert_eq!(increments as u64, duration);
        prop_assert_eq!(events.first(), Some(&CountdownEvent::Start));
        prop_assert_eq!(events.last(), Some(&CountdownEvent::Ended));
        prop_assert_eq!(
            events.iter().filter(|e| **e == CountdownEvent::Ended).count(),
            1
        );
        prop_assert_eq!(countdown.elapsed(), duration);
        prop_assert_eq!(countdown.remaining(), 0);
        prop_assert!(!countdown.is_started());
    }

    #[test]
    fn pause_unpause_loses_no_ticks(
        duration in 2u64..100,
        before in 0u64..100,
        idle in 0usize..50,
    ) {
        let before = before % (duration - 1);
        let (mut countdown, scheduler, _events) = started(duration);
        for _ in 0..before {
            let source = scheduler.active().unwrap();
            countdown.on_tick(source);
        }
        let stale = countdown.tick_source().unwrap();

        countdown.pause();
        for _ in 0..idle {
            countdown.on_tick(stale);
        }
        prop_assert_eq!(countdown.elapsed(), before);

        countdown.unpause();
        prop_assert_eq!(countdown.elapsed(), before);
        prop_assert!(countdown.is_started());
        prop_assert!(!countdown.is_paused());
        prop_assert_eq!(scheduler.active_sources().len(), 1);
    }

    #[test]
    fn reset_always_idles(duration in 0u64..50, ticks in 0u64..60, pause in any::<bool>()) {
        let (mut countdown, scheduler, _events) = started(duration);
        for _ in 0..ticks {
            match scheduler.active() {
                Some(source) => { countdown.on_tick(source); }
                None => break,
            }
        }
        if pause {
            countdown.pause();
        }

        countdown.reset();
        prop_assert_eq!(countdown.elapsed(), 0);
        prop_assert!(!countdown.is_started());
        prop_assert!(!countdown.is_paused());
        prop_assert!(!scheduler.is_armed());
    }
}
