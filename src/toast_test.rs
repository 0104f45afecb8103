use super::*;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Observer that records every snapshot as a list of ids.
fn recorder() -> (Arc<StdMutex<Vec<Vec<u64>>>>, impl Fn(&[Toast]) + Send + Sync + 'static) {
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let sink = seen.clone();
    let observer = move |toasts: &[Toast]| {
        sink.lock().unwrap().push(toasts.iter().map(|t| t.id).collect());
    };
    (seen, observer)
}

fn ids(queue: &ToastQueue) -> Vec<u64> {
    queue.snapshot().iter().map(|t| t.id).collect()
}

// =============================================================
// add / ordering
// =============================================================

#[test]
fn add_assigns_increasing_ids_newest_first() {
    let queue = ToastQueue::new(Duration::ZERO);
    let a = queue.add("saved", Severity::Success, ToastOptions::persistent());
    let b = queue.add("oops", Severity::Error, ToastOptions::persistent());
    let c = queue.add("fyi", Severity::Info, ToastOptions::persistent());

    assert!(a < b && b < c);
    assert_eq!(ids(&queue), vec![c, b, a]);

    let head = &queue.snapshot()[0];
    assert_eq!(head.message, "fyi");
    assert_eq!(head.severity, Severity::Info);
    assert!(head.visible);
    assert_eq!(head.duration, Duration::ZERO);
}

#[test]
fn shorthands_use_queue_default_duration() {
    let queue = ToastQueue::new(Duration::ZERO);
    queue.success("a");
    queue.error("b");
    queue.info("c");
    queue.warning("d");

    let severities: Vec<Severity> = queue.snapshot().iter().map(|t| t.severity).collect();
    assert_eq!(severities, vec![Severity::Warning, Severity::Info, Severity::Error, Severity::Success]);
    assert!(queue.snapshot().iter().all(|t| t.duration == queue.default_duration()));
}

#[test]
fn add_without_runtime_keeps_toast() {
    let queue = ToastQueue::new(Duration::from_millis(10));
    let id = queue.info("no timers here");
    assert_eq!(ids(&queue), vec![id]);
}

// =============================================================
// expiry
// =============================================================

#[tokio::test(start_paused = true)]
async fn toast_expires_after_duration() {
    let queue = ToastQueue::new(Duration::from_millis(3000));
    let (seen, observer) = recorder();
    let _sub = queue.subscribe(observer);

    let id = queue.add("x", Severity::Info, ToastOptions::with_duration(Duration::from_millis(1000)));
    assert_eq!(seen.lock().unwrap().last().unwrap(), &vec![id]);

    tokio::time::sleep(Duration::from_millis(999)).await;
    assert_eq!(ids(&queue), vec![id]);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(queue.snapshot().is_empty());
    assert_eq!(seen.lock().unwrap().last().unwrap(), &Vec::<u64>::new());
}

#[tokio::test(start_paused = true)]
async fn persistent_toast_never_expires() {
    let queue = ToastQueue::new(Duration::from_millis(100));
    let id = queue.add("sticky", Severity::Warning, ToastOptions::persistent());
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(ids(&queue), vec![id]);
}

#[tokio::test(start_paused = true)]
async fn timer_after_manual_removal_is_noop() {
    let queue = ToastQueue::new(Duration::from_millis(500));
    let (seen, observer) = recorder();
    let _sub = queue.subscribe(observer);

    let id = queue.info("short");
    assert!(queue.remove(id));
    let notifications = seen.lock().unwrap().len();

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(seen.lock().unwrap().len(), notifications);
}

#[tokio::test(start_paused = true)]
async fn clear_all_cancels_pending_timers() {
    let queue = ToastQueue::new(Duration::from_millis(500));
    queue.info("a");
    queue.clear_all();
    let kept = queue.add("b", Severity::Info, ToastOptions::with_duration(Duration::from_millis(2000)));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(ids(&queue), vec![kept]);
}

// =============================================================
// remove / dismiss / clear
// =============================================================

#[test]
fn remove_twice_is_noop_second_time() {
    let queue = ToastQueue::new(Duration::ZERO);
    let (seen, observer) = recorder();
    let _sub = queue.subscribe(observer);
    let id = queue.info("bye");

    assert!(queue.remove(id));
    let after_first = seen.lock().unwrap().len();
    assert!(!queue.remove(id));
    assert_eq!(seen.lock().unwrap().len(), after_first);
    assert!(queue.snapshot().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dismiss_hides_then_removes_after_exit_delay() {
    let queue = ToastQueue::new(Duration::ZERO);
    let id = queue.info("closing");

    assert!(queue.dismiss(id));
    let snap = queue.snapshot();
    assert_eq!(snap.len(), 1);
    assert!(!snap[0].visible);
    assert!(!queue.dismiss(id), "already dismissed");

    tokio::time::sleep(EXIT_DELAY + Duration::from_millis(1)).await;
    assert!(queue.snapshot().is_empty());
}

#[test]
fn clear_all_empties_and_notifies() {
    let queue = ToastQueue::new(Duration::ZERO);
    queue.info("a");
    queue.info("b");
    let (seen, observer) = recorder();
    let _sub = queue.subscribe(observer);

    queue.clear_all();
    assert!(queue.snapshot().is_empty());
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[1].is_empty());
}

// =============================================================
// subscribe
// =============================================================

#[test]
fn subscribe_delivers_current_state_immediately() {
    let queue = ToastQueue::new(Duration::ZERO);
    let id = queue.info("already here");
    let (seen, observer) = recorder();
    let _sub = queue.subscribe(observer);
    assert_eq!(*seen.lock().unwrap(), vec![vec![id]]);
}

#[test]
fn observers_notified_in_registration_order() {
    let queue = ToastQueue::new(Duration::ZERO);
    let order = Arc::new(StdMutex::new(Vec::new()));
    let first = order.clone();
    let second = order.clone();
    let _a = queue.subscribe(move |_| first.lock().unwrap().push("a"));
    let _b = queue.subscribe(move |_| second.lock().unwrap().push("b"));
    order.lock().unwrap().clear();

    queue.info("ping");
    assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
}

#[test]
fn unsubscribe_stops_notifications() {
    let queue = ToastQueue::new(Duration::ZERO);
    let (seen, observer) = recorder();
    let sub = queue.subscribe(observer);
    assert_eq!(queue.observer_count(), 1);

    sub.unsubscribe();
    assert_eq!(queue.observer_count(), 0);
    queue.info("unseen");
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn observer_may_reenter_queue() {
    let queue = ToastQueue::new(Duration::ZERO);
    let inner = queue.clone();
    let _sub = queue.subscribe(move |toasts| {
        // Auto-acknowledge errors by removing them.
        for t in toasts.iter().filter(|t| t.severity == Severity::Error) {
            inner.remove(t.id);
        }
    });

    queue.error("boom");
    queue.info("fine");
    let snap = queue.snapshot();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].message, "fine");
}

#[test]
fn observer_changes_are_delivered_after_current_round() {
    let queue = ToastQueue::new(Duration::ZERO);
    let inner = queue.clone();
    let _ack = queue.subscribe(move |toasts| {
        for t in toasts.iter().filter(|t| t.severity == Severity::Error) {
            inner.remove(t.id);
        }
    });
    let (seen, observer) = recorder();
    let _log = queue.subscribe(observer);

    let id = queue.error("boom");
    // The second observer sees the error, then the collection without it.
    let seen = seen.lock().unwrap();
    assert_eq!(seen[seen.len() - 2], vec![id]);
    assert_eq!(seen[seen.len() - 1], Vec::<u64>::new());
}

#[test]
fn concurrent_changes_never_overlap_and_end_on_current_state() {
    let queue = ToastQueue::new(Duration::ZERO);
    let in_flight = Arc::new(AtomicBool::new(false));
    let overlapped = Arc::new(AtomicBool::new(false));
    let (seen, record) = recorder();
    let (flag, overlap) = (in_flight.clone(), overlapped.clone());
    let _sub = queue.subscribe(move |toasts| {
        if flag.swap(true, Ordering::SeqCst) {
            overlap.store(true, Ordering::SeqCst);
        }
        record(toasts);
        std::thread::yield_now();
        flag.store(false, Ordering::SeqCst);
    });

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let queue = queue.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let id = queue.add("x", Severity::Info, ToastOptions::persistent());
                    if id % 3 == 0 {
                        queue.remove(id);
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(!overlapped.load(Ordering::SeqCst));
    assert_eq!(seen.lock().unwrap().last().unwrap(), &ids(&queue));
}

#[test]
fn severity_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), r#""warning""#);
    assert_eq!(Severity::Success.to_string(), "success");
}
