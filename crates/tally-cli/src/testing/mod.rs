//! Test harness infrastructure for tally
//!
//! Discovery, loading, collection, execution and reporting, run as one
//! sequential pipeline.

pub mod collector;
pub mod discovery;
pub mod loader;
pub mod reporter;
pub mod runner;

pub use collector::{collect, TestIdentity, TestUnit};
pub use discovery::PathWalker;
pub use loader::{ScriptResolver, UnitLoader};
pub use reporter::{Reporter, ReporterOptions};
pub use runner::{RunSummary, TestRunner};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Serializes panic hook swaps so overlapping calls restore the right hook
static HOOK_LOCK: Mutex<()> = Mutex::new(());

fn lock_hook() -> MutexGuard<'static, ()> {
    HOOK_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `f`, turning a panic into an error without printing it
///
/// The panic message goes to the debug log instead of stderr. Calls are
/// serialized process-wide and must not nest.
pub(crate) fn catch_quietly<T>(f: impl FnOnce() -> T) -> std::thread::Result<T> {
    let _guard = lock_hook();
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        tracing::debug!(%info, "panic caught");
    }));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    panic::set_hook(previous);
    result
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_quietly_returns_value() {
        assert_eq!(catch_quietly(|| 41 + 1).unwrap(), 42);
    }

    #[test]
    fn test_overlapping_calls_restore_previous_hook() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::thread;

        static SEEN: AtomicUsize = AtomicUsize::new(0);

        {
            let _guard = lock_hook();
            let _ = panic::take_hook();
            panic::set_hook(Box::new(|_| {
                SEEN.fetch_add(1, Ordering::SeqCst);
            }));
        }

        let workers: Vec<_> = (0..8)
            .map(|i| {
                thread::spawn(move || {
                    for _ in 0..25 {
                        let payload = catch_quietly::<()>(|| panic!("worker {}", i)).unwrap_err();
                        assert_eq!(panic_message(payload.as_ref()), format!("worker {}", i));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let _guard = lock_hook();
        let before = SEEN.load(Ordering::SeqCst);
        let _ = panic::catch_unwind::<_, ()>(|| panic!("after workers"));
        let after = SEEN.load(Ordering::SeqCst);
        let _ = panic::take_hook();

        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_catch_quietly_captures_panic_message() {
        let payload = catch_quietly::<()>(|| panic!("boom {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom 7");

        let payload = catch_quietly::<()>(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static");
    }
}
