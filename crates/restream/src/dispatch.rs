//! Dual-dispatch plumbing shared by every manager.
//!
//! On each decoded item the consumer loop invokes, independently, (a) the
//! inline callback supplied at configuration time and (b) the matching
//! method on an attached handler object. A failure in either is contained:
//! it is logged and the loop continues with the next item.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::warn;

/// Inline callback invoked once per dispatched item.
pub type Callback<T> = std::sync::Arc<dyn Fn(&T) + Send + Sync>;

/// Inline callback with no payload (lifecycle notifications).
pub type LifecycleCallback = std::sync::Arc<dyn Fn() + Send + Sync>;

/// Run one user callback or handler method, containing panics.
///
/// User code must never stop a consumer loop; a panic is downgraded to a
/// structured warning.
pub(crate) fn contain<F>(what: &str, f: F)
where
    F: FnOnce(),
{
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        warn!(callback = what, "user callback panicked; continuing dispatch");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use super::*;

    #[test]
    fn contained_panic_does_not_propagate() {
        contain("test", || panic!("boom"));
    }

    #[test]
    fn panicking_callback_does_not_shadow_handler() {
        let seen = Arc::new(AtomicU32::new(0));

        for item in 0..3u32 {
            contain("on_item", || {
                if item == 1 {
                    panic!("bad item");
                }
            });
            let seen = Arc::clone(&seen);
            contain("handler.on_item", move || {
                seen.fetch_add(1, Ordering::SeqCst);
            });
        }

        // The handler fired for every item, including the one whose inline
        // callback panicked.
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
