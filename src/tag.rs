//! Level tags for nested differentiation.
//!
//! Every entry into a derivative computation draws a fresh tag. A value with
//! a higher tag belongs to a more recently entered (inner) level; values at
//! lower tags are treated as constants by it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::{fatal, Error};

/// Nesting level identifier.
pub type Tag = u64;

/// Monotonically increasing source of level tags.
///
/// Cloning a `Tagger` shares the counter. The counter is the only state the
/// differentiation core shares across threads.
#[derive(Clone, Debug, Default)]
pub struct Tagger {
    counter: Arc<AtomicU64>,
}

static GLOBAL: OnceLock<Tagger> = OnceLock::new();

impl Tagger {
    /// Create an independent counter starting at tag 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide tagger used by the free functions in [`crate::api`].
    pub fn global() -> &'static Tagger {
        GLOBAL.get_or_init(Tagger::new)
    }

    #[cfg(test)]
    fn resuming_after(last: Tag) -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(last)),
        }
    }

    /// Issue the next unused tag.
    ///
    /// Panics once the counter is exhausted rather than reissuing tag 0.
    #[inline]
    pub fn next_tag(&self) -> Tag {
        match self
            .counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |t| t.checked_add(1))
        {
            Ok(prev) => prev + 1,
            Err(_) => fatal(Error::domain("next_tag", "level tags exhausted")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tags_increase() {
        let t = Tagger::new();
        let a = t.next_tag();
        let b = t.next_tag();
        assert!(b > a);
        assert_eq!(a, 1);
    }

    #[test]
    fn clones_share_the_counter() {
        let t = Tagger::new();
        let u = t.clone();
        assert_eq!(t.next_tag(), 1);
        assert_eq!(u.next_tag(), 2);
    }

    #[test]
    fn concurrent_tags_are_unique() {
        let t = Tagger::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let t = t.clone();
                std::thread::spawn(move || (0..1000).map(|_| t.next_tag()).collect::<Vec<_>>())
            })
            .collect();
        let mut seen = HashSet::new();
        for h in handles {
            for tag in h.join().unwrap() {
                assert!(seen.insert(tag));
            }
        }
        assert_eq!(seen.len(), 4000);
    }

    #[test]
    fn last_tag_is_still_issued() {
        let t = Tagger::resuming_after(Tag::MAX - 1);
        assert_eq!(t.next_tag(), Tag::MAX);
    }

    #[test]
    #[should_panic(expected = "level tags exhausted")]
    fn exhausted_counter_does_not_wrap() {
        let t = Tagger::resuming_after(Tag::MAX);
        t.next_tag();
    }
}
