//! Tracks which time source owns an animation id.
//!
//! Tweens sharing an id under the same time source accumulate in one entry. When a tween starts
//! under a different time source, every tween of the previous owner is canceled and the entry is
//! replaced. This is the only point where independent execution contexts interact.

use std::{collections::HashMap, sync::Arc};

use log::warn;
use parking_lot::Mutex;

use crate::{CancelToken, TimeSource, TweenId};

#[derive(Debug, Clone, Default)]
pub struct ExclusivityDirectory {
    entries: Arc<Mutex<HashMap<TweenId, Entry>>>,
}

#[derive(Debug)]
struct Entry {
    source: TimeSource,
    members: Vec<CancelToken>,
}

impl ExclusivityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, id: &TweenId, source: TimeSource, member: CancelToken) {
        let mut entries = self.entries.lock();
        let entry = entries.entry(id.clone()).or_insert_with(|| Entry {
            source,
            members: Vec::new(),
        });

        if entry.source != source {
            warn!(
                "Animation `{id}` started under {source} while owned by {}, canceling {} tween(s)",
                entry.source,
                entry.members.len()
            );
            for previous in entry.members.drain(..) {
                previous.cancel();
            }
            entry.source = source;
        }

        if !entry.members.iter().any(|m| m.ptr_eq(&member)) {
            entry.members.push(member);
        }
    }

    pub(crate) fn unregister(&self, id: &TweenId, member: &CancelToken) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(id) else {
            return;
        };
        entry.members.retain(|m| !m.ptr_eq(member));
        if entry.members.is_empty() {
            entries.remove(id);
        }
    }

    /// The time source currently owning `id`.
    pub fn owner(&self, id: &TweenId) -> Option<TimeSource> {
        self.entries.lock().get(id).map(|entry| entry.source)
    }

    /// Number of tweens registered under `id`.
    pub fn member_count(&self, id: &TweenId) -> usize {
        self.entries
            .lock()
            .get(id)
            .map_or(0, |entry| entry.members.len())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_source_accumulates() {
        let directory = ExclusivityDirectory::new();
        let id = TweenId::from("fade");
        let source = TimeSource::new();
        let (a, b) = (CancelToken::default(), CancelToken::default());

        directory.register(&id, source, a.clone());
        directory.register(&id, source, b.clone());

        assert_eq!(directory.member_count(&id), 2);
        assert!(!a.is_canceled());
        assert!(!b.is_canceled());
    }

    #[test]
    fn different_source_cancels_previous_owner() {
        let directory = ExclusivityDirectory::new();
        let id = TweenId::from("X");
        let (first, second) = (TimeSource::new(), TimeSource::new());
        let (a, b, c) = (
            CancelToken::default(),
            CancelToken::default(),
            CancelToken::default(),
        );

        directory.register(&id, first, a.clone());
        directory.register(&id, first, b.clone());
        directory.register(&id, second, c.clone());

        assert!(a.is_canceled());
        assert!(b.is_canceled());
        assert!(!c.is_canceled());
        assert_eq!(directory.owner(&id), Some(second));
        assert_eq!(directory.member_count(&id), 1);
    }

    #[test]
    fn entry_is_removed_when_last_member_leaves() {
        let directory = ExclusivityDirectory::new();
        let id = TweenId::from("move");
        let source = TimeSource::new();
        let (a, b) = (CancelToken::default(), CancelToken::default());

        directory.register(&id, source, a.clone());
        directory.register(&id, source, b.clone());
        directory.unregister(&id, &a);
        assert_eq!(directory.member_count(&id), 1);
        directory.unregister(&id, &b);
        assert!(directory.is_empty());
        assert_eq!(directory.owner(&id), None);
    }

    #[test]
    fn stale_member_leaving_does_not_touch_new_owner() {
        let directory = ExclusivityDirectory::new();
        let id = TweenId::from("X");
        let (stale, fresh) = (CancelToken::default(), CancelToken::default());
        let new_owner = TimeSource::new();

        directory.register(&id, TimeSource::new(), stale.clone());
        directory.register(&id, new_owner, fresh.clone());
        directory.unregister(&id, &stale);

        assert_eq!(directory.owner(&id), Some(new_owner));
        assert_eq!(directory.member_count(&id), 1);
    }
}
