//! Scoped page-scroll lock for modal dialogs.
//!
//! Each open modal holds a `ModalGuard`; the page is scroll-locked while at
//! least one guard is alive. Dropping the guard releases its hold.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalKind {
    SubmitConfirmation,
    NamePrompt,
}

#[derive(Debug, Clone, Default)]
pub struct ScrollLock {
    holders: Arc<AtomicUsize>,
}

impl ScrollLock {
    pub fn acquire(&self, kind: ModalKind) -> ModalGuard {
        self.holders.fetch_add(1, Ordering::SeqCst);
        ModalGuard {
            holders: Arc::clone(&self.holders),
            kind,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.holders() > 0
    }

    pub fn holders(&self) -> usize {
        self.holders.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ModalGuard {
    holders: Arc<AtomicUsize>,
    kind: ModalKind,
}

impl ModalGuard {
    pub fn kind(&self) -> ModalKind {
        self.kind
    }
}

impl Drop for ModalGuard {
    fn drop(&mut self) {
        self.holders.fetch_sub(1, Ordering::SeqCst);
    }
}
