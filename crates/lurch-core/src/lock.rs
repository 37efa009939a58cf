//! Non-blocking exclusion primitives.
//!
//! Both primitives refuse a second holder instead of queueing it, and both
//! hand out guards that release on drop, so every exit path (early return,
//! `?`, panic unwinding) gives the slot back.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// KeyLockSet
// ---------------------------------------------------------------------------

/// A set of keys currently held, one holder per key.
#[derive(Debug, Default)]
pub struct KeyLockSet {
    held: Mutex<HashSet<String>>,
}

impl KeyLockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key` if it is absent. Returns `None` when another holder
    /// already has it.
    pub fn try_acquire(&self, key: &str) -> Option<KeyGuard<'_>> {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if !held.insert(key.to_string()) {
            return None;
        }
        Some(KeyGuard {
            set: self,
            key: key.to_string(),
        })
    }

    /// Remove `key` unconditionally.
    pub fn release(&self, key: &str) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        let held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.contains(key)
    }
}

/// Scoped membership of a key in a [`KeyLockSet`].
#[derive(Debug)]
pub struct KeyGuard<'a> {
    set: &'a KeyLockSet,
    key: String,
}

impl KeyGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.set.release(&self.key);
    }
}

// ---------------------------------------------------------------------------
// PullToggle
// ---------------------------------------------------------------------------

/// A process-wide flag that is on exactly while one holder owns it.
#[derive(Debug, Default)]
pub struct PullToggle {
    on: AtomicBool,
}

impl PullToggle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the flag on if it is off. Returns `None` if it was already on.
    pub fn try_on(&self) -> Option<ToggleGuard<'_>> {
        self.on
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ToggleGuard { toggle: self })
    }

    /// Switch the flag off unconditionally.
    pub fn off(&self) {
        self.on.store(false, Ordering::Release);
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Acquire)
    }
}

/// Scoped ownership of a [`PullToggle`].
#[derive(Debug)]
pub struct ToggleGuard<'a> {
    toggle: &'a PullToggle,
}

impl Drop for ToggleGuard<'_> {
    fn drop(&mut self) {
        self.toggle.off();
    }
}
