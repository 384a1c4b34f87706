// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unique names for tests that share a display name.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

/// Tracks how many times each test display name has finished, so that repeated names can be
/// reported with a numeric suffix.
///
/// Names are compared case-insensitively. The suffix for a name is the number of finish events
/// already resolved for it: the first occurrence is reported as-is, the second as `"{name} 1"`,
/// and so on.
#[derive(Debug, Default)]
pub struct NameRegistry {
    // Keyed by the case-folded display name.
    finished: Mutex<HashMap<String, usize>>,
}

impl NameRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the name a test that is starting now will finish under, without claiming it.
    ///
    /// A test that starts but never finishes does not affect the names given to later tests.
    pub fn peek_display_name(&self, name: &str) -> String {
        let finished = self.lock();
        let count = finished.get(&registry_key(name)).copied().unwrap_or(0);
        display_name_for(name, count)
    }

    /// Returns the name a finished test is reported under, and claims it.
    pub fn resolve_finished_name(&self, name: &str) -> String {
        let mut finished = self.lock();
        let count = finished.entry(registry_key(name)).or_insert(0);
        let display_name = display_name_for(name, *count);
        *count += 1;
        display_name
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        // The map is never left partially updated, so a poisoned lock is still usable.
        self.finished.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Folds case one character at a time, so that a character's key never depends on its neighbors.
fn registry_key(name: &str) -> String {
    name.chars()
        .flat_map(char::to_uppercase)
        .flat_map(char::to_lowercase)
        .collect()
}

fn display_name_for(name: &str, count: usize) -> String {
    if count == 0 {
        name.to_owned()
    } else {
        format!("{name} {count}")
    }
}
