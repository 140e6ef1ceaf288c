//! Setting cycle — the fixed, ordered list of settings an app steps through.

use crate::setting::SettingKind;

/// Index that follows `current` in a cycle of `len` entries, wrapping to 0.
///
/// A cycle of length 0 or 1 always yields 0.
#[must_use]
pub fn next_index(current: usize, len: usize) -> usize {
    if len <= 1 { 0 } else { (current + 1) % len }
}

/// An app's settings plus a pointer to the active one.
///
/// The list is fixed when the app kind is defined; only the pointer moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingCycle {
    settings: &'static [SettingKind],
    index: usize,
}

impl SettingCycle {
    /// Start a cycle at its first setting.
    ///
    /// Returns `None` for an empty list.
    #[must_use]
    pub fn new(settings: &'static [SettingKind]) -> Option<Self> {
        if settings.is_empty() {
            return None;
        }
        Some(Self { settings, index: 0 })
    }

    /// The active setting.
    #[must_use]
    pub fn current(&self) -> SettingKind {
        self.settings[self.index]
    }

    /// Index of the active setting.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The setting that [`advance`](Self::advance) would activate.
    #[must_use]
    pub fn peek_next(&self) -> SettingKind {
        self.settings[next_index(self.index, self.settings.len())]
    }

    /// Move to the next setting, wrapping after the last one.
    pub fn advance(&mut self) -> SettingKind {
        self.index = next_index(self.index, self.settings.len());
        self.current()
    }

    #[must_use]
    pub fn settings(&self) -> &'static [SettingKind] {
        self.settings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Always `false`: empty cycles cannot be built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Position of `setting` in the cycle, if the app exposes it.
    #[must_use]
    pub fn index_of(&self, setting: SettingKind) -> Option<usize> {
        self.settings.iter().position(|s| *s == setting)
    }
}
