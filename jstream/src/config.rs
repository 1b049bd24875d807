// SPDX-License-Identifier: Apache-2.0

//! Runtime parser configuration.

/// What happens when an object repeats a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeys {
    /// Keep the value of the last occurrence, at the position of the first.
    #[default]
    LastWins,
    /// Keep the first occurrence and drop the later ones.
    FirstWins,
    /// Keep every member in source order.
    KeepAll,
}

/// Parser options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub duplicate_keys: DuplicateKeys,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }
}
