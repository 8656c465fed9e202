//! Bounded, insertion-ordered selection set for multi-answer questions.

use std::collections::{HashSet, VecDeque};

/// What a toggle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The id was added; `evicted` is the oldest id dropped to make room.
    Selected { evicted: Option<String> },
    Deselected,
    /// Nothing can be selected (`max = 0`).
    Refused,
}

/// Selected answer ids plus the order they were picked in.
///
/// When full, selecting another id evicts the oldest one (FIFO).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSelectSet {
    max: Option<usize>,
    members: HashSet<String>,
    order: VecDeque<String>,
}

impl MultiSelectSet {
    pub fn new(max: Option<usize>) -> Self {
        Self {
            max,
            ..Default::default()
        }
    }

    pub fn toggle(&mut self, id: &str) -> ToggleOutcome {
        if self.members.remove(id) {
            self.order.retain(|existing| existing != id);
            return ToggleOutcome::Deselected;
        }

        if self.max == Some(0) {
            return ToggleOutcome::Refused;
        }

        let mut evicted = None;
        if self.max.is_some_and(|max| self.members.len() >= max) {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        self.members.insert(id.to_string());
        self.order.push_back(id.to_string());
        ToggleOutcome::Selected { evicted }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Keep only the ids `keep` accepts, preserving pick order.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.order.retain(|id| keep(id));
        let order = &self.order;
        self.members.retain(|id| order.contains(id));
    }

    /// Selected ids, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Minimum selections a multi question needs before it can be confirmed.
pub fn required_minimum(min: Option<usize>) -> usize {
    min.unwrap_or(1)
}
