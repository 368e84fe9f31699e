//! Priority levels for work items
//!
//! Priorities are small integers where `1` is the most urgent level and
//! [`PRIORITY_LEVELS`] is the least urgent one.

use crate::core::error::{Result, WorkqError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of priority levels a queue understands
pub const PRIORITY_LEVELS: u32 = 10;

/// Maximum payload size of a single work item, in bytes
pub const MAX_PAYLOAD: usize = 2048;

/// Delivery precedence of a work item (lower number = delivered first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Priority(u32);

impl Priority {
    /// Most urgent level
    pub const HIGHEST: Priority = Priority(1);
    /// Least urgent level
    pub const LOWEST: Priority = Priority(PRIORITY_LEVELS);

    /// Create a priority, rejecting values outside `1..=PRIORITY_LEVELS`
    pub fn new(level: u32) -> Result<Self> {
        if (1..=PRIORITY_LEVELS).contains(&level) {
            Ok(Self(level))
        } else {
            Err(WorkqError::invalid_priority(level, PRIORITY_LEVELS))
        }
    }

    /// Get the numeric level
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Zero-based bucket index for this level
    pub(crate) fn index(&self) -> usize {
        (self.0 - 1) as usize
    }

    /// All levels, most urgent first
    pub fn all() -> impl Iterator<Item = Priority> {
        (1..=PRIORITY_LEVELS).map(Priority)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::LOWEST
    }
}

impl TryFrom<u32> for Priority {
    type Error = WorkqError;

    fn try_from(level: u32) -> Result<Self> {
        Self::new(level)
    }
}

impl From<Priority> for u32 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_bounds() {
        assert!(Priority::new(0).is_err());
        assert!(Priority::new(PRIORITY_LEVELS + 1).is_err());
        assert_eq!(Priority::new(1).unwrap(), Priority::HIGHEST);
        assert_eq!(Priority::new(PRIORITY_LEVELS).unwrap(), Priority::LOWEST);
    }

    #[test]
    fn test_priority_ordering() {
        // Lower number sorts first and is more urgent
        assert!(Priority::HIGHEST < Priority::LOWEST);
        assert!(Priority::new(3).unwrap() < Priority::new(5).unwrap());
    }

    #[test]
    fn test_priority_all_levels() {
        let levels: Vec<u32> = Priority::all().map(|p| p.value()).collect();
        assert_eq!(levels, (1..=PRIORITY_LEVELS).collect::<Vec<_>>());
        assert_eq!(Priority::HIGHEST.index(), 0);
        assert_eq!(Priority::LOWEST.index(), PRIORITY_LEVELS as usize - 1);
    }

    #[test]
    fn test_priority_serde() {
        let p = Priority::new(4).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "4");
        let back: Priority = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<Priority>("42").is_err());
    }
}
