//! Recursion depth and time budget of a shove operation

use std::time::{Duration, Instant};

/// Wall clock limit of an operation; polled between recursive steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub const NONE: Deadline = Deadline(None);

    pub fn after(limit: Duration) -> Self {
        Deadline(Instant::now().checked_add(limit))
    }

    pub fn expired(&self) -> bool {
        self.0.map_or(false, |at| Instant::now() >= at)
    }
}

/// Remaining depths for nested shoves, passed down by value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursionBudget {
    pub general: i32,
    pub via: i32,
    pub deadline: Deadline,
}

impl RecursionBudget {
    pub fn new(general: i32, via: i32, deadline: Deadline) -> Self {
        Self { general, via, deadline }
    }

    /// One level deeper for trace shoves
    pub fn descend(&self) -> Self {
        Self {
            general: self.general - 1,
            ..*self
        }
    }

    /// One level deeper for via shoves; the general depth is kept
    pub fn descend_via(&self) -> Self {
        Self {
            via: self.via - 1,
            ..*self
        }
    }

    pub fn expired(&self) -> bool {
        self.deadline.expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descend_keeps_other_counter() {
        let budget = RecursionBudget::new(2, 1, Deadline::NONE);
        assert_eq!(budget.descend().general, 1);
        assert_eq!(budget.descend().via, 1);
        assert_eq!(budget.descend_via().via, 0);
        assert_eq!(budget.descend_via().general, 2);
        assert!(!budget.expired());
    }

    #[test]
    fn test_zero_deadline_expires() {
        let budget = RecursionBudget::new(2, 1, Deadline::after(Duration::ZERO));
        assert!(budget.expired());
    }
}
