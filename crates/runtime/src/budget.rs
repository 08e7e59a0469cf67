/// Deterministic frame budgeting.
///
/// Budgets are expressed in abstract "work units" rather than wall-clock time.
/// An animation that may run for at most `n` frames holds a `FrameBudget::new(n)`
/// and consumes one unit per frame it applies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameBudget {
    remaining_units: u32,
}

impl FrameBudget {
    pub fn new(units: u32) -> Self {
        Self {
            remaining_units: units,
        }
    }

    pub fn remaining_units(&self) -> u32 {
        self.remaining_units
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_units == 0
    }

    /// Attempts to consume `units` from the budget.
    ///
    /// Returns `true` if the budget had enough remaining units.
    pub fn try_consume(&mut self, units: u32) -> bool {
        if self.remaining_units < units {
            return false;
        }
        self.remaining_units -= units;
        true
    }
}
