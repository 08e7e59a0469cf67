/// Generational handle: `(index, generation)`.
///
/// Two handles with the same index but different generations never compare
/// equal, so a stale handle cannot alias a newer one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32, u32);

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Handle(index, generation)
    }

    pub fn index(&self) -> u32 {
        self.0
    }

    pub fn generation(&self) -> u32 {
        self.1
    }

    /// Same slot, next generation.
    pub fn next_generation(self) -> Self {
        Handle(self.0, self.1.wrapping_add(1))
    }
}
