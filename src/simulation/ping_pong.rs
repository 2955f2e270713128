//! Two-slot double buffer with an explicit "current" index

/// Pair of values that trade the "current" and "next" roles
///
/// Swapping only flips an index; nothing is copied.
#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    current: usize,
}

impl<T> PingPong<T> {
    /// `first` starts out as current
    pub fn new(first: T, second: T) -> Self {
        Self {
            slots: [first, second],
            current: 0,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn next_index(&self) -> usize {
        1 - self.current
    }

    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    pub fn next(&self) -> &T {
        &self.slots[self.next_index()]
    }

    /// Slot by absolute index (0 or 1), regardless of role
    pub fn get(&self, index: usize) -> &T {
        &self.slots[index]
    }

    /// Makes "next" the new "current"
    pub fn swap(&mut self) {
        self.current = self.next_index();
    }
}
