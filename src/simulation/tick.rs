//! Frame counter that decides when the simulation advances

/// Counts main-loop iterations; the simulation fires on every tick that is
/// a multiple of the rate, starting with tick 0
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickCounter {
    tick: u64,
    rate: u32,
}

impl TickCounter {
    /// # Panics
    /// If `rate` is zero. [`LifeConfig::validate`](crate::config::LifeConfig::validate)
    /// rejects that earlier.
    pub fn new(rate: u32) -> Self {
        assert!(rate > 0, "tick rate must be at least 1");
        Self { tick: 0, rate }
    }

    /// Ticks elapsed so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Whether the current tick runs the simulation
    pub fn fires(&self) -> bool {
        self.tick % u64::from(self.rate) == 0
    }

    /// Reports whether this tick fires, then moves to the next one.
    /// Call exactly once per loop iteration.
    pub fn advance(&mut self) -> bool {
        let fire = self.fires();
        self.tick += 1;
        fire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_multiples_including_zero() {
        let mut ticks = TickCounter::new(500);
        let fired: Vec<u64> = (0..1501)
            .filter_map(|_| {
                let tick = ticks.tick();
                ticks.advance().then_some(tick)
            })
            .collect();

        assert_eq!(fired, vec![0, 500, 1000, 1500]);
    }

    #[test]
    fn test_increments_once_per_iteration() {
        let mut ticks = TickCounter::new(3);
        for expected in 1..=10 {
            ticks.advance();
            assert_eq!(ticks.tick(), expected);
        }
    }

    #[test]
    fn test_rate_one_fires_every_tick() {
        let mut ticks = TickCounter::new(1);
        assert!((0..10).all(|_| ticks.advance()));
    }

    #[test]
    #[should_panic]
    fn test_zero_rate_panics() {
        TickCounter::new(0);
    }
}
