//! Level-meter simulator.
//!
//! Bar heights come from one of two sources, selected by data availability:
//! a rolling buffer of sampled levels fed by the audio sampler, or a
//! smoothed random walk when no samples have arrived yet. While playback is
//! paused all bars collapse to the minimum and updates are suspended.

use std::collections::VecDeque;

use rand::Rng;

pub const LEVEL_MIN: u8 = 1;
pub const LEVEL_MAX: u8 = 10;
const SAMPLE_CAP: usize = 50;

pub struct LevelMeter {
    bars: Vec<u8>,
    samples: VecDeque<u8>,
}

impl LevelMeter {
    pub fn new(bar_count: usize) -> Self {
        Self {
            bars: vec![LEVEL_MIN; bar_count.max(1)],
            samples: VecDeque::new(),
        }
    }

    pub fn heights(&self) -> &[u8] {
        &self.bars
    }

    /// Append a sampled level to the rolling buffer (oldest evicted first).
    pub fn push_sample(&mut self, level: u8) {
        self.samples
            .push_back(level.clamp(LEVEL_MIN, LEVEL_MAX));
        while self.samples.len() > SAMPLE_CAP {
            self.samples.pop_front();
        }
    }

    /// Advance one animation frame.
    pub fn tick<R: Rng>(&mut self, paused: bool, rng: &mut R) {
        if paused {
            self.bars.fill(LEVEL_MIN);
            return;
        }
        match self.samples.pop_front() {
            Some(level) => {
                // Sampled source: scroll left, newest level enters on the right.
                self.bars.rotate_left(1);
                if let Some(last) = self.bars.last_mut() {
                    *last = level;
                }
            }
            None => {
                // Synthetic source: nudge every bar by a bounded delta.
                for bar in &mut self.bars {
                    let delta: i8 = rng.gen_range(-2..=2);
                    *bar = bar
                        .saturating_add_signed(delta)
                        .clamp(LEVEL_MIN, LEVEL_MAX);
                }
            }
        }
    }

    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.samples.len()
    }
}

/// Map a decibel reading onto the `[1, 10]` level range.
///
/// Affine between the configured bounds (default −50 dB → 1, +10 dB → 10),
/// clamped outside them.
pub fn db_to_level(db: f32, floor_db: f32, ceil_db: f32) -> u8 {
    let span = (ceil_db - floor_db).max(f32::EPSILON);
    let frac = ((db - floor_db) / span).clamp(0.0, 1.0);
    let level = 1.0 + frac * f32::from(LEVEL_MAX - LEVEL_MIN);
    (level.round() as u8).clamp(LEVEL_MIN, LEVEL_MAX)
}

/// Spread one measurement into several jittered copies so the meter keeps
/// moving between discrete sampling passes.
pub fn jittered_copies<R: Rng>(level: u8, count: usize, rng: &mut R) -> Vec<u8> {
    (0..count)
        .map(|_| {
            let delta: i8 = rng.gen_range(-1..=1);
            level
                .saturating_add_signed(delta)
                .clamp(LEVEL_MIN, LEVEL_MAX)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_heights_stay_in_range_for_any_samples() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut meter = LevelMeter::new(12);
        for raw in [0u8, 1, 3, 9, 10, 50, 255] {
            meter.push_sample(raw);
        }
        for _ in 0..200 {
            meter.tick(false, &mut rng);
            assert!(meter
                .heights()
                .iter()
                .all(|&h| (LEVEL_MIN..=LEVEL_MAX).contains(&h)));
        }
    }

    #[test]
    fn test_paused_collapses_all_bars_to_min() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut meter = LevelMeter::new(8);
        for _ in 0..20 {
            meter.push_sample(10);
            meter.tick(false, &mut rng);
        }
        meter.tick(true, &mut rng);
        assert!(meter.heights().iter().all(|&h| h == LEVEL_MIN));
    }

    #[test]
    fn test_sample_buffer_caps_at_fifty() {
        let mut meter = LevelMeter::new(8);
        for _ in 0..120 {
            meter.push_sample(5);
        }
        assert_eq!(meter.buffered(), 50);
    }

    #[test]
    fn test_sampled_level_enters_on_the_right() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut meter = LevelMeter::new(4);
        meter.push_sample(9);
        meter.tick(false, &mut rng);
        assert_eq!(*meter.heights().last().unwrap(), 9);
    }

    #[test]
    fn test_db_mapping_bounds_and_clamp() {
        assert_eq!(db_to_level(-50.0, -50.0, 10.0), 1);
        assert_eq!(db_to_level(10.0, -50.0, 10.0), 10);
        assert_eq!(db_to_level(-90.0, -50.0, 10.0), 1);
        assert_eq!(db_to_level(25.0, -50.0, 10.0), 10);
        let mid = db_to_level(-20.0, -50.0, 10.0);
        assert!((5..=6).contains(&mid));
    }

    #[test]
    fn test_jittered_copies_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        for copy in jittered_copies(1, 32, &mut rng) {
            assert!((LEVEL_MIN..=LEVEL_MAX).contains(&copy));
        }
        for copy in jittered_copies(10, 32, &mut rng) {
            assert!((LEVEL_MIN..=LEVEL_MAX).contains(&copy));
        }
    }
}
