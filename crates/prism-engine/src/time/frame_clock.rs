use std::time::{Duration, Instant};

/// Timing of one frame, handed to the camera and the application.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// When the tick happened.
    pub now: Instant,

    /// Zero-based index of this frame.
    pub frame_index: u64,
}

/// Produces one [`FrameTime`] per redraw.
///
/// Delta time is clamped to `[dt_min, dt_max]` so a debugger pause or a long
/// stall does not fling the camera across the scene.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub const DEFAULT_DT_MIN: Duration = Duration::from_micros(100);
    pub const DEFAULT_DT_MAX: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Clock whose first tick measures from `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            last: start,
            frame_index: 0,
            dt_min: Self::DEFAULT_DT_MIN,
            dt_max: Self::DEFAULT_DT_MAX,
        }
    }

    pub fn with_clamps(mut self, dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        self.dt_min = dt_min;
        self.dt_max = dt_max;
        self
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`. Earlier instants count as zero elapsed.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_frames_pass_through() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);

        let ft = clock.tick_at(start + Duration::from_millis(16));

        assert!((ft.dt - 0.016).abs() < 1e-6);
        assert_eq!(ft.frame_index, 0);
        assert_eq!(clock.tick_at(start + Duration::from_millis(32)).frame_index, 1);
    }

    #[test]
    fn stalls_are_clamped() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);

        let ft = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(ft.dt, 0.25);
    }

    #[test]
    fn zero_and_backwards_steps_get_the_minimum() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut clock = FrameClock::starting_at(start);

        assert_eq!(clock.tick_at(start).dt, FrameClock::DEFAULT_DT_MIN.as_secs_f32());
        let earlier = start - Duration::from_millis(10);
        assert_eq!(clock.tick_at(earlier).dt, FrameClock::DEFAULT_DT_MIN.as_secs_f32());
    }

    #[test]
    fn custom_clamps_apply() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start)
            .with_clamps(Duration::from_millis(10), Duration::from_millis(20));

        assert!((clock.tick_at(start + Duration::from_millis(1)).dt - 0.01).abs() < 1e-6);
        assert!((clock.tick_at(start + Duration::from_secs(1)).dt - 0.02).abs() < 1e-6);
    }
}
