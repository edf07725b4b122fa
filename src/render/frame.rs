use crate::config::{DEFAULT_DITHER, DEFAULT_MAX_REFRESH_RATE};

/// Gaps longer than this between frames are treated as a clock discontinuity.
pub const MAX_PLAUSIBLE_FRAME_GAP: f64 = 60.0;
/// A frame this close to the refresh interval still renders, absorbing timer jitter.
pub const FRAME_PACING_SLACK_MS: f64 = 2.0;
const DELTA_SMOOTHING: f32 = 0.1;

/// Seconds between two millisecond timestamps. Backwards or absurd jumps yield 0.
pub fn sanitize_delta(previous_ms: Option<f64>, now_ms: f64) -> f32 {
    let Some(previous) = previous_ms else {
        return 0.0;
    };
    let seconds = (now_ms - previous) / 1000.0;
    if seconds.is_finite() && (0.0..=MAX_PLAUSIBLE_FRAME_GAP).contains(&seconds) {
        seconds as f32
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct FrameState {
    width: u32,
    height: u32,
    first_frame_ms: Option<f64>,
    last_frame_ms: Option<f64>,
    frame_count: u64,
    max_refresh_rate: u8,
    dither: u8,
    delta: f32,
    smoothed_delta: f32,
}

impl FrameState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            first_frame_ms: None,
            last_frame_ms: None,
            frame_count: 0,
            max_refresh_rate: DEFAULT_MAX_REFRESH_RATE,
            dither: DEFAULT_DITHER,
            delta: 0.0,
            smoothed_delta: 0.0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_size(&mut self, width: u32, height: u32) -> bool {
        let size = (width.max(1), height.max(1));
        if size == self.size() {
            return false;
        }
        (self.width, self.height) = size;
        true
    }

    pub fn max_refresh_rate(&self) -> u8 {
        self.max_refresh_rate
    }

    pub fn set_max_refresh_rate(&mut self, fps: u8) {
        self.max_refresh_rate = fps;
    }

    pub fn dither(&self) -> u8 {
        self.dither
    }

    pub fn set_dither(&mut self, level: u8) {
        self.dither = level;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn delta_time(&self) -> f32 {
        self.delta
    }

    pub fn smoothed_delta(&self) -> f32 {
        self.smoothed_delta
    }

    pub fn millis(&self) -> u32 {
        match (self.first_frame_ms, self.last_frame_ms) {
            (Some(first), Some(last)) => (last - first).max(0.0) as u32,
            _ => 0,
        }
    }

    fn min_frame_interval_ms(&self) -> Option<f64> {
        (self.max_refresh_rate > 0).then(|| 1000.0 / self.max_refresh_rate as f64)
    }

    /// Starts a frame at `now_ms`. Returns the clamped delta in seconds, or `None`
    /// when the frame arrives too early for the refresh cap and should be skipped.
    pub fn begin_frame(&mut self, now_ms: f64) -> Option<f32> {
        if !now_ms.is_finite() {
            log::trace!("Non-finite frame timestamp {now_ms}");
            self.frame_count += 1;
            self.delta = 0.0;
            return Some(0.0);
        }

        if let (Some(last), Some(interval)) = (self.last_frame_ms, self.min_frame_interval_ms()) {
            let elapsed = now_ms - last;
            if elapsed >= 0.0 && elapsed < interval - FRAME_PACING_SLACK_MS {
                return None;
            }
        }

        let delta = sanitize_delta(self.last_frame_ms, now_ms);
        if self.first_frame_ms.is_none() {
            self.first_frame_ms = Some(now_ms);
        }
        self.last_frame_ms = Some(now_ms);
        self.frame_count += 1;
        self.delta = delta;
        self.smoothed_delta = if self.frame_count <= 2 {
            delta
        } else {
            self.smoothed_delta + (delta - self.smoothed_delta) * DELTA_SMOOTHING
        };
        Some(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_frame_has_zero_delta() {
        let mut frame = FrameState::new(800, 600);
        assert_eq!(frame.begin_frame(1000.0), Some(0.0));
        assert_eq!(frame.frame_count(), 1);
    }

    #[test]
    fn regular_frames_report_seconds() {
        let mut frame = FrameState::new(800, 600);
        frame.begin_frame(0.0);
        let delta = frame.begin_frame(16.7).unwrap();
        assert_relative_eq!(delta, 0.0167, epsilon = 1e-6);
        assert_eq!(frame.millis(), 16);
    }

    #[test]
    fn backwards_clock_yields_zero() {
        let mut frame = FrameState::new(800, 600);
        frame.begin_frame(5000.0);
        assert_eq!(frame.begin_frame(1000.0), Some(0.0));
        assert_eq!(sanitize_delta(Some(0.0), 3_600_000.0), 0.0);
        assert_eq!(sanitize_delta(Some(0.0), f64::NAN), 0.0);
    }

    #[test]
    fn refresh_cap_skips_early_frames() {
        let mut frame = FrameState::new(800, 600);
        frame.set_max_refresh_rate(30);
        frame.begin_frame(0.0);
        assert_eq!(frame.begin_frame(16.0), None);
        assert_eq!(frame.frame_count(), 1);
        assert!(frame.begin_frame(33.0).is_some());
        assert_eq!(frame.frame_count(), 2);
    }

    #[test]
    fn jitter_within_slack_still_renders() {
        let mut frame = FrameState::new(800, 600);
        frame.begin_frame(0.0);
        assert!(frame.begin_frame(15.5).is_some());
    }

    #[test]
    fn uncapped_renders_everything() {
        let mut frame = FrameState::new(800, 600);
        frame.set_max_refresh_rate(0);
        frame.begin_frame(0.0);
        assert!(frame.begin_frame(1.0).is_some());
    }

    #[test]
    fn smoothing_converges() {
        let mut frame = FrameState::new(800, 600);
        frame.set_max_refresh_rate(0);
        let mut t = 0.0;
        for _ in 0..200 {
            frame.begin_frame(t);
            t += 20.0;
        }
        assert_relative_eq!(frame.smoothed_delta(), 0.02, epsilon = 1e-4);
    }

    #[test]
    fn non_finite_timestamps_are_not_recorded() {
        let mut frame = FrameState::new(800, 600);
        frame.set_max_refresh_rate(0);
        assert_eq!(frame.begin_frame(f64::NAN), Some(0.0));
        frame.begin_frame(1000.0);
        assert_eq!(frame.begin_frame(f64::INFINITY), Some(0.0));
        let delta = frame.begin_frame(5000.0).unwrap();
        assert_relative_eq!(delta, 4.0);
        assert_eq!(frame.millis(), 4000);
        assert_eq!(frame.frame_count(), 4);
    }

    #[test]
    fn set_size_reports_changes() {
        let mut frame = FrameState::new(800, 600);
        assert!(!frame.set_size(800, 600));
        assert!(frame.set_size(1024, 768));
        assert!(!frame.set_size(1024, 768));
        frame.set_size(0, 0);
        assert_eq!(frame.size(), (1, 1));
    }
}
