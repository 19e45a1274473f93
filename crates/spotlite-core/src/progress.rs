//! Play-head tracking: engine position reports in, percent and `M:SS` out.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProgressTracker {
    current_time_secs: f64,
    duration_secs: f64,
    progress_percent: f64,
}

impl ProgressTracker {
    pub fn current_time_secs(&self) -> f64 {
        self.current_time_secs
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    pub fn has_duration(&self) -> bool {
        self.duration_secs > 0.0
    }

    /// Periodic position report.  `duration` may still be unknown right
    /// after a load, in which case the last known duration is kept.
    pub fn on_position(&mut self, position_secs: f64, duration_secs: Option<f64>) {
        self.current_time_secs = sanitize(position_secs);
        if let Some(d) = duration_secs {
            self.duration_secs = sanitize(d);
        }
        self.recompute();
    }

    pub fn on_metadata_loaded(&mut self, duration_secs: f64) {
        self.duration_secs = sanitize(duration_secs);
        self.recompute();
    }

    /// Absolute engine position for a seek gesture, `None` while the
    /// duration is unknown.  The tracker moves to the target immediately.
    pub fn seek_target(&mut self, percent: f64) -> Option<f64> {
        if !self.has_duration() {
            return None;
        }
        let percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let target = percent / 100.0 * self.duration_secs;
        self.current_time_secs = target;
        self.progress_percent = percent;
        Some(target)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn elapsed_label(&self) -> String {
        format_time(self.current_time_secs)
    }

    pub fn duration_label(&self) -> String {
        format_time(self.duration_secs)
    }

    fn recompute(&mut self) {
        self.progress_percent = if self.has_duration() {
            (self.current_time_secs / self.duration_secs * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
    }
}

fn sanitize(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        secs
    } else {
        0.0
    }
}

/// `M:SS` with unpadded minutes, e.g. 125 → `2:05`.
pub fn format_time(secs: f64) -> String {
    let total = sanitize(secs).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_examples() {
        assert_eq!(format_time(125.0), "2:05");
        assert_eq!(format_time(59.0), "0:59");
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.99), "0:59");
        assert_eq!(format_time(3600.0), "60:00");
    }

    #[test]
    fn format_time_guards_bad_input() {
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(-4.0), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
    }

    #[test]
    fn percent_is_zero_until_duration_known() {
        let mut t = ProgressTracker::default();
        t.on_position(12.0, None);
        assert_eq!(t.progress_percent(), 0.0);
        assert_eq!(t.current_time_secs(), 12.0);

        t.on_metadata_loaded(48.0);
        assert_eq!(t.progress_percent(), 25.0);
    }

    #[test]
    fn nan_duration_is_treated_as_unknown() {
        let mut t = ProgressTracker::default();
        t.on_position(10.0, Some(f64::NAN));
        assert_eq!(t.progress_percent(), 0.0);
        assert_eq!(t.duration_label(), "0:00");
    }

    #[test]
    fn seek_then_report_round_trips_percent() {
        let mut t = ProgressTracker::default();
        t.on_metadata_loaded(200.0);
        assert_eq!(t.seek_target(50.0), Some(100.0));
        t.on_position(100.0, Some(200.0));
        assert_eq!(t.progress_percent(), 50.0);
    }

    #[test]
    fn seek_clamps_and_needs_duration() {
        let mut t = ProgressTracker::default();
        assert_eq!(t.seek_target(30.0), None);

        t.on_metadata_loaded(80.0);
        assert_eq!(t.seek_target(150.0), Some(80.0));
        assert_eq!(t.seek_target(-3.0), Some(0.0));
    }

    #[test]
    fn position_past_duration_caps_at_hundred() {
        let mut t = ProgressTracker::default();
        t.on_position(205.0, Some(200.0));
        assert_eq!(t.progress_percent(), 100.0);
    }
}
