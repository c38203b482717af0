//! Frame and sound-slice timing.

/// Frames ffmpeg produces for a movie sampled at `hertz`.
///
/// ffmpeg emits a couple of frames beyond `hertz * duration`, which the
/// extra 2 accounts for.
pub fn estimated_frame_count(hertz: u32, duration_secs: f64) -> u64 {
    (f64::from(hertz) * duration_secs.max(0.0) + 2.0) as u64
}

/// Start position, in seconds, of the sound slice belonging to frame `n`
pub fn sound_position(duration_secs: f64, frame_count: u64, frame_number: u64) -> f64 {
    if frame_count == 0 {
        return 0.0;
    }
    duration_secs / frame_count as f64 * frame_number as f64
}

/// Length, in seconds, of the sound slice cut for one frame
pub fn clip_length(hertz: u32) -> f64 {
    1.0 / f64::from(hertz.max(1))
}

/// Format seconds as an ffmpeg timestamp `HH:MM:SS.micros`.
pub fn format_timestamp(secs: f64) -> String {
    let micros = (secs.max(0.0) * 1_000_000.0).round() as u64;
    let hours = micros / 3_600_000_000;
    let minutes = (micros / 60_000_000) % 60;
    let seconds = (micros / 1_000_000) % 60;
    let fraction = micros % 1_000_000;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{fraction:06}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_adds_two_trailing_frames() {
        assert_eq!(estimated_frame_count(1, 10.0), 12);
        assert_eq!(estimated_frame_count(2, 10.4), 22);
        assert_eq!(estimated_frame_count(10, 0.0), 2);
    }

    #[test]
    fn sound_position_scales_with_frame_number() {
        let position = sound_position(12.0, 12, 5);
        assert!((position - 5.0).abs() < 1e-9);
        assert_eq!(sound_position(12.0, 0, 5), 0.0);
    }

    #[test]
    fn clip_length_is_one_frame_period() {
        assert_eq!(clip_length(1), 1.0);
        assert_eq!(clip_length(4), 0.25);
    }

    #[test]
    fn timestamps_carry_hours_minutes_and_micros() {
        assert_eq!(format_timestamp(62.5), "00:01:02.500000");
        assert_eq!(format_timestamp(0.0), "00:00:00.000000");
        assert_eq!(format_timestamp(3723.000001), "01:02:03.000001");
        assert_eq!(format_timestamp(1.0 / 3.0), "00:00:00.333333");
    }

    #[test]
    fn rounding_carries_into_seconds() {
        assert_eq!(format_timestamp(59.9999999), "00:01:00.000000");
    }
}
