//! # Game Mathematics
//!
//! Integer tweening helpers used by the animation clock.

/// Linear integer tween: `from` at progress 0, `to` at progress 1.
///
/// # Examples
///
/// ```
/// use delve::int_tween;
///
/// assert_eq!(int_tween(0, 14, 0.5), 7);
/// assert_eq!(int_tween(0, 14, 1.0), 14);
/// ```
pub fn int_tween(from: i32, to: i32, progress: f32) -> i32 {
    let diff = (to - from) as f32;
    from + (diff * progress).round() as i32
}

/// Out-and-back integer tween: reaches `to` at progress 0.5 and returns to
/// `from` at progress 1.
///
/// # Examples
///
/// ```
/// use delve::int_bounce_tween;
///
/// assert_eq!(int_bounce_tween(10, 15, 0.5), 15);
/// assert_eq!(int_bounce_tween(10, 15, 1.0), 10);
/// ```
pub fn int_bounce_tween(from: i32, to: i32, progress: f32) -> i32 {
    // The distance is doubled because progress runs 0 -> 0.5 -> 0.
    let diff = ((to - from) * 2) as f32;
    let folded = if progress > 0.5 { 1.0 - progress } else { progress };
    from + (diff * folded).round() as i32
}

/// Clamps animation progress into `[0, 1]`.
pub fn clamp_progress(progress: f32) -> f32 {
    progress.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_tween_endpoints() {
        assert_eq!(int_tween(14, 28, 0.0), 14);
        assert_eq!(int_tween(14, 28, 1.0), 28);
        assert_eq!(int_tween(28, 14, 0.25), 25);
    }

    #[test]
    fn test_bounce_returns_home() {
        assert_eq!(int_bounce_tween(0, 5, 0.0), 0);
        assert_eq!(int_bounce_tween(0, 5, 0.25), 3);
        assert_eq!(int_bounce_tween(0, 5, 0.5), 5);
        assert_eq!(int_bounce_tween(0, 5, 1.0), 0);
        assert_eq!(int_bounce_tween(0, -5, 0.5), -5);
    }

    #[test]
    fn test_clamp_progress() {
        assert_eq!(clamp_progress(1.7), 1.0);
        assert_eq!(clamp_progress(-0.1), 0.0);
    }
}
