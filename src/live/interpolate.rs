//! Age encoding for track points: oldest red and half transparent, newest
//! green and opaque.

use crate::map::Rgb;

fn clamp_unit(t: f64) -> f64 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Two-segment gradient red -> yellow -> green.
pub fn color_from_progress(t: f64) -> Rgb {
    let t = clamp_unit(t);
    if t <= 0.5 {
        Rgb::new(255, (510.0 * t).round() as u8, 0)
    } else {
        Rgb::new((510.0 * (1.0 - t)).round() as u8, 255, 0)
    }
}

/// Linear map of [0,1] onto [0.5,1.0].
pub fn opacity_from_progress(t: f64) -> f64 {
    0.5 + 0.5 * clamp_unit(t)
}

/// Progress of the `index`-th of `count` points. A lone point counts as newest.
pub fn progress(index: usize, count: usize) -> f64 {
    if count <= 1 {
        1.0
    } else {
        index as f64 / (count - 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_endpoints() {
        assert_eq!(color_from_progress(0.0), Rgb::new(255, 0, 0));
        assert_eq!(color_from_progress(0.5), Rgb::new(255, 255, 0));
        assert_eq!(color_from_progress(1.0), Rgb::new(0, 255, 0));
    }

    #[test]
    fn gradient_midpoints() {
        assert_eq!(color_from_progress(0.25), Rgb::new(255, 128, 0));
        assert_eq!(color_from_progress(0.75), Rgb::new(128, 255, 0));
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_eq!(color_from_progress(-3.0), Rgb::new(255, 0, 0));
        assert_eq!(color_from_progress(7.0), Rgb::new(0, 255, 0));
        assert_eq!(opacity_from_progress(-1.0), 0.5);
        assert_eq!(opacity_from_progress(2.0), 1.0);
        assert_eq!(opacity_from_progress(f64::NAN), 0.5);
    }

    #[test]
    fn opacity_is_bounded_and_monotonic() {
        let mut previous = 0.0;
        for step in 0..=100 {
            let opacity = opacity_from_progress(step as f64 / 100.0);
            assert!((0.5..=1.0).contains(&opacity));
            assert!(opacity >= previous);
            previous = opacity;
        }
    }

    #[test]
    fn single_point_is_newest() {
        assert_eq!(progress(0, 1), 1.0);
        assert_eq!(progress(0, 0), 1.0);
        assert_eq!(progress(0, 5), 0.0);
        assert_eq!(progress(2, 5), 0.5);
        assert_eq!(progress(4, 5), 1.0);
    }

    #[test]
    fn css_rendering() {
        assert_eq!(color_from_progress(0.5).to_string(), "rgb(255,255,0)");
    }
}
