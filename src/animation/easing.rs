use std::f32::consts::PI;

use serde::Deserialize;

/// Penner easing curves. Every curve maps 0 to 0 and 1 to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    QuadraticInOut,
    CubicInOut,
    QuarticInOut,
    SinusoidalIn,
    SinusoidalOut,
    SinusoidalInOut,
}

impl Easing {
    pub fn apply(self, k: f32) -> f32 {
        let k = k.clamp(0.0, 1.0);

        match self {
            Easing::Linear => k,
            Easing::QuadraticInOut => {
                let k = k * 2.0;
                if k < 1.0 {
                    0.5 * k * k
                } else {
                    let k = k - 1.0;
                    -0.5 * (k * (k - 2.0) - 1.0)
                }
            }
            Easing::CubicInOut => {
                let k = k * 2.0;
                if k < 1.0 {
                    0.5 * k * k * k
                } else {
                    let k = k - 2.0;
                    0.5 * (k * k * k + 2.0)
                }
            }
            Easing::QuarticInOut => {
                let k = k * 2.0;
                if k < 1.0 {
                    0.5 * k * k * k * k
                } else {
                    let k = k - 2.0;
                    -0.5 * (k * k * k * k - 2.0)
                }
            }
            Easing::SinusoidalIn => 1.0 - (k * PI / 2.0).cos(),
            Easing::SinusoidalOut => (k * PI / 2.0).sin(),
            Easing::SinusoidalInOut => 0.5 * (1.0 - (PI * k).cos()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::QuadraticInOut,
        Easing::CubicInOut,
        Easing::QuarticInOut,
        Easing::SinusoidalIn,
        Easing::SinusoidalOut,
        Easing::SinusoidalInOut,
    ];

    #[test]
    fn curves_are_anchored_at_both_ends() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
    }

    #[test]
    fn in_out_curves_are_symmetric_around_midpoint() {
        for easing in [
            Easing::QuadraticInOut,
            Easing::CubicInOut,
            Easing::QuarticInOut,
            Easing::SinusoidalInOut,
        ] {
            assert!((easing.apply(0.5) - 0.5).abs() < 1e-6, "{easing:?}");
            let a = easing.apply(0.2);
            let b = easing.apply(0.8);
            assert!((a + b - 1.0).abs() < 1e-5, "{easing:?}");
        }
    }

    #[test]
    fn quartic_starts_slower_than_linear() {
        assert!(Easing::QuarticInOut.apply(0.25) < 0.25);
        assert!(Easing::QuarticInOut.apply(0.75) > 0.75);
    }

    #[test]
    fn input_outside_unit_range_is_clamped() {
        assert_eq!(Easing::QuarticInOut.apply(-3.0), 0.0);
        assert_eq!(Easing::SinusoidalInOut.apply(7.0), Easing::SinusoidalInOut.apply(1.0));
    }
}
