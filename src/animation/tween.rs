use std::time::Duration;

use glam::Vec3;

use crate::animation::easing::Easing;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenStep {
    pub value: Vec3,
    pub finished: bool,
}

/// A one-shot interpolation between two points. Time is accumulated as a
/// `Duration` so that completion lands exactly on `delay + duration`.
#[derive(Debug, Clone)]
pub struct Tween {
    from: Vec3,
    to: Vec3,
    delay: Duration,
    duration: Duration,
    easing: Easing,
    elapsed: Duration,
}

impl Tween {
    pub fn new(from: Vec3, to: Vec3, duration: Duration) -> Self {
        Self {
            from,
            to,
            delay: Duration::ZERO,
            duration,
            easing: Easing::Linear,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn from(&self) -> Vec3 {
        self.from
    }

    pub fn to(&self) -> Vec3 {
        self.to
    }

    pub fn total_duration(&self) -> Duration {
        self.delay + self.duration
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.total_duration()
    }

    pub fn advance(&mut self, delta: Duration) -> TweenStep {
        self.elapsed = (self.elapsed + delta).min(self.total_duration());
        self.sample()
    }

    pub fn sample(&self) -> TweenStep {
        if self.is_finished() {
            return TweenStep {
                value: self.to,
                finished: true,
            };
        }

        // Still waiting out the delay
        if self.elapsed <= self.delay {
            return TweenStep {
                value: self.from,
                finished: false,
            };
        }

        let progress = (self.elapsed - self.delay).as_secs_f32() / self.duration.as_secs_f32();
        let value = self.from.lerp(self.to, self.easing.apply(progress));

        TweenStep {
            value,
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn holds_start_value_during_delay() {
        let mut tween = Tween::new(Vec3::ZERO, Vec3::X, ms(1000)).with_delay(ms(500));

        let step = tween.advance(ms(499));
        assert_eq!(step.value, Vec3::ZERO);
        assert!(!step.finished);
    }

    #[test]
    fn completes_exactly_at_delay_plus_duration() {
        let mut tween = Tween::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), ms(1000))
            .with_delay(ms(500))
            .with_easing(Easing::QuarticInOut);

        for _ in 0..149 {
            assert!(!tween.advance(ms(10)).finished);
        }

        let step = tween.advance(ms(10));
        assert!(step.finished);
        assert_eq!(step.value, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn overshooting_clamps_to_target() {
        let mut tween = Tween::new(Vec3::ZERO, Vec3::ONE, ms(100));
        let step = tween.advance(Duration::from_secs(5));
        assert!(step.finished);
        assert_eq!(step.value, Vec3::ONE);
    }

    #[test]
    fn linear_midpoint() {
        let mut tween = Tween::new(Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0), ms(200));
        let step = tween.advance(ms(100));
        assert!(step.value.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let mut tween = Tween::new(Vec3::ZERO, Vec3::Y, Duration::ZERO);
        let step = tween.advance(Duration::ZERO);
        assert!(step.finished);
        assert_eq!(step.value, Vec3::Y);
    }
}
