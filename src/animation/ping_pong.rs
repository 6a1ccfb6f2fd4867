use std::time::Duration;

use glam::Vec3;

use crate::animation::easing::Easing;

const MIN_LEG_DURATION: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingPongPhase {
    /// Travelling from `a` towards `b`
    Out,
    /// Travelling from `b` back to `a`
    Back,
}

/// Perpetual two-state animation between `a` and `b`. When a leg reaches its
/// end the other leg starts, and the leftover time carries over.
#[derive(Debug, Clone)]
pub struct PingPong {
    a: Vec3,
    b: Vec3,
    out_duration: Duration,
    back_duration: Duration,
    easing: Easing,
    phase: PingPongPhase,
    elapsed: Duration,
    legs_completed: u64,
}

impl PingPong {
    pub fn new(
        a: Vec3,
        b: Vec3,
        out_duration: Duration,
        back_duration: Duration,
        easing: Easing,
    ) -> Self {
        Self {
            a,
            b,
            out_duration: out_duration.max(MIN_LEG_DURATION),
            back_duration: back_duration.max(MIN_LEG_DURATION),
            easing,
            phase: PingPongPhase::Out,
            elapsed: Duration::ZERO,
            legs_completed: 0,
        }
    }

    pub fn phase(&self) -> PingPongPhase {
        self.phase
    }

    pub fn legs_completed(&self) -> u64 {
        self.legs_completed
    }

    fn leg_duration(&self) -> Duration {
        match self.phase {
            PingPongPhase::Out => self.out_duration,
            PingPongPhase::Back => self.back_duration,
        }
    }

    pub fn advance(&mut self, delta: Duration) -> Vec3 {
        self.elapsed += delta;

        while self.elapsed >= self.leg_duration() {
            self.elapsed -= self.leg_duration();
            self.legs_completed += 1;
            self.phase = match self.phase {
                PingPongPhase::Out => PingPongPhase::Back,
                PingPongPhase::Back => PingPongPhase::Out,
            };
        }

        self.sample()
    }

    pub fn sample(&self) -> Vec3 {
        let k = self.elapsed.as_secs_f32() / self.leg_duration().as_secs_f32();
        let eased = self.easing.apply(k);

        match self.phase {
            PingPongPhase::Out => self.a.lerp(self.b, eased),
            PingPongPhase::Back => self.b.lerp(self.a, eased),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud_drift() -> PingPong {
        PingPong::new(
            Vec3::new(-2.0, 10.0, 0.0),
            Vec3::new(-1.0, 10.0, -1.0),
            Duration::from_millis(5000),
            Duration::from_millis(4000),
            Easing::SinusoidalInOut,
        )
    }

    #[test]
    fn legs_alternate_forever() {
        let mut drift = cloud_drift();
        let step = Duration::from_millis(100);

        let mut phase_changes = 0;
        let mut last_phase = drift.phase();
        // Ten minutes of simulated frames
        for _ in 0..6000 {
            drift.advance(step);
            if drift.phase() != last_phase {
                phase_changes += 1;
                last_phase = drift.phase();
            }
        }

        // 600 s / 9 s per round trip, two legs each
        assert_eq!(drift.legs_completed(), phase_changes);
        assert!(drift.legs_completed() >= 133);
    }

    #[test]
    fn reaches_each_end_at_leg_boundaries() {
        let mut drift = cloud_drift();

        let at_b = drift.advance(Duration::from_millis(5000));
        assert_eq!(drift.phase(), PingPongPhase::Back);
        assert!(at_b.abs_diff_eq(Vec3::new(-1.0, 10.0, -1.0), 1e-5));

        let at_a = drift.advance(Duration::from_millis(4000));
        assert_eq!(drift.phase(), PingPongPhase::Out);
        assert!(at_a.abs_diff_eq(Vec3::new(-2.0, 10.0, 0.0), 1e-5));
    }

    #[test]
    fn overshoot_carries_into_next_leg() {
        let mut drift = PingPong::new(
            Vec3::ZERO,
            Vec3::X,
            Duration::from_millis(1000),
            Duration::from_millis(1000),
            Easing::Linear,
        );

        let value = drift.advance(Duration::from_millis(1250));
        assert_eq!(drift.phase(), PingPongPhase::Back);
        assert!(value.abs_diff_eq(Vec3::new(0.75, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn huge_delta_does_not_stall() {
        let mut drift = PingPong::new(
            Vec3::ZERO,
            Vec3::X,
            Duration::ZERO,
            Duration::ZERO,
            Easing::Linear,
        );

        drift.advance(Duration::from_millis(10));
        assert_eq!(drift.legs_completed(), 10);
    }
}
