/// Highest fraction reported while any request is still outstanding.
const MAX_INCOMPLETE_FRACTION: f32 = 0.999;

/// Byte-weighted progress over a set of load requests.
///
/// A request counts as settled whether it succeeded or failed. Requests are
/// expected to be made up front; the fraction only grows while loads settle.
#[derive(Debug, Clone, Default)]
pub struct LoadProgress {
    requested: usize,
    settled: usize,
    total_bytes: u64,
    loaded_bytes: u64,
    all_loaded_reported: bool,
}

impl LoadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request(&mut self, bytes: u64) {
        self.requested += 1;
        self.total_bytes += bytes;
    }

    /// Marks one request as settled. Returns true exactly once, when the last
    /// outstanding request settles.
    pub fn settle(&mut self, bytes: u64) -> bool {
        if self.settled >= self.requested {
            log::warn!("Settled more loads than were requested");
            return false;
        }

        self.settled += 1;
        self.loaded_bytes = (self.loaded_bytes + bytes).min(self.total_bytes);

        if self.is_complete() && !self.all_loaded_reported {
            self.all_loaded_reported = true;
            return true;
        }

        false
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn settled(&self) -> usize {
        self.settled
    }

    pub fn loaded_bytes(&self) -> u64 {
        self.loaded_bytes
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn is_complete(&self) -> bool {
        self.settled == self.requested
    }

    /// 0.0 to 1.0. Falls back to the settled share of requests when no byte
    /// sizes are known. Stays below 1.0 until the last request settles, even
    /// when the outstanding requests have an unknown size.
    pub fn fraction(&self) -> f32 {
        if self.is_complete() {
            return 1.0;
        }

        let fraction = if self.total_bytes == 0 {
            self.settled as f32 / self.requested as f32
        } else {
            self.loaded_bytes as f32 / self.total_bytes as f32
        };

        fraction.min(MAX_INCOMPLETE_FRACTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_progress_by_bytes() {
        let mut progress = LoadProgress::new();
        for bytes in [10, 20, 30] {
            progress.add_request(bytes);
        }

        assert!(!progress.settle(10));
        assert!((progress.fraction() - 10.0 / 60.0).abs() < 1e-6);

        assert!(!progress.settle(20));
        assert!((progress.fraction() - 0.5).abs() < 1e-6);

        assert!(progress.settle(30));
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn all_loaded_is_reported_once() {
        let mut progress = LoadProgress::new();
        progress.add_request(5);

        assert!(progress.settle(5));
        assert!(!progress.settle(5));
        assert_eq!(progress.settled(), 1);
    }

    #[test]
    fn fraction_never_decreases_in_any_order() {
        let sizes = [7u64, 0, 300, 42, 1];
        let orders = [[0, 1, 2, 3, 4], [4, 3, 2, 1, 0], [2, 0, 4, 1, 3]];

        for order in orders {
            let mut progress = LoadProgress::new();
            sizes.iter().for_each(|bytes| progress.add_request(*bytes));

            let mut previous = progress.fraction();
            for (i, index) in order.iter().enumerate() {
                let completed_all = progress.settle(sizes[*index]);
                let fraction = progress.fraction();

                assert!(fraction >= previous);
                assert_eq!(completed_all, i == order.len() - 1);
                assert_eq!(fraction == 1.0, i == order.len() - 1);
                previous = fraction;
            }
        }
    }

    #[test]
    fn zero_byte_requests_count_by_number() {
        let mut progress = LoadProgress::new();
        progress.add_request(0);
        progress.add_request(0);

        progress.settle(0);
        assert_eq!(progress.fraction(), 0.5);
        progress.settle(0);
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn failed_loads_still_complete_progress() {
        let mut progress = LoadProgress::new();
        progress.add_request(100);
        progress.add_request(0);

        progress.settle(100);
        assert!(progress.fraction() < 1.0);
        assert!(progress.settle(0));
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn unknown_size_request_holds_progress_below_full() {
        let mut progress = LoadProgress::new();
        progress.add_request(0);
        progress.add_request(40);
        progress.add_request(0);

        assert!(!progress.settle(40));
        assert!(progress.fraction() < 1.0);
        assert!(!progress.settle(0));
        assert!(progress.fraction() < 1.0);
        assert!(progress.settle(0));
        assert_eq!(progress.fraction(), 1.0);
    }
}
