use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upload => write!(f, "upload"),
            Direction::Download => write!(f, "download"),
        }
    }
}

/// Byte and time accounting for one data transfer.
#[derive(Debug, Clone)]
pub struct TransferState {
    direction: Direction,
    start: Instant,
    bytes: u64,
}

impl TransferState {
    pub fn new(direction: Direction) -> Self {
        Self::starting_at(direction, Instant::now())
    }

    pub fn starting_at(direction: Direction, start: Instant) -> Self {
        Self {
            direction,
            start,
            bytes: 0,
        }
    }

    pub fn add_bytes(&mut self, n: u64) {
        self.bytes += n;
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Average rate since the start, in KiB/s.
    pub fn average_speed_kbps(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes as f64 / 1024.0 / secs
    }

    /// How long to sleep to keep the average rate at or below `max_speed_kbps`.
    pub fn pace_delay(&self, max_speed_kbps: u32, min_sleep: Duration) -> Duration {
        pace_delay_for(self.bytes, self.elapsed(), max_speed_kbps, min_sleep)
    }

    pub async fn pace_sleep(&self, max_speed_kbps: u32, min_sleep: Duration) {
        let delay = self.pace_delay(max_speed_kbps, min_sleep);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// `max(bytes / 1024 / max_speed_kbps − elapsed, min_sleep)`, never negative.
/// A limit of zero means unlimited and yields `min_sleep`.
pub fn pace_delay_for(
    bytes: u64,
    elapsed: Duration,
    max_speed_kbps: u32,
    min_sleep: Duration,
) -> Duration {
    if max_speed_kbps == 0 {
        return min_sleep;
    }
    let expected = Duration::from_secs_f64(bytes as f64 / 1024.0 / max_speed_kbps as f64);
    expected.saturating_sub(elapsed).max(min_sleep)
}

/// The lower non-zero of two KiB/s limits; zero when both are unlimited.
pub fn effective_speed_limit(global: u32, user: u32) -> u32 {
    match (global, user) {
        (0, limit) | (limit, 0) => limit,
        (a, b) => a.min(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pace_delay_behind_schedule() {
        // 100 KiB at 100 KiB/s should take one second; half of it has passed.
        let delay = pace_delay_for(102_400, Duration::from_millis(500), 100, Duration::ZERO);
        assert_eq!(delay, Duration::from_millis(500));
    }

    #[test]
    fn test_pace_delay_floor() {
        let delay = pace_delay_for(
            102_400,
            Duration::from_millis(500),
            100,
            Duration::from_millis(700),
        );
        assert_eq!(delay, Duration::from_millis(700));

        // Ahead of schedule: only the floor is slept.
        let delay = pace_delay_for(1024, Duration::from_secs(5), 100, Duration::from_millis(3));
        assert_eq!(delay, Duration::from_millis(3));

        let delay = pace_delay_for(1024, Duration::from_secs(5), 100, Duration::ZERO);
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn test_pace_delay_unlimited() {
        let delay = pace_delay_for(u64::MAX, Duration::ZERO, 0, Duration::from_millis(1));
        assert_eq!(delay, Duration::from_millis(1));
    }

    #[test]
    fn test_transfer_state_pacing() {
        let start = Instant::now() - Duration::from_millis(500);
        let mut state = TransferState::starting_at(Direction::Download, start);
        state.add_bytes(51_200);
        state.add_bytes(51_200);
        assert_eq!(state.bytes(), 102_400);
        assert_eq!(state.direction(), Direction::Download);

        let delay = state.pace_delay(100, Duration::ZERO);
        assert!(delay <= Duration::from_millis(500));
        assert!(delay >= Duration::from_millis(400));
    }

    #[test]
    fn test_effective_speed_limit() {
        assert_eq!(effective_speed_limit(0, 0), 0);
        assert_eq!(effective_speed_limit(500, 0), 500);
        assert_eq!(effective_speed_limit(0, 200), 200);
        assert_eq!(effective_speed_limit(500, 200), 200);
    }
}
