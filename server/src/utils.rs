use log::{error, warn};
use rand::Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

/// Shortest period a repeating timer may run at
pub const MIN_TIMER_PERIOD: Duration = Duration::from_millis(1);

// Get current timestamp in milliseconds
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

// Random `#rrggbb` display color for a new player
pub fn generate_color() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..=0xFF_FFFF);
    format!("#{:06x}", value)
}

// Clamp a repeating timer period; tokio rejects a zero period
pub fn timer_period(period: Duration) -> Duration {
    period.max(MIN_TIMER_PERIOD)
}

/// Waits for a background task and logs how it ended. A panic inside the
/// task is reported here instead of tearing down the caller.
pub async fn watch_task(name: &str, handle: JoinHandle<()>) {
    match handle.await {
        Ok(()) => warn!("{} task exited", name),
        Err(e) if e.is_panic() => error!("{} task panicked: {}", name, e),
        Err(e) => warn!("{} task was cancelled: {}", name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_format() {
        for _ in 0..100 {
            let color = generate_color();
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_timestamp_is_monotonic_enough() {
        let first = get_timestamp();
        std::thread::sleep(Duration::from_millis(2));
        assert!(get_timestamp() > first);
    }

    #[test]
    fn test_timer_period_is_never_zero() {
        assert_eq!(timer_period(Duration::ZERO), MIN_TIMER_PERIOD);
        assert_eq!(timer_period(Duration::from_millis(250)), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_watch_task_survives_panic() {
        let handle = tokio::spawn(async {
            panic!("hub loop failure");
        });
        watch_task("Test", handle).await;

        // The runtime is still usable afterwards
        let handle = tokio::spawn(async {});
        watch_task("Test", handle).await;
    }
}
