//! Daily run scheduling.

use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Time from `now` until the next occurrence of `at`.
///
/// If `now` is exactly `at`, the next occurrence is tomorrow's.
pub fn next_run_delay(now: NaiveDateTime, at: NaiveTime) -> Duration {
    let today = now.date().and_time(at);
    let next = if today > now {
        today
    } else {
        today.checked_add_days(Days::new(1)).unwrap_or(today)
    };
    (next - now).to_std().unwrap_or_default()
}

/// Run `job` every day at local time `at`, forever.
///
/// The job receives the local time it was started at. It is expected to
/// report its own failures; the loop never stops on one.
pub async fn run_daily<F, Fut>(at: NaiveTime, mut job: F)
where
    F: FnMut(NaiveDateTime) -> Fut,
    Fut: Future<Output = ()>,
{
    info!(%at, "Scheduler started; running daily");
    loop {
        let now = Local::now().naive_local();
        let delay = next_run_delay(now, at);
        info!(wait_secs = delay.as_secs(), "Waiting for next run");
        sleep(delay).await;
        job(Local::now().naive_local()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn test_later_today() {
        assert_eq!(next_run_delay(at(8, 30, 0), nine()), Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_already_passed_waits_for_tomorrow() {
        assert_eq!(next_run_delay(at(9, 0, 1), nine()), Duration::from_secs(24 * 3600 - 1));
        assert_eq!(next_run_delay(at(23, 0, 0), nine()), Duration::from_secs(10 * 3600));
    }

    #[test]
    fn test_exactly_now_is_tomorrow() {
        assert_eq!(next_run_delay(at(9, 0, 0), nine()), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_crosses_month_end() {
        let now = NaiveDate::from_ymd_opt(2025, 5, 31)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(next_run_delay(now, nine()), Duration::from_secs(21 * 3600));
    }
}
