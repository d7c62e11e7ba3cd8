//! # Window Calculation
//!
//! Pure time arithmetic turning stage parameters and the current instant
//! into the closed UTC interval of qualifying event times.
//!
//! Two modes exist:
//!
//! - **Relative**: `[now - (T+W)h, now - (T-W)h]` — a `2W`-wide window that
//!   slides continuously with `now`. A run that happens too late can miss
//!   event times entirely; the permanent dedup ledger only prevents
//!   duplicates, it does not backfill coverage.
//! - **Fixed local day**: one full local calendar day, `max(1, T/24)` days
//!   back, using a static UTC offset. The same window is produced no matter
//!   what hour the orchestrator runs that day.

use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDateTime, Utc};

use crate::error::{ReminderError, Result};

/// Closed UTC interval of qualifying event times for one stage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub mode: WindowMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Relative,
    FixedLocalDay,
}

impl CampaignWindow {
    /// Express the window in local wall-clock time for comparison against
    /// event timestamps stored in local time (same static offset).
    pub fn local_bounds(&self, offset: FixedOffset) -> (NaiveDateTime, NaiveDateTime) {
        let shift = Duration::seconds(i64::from(offset.local_minus_utc()));
        ((self.start + shift).naive_utc(), (self.end + shift).naive_utc())
    }
}

/// Parse a static offset string like `-06:00` or `+05:30`.
pub fn parse_tz_offset(raw: &str) -> Result<FixedOffset> {
    let s = raw.trim();
    let bad = || {
        ReminderError::configuration(
            "LOCAL_TZ_OFFSET",
            format!("invalid offset {raw:?}, expected e.g. -06:00"),
        )
    };

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1i32, &s[1..]),
        Some(b'+') => (1i32, &s[1..]),
        Some(_) => (1i32, s),
        None => return Err(bad()),
    };
    // The sign applies to the whole offset; the components themselves must
    // be unsigned, so "+05:-30" is rejected rather than parsed as nonsense.
    let (hh, mm) = rest.split_once(':').ok_or_else(bad)?;
    let hours: u32 = hh.parse().map_err(|_| bad())?;
    let minutes: u32 = mm.parse().map_err(|_| bad())?;
    if hours > 14 || minutes > 59 {
        return Err(bad());
    }

    FixedOffset::east_opt(sign * (hours as i32 * 3600 + minutes as i32 * 60)).ok_or_else(bad)
}

/// Relative window: `target ± tolerance` hours behind `now`.
///
/// When `target < tolerance`, `end` lands after `now`; that is allowed
/// (candidates already eligible), not clamped.
pub fn relative_window(now: DateTime<Utc>, target_hours: i64, tolerance_hours: i64) -> CampaignWindow {
    CampaignWindow {
        start: now - Duration::hours(target_hours + tolerance_hours),
        end: now - Duration::hours(target_hours - tolerance_hours),
        mode: WindowMode::Relative,
    }
}

/// Fixed-local-day window: the full local calendar day `max(1, target/24)`
/// days before today (local), expressed as UTC instants.
pub fn fixed_local_day_window(
    now: DateTime<Utc>,
    target_hours: i64,
    offset: FixedOffset,
) -> CampaignWindow {
    let days_back = (target_hours / 24).max(1) as u64;

    let today_local = now.with_timezone(&offset).date_naive();
    let target_date = today_local
        .checked_sub_days(Days::new(days_back))
        .unwrap_or(today_local);

    // 00:00:00.000 .. 23:59:59.999 of the local date; midnight and the
    // last-millisecond stamp always exist on a calendar date.
    let start_local = target_date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let end_local = target_date
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_default();

    // UTC = local - offset
    let shift = Duration::seconds(i64::from(offset.local_minus_utc()));
    CampaignWindow {
        start: DateTime::from_naive_utc_and_offset(start_local - shift, Utc),
        end: DateTime::from_naive_utc_and_offset(end_local - shift, Utc),
        mode: WindowMode::FixedLocalDay,
    }
}

/// Compute the stage window for `now` under the configured mode.
pub fn compute_window(
    now: DateTime<Utc>,
    target_hours: i64,
    tolerance_hours: i64,
    fixed_day_mode: bool,
    tz_offset: &str,
) -> Result<CampaignWindow> {
    if fixed_day_mode {
        let offset = parse_tz_offset(tz_offset)?;
        Ok(fixed_local_day_window(now, target_hours, offset))
    } else {
        Ok(relative_window(now, target_hours, tolerance_hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn relative_window_is_twice_the_tolerance_wide() {
        let now = utc(2025, 3, 10, 12, 0);
        for (t, w) in [(24i64, 6i64), (48, 6), (72, 6), (24, 12)] {
            let win = relative_window(now, t, w);
            assert_eq!(win.end - win.start, Duration::hours(2 * w));
        }
    }

    #[test]
    fn relative_window_slides_with_now() {
        let now = utc(2025, 3, 10, 12, 0);
        let later = now + Duration::minutes(45);
        let a = relative_window(now, 24, 6);
        let b = relative_window(later, 24, 6);
        assert_eq!(b.start - a.start, Duration::minutes(45));
        assert_eq!(b.end - a.end, Duration::minutes(45));
    }

    #[test]
    fn relative_window_example_from_stage_parameters() {
        // T=24, W=6, now = day D 12:00 UTC => [D-1 06:00, D-1 18:00]
        let now = utc(2025, 3, 10, 12, 0);
        let win = relative_window(now, 24, 6);
        assert_eq!(win.start, utc(2025, 3, 9, 6, 0));
        assert_eq!(win.end, utc(2025, 3, 9, 18, 0));
    }

    #[test]
    fn relative_window_allows_end_after_now_when_target_below_tolerance() {
        let now = utc(2025, 3, 10, 12, 0);
        let win = relative_window(now, 2, 6);
        assert!(win.end > now);
        assert!(win.start < win.end);
    }

    #[test]
    fn fixed_day_window_days_back() {
        let offset = parse_tz_offset("-06:00").unwrap();
        let now = utc(2025, 3, 10, 9, 0); // 03:00 local
        for (t, back) in [(24i64, 1i64), (48, 2), (72, 3), (30, 1)] {
            let win = fixed_local_day_window(now, t, offset);
            let local_start = (win.start + Duration::hours(-6)).date_naive();
            let expected = now.with_timezone(&offset).date_naive() - Duration::days(back);
            assert_eq!(local_start, expected, "target_hours={t}");
        }
    }

    #[test]
    fn fixed_day_window_utc_bounds() {
        // offset -06:00, now = D 09:00 UTC => [D-1 06:00:00, D 05:59:59.999]
        let offset = parse_tz_offset("-06:00").unwrap();
        let now = utc(2025, 3, 10, 9, 0);
        let win = fixed_local_day_window(now, 24, offset);
        assert_eq!(win.start, utc(2025, 3, 9, 6, 0));
        assert_eq!(
            win.end,
            utc(2025, 3, 10, 5, 59) + Duration::seconds(59) + Duration::milliseconds(999)
        );
    }

    #[test]
    fn fixed_day_window_stable_within_the_local_day() {
        let offset = parse_tz_offset("-06:00").unwrap();
        let morning = utc(2025, 3, 10, 9, 0); // 03:00 local
        let evening = utc(2025, 3, 11, 3, 0); // 21:00 local, same local day
        assert_eq!(
            fixed_local_day_window(morning, 48, offset),
            fixed_local_day_window(evening, 48, offset)
        );
    }

    #[test]
    fn local_bounds_shift_by_the_offset() {
        let offset = parse_tz_offset("-06:00").unwrap();
        let win = relative_window(utc(2025, 3, 10, 12, 0), 24, 6);
        let (start_local, _) = win.local_bounds(offset);
        assert_eq!(start_local, (win.start - Duration::hours(6)).naive_utc());
    }

    #[test]
    fn parses_positive_and_negative_offsets() {
        assert_eq!(
            parse_tz_offset("-06:00").unwrap(),
            FixedOffset::west_opt(6 * 3600).unwrap()
        );
        assert_eq!(
            parse_tz_offset("+05:30").unwrap(),
            FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
        );
        assert!(parse_tz_offset("6h").is_err());
        assert!(parse_tz_offset("").is_err());
    }

    #[test]
    fn rejects_signed_offset_components() {
        assert!(parse_tz_offset("+05:-30").is_err());
        assert!(parse_tz_offset("--06:00").is_err());
        assert!(parse_tz_offset("+15:00").is_err());
        assert!(parse_tz_offset("+05:60").is_err());
    }
}
