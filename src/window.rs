//! Daily time-window evaluation
//!
//! A window is a same-day interval `[startTime, endTime]` in a named IANA
//! timezone. Evaluation converts the current instant into the policy's local
//! clock and checks membership, inclusive on both bounds. Windows never wrap
//! past midnight: `endTime` at or before `startTime` is a policy error, not
//! an overnight window.

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::Error;

/// Position of an instant relative to a policy's daily window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowPosition {
    /// The local time falls within the window, bounds included
    Inside,
    /// The local time falls before the start or after the end
    Outside,
}

/// Evaluate an instant against a daily window
///
/// `start` and `end` are `HH:MM` 24-hour clock times; `time_zone` is an IANA
/// identifier such as `Europe/Berlin`. The window bounds are inclusive: an
/// instant landing exactly on `start` or `end` is [`WindowPosition::Inside`].
///
/// Validation runs regardless of `now`:
/// - an unresolvable timezone is [`Error::InvalidTimeZone`]
/// - a malformed bound is [`Error::InvalidTimeFormat`]
/// - `end <= start` is [`Error::InvalidWindow`]
///
/// Pure apart from trace output; never touches the cluster.
pub fn evaluate(
    now: DateTime<Utc>,
    time_zone: &str,
    start: &str,
    end: &str,
) -> Result<WindowPosition, Error> {
    let tz: Tz = time_zone.parse().map_err(|_| {
        Error::invalid_time_zone(format!("'{time_zone}' is not a recognized IANA timezone"))
    })?;

    let start_time = parse_clock_time(start)?;
    let end_time = parse_clock_time(end)?;

    if end_time < start_time {
        return Err(Error::invalid_window(format!(
            "endTime {end} must be after startTime {start}"
        )));
    }
    if end_time == start_time {
        return Err(Error::invalid_window(format!(
            "endTime {end} equals startTime, window has no duration"
        )));
    }

    let local = now.with_timezone(&tz).time();
    let position = if local >= start_time && local <= end_time {
        WindowPosition::Inside
    } else {
        WindowPosition::Outside
    };

    debug!(
        time_zone,
        local = %local.format("%H:%M:%S"),
        start,
        end,
        ?position,
        "evaluated window"
    );

    Ok(position)
}

/// Parse an `HH:MM` 24-hour clock time
fn parse_clock_time(value: &str) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| Error::invalid_time_format(format!("'{value}' is not a valid HH:MM time")))
}
