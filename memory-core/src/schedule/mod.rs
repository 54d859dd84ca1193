//! Schedule Parser (spec §4.I): natural-language and cron schedule
//! expressions, canonicalized to a [`Trigger`].
//!
//! The natural-language regex set and the `sunday: 0` weekday mapping are
//! grounded in the scheduler this system was distilled from.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use regex::Regex;

use crate::error::{Error, Result};
use crate::types::{Trigger, TriggerKind};

fn weekday_num(name: &str) -> Option<u8> {
    Some(match name {
        "sunday" => 0,
        "monday" => 1,
        "tuesday" => 2,
        "wednesday" => 3,
        "thursday" => 4,
        "friday" => 5,
        "saturday" => 6,
        _ => return None,
    })
}

fn parse_time(hour_str: &str, minute_str: Option<&str>, ampm: &str) -> (u32, u32) {
    let mut hour: u32 = hour_str.parse().unwrap_or(0);
    let minute: u32 = minute_str.and_then(|m| m.parse().ok()).unwrap_or(0);
    if ampm.eq_ignore_ascii_case("pm") && hour != 12 {
        hour += 12;
    } else if ampm.eq_ignore_ascii_case("am") && hour == 12 {
        hour = 0;
    }
    (minute, hour)
}

const WEEKDAY_ALT: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";

/// Parse a schedule expression into a canonical [`Trigger`] (spec §4.I).
/// Undefined input returns `None`; the caller treats the task as
/// unschedulable rather than erroring.
#[must_use]
pub fn parse(expr: &str, tz: &str) -> Option<Trigger> {
    let normalized = expr.to_lowercase().trim().to_string();

    if let Some(value) = parse_at_token(&normalized) {
        return Some(Trigger {
            kind: TriggerKind::Cron,
            value,
            tz: tz.to_string(),
        });
    }

    if is_canonical_cron(&normalized) {
        return Some(Trigger {
            kind: TriggerKind::Cron,
            value: normalized,
            tz: tz.to_string(),
        });
    }

    if let Some(value) = parse_natural_language(&normalized) {
        let kind = if value.split_whitespace().count() == 6 {
            TriggerKind::Interval
        } else {
            TriggerKind::Cron
        };
        return Some(Trigger {
            kind,
            value,
            tz: tz.to_string(),
        });
    }

    None
}

fn is_canonical_cron(expr: &str) -> bool {
    let tokens: Vec<&str> = expr.split_whitespace().collect();
    (tokens.len() == 5 || tokens.len() == 6)
        && tokens
            .iter()
            .all(|t| t.chars().all(|c| c.is_ascii_digit() || "*/,-".contains(c)))
}

fn parse_at_token(expr: &str) -> Option<String> {
    match expr {
        "@daily" => Some("0 9 * * *".to_string()),
        "@weekly" => Some("0 20 * * 0".to_string()),
        "@monthly" => Some("0 9 1 * *".to_string()),
        _ => None,
    }
}

fn parse_natural_language(expr: &str) -> Option<String> {
    let every_weekday_at = Regex::new(&format!(
        r"^every\s+({WEEKDAY_ALT})\s+at\s+(\d{{1,2}}):?(\d{{2}})?\s*(am|pm)$"
    ))
    .ok()?;
    if let Some(c) = every_weekday_at.captures(expr) {
        let weekday = weekday_num(&c[1])?;
        let (minute, hour) = parse_time(&c[2], c.get(3).map(|m| m.as_str()), &c[4]);
        return Some(format!("{minute} {hour} * * {weekday}"));
    }

    let weekday_at_no_every = Regex::new(&format!(
        r"^({WEEKDAY_ALT})\s+at\s+(\d{{1,2}}):?(\d{{2}})?\s*(am|pm)$"
    ))
    .ok()?;
    if let Some(c) = weekday_at_no_every.captures(expr) {
        let weekday = weekday_num(&c[1])?;
        let (minute, hour) = parse_time(&c[2], c.get(3).map(|m| m.as_str()), &c[4]);
        return Some(format!("{minute} {hour} * * {weekday}"));
    }

    let daily_at = Regex::new(r"^daily\s+at\s+(\d{1,2}):?(\d{2})?\s*(am|pm)$").ok()?;
    if let Some(c) = daily_at.captures(expr) {
        let (minute, hour) = parse_time(&c[1], c.get(2).map(|m| m.as_str()), &c[3]);
        return Some(format!("{minute} {hour} * * *"));
    }

    let every_weekday_keyword = Regex::new(r"^every\s+weekday\s+at\s+(\d{1,2}):?(\d{2})?\s*(am|pm)$").ok()?;
    if let Some(c) = every_weekday_keyword.captures(expr) {
        let (minute, hour) = parse_time(&c[1], c.get(2).map(|m| m.as_str()), &c[3]);
        return Some(format!("{minute} {hour} * * 1-5"));
    }

    let every_minutes = Regex::new(r"^every\s+(\d+)\s+minutes?$").ok()?;
    if let Some(c) = every_minutes.captures(expr) {
        return Some(format!("*/{} * * * *", &c[1]));
    }

    let every_hours = Regex::new(r"^every\s+(\d+)\s+hours?$").ok()?;
    if let Some(c) = every_hours.captures(expr) {
        return Some(format!("0 */{} * * *", &c[1]));
    }

    let every_seconds = Regex::new(r"^every\s+(\d+)\s+seconds?$").ok()?;
    if let Some(c) = every_seconds.captures(expr) {
        return Some(format!("*/{} * * * * *", &c[1]));
    }

    let first_weekday_of_month = Regex::new(&format!(
        r"^first\s+({WEEKDAY_ALT})\s+of\s+each\s+month\s+at\s+(\d{{1,2}}):?(\d{{2}})?\s*(am|pm)$"
    ))
    .ok()?;
    if let Some(c) = first_weekday_of_month.captures(expr) {
        let weekday = weekday_num(&c[1])?;
        let (minute, hour) = parse_time(&c[2], c.get(3).map(|m| m.as_str()), &c[4]);
        return Some(format!("{minute} {hour} 1-7 * {weekday}"));
    }

    let last_day_of_month = Regex::new(r"^last\s+day\s+of\s+each\s+month\s+at\s+(\d{1,2}):?(\d{2})?\s*(am|pm)$").ok()?;
    if let Some(c) = last_day_of_month.captures(expr) {
        let (minute, hour) = parse_time(&c[1], c.get(2).map(|m| m.as_str()), &c[3]);
        return Some(format!("{minute} {hour} 28-31 * *"));
    }

    None
}

/// Compute the next fire instant (UTC) strictly after `after`.
///
/// # Errors
///
/// Returns [`Error::InputError`] if `trigger.value` is not a valid cron
/// expression, or if `trigger.tz` is not a recognized IANA timezone.
pub fn next_fire(trigger: &Trigger, after: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let tz: Tz = trigger
        .tz
        .parse()
        .map_err(|_| Error::InputError(format!("unrecognized timezone: {}", trigger.tz)))?;

    let canonical = canonicalize_for_cron_crate(&trigger.value);
    let schedule = Schedule::from_str(&canonical)
        .map_err(|e| Error::InputError(format!("invalid schedule expression: {e}")))?;

    let local_after = after.with_timezone(&tz);
    schedule
        .after(&local_after)
        .next()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::InputError("schedule has no future occurrences".to_string()))
}

/// The `cron` crate expects a leading seconds field; our 5-field canonical
/// expressions (`min hour dom mon dow`) omit it, so prepend `0`.
fn canonicalize_for_cron_crate(value: &str) -> String {
    if value.split_whitespace().count() == 5 {
        format!("0 {value}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cron_value(expr: &str) -> String {
        parse(expr, "UTC").unwrap().value
    }

    #[test]
    fn every_sunday_at_8pm() {
        assert_eq!(cron_value("every Sunday at 8pm"), "0 20 * * 0");
    }

    #[test]
    fn daily_at_9am() {
        assert_eq!(cron_value("daily at 9am"), "0 9 * * *");
    }

    #[test]
    fn every_5_minutes() {
        assert_eq!(cron_value("every 5 minutes"), "*/5 * * * *");
    }

    #[test]
    fn gibberish_is_none() {
        assert!(parse("gibberish", "UTC").is_none());
    }

    #[test]
    fn weekday_without_every() {
        assert_eq!(cron_value("Saturday at 2:05pm"), "5 14 * * 6");
    }

    #[test]
    fn every_weekday_keyword() {
        assert_eq!(cron_value("every weekday at 8:30am"), "30 8 * * 1-5");
    }

    #[test]
    fn first_weekday_of_month() {
        assert_eq!(
            cron_value("first monday of each month at 10am"),
            "0 10 1-7 * 1"
        );
    }

    #[test]
    fn last_day_of_month() {
        assert_eq!(cron_value("last day of each month at 11pm"), "0 23 28-31 * *");
    }

    #[test]
    fn parsing_same_expression_twice_is_idempotent() {
        assert_eq!(parse("every Sunday at 8pm", "UTC"), parse("every Sunday at 8pm", "UTC"));
    }

    #[test]
    fn at_daily_maps_to_nine_am() {
        assert_eq!(cron_value("@daily"), "0 9 * * *");
    }

    #[test]
    fn canonical_cron_passes_through() {
        assert_eq!(cron_value("*/15 * * * *"), "*/15 * * * *");
    }

    #[test]
    fn next_fire_advances_strictly_after_input() {
        let trigger = parse("every 5 minutes", "UTC").unwrap();
        let now = Utc::now();
        let next = next_fire(&trigger, now).unwrap();
        assert!(next > now);
    }
}
