//! Working-hours validation
//!
//! Requested times are `"ASAP"` or `"YYYY-MM-DD HH:MM"` in the restaurant's
//! local clock; `now` is supplied by the caller in the same clock so the
//! checks stay pure and testable. Window bounds compare "HH:MM" strings
//! lexicographically, matching the storefront wire format.

use crate::utils::{AppError, AppResult};
use chrono::{Datelike, NaiveDateTime, Timelike};
use shared::models::{DaySchedule, DeliveryType, WorkingHours};

pub const ASAP: &str = "ASAP";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn day_key(t: NaiveDateTime) -> String {
    t.weekday().to_string().to_lowercase() // "Mon" -> "mon"
}

fn schedule_for<'a>(
    hours: &'a WorkingHours,
    delivery_type: DeliveryType,
    t: NaiveDateTime,
) -> Option<&'a DaySchedule> {
    let map = match delivery_type {
        DeliveryType::Delivery => &hours.delivery,
        // Pickup hours also cover in-house orders.
        DeliveryType::Pickup | DeliveryType::Dine => &hours.pickup,
    };
    // Settings key by full lowercase day name ("monday").
    let full = match t.weekday().number_from_monday() {
        1 => "monday",
        2 => "tuesday",
        3 => "wednesday",
        4 => "thursday",
        5 => "friday",
        6 => "saturday",
        _ => "sunday",
    };
    map.get(full).or_else(|| map.get(&day_key(t)))
}

/// ASAP orders get a half-open window: at exactly closing time the kitchen
/// is already done. An explicitly scheduled time may still name the bound.
fn within_window(t: NaiveDateTime, day: &DaySchedule, half_open: bool) -> bool {
    if day.closed {
        return false;
    }
    let hhmm = format!("{:02}:{:02}", t.hour(), t.minute());
    if hhmm.as_str() < day.start.as_str() {
        return false;
    }
    if half_open {
        hhmm.as_str() < day.end.as_str()
    } else {
        hhmm.as_str() <= day.end.as_str()
    }
}

/// Validate the requested fulfillment time and resolve it to a concrete
/// local timestamp (`now` for ASAP orders).
pub fn validate_order_time(
    requested: &str,
    delivery_type: DeliveryType,
    now: NaiveDateTime,
    hours: &WorkingHours,
) -> AppResult<NaiveDateTime> {
    if requested.trim().eq_ignore_ascii_case(ASAP) {
        let day = schedule_for(hours, delivery_type, now).ok_or(AppError::TimeNotAvailable)?;
        if !within_window(now, day, true) {
            return Err(AppError::TimeNotAvailable);
        }
        return Ok(now);
    }

    let t = NaiveDateTime::parse_from_str(requested.trim(), TIME_FORMAT)
        .map_err(|_| AppError::TimeNotAvailable)?;
    if t < now {
        return Err(AppError::TimeNotAvailable);
    }
    let day = schedule_for(hours, delivery_type, t).ok_or(AppError::TimeNotAvailable)?;
    if !within_window(t, day, false) {
        return Err(AppError::TimeNotAvailable);
    }
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn hours_open(start: &str, end: &str) -> WorkingHours {
        let mut delivery = HashMap::new();
        for day in [
            "monday",
            "tuesday",
            "wednesday",
            "thursday",
            "friday",
            "saturday",
            "sunday",
        ] {
            delivery.insert(
                day.to_string(),
                DaySchedule {
                    start: start.to_string(),
                    end: end.to_string(),
                    closed: false,
                },
            );
        }
        WorkingHours {
            pickup: delivery.clone(),
            delivery,
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn asap_one_minute_before_closing_is_accepted() {
        let hours = hours_open("10:00", "22:00");
        let r = validate_order_time(ASAP, DeliveryType::Delivery, at(21, 59), &hours);
        assert!(r.is_ok());
    }

    #[test]
    fn asap_one_minute_after_closing_is_rejected() {
        let hours = hours_open("10:00", "22:00");
        let r = validate_order_time("asap", DeliveryType::Delivery, at(22, 1), &hours);
        assert!(matches!(r, Err(AppError::TimeNotAvailable)));
    }

    #[test]
    fn asap_at_exactly_closing_time_is_rejected() {
        let hours = hours_open("10:00", "22:00");
        let r = validate_order_time(ASAP, DeliveryType::Delivery, at(22, 0), &hours);
        assert!(matches!(r, Err(AppError::TimeNotAvailable)));
    }

    #[test]
    fn scheduled_order_may_name_the_closing_time() {
        let hours = hours_open("10:00", "22:00");
        let r = validate_order_time(
            "2024-06-03 22:00",
            DeliveryType::Delivery,
            at(12, 0),
            &hours,
        );
        assert!(r.is_ok());
    }

    #[test]
    fn explicit_time_in_the_past_is_rejected() {
        let hours = hours_open("10:00", "22:00");
        let r = validate_order_time(
            "2024-06-03 11:00",
            DeliveryType::Delivery,
            at(12, 0),
            &hours,
        );
        assert!(matches!(r, Err(AppError::TimeNotAvailable)));
    }

    #[test]
    fn explicit_time_inside_window_resolves() {
        let hours = hours_open("10:00", "22:00");
        let t = validate_order_time(
            "2024-06-03 18:30",
            DeliveryType::Pickup,
            at(12, 0),
            &hours,
        )
        .unwrap();
        assert_eq!(t, at(18, 30));
    }

    #[test]
    fn closed_day_rejects_even_inside_hours() {
        let mut hours = hours_open("10:00", "22:00");
        hours.delivery.get_mut("monday").unwrap().closed = true;
        let r = validate_order_time(ASAP, DeliveryType::Delivery, at(12, 0), &hours);
        assert!(matches!(r, Err(AppError::TimeNotAvailable)));
    }

    #[test]
    fn garbage_time_string_is_rejected() {
        let hours = hours_open("10:00", "22:00");
        let r = validate_order_time("tomorrow-ish", DeliveryType::Delivery, at(12, 0), &hours);
        assert!(matches!(r, Err(AppError::TimeNotAvailable)));
    }
}
