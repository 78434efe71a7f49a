//! Weekly appointment grid shared by the booking flow and the slot endpoint.
//!
//! Slots are 30 minutes long. The clinic opens at 10:00 and the last slot
//! starts at 20:30. Today starts at the next half-hour boundary (never before
//! opening); the following six days start at opening time.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::Serialize;
use thiserror::Error;

use shared_config::AppConfig;

use crate::models::SlotsBooked;

pub const SLOT_MINUTES: u32 = 30;
pub const DAYS_AHEAD: i64 = 7;
pub const DATE_FORMAT: &str = "%d-%m-%Y";
pub const TIME_FORMAT: &str = "%I:%M %p";

pub fn opening_time() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN)
}

pub fn closing_time() -> NaiveTime {
    NaiveTime::from_hms_opt(21, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("Invalid slot date, expected DD-MM-YYYY")]
    InvalidDate,
    #[error("Invalid slot time, expected HH:MM AM/PM")]
    InvalidTime,
    #[error("Slot time must fall on a 30 minute boundary")]
    OffGrid,
    #[error("Slot time is outside clinic hours")]
    OutsideHours,
    #[error("Slot is in the past")]
    InPast,
    #[error("Slot date is outside the booking window")]
    OutsideWindow,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Slot {
    pub time: String,
    pub date_time: NaiveDateTime,
    pub is_booked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySlots {
    pub date: String,
    pub weekday: String,
    pub slots: Vec<Slot>,
}

impl DaySlots {
    pub fn free_times(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|slot| !slot.is_booked)
            .map(|slot| slot.time.as_str())
            .collect()
    }
}

/// A slot that passed validation, in canonical string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotKey {
    pub date: String,
    pub time: String,
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_slot_date(raw: &str) -> Result<NaiveDate, SlotError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| SlotError::InvalidDate)
}

pub fn parse_slot_time(raw: &str) -> Result<NaiveTime, SlotError> {
    NaiveTime::parse_from_str(&raw.trim().to_ascii_uppercase(), TIME_FORMAT).map_err(|_| SlotError::InvalidTime)
}

/// Current wall-clock time at the clinic.
pub fn clinic_now(config: &AppConfig) -> NaiveDateTime {
    clinic_time(Utc::now(), config)
}

pub fn clinic_time(instant: DateTime<Utc>, config: &AppConfig) -> NaiveDateTime {
    config.clinic_offset().from_utc_datetime(&instant.naive_utc()).naive_local()
}

/// Round up to the next half-hour boundary; boundaries map to themselves.
fn round_up_to_slot(time: NaiveTime) -> Option<NaiveTime> {
    let minutes = time.hour() * 60 + time.minute();
    let on_boundary = minutes % SLOT_MINUTES == 0 && time.second() == 0 && time.nanosecond() == 0;
    let rounded = if on_boundary {
        minutes
    } else {
        (minutes / SLOT_MINUTES + 1) * SLOT_MINUTES
    };
    NaiveTime::from_hms_opt(rounded / 60, rounded % 60, 0)
}

fn day_start(now: NaiveDateTime, offset: i64) -> Option<NaiveTime> {
    if offset > 0 {
        return Some(opening_time());
    }
    round_up_to_slot(now.time()).map(|rounded| rounded.max(opening_time()))
}

/// Slot grid for the seven days starting at `now`, marked against `booked`.
pub fn generate_week(now: NaiveDateTime, booked: &SlotsBooked) -> Vec<DaySlots> {
    (0..DAYS_AHEAD)
        .filter_map(|offset| {
            let date = now.date().checked_add_signed(Duration::days(offset))?;
            let key = format_date(date);
            let mut slots = Vec::new();

            if let Some(mut time) = day_start(now, offset) {
                while time < closing_time() {
                    let label = format_time(time);
                    slots.push(Slot {
                        is_booked: booked.is_booked(&key, &label),
                        date_time: date.and_time(time),
                        time: label,
                    });
                    time += Duration::minutes(i64::from(SLOT_MINUTES));
                }
            }

            Some(DaySlots {
                weekday: date.format("%a").to_string().to_uppercase(),
                date: key,
                slots,
            })
        })
        .collect()
}

/// Check a requested slot against the grid, clinic hours and booking window.
pub fn validate_slot(now: NaiveDateTime, raw_date: &str, raw_time: &str) -> Result<SlotKey, SlotError> {
    let date = parse_slot_date(raw_date)?;
    let time = parse_slot_time(raw_time)?;

    if time.minute() % SLOT_MINUTES != 0 || time.second() != 0 {
        return Err(SlotError::OffGrid);
    }
    if time < opening_time() || time >= closing_time() {
        return Err(SlotError::OutsideHours);
    }

    let today = now.date();
    let last_day = today + Duration::days(DAYS_AHEAD - 1);
    if date < today {
        return Err(SlotError::InPast);
    }
    if date > last_day {
        return Err(SlotError::OutsideWindow);
    }
    if date.and_time(time) < now {
        return Err(SlotError::InPast);
    }

    Ok(SlotKey {
        date: format_date(date),
        time: format_time(time),
    })
}
