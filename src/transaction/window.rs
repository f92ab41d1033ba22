//! Date windows for the transaction reports.
//!
//! A window is chosen by name in the query string and resolved against the
//! local calendar into an inclusive range of dates, which in turn becomes a
//! half-open range of UTC instants for the database query.

use time::{Date, OffsetDateTime, UtcOffset, macros::format_description};

use crate::{listing::present, timezone::normalize_timestamp, validation::ValidationErrors};

/// The time period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The current local date.
    Today,
    /// The current calendar month of the current year.
    ThisMonth,
    /// An explicit, inclusive range of dates.
    Custom(DateRange),
}

/// An inclusive range of local calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first date in the range.
    pub start: Date,
    /// The last date in the range.
    pub end: Date,
}

/// The half-open UTC interval `[start, end)` a window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcBounds {
    /// The first instant inside the window.
    pub start: OffsetDateTime,
    /// The first instant after the window.
    pub end: OffsetDateTime,
}

impl Window {
    /// Validate a window selector and its dates.
    ///
    /// `selector_field` names the query parameter holding the selector so
    /// that errors are reported against it. Returns `None` if the selector is
    /// absent, in which case the caller decides whether that is an error.
    pub fn parse(
        selector: &Option<String>,
        selector_field: &str,
        start_date: &Option<String>,
        end_date: &Option<String>,
        errors: &mut ValidationErrors,
    ) -> Option<Self> {
        let selector = present(selector)?;

        match selector {
            "today" => Some(Self::Today),
            "this_month" => Some(Self::ThisMonth),
            "custom" => {
                let start = parse_required_date(start_date, "start_date", "start date", errors);
                let end = parse_required_date(end_date, "end_date", "end date", errors);

                match (start, end) {
                    (Some(start), Some(end)) if end < start => {
                        errors.add(
                            "end_date",
                            "The end date must be a date after or equal to start date.",
                        );
                        None
                    }
                    (Some(start), Some(end)) => Some(Self::Custom(DateRange { start, end })),
                    _ => None,
                }
            }
            _ => {
                errors.add(
                    selector_field,
                    format!("The selected {selector_field} is invalid."),
                );
                None
            }
        }
    }

    /// The dates covered by this window when the local date is `today`.
    pub fn date_range(self, today: Date) -> DateRange {
        match self {
            Self::Today => DateRange {
                start: today,
                end: today,
            },
            Self::ThisMonth => {
                let start = Date::from_calendar_date(today.year(), today.month(), 1)
                    .unwrap_or(today);
                let mut end = today;
                while let Some(next) = end.next_day().filter(|next| next.month() == today.month())
                {
                    end = next;
                }

                DateRange { start, end }
            }
            Self::Custom(range) => range,
        }
    }
}

impl DateRange {
    /// The UTC instants covered by the local dates of this range, where the
    /// local time is `offset` from UTC.
    pub fn utc_bounds(self, offset: UtcOffset) -> UtcBounds {
        let start = self.start.midnight().assume_offset(offset);
        let end = match self.end.next_day() {
            Some(next) => next.midnight().assume_offset(offset),
            None => Date::MAX.midnight().assume_offset(offset),
        };

        UtcBounds {
            start: normalize_timestamp(start),
            end: normalize_timestamp(end),
        }
    }
}

// Dates outside these years cannot be shifted by a UTC offset without
// leaving the range `time` can represent.
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

fn parse_required_date(
    value: &Option<String>,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) -> Option<Date> {
    let Some(raw) = present(value) else {
        errors.add(
            field,
            format!("The {label} field is required when type is custom."),
        );
        return None;
    };

    match Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        Ok(date) if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) => {
            errors.add(field, format!("The {label} is not a valid date."));
            None
        }
        Ok(date) => Some(date),
        Err(error) => {
            tracing::debug!("Could not parse {field} \"{raw}\": {error}");
            errors.add(
                field,
                format!("The {label} does not match the format Y-m-d."),
            );
            None
        }
    }
}

#[cfg(test)]
mod window_tests {
    use time::{
        UtcOffset,
        macros::{date, datetime, offset},
    };

    use crate::validation::ValidationErrors;

    use super::{DateRange, UtcBounds, Window};

    fn parse(
        selector: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> (Option<Window>, ValidationErrors) {
        let mut errors = ValidationErrors::default();
        let window = Window::parse(
            &selector.map(str::to_owned),
            "type",
            &start.map(str::to_owned),
            &end.map(str::to_owned),
            &mut errors,
        );

        (window, errors)
    }

    #[test]
    fn parses_named_windows() {
        assert_eq!(parse(Some("today"), None, None).0, Some(Window::Today));
        assert_eq!(
            parse(Some("this_month"), None, None).0,
            Some(Window::ThisMonth)
        );
    }

    #[test]
    fn missing_selector_is_none_without_errors() {
        let (window, errors) = parse(None, None, None);

        assert_eq!(window, None);
        assert!(errors.is_empty());
    }

    #[test]
    fn unknown_selector_is_reported_against_its_field() {
        let (window, errors) = parse(Some("yesterday"), None, None);

        assert_eq!(window, None);
        assert!(errors.get("type").is_some());
    }

    #[test]
    fn custom_requires_both_dates() {
        let (window, errors) = parse(Some("custom"), Some("2024-01-01"), None);

        assert_eq!(window, None);
        assert!(errors.get("end_date").is_some());
        assert!(errors.get("start_date").is_none());

        let (_, errors) = parse(Some("custom"), None, None);
        assert!(errors.get("start_date").is_some());
        assert!(errors.get("end_date").is_some());
    }

    #[test]
    fn custom_rejects_bad_format_and_reversed_range() {
        let (_, errors) = parse(Some("custom"), Some("05/01/2024"), Some("2024-01-31"));
        assert!(errors.get("start_date").is_some());

        let (window, errors) = parse(Some("custom"), Some("2024-02-01"), Some("2024-01-01"));
        assert_eq!(window, None);
        assert!(errors.get("end_date").is_some());
    }

    #[test]
    fn custom_rejects_years_outside_the_calendar() {
        let (window, errors) = parse(Some("custom"), Some("-9999-01-01"), Some("2024-01-01"));

        assert_eq!(window, None);
        assert_eq!(
            errors.get("start_date").unwrap(),
            ["The start date is not a valid date.".to_owned()]
        );
        assert!(errors.get("end_date").is_none());

        let (window, errors) = parse(Some("custom"), Some("0000-12-31"), Some("2024-01-01"));
        assert_eq!(window, None);
        assert!(errors.get("start_date").is_some());
    }

    #[test]
    fn earliest_allowed_date_shifts_without_overflow() {
        let (window, errors) = parse(Some("custom"), Some("0001-01-01"), Some("9999-12-31"));
        assert!(errors.is_empty());

        let Some(Window::Custom(range)) = window else {
            panic!("expected a custom window, got {window:?}");
        };
        let bounds = range.utc_bounds(offset!(+13));
        assert_eq!(bounds.start.year(), 0);
        assert!(bounds.start < bounds.end);

        let bounds = range.utc_bounds(offset!(-12));
        assert!(bounds.start < bounds.end);
    }

    #[test]
    fn custom_range_is_inclusive() {
        let (window, errors) = parse(Some("custom"), Some("2024-01-01"), Some("2024-01-01"));

        assert!(errors.is_empty());
        assert_eq!(
            window,
            Some(Window::Custom(DateRange {
                start: date!(2024 - 01 - 01),
                end: date!(2024 - 01 - 01),
            }))
        );
    }

    #[test]
    fn this_month_covers_the_whole_month_of_the_current_year() {
        assert_eq!(
            Window::ThisMonth.date_range(date!(2024 - 02 - 10)),
            DateRange {
                start: date!(2024 - 02 - 01),
                end: date!(2024 - 02 - 29),
            }
        );
        assert_eq!(
            Window::ThisMonth.date_range(date!(2023 - 12 - 31)),
            DateRange {
                start: date!(2023 - 12 - 01),
                end: date!(2023 - 12 - 31),
            }
        );
    }

    #[test]
    fn today_is_a_single_day() {
        assert_eq!(
            Window::Today.date_range(date!(2024 - 01 - 05)),
            DateRange {
                start: date!(2024 - 01 - 05),
                end: date!(2024 - 01 - 05),
            }
        );
    }

    #[test]
    fn utc_bounds_shift_local_midnights() {
        let range = DateRange {
            start: date!(2024 - 01 - 05),
            end: date!(2024 - 01 - 05),
        };

        assert_eq!(
            range.utc_bounds(UtcOffset::UTC),
            UtcBounds {
                start: datetime!(2024-01-05 00:00:00 UTC),
                end: datetime!(2024-01-06 00:00:00 UTC),
            }
        );
        assert_eq!(
            range.utc_bounds(offset!(+13)),
            UtcBounds {
                start: datetime!(2024-01-04 11:00:00 UTC),
                end: datetime!(2024-01-05 11:00:00 UTC),
            }
        );
    }
}
