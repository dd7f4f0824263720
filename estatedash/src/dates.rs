//! Normalisation of the date headers used by the Zillow tables. Some tables label their columns
//! with month-end dates (`2020-01-31`), others with bare months (`2020-01`); both collapse to the
//! first day of the month so they can be compared and joined on.

use chrono::{Datelike, NaiveDate};

use crate::error::{EstatedashError, Result};

const FULL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalise a single `YYYY-MM-DD` or `YYYY-MM` string to the first day of its month.
pub fn normalize_date(value: &str) -> Result<NaiveDate> {
    let invalid = || EstatedashError::InvalidDate(value.to_string());
    if value.split('-').count() == 3 {
        let date = NaiveDate::parse_from_str(value, FULL_DATE_FORMAT).map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(date.year(), date.month(), 1).ok_or_else(invalid)
    } else {
        // chrono needs a day to build a date, so year-month strings get one appended
        NaiveDate::parse_from_str(&format!("{value}-01"), FULL_DATE_FORMAT).map_err(|_| invalid())
    }
}

/// Normalise a sequence of date strings, failing on the first one that cannot be parsed.
pub fn normalize_dates<I, S>(values: I) -> Result<Vec<NaiveDate>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| normalize_date(value.as_ref()))
        .collect()
}

/// Format a normalised date the way it is labelled on chart axes and in exports.
pub fn month_label(date: &NaiveDate) -> String {
    date.format(FULL_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 1).unwrap()
    }

    #[test]
    fn full_dates_should_truncate_to_month() {
        assert_eq!(normalize_date("2020-02-15").unwrap(), ym(2020, 2));
        assert_eq!(normalize_date("2021-12-31").unwrap(), ym(2021, 12));
        assert_eq!(
            normalize_date("2020-02-29").unwrap(),
            normalize_date("2020-02").unwrap(),
            "A full date should equal its first seven characters parsed as year-month"
        );
    }

    #[test]
    fn year_month_should_be_unchanged() {
        assert_eq!(normalize_date("2020-01").unwrap(), ym(2020, 1));
        assert_eq!(month_label(&normalize_date("2019-07").unwrap()), "2019-07-01");
    }

    #[test]
    fn other_formats_should_fail() {
        for bad in ["2020/01/31", "01-31-2020", "2020-13", "2020-02-30", "Jan 2020", "", "2020"] {
            assert!(
                matches!(normalize_date(bad), Err(EstatedashError::InvalidDate(_))),
                "'{bad}' should not parse"
            );
        }
    }

    #[test]
    fn sequence_should_fail_on_first_bad_element() {
        let dates = normalize_dates(["2020-01", "2020-02-15"]).unwrap();
        assert_eq!(dates, vec![ym(2020, 1), ym(2020, 2)]);
        assert!(normalize_dates(["2020-01", "RegionType", "2020-03"]).is_err());
    }
}
