use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: Uuid,
    pub employee_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    pub date: NaiveDate,
    pub hours: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub validated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetDay {
    pub date: NaiveDate,
    pub hours: Decimal,
    pub entries: Vec<TimeEntry>,
}

/// Time entries of one employee over a period, grouped per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timesheet {
    pub employee_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: Vec<TimesheetDay>,
    pub total_hours: Decimal,
}

impl Timesheet {
    /// Groups `entries` per day. Days without entries are left out.
    pub fn from_entries(employee_id: Uuid, from: NaiveDate, to: NaiveDate, mut entries: Vec<TimeEntry>) -> Self {
        entries.sort_by_key(|e| e.date);
        let mut days: Vec<TimesheetDay> = Vec::new();
        for entry in entries {
            match days.last_mut() {
                Some(day) if day.date == entry.date => {
                    day.hours += entry.hours;
                    day.entries.push(entry);
                }
                _ => days.push(TimesheetDay {
                    date: entry.date,
                    hours: entry.hours,
                    entries: vec![entry],
                }),
            }
        }
        let total_hours = days.iter().map(|d| d.hours).sum();
        Self {
            employee_id,
            from,
            to,
            days,
            total_hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberDay {
    pub employee_id: Uuid,
    pub full_name: String,
    pub hours: Decimal,
    pub validated: bool,
}

/// Hours logged on one day by everyone reporting to a manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamTimesheet {
    pub manager_id: Uuid,
    pub date: NaiveDate,
    pub members: Vec<TeamMemberDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkValidateResult {
    pub requested: usize,
    pub validated: usize,
}

/// First and last day of a `YYYY-MM` month. `None` when the string is not a month.
pub fn month_bounds(month: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (year, month) = month.split_once('-')?;
    let first = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
    };
    Some((first, next - Duration::days(1)))
}

/// Monday and Sunday of the ISO week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_bounds_handles_leap_years_and_december() {
        assert_eq!(month_bounds("2024-02"), Some((d(2024, 2, 1), d(2024, 2, 29))));
        assert_eq!(month_bounds("2023-12"), Some((d(2023, 12, 1), d(2023, 12, 31))));
        assert_eq!(month_bounds("2024-13"), None);
    }

    #[test]
    fn week_starts_on_monday() {
        // 2024-02-08 is a Thursday
        assert_eq!(week_bounds(d(2024, 2, 8)), (d(2024, 2, 5), d(2024, 2, 11)));
        assert_eq!(week_bounds(d(2024, 2, 5)), (d(2024, 2, 5), d(2024, 2, 11)));
    }

    #[test]
    fn entries_grouped_per_day() {
        let emp = Uuid::new_v4();
        let entry = |date, hours| TimeEntry {
            id: Uuid::new_v4(),
            employee_id: emp,
            project_id: None,
            date,
            hours: Decimal::new(hours, 1),
            description: None,
            validated: false,
        };
        let sheet = Timesheet::from_entries(
            emp,
            d(2024, 2, 1),
            d(2024, 2, 29),
            vec![entry(d(2024, 2, 2), 35), entry(d(2024, 2, 1), 80), entry(d(2024, 2, 2), 40)],
        );
        assert_eq!(sheet.days.len(), 2);
        assert_eq!(sheet.days[1].hours, Decimal::new(75, 1));
        assert_eq!(sheet.total_hours, Decimal::new(155, 1));
    }
}
