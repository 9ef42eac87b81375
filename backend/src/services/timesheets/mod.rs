//! Timesheet views and exports built from `time_entries`.
//!
//! - `GET /api/timesheets/monthly?employeeId=&month=YYYY-MM`
//! - `GET /api/timesheets/weekly?employeeId=&weekStart=YYYY-MM-DD` (any day of the week)
//! - `GET /api/timesheets/team?managerId=&date=YYYY-MM-DD`
//! - `POST /api/timesheets/export`: CSV of every entry in a date range,
//!   optionally restricted to one employee.

mod export;
mod monthly;
mod team;
mod weekly;

use crate::db::{decimal_at, opt_uuid_at, uuid_at};
use crate::error::ApiError;
use actix_web::web::{get, post, scope};
use actix_web::Scope;
use chrono::NaiveDate;
use common::model::timesheet::TimeEntry;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const API_PATH: &str = "/api/timesheets";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/monthly", get().to(monthly::process))
        .route("/weekly", get().to(weekly::process))
        .route("/team", get().to(team::process))
        .route("/export", post().to(export::process))
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<TimeEntry> {
    Ok(TimeEntry {
        id: uuid_at(row, 0)?,
        employee_id: uuid_at(row, 1)?,
        project_id: opt_uuid_at(row, 2)?,
        date: row.get(3)?,
        hours: decimal_at(row, 4)?,
        description: row.get(5)?,
        validated: row.get(6)?,
    })
}

/// Entries dated within `[from, to]`, oldest first. `employee` narrows to one person.
pub(crate) fn entries_between(
    conn: &Connection,
    employee: Option<Uuid>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<TimeEntry>, ApiError> {
    let mut stmt = conn.prepare(
        "SELECT id, employee_id, project_id, date, hours, description, validated
         FROM time_entries
         WHERE date BETWEEN ?1 AND ?2 AND (?3 IS NULL OR employee_id = ?3)
         ORDER BY date, employee_id",
    )?;
    let entries = stmt
        .query_map(
            params![from, to, employee.map(|e| e.to_string())],
            entry_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_employee, insert_entry, test_db};

    #[test]
    fn range_is_inclusive_and_inverted_range_is_empty() {
        let t = test_db();
        let conn = t.db.connect().unwrap();
        let ada = insert_employee(&conn, "Ada", "ada@example.com", None);
        let bob = insert_employee(&conn, "Bob", "bob@example.com", None);
        insert_entry(&conn, ada, "2024-02-01", "7");
        insert_entry(&conn, ada, "2024-02-29", "8");
        insert_entry(&conn, ada, "2024-03-01", "6");
        insert_entry(&conn, bob, "2024-02-10", "5");

        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        assert_eq!(entries_between(&conn, Some(ada), d(2, 1), d(2, 29)).unwrap().len(), 2);
        assert_eq!(entries_between(&conn, None, d(2, 1), d(2, 29)).unwrap().len(), 3);
        assert!(entries_between(&conn, None, d(3, 1), d(2, 1)).unwrap().is_empty());
    }
}
