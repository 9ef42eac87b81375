use crate::db::{decimal_at, uuid_at};
use crate::error::ApiError;
use crate::extract::ValidatedQuery;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::timesheet::{TeamMemberDay, TeamTimesheet};
use common::requests::TeamTimesheetQuery;
use rusqlite::params;
use rust_decimal::Decimal;
use uuid::Uuid;

pub(crate) async fn process(
    state: web::Data<AppState>,
    query: ValidatedQuery<TeamTimesheetQuery>,
) -> Result<HttpResponse, ApiError> {
    let TeamTimesheetQuery { manager_id, date } = query.into_inner();

    let members = state
        .db
        .run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT e.id, e.full_name, t.hours, t.validated
                 FROM employees e
                 LEFT JOIN time_entries t ON t.employee_id = e.id AND t.date = ?2
                 WHERE e.manager_id = ?1
                 ORDER BY e.full_name, e.id",
            )?;
            let rows = stmt
                .query_map(params![manager_id.to_string(), date], |row| {
                    let hours = match row.get::<_, Option<String>>(2)? {
                        Some(_) => Some((decimal_at(row, 2)?, row.get::<_, bool>(3)?)),
                        None => None,
                    };
                    Ok((uuid_at(row, 0)?, row.get::<_, String>(1)?, hours))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(fold_members(rows))
        })
        .await?;

    Ok(HttpResponse::Ok().json(TeamTimesheet {
        manager_id,
        date,
        members,
    }))
}

/// One line per employee. A day counts as validated once it has entries and all are validated.
fn fold_members(rows: Vec<(Uuid, String, Option<(Decimal, bool)>)>) -> Vec<TeamMemberDay> {
    let mut members: Vec<(TeamMemberDay, bool)> = Vec::new();
    for (employee_id, full_name, entry) in rows {
        if members.last().map(|(m, _)| m.employee_id) != Some(employee_id) {
            members.push((
                TeamMemberDay {
                    employee_id,
                    full_name,
                    hours: Decimal::ZERO,
                    validated: true,
                },
                false,
            ));
        }
        if let Some((member, has_entries)) = members.last_mut() {
            if let Some((hours, validated)) = entry {
                member.hours += hours;
                member.validated &= validated;
                *has_entries = true;
            }
        }
    }
    members
        .into_iter()
        .map(|(mut member, has_entries)| {
            member.validated &= has_entries;
            member
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::db::testing::{insert_employee, insert_entry};
    use crate::state::testing::test_app;
    use actix_web::{test, web, App};
    use common::model::timesheet::TeamTimesheet;
    use rust_decimal::Decimal;

    #[actix_web::test]
    async fn lists_every_report_even_without_hours() {
        let t = test_app().await;
        let conn = t.state.db.connect().unwrap();
        let boss = insert_employee(&conn, "Boss", "boss@example.com", None);
        let ada = insert_employee(&conn, "Ada", "ada@example.com", Some(boss));
        let bob = insert_employee(&conn, "Bob", "bob@example.com", Some(boss));
        insert_employee(&conn, "Eve", "eve@example.com", None);
        let first = insert_entry(&conn, ada, "2024-02-05", "4");
        insert_entry(&conn, ada, "2024-02-05", "3.5");
        insert_entry(&conn, ada, "2024-02-06", "8");
        conn.execute(
            "UPDATE time_entries SET validated = 1 WHERE id = ?1",
            [first.to_string()],
        )
        .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(t.state.clone()))
                .service(super::super::configure_routes()),
        )
        .await;
        let req = test::TestRequest::get()
            .uri(&format!("/api/timesheets/team?managerId={}&date=2024-02-05", boss))
            .to_request();
        let team: TeamTimesheet = test::call_and_read_body_json(&app, req).await;

        assert_eq!(team.members.len(), 2);
        assert_eq!(team.members[0].employee_id, ada);
        assert_eq!(team.members[0].hours, Decimal::new(75, 1));
        assert!(!team.members[0].validated);
        assert_eq!(team.members[1].employee_id, bob);
        assert_eq!(team.members[1].hours, Decimal::ZERO);
        assert!(!team.members[1].validated);
    }
}
