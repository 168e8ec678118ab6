use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::types::Value as SqlValue;
use rusqlite::params_from_iter;
use serde_json::json;

fn handle_specialties(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut stmt = match conn.prepare("SELECT id, name, code FROM specialties ORDER BY code") {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map([], |row| {
            let id: i64 = row.get(0)?;
            let name: String = row.get(1)?;
            let code: String = row.get(2)?;
            Ok(json!({ "id": id, "name": name, "code": code }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(specialties) => ok(&req.id, json!({ "specialties": specialties })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_groups(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut query = String::from(
        "SELECT g.id, g.period_id, g.name, g.semester,
                sp.name, sp.code,
                (SELECT COUNT(*) FROM group_students gs WHERE gs.group_id = g.id)
         FROM groups_table g
         LEFT JOIN specialties sp ON g.specialty_id = sp.id",
    );
    let mut args: Vec<SqlValue> = Vec::new();
    if let Some(period_id) = req.params.get("periodId").and_then(|v| v.as_i64()) {
        query.push_str(" WHERE g.period_id = ?");
        args.push(SqlValue::Integer(period_id));
    }
    query.push_str(" ORDER BY g.semester, g.name");

    let mut stmt = match conn.prepare(&query) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map(params_from_iter(args), |row| {
            let id: i64 = row.get(0)?;
            let period_id: i64 = row.get(1)?;
            let name: String = row.get(2)?;
            let semester: i64 = row.get(3)?;
            let specialty_name: Option<String> = row.get(4)?;
            let specialty_code: Option<String> = row.get(5)?;
            let student_count: i64 = row.get(6)?;
            Ok(json!({
                "id": id,
                "periodId": period_id,
                "name": name,
                "semester": semester,
                "specialtyName": specialty_name,
                "specialtyCode": specialty_code,
                "studentCount": student_count
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(groups) => ok(&req.id, json!({ "groups": groups })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_subjects(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut stmt = match conn.prepare(
        "SELECT sub.id, sub.xml_id, sub.name, sub.short_code, sub.semester,
                sp.name, sp.code
         FROM subjects sub
         LEFT JOIN specialties sp ON sub.specialty_id = sp.id
         ORDER BY sub.short_code",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map([], |row| {
            let id: i64 = row.get(0)?;
            let xml_id: Option<String> = row.get(1)?;
            let name: String = row.get(2)?;
            let short_code: String = row.get(3)?;
            let semester: Option<i64> = row.get(4)?;
            let specialty_name: Option<String> = row.get(5)?;
            let specialty_code: Option<String> = row.get(6)?;
            Ok(json!({
                "id": id,
                "xmlId": xml_id,
                "name": name,
                "shortCode": short_code,
                "semester": semester,
                "specialtyName": specialty_name,
                "specialtyCode": specialty_code
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(subjects) => ok(&req.id, json!({ "subjects": subjects })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_schedules(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(group_id) = req.params.get("groupId").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "group_id requerido", None);
    };

    let mut stmt = match conn.prepare(
        "SELECT s.id, s.day, s.period_num, s.classroom,
                sub.name, sub.short_code,
                t.name, t.short_name
         FROM schedules s
         JOIN subjects sub ON s.subject_id = sub.id
         JOIN teachers t ON s.teacher_id = t.id
         WHERE s.group_id = ?
         ORDER BY s.day, s.period_num",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map([group_id], |row| {
            let id: i64 = row.get(0)?;
            let day: i64 = row.get(1)?;
            let period_num: i64 = row.get(2)?;
            let classroom: Option<String> = row.get(3)?;
            let subject_name: String = row.get(4)?;
            let short_code: String = row.get(5)?;
            let teacher_name: String = row.get(6)?;
            let teacher_short: String = row.get(7)?;
            Ok(json!({
                "id": id,
                "day": day,
                "periodNum": period_num,
                "classroom": classroom,
                "subjectName": subject_name,
                "shortCode": short_code,
                "teacherName": teacher_name,
                "teacherShort": teacher_short
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(schedules) => ok(&req.id, json!({ "schedules": schedules })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "catalogs.specialties" => Some(handle_specialties(state, req)),
        "catalogs.groups" => Some(handle_groups(state, req)),
        "catalogs.subjects" => Some(handle_subjects(state, req)),
        "catalogs.schedules" => Some(handle_schedules(state, req)),
        _ => None,
    }
}
