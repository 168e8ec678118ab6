use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, OptionalExtension};
use serde_json::json;

fn student_json(row: &rusqlite::Row) -> rusqlite::Result<serde_json::Value> {
    let id: i64 = row.get(0)?;
    let no_control: String = row.get(1)?;
    let curp: String = row.get(2)?;
    let name: String = row.get(3)?;
    let paterno: String = row.get(4)?;
    let materno: String = row.get(5)?;
    let career: String = row.get(6)?;
    let generation: String = row.get(7)?;
    let semester: i64 = row.get(8)?;
    let grupo: String = row.get(9)?;
    let active: i64 = row.get(10)?;
    Ok(json!({
        "id": id,
        "noControl": no_control,
        "curp": curp,
        "name": name,
        "paterno": paterno,
        "materno": materno,
        "career": career,
        "generation": generation,
        "semester": semester,
        "grupo": grupo,
        "active": active != 0
    }))
}

const STUDENT_COLUMNS: &str = "id, no_control, curp, name, paterno, materno, career, \
                               generation, semester, grupo, active";

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut query = format!("SELECT {} FROM students WHERE active = 1", STUDENT_COLUMNS);
    let mut args: Vec<SqlValue> = Vec::new();

    if let Some(grupo) = req.params.get("grupo").and_then(|v| v.as_str()) {
        query.push_str(" AND grupo = ?");
        args.push(SqlValue::Text(grupo.to_string()));
    }
    if let Some(semester) = req.params.get("semester").and_then(|v| v.as_i64()) {
        query.push_str(" AND semester = ?");
        args.push(SqlValue::Integer(semester));
    }
    query.push_str(" ORDER BY paterno, materno, name");

    let mut stmt = match conn.prepare(&query) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map(params_from_iter(args), |row| student_json(row))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = req.params.get("id").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing id", None);
    };

    let student = match conn
        .query_row(
            &format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS),
            [student_id],
            |row| student_json(row),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let Some(mut student) = student else {
        return err(&req.id, "not_found", "Alumno no encontrado", None);
    };

    let mut stmt = match conn.prepare(
        "SELECT id, name, relationship, phone, phone_alt, email
         FROM guardians WHERE student_id = ?",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let guardians = stmt
        .query_map([student_id], |row| {
            let id: i64 = row.get(0)?;
            let name: String = row.get(1)?;
            let relationship: String = row.get(2)?;
            let phone: String = row.get(3)?;
            let phone_alt: Option<String> = row.get(4)?;
            let email: Option<String> = row.get(5)?;
            Ok(json!({
                "id": id,
                "name": name,
                "relationship": relationship,
                "phone": phone,
                "phoneAlt": phone_alt,
                "email": email
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match guardians {
        Ok(gs) => {
            student["guardians"] = json!(gs);
            ok(&req.id, student)
        }
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_students_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let total: i64 = match conn.query_row(
        "SELECT COUNT(*) FROM students WHERE active = 1",
        [],
        |r| r.get(0),
    ) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let grouped = |sql: &str| -> rusqlite::Result<Vec<serde_json::Value>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| {
                let key: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok(json!({ "name": key, "count": count }))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    };

    let by_group = grouped(
        "SELECT grupo, COUNT(*) FROM students WHERE active = 1 GROUP BY grupo ORDER BY grupo",
    );
    let by_career = grouped(
        "SELECT career, COUNT(*) FROM students WHERE active = 1 GROUP BY career ORDER BY career",
    );

    match (by_group, by_career) {
        (Ok(by_group), Ok(by_career)) => ok(
            &req.id,
            json!({
                "total": total,
                "byGroup": by_group,
                "byCareer": by_career
            }),
        ),
        (Err(e), _) | (_, Err(e)) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.stats" => Some(handle_students_stats(state, req)),
        _ => None,
    }
}
