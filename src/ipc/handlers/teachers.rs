use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, OptionalExtension};
use serde_json::json;

fn teacher_json(row: &rusqlite::Row) -> rusqlite::Result<serde_json::Value> {
    let id: i64 = row.get(0)?;
    let xml_id: Option<String> = row.get(1)?;
    let name: String = row.get(2)?;
    let short_name: String = row.get(3)?;
    let specialty: Option<String> = row.get(4)?;
    Ok(json!({
        "id": id,
        "xmlId": xml_id,
        "name": name,
        "shortName": short_name,
        "specialty": specialty
    }))
}

fn handle_teachers_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut query =
        String::from("SELECT id, xml_id, name, short_name, specialty FROM teachers");
    let mut args: Vec<SqlValue> = Vec::new();
    if let Some(search) = req.params.get("search").and_then(|v| v.as_str()) {
        query.push_str(" WHERE name LIKE ? OR short_name LIKE ?");
        let pattern = format!("%{}%", search);
        args.push(SqlValue::Text(pattern.clone()));
        args.push(SqlValue::Text(pattern));
    }
    query.push_str(" ORDER BY name");

    let mut stmt = match conn.prepare(&query) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map(params_from_iter(args), |row| teacher_json(row))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(teachers) => ok(&req.id, json!({ "teachers": teachers })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_teachers_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(teacher_id) = req.params.get("id").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing id", None);
    };

    let teacher = match conn
        .query_row(
            "SELECT id, xml_id, name, short_name, specialty FROM teachers WHERE id = ?",
            [teacher_id],
            |row| teacher_json(row),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let Some(mut teacher) = teacher else {
        return err(&req.id, "not_found", "Docente no encontrado", None);
    };

    let mut stmt = match conn.prepare(
        "SELECT s.day, s.period_num, s.classroom, sub.name, sub.short_code, g.name
         FROM schedules s
         JOIN subjects sub ON s.subject_id = sub.id
         JOIN groups_table g ON s.group_id = g.id
         WHERE s.teacher_id = ?
         ORDER BY s.day, s.period_num",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let schedules = stmt
        .query_map([teacher_id], |row| {
            let day: i64 = row.get(0)?;
            let period_num: i64 = row.get(1)?;
            let classroom: Option<String> = row.get(2)?;
            let subject_name: String = row.get(3)?;
            let short_code: String = row.get(4)?;
            let group_name: String = row.get(5)?;
            Ok(json!({
                "day": day,
                "periodNum": period_num,
                "classroom": classroom,
                "subjectName": subject_name,
                "shortCode": short_code,
                "groupName": group_name
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match schedules {
        Ok(s) => {
            teacher["schedules"] = json!(s);
            ok(&req.id, teacher)
        }
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_teachers_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing name", None),
    };
    let short_name = match req.params.get("shortName").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing shortName", None),
    };
    let specialty = req
        .params
        .get("specialty")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    if let Err(e) = conn.execute(
        "INSERT INTO teachers(name, short_name, specialty) VALUES(?, ?, ?)",
        params![name, short_name, specialty],
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "teachers" })),
        );
    }

    ok(&req.id, json!({ "id": conn.last_insert_rowid() }))
}

fn handle_teachers_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(teacher_id) = req.params.get("id").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing id", None);
    };

    let mut fields: Vec<&str> = Vec::new();
    let mut args: Vec<SqlValue> = Vec::new();
    if let Some(name) = req.params.get("name").and_then(|v| v.as_str()) {
        fields.push("name = ?");
        args.push(SqlValue::Text(name.to_string()));
    }
    if let Some(short_name) = req.params.get("shortName").and_then(|v| v.as_str()) {
        fields.push("short_name = ?");
        args.push(SqlValue::Text(short_name.to_string()));
    }
    if let Some(specialty) = req.params.get("specialty") {
        fields.push("specialty = ?");
        match specialty.as_str() {
            Some(s) => args.push(SqlValue::Text(s.to_string())),
            None => args.push(SqlValue::Null),
        }
    }

    if fields.is_empty() {
        return err(&req.id, "bad_params", "Sin campos", None);
    }

    let query = format!("UPDATE teachers SET {} WHERE id = ?", fields.join(", "));
    args.push(SqlValue::Integer(teacher_id));

    match conn.execute(&query, params_from_iter(args)) {
        Ok(0) => err(&req.id, "not_found", "Docente no encontrado", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_teachers_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(teacher_id) = req.params.get("id").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing id", None);
    };

    match conn.execute("DELETE FROM teachers WHERE id = ?", [teacher_id]) {
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teachers.list" => Some(handle_teachers_list(state, req)),
        "teachers.get" => Some(handle_teachers_get(state, req)),
        "teachers.create" => Some(handle_teachers_create(state, req)),
        "teachers.update" => Some(handle_teachers_update(state, req)),
        "teachers.delete" => Some(handle_teachers_delete(state, req)),
        _ => None,
    }
}
