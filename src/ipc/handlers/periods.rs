use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::params;
use serde_json::json;

fn handle_periods_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut stmt = match conn.prepare(
        "SELECT id, name, year, semester_type, start_date, end_date, active
         FROM periods ORDER BY year DESC, id DESC",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let rows = stmt
        .query_map([], |row| {
            let id: i64 = row.get(0)?;
            let name: String = row.get(1)?;
            let year: i64 = row.get(2)?;
            let semester_type: String = row.get(3)?;
            let start_date: Option<String> = row.get(4)?;
            let end_date: Option<String> = row.get(5)?;
            let active: i64 = row.get(6)?;
            Ok(json!({
                "id": id,
                "name": name,
                "year": year,
                "semesterType": semester_type,
                "startDate": start_date,
                "endDate": end_date,
                "active": active != 0
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(periods) => ok(&req.id, json!({ "periods": periods })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_periods_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing name", None),
    };
    let Some(year) = req.params.get("year").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing year", None);
    };
    let semester_type = match req.params.get("semesterType").and_then(|v| v.as_str()) {
        Some(v @ ("odd" | "even")) => v.to_string(),
        _ => {
            return err(
                &req.id,
                "bad_params",
                "semesterType must be odd or even",
                None,
            )
        }
    };
    let start_date = req
        .params
        .get("startDate")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let end_date = req
        .params
        .get("endDate")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let active = req
        .params
        .get("active")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    // Only one period may be active at a time.
    if active {
        if let Err(e) = conn.execute("UPDATE periods SET active = 0", []) {
            return err(&req.id, "db_update_failed", e.to_string(), None);
        }
    }

    if let Err(e) = conn.execute(
        "INSERT INTO periods(name, year, semester_type, start_date, end_date, active)
         VALUES(?, ?, ?, ?, ?, ?)",
        params![
            name,
            year,
            semester_type,
            start_date,
            end_date,
            if active { 1 } else { 0 }
        ],
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "periods" })),
        );
    }

    ok(&req.id, json!({ "id": conn.last_insert_rowid() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "periods.list" => Some(handle_periods_list(state, req)),
        "periods.create" => Some(handle_periods_create(state, req)),
        _ => None,
    }
}
