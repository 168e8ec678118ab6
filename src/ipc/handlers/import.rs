use crate::asc;
use crate::import::{import_horarios, import_sisems, CatalogResolver};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::sisems;
use calamine::{open_workbook_auto, Data, Reader};
use rusqlite::Connection;
use serde_json::json;
use std::path::Path;

// The period id arrives from the UI as either a number or a numeric string.
fn period_id_param(req: &Request) -> Result<i64, serde_json::Value> {
    let Some(raw) = req.params.get("periodId") else {
        return Err(err(&req.id, "bad_params", "Falta period_id", None));
    };
    let parsed = match raw {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| err(&req.id, "bad_params", "period_id inválido", None))
}

fn file_path_param(req: &Request) -> Result<&str, serde_json::Value> {
    req.params
        .get("filePath")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", "No se recibió archivo", None))
}

fn run_sisems(conn: &Connection, path: &Path, period_id: i64) -> anyhow::Result<serde_json::Value> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_owned();
    let Some(sheet) = names.first().cloned() else {
        anyhow::bail!("El archivo no contiene hojas");
    };
    let range = workbook.worksheet_range(&sheet)?;
    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

    let parsed = sisems::parse_sisems_rows(&rows);
    let mut resolver = CatalogResolver::new();
    let summary = import_sisems(conn, &mut resolver, &parsed, period_id)?;

    Ok(json!({
        "type": parsed.kind.as_str(),
        "studentsFound": parsed.students.len(),
        "gradesFound": parsed.grades.len(),
        "studentsUpserted": summary.students_upserted,
        "gradesImported": summary.grades_imported,
        "groupsCreated": summary.groups_created,
        "warnings": parsed.warnings,
    }))
}

fn run_horarios(
    conn: &Connection,
    path: &Path,
    period_id: i64,
) -> anyhow::Result<serde_json::Value> {
    let xml = std::fs::read_to_string(path)?;
    let parsed = asc::parse_asc_xml(&xml);
    let mut resolver = CatalogResolver::new();
    let summary = import_horarios(conn, &mut resolver, &parsed, period_id)?;

    Ok(json!({
        "teachersFound": parsed.teachers.len(),
        "subjectsFound": parsed.subjects.len(),
        "classesFound": parsed.classes.len(),
        "cardsFound": parsed.cards.len(),
        "teachersUpserted": summary.teachers_upserted,
        "subjectsUpserted": summary.subjects_upserted,
        "groupsCreated": summary.groups_created,
        "schedulesCreated": summary.schedules_created,
        "warnings": parsed.warnings,
    }))
}

fn handle_import_sisems(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let file_path = match file_path_param(req) {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let period_id = match period_id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match run_sisems(conn, Path::new(&file_path), period_id) {
        Ok(result) => ok(&req.id, result),
        Err(e) => err(
            &req.id,
            "import_failed",
            format!("Error procesando archivo: {e}"),
            None,
        ),
    }
}

fn handle_import_horarios(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let file_path = match file_path_param(req) {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let period_id = match period_id_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match run_horarios(conn, Path::new(&file_path), period_id) {
        Ok(result) => ok(&req.id, result),
        Err(e) => err(
            &req.id,
            "import_failed",
            format!("Error procesando XML: {e}"),
            None,
        ),
    }
}

fn handle_import_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let count = |sql: &str| -> rusqlite::Result<i64> { conn.query_row(sql, [], |r| r.get(0)) };

    let stats = count("SELECT COUNT(*) FROM students WHERE active = 1").and_then(|students| {
        Ok(json!({
            "students": students,
            "teachers": count("SELECT COUNT(*) FROM teachers")?,
            "subjects": count("SELECT COUNT(*) FROM subjects")?,
            "groups": count("SELECT COUNT(*) FROM groups_table")?,
            "schedules": count("SELECT COUNT(*) FROM schedules")?,
            "grades": count("SELECT COUNT(*) FROM grades")?,
        }))
    });

    match stats {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "import.sisems" => Some(handle_import_sisems(state, req)),
        "import.horarios" => Some(handle_import_horarios(state, req)),
        "import.stats" => Some(handle_import_stats(state, req)),
        _ => None,
    }
}
