mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn import_fatal_errors_surface_once_with_fixed_messages() {
    let workspace = temp_dir("escolar-import-errors");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Missing upload.
    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "import.sisems",
        json!({ "periodId": 1 }),
    );
    assert_eq!(
        e.get("message").and_then(|v| v.as_str()),
        Some("No se recibió archivo")
    );

    // Missing period id.
    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "import.sisems",
        json!({ "filePath": "/tmp/nope.xlsx" }),
    );
    assert_eq!(
        e.get("message").and_then(|v| v.as_str()),
        Some("Falta period_id")
    );

    // Non-numeric period id.
    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "import.sisems",
        json!({ "filePath": "/tmp/nope.xlsx", "periodId": "abc" }),
    );
    assert_eq!(
        e.get("message").and_then(|v| v.as_str()),
        Some("period_id inválido")
    );

    // Unreadable spreadsheet aborts the whole call with the sisems format.
    let e = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "import.sisems",
        json!({ "filePath": workspace.join("missing.xlsx").to_string_lossy(), "periodId": 1 }),
    );
    let msg = e.get("message").and_then(|v| v.as_str()).expect("message");
    assert!(
        msg.starts_with("Error procesando archivo: "),
        "unexpected message: {msg}"
    );

    // Unreadable XML aborts with the timetable format.
    let e = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "import.horarios",
        json!({ "filePath": workspace.join("missing.xml").to_string_lossy(), "periodId": 1 }),
    );
    let msg = e.get("message").and_then(|v| v.as_str()).expect("message");
    assert!(
        msg.starts_with("Error procesando XML: "),
        "unexpected message: {msg}"
    );
}

#[test]
fn unknown_method_reports_not_implemented() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let e = request_err(&mut stdin, &mut reader, "1", "no.such.method", json!({}));
    assert_eq!(
        e.get("code").and_then(|v| v.as_str()),
        Some("not_implemented")
    );
}

#[test]
fn import_requires_a_selected_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let e = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "import.horarios",
        json!({ "filePath": "/tmp/x.xml", "periodId": 1 }),
    );
    assert_eq!(e.get("code").and_then(|v| v.as_str()), Some("no_workspace"));
}
