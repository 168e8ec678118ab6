mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn register_login_me_roundtrip() {
    let workspace = temp_dir("escolar-auth");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.register",
        json!({
            "email": "admin@cetmar.edu.mx",
            "password": "secreta1",
            "role": "admin",
            "displayName": "Administración"
        }),
    );
    assert!(created.get("id").and_then(|v| v.as_i64()).is_some());

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "email": "admin@cetmar.edu.mx", "password": "secreta1" }),
    );
    let token = login
        .get("token")
        .and_then(|v| v.as_str())
        .expect("session token")
        .to_string();
    assert_eq!(
        login.pointer("/user/role").and_then(|v| v.as_str()),
        Some("admin")
    );

    let me = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "auth.me",
        json!({ "token": token }),
    );
    assert_eq!(
        me.get("email").and_then(|v| v.as_str()),
        Some("admin@cetmar.edu.mx")
    );
    assert_eq!(me.get("active").and_then(|v| v.as_bool()), Some(true));
}

#[test]
fn wrong_password_and_duplicate_email_are_rejected() {
    let workspace = temp_dir("escolar-auth-bad");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.register",
        json!({
            "email": "pre@cetmar.edu.mx",
            "password": "secreta1",
            "role": "prefect",
            "displayName": "Prefectura"
        }),
    );

    let bad_login = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "email": "pre@cetmar.edu.mx", "password": "equivocada" }),
    );
    assert_eq!(
        bad_login.get("message").and_then(|v| v.as_str()),
        Some("Credenciales inválidas")
    );

    let duplicate = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "auth.register",
        json!({
            "email": "pre@cetmar.edu.mx",
            "password": "secreta1",
            "role": "prefect",
            "displayName": "Prefectura"
        }),
    );
    assert_eq!(
        duplicate.get("message").and_then(|v| v.as_str()),
        Some("El correo ya está registrado")
    );

    let bad_token = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "auth.me",
        json!({ "token": "no-such-token" }),
    );
    assert_eq!(
        bad_token.get("message").and_then(|v| v.as_str()),
        Some("Token inválido")
    );
}
