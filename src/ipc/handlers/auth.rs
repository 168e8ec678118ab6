use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const ROLES: [&str; 5] = ["admin", "teacher", "prefect", "student", "parent"];
const SESSION_HOURS: i64 = 24;

// Stored form is "salt$hexdigest".
fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = Sha256::digest(format!("{salt}{password}").as_bytes());
    format!("{}${}", salt, hex::encode(digest))
}

fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let digest = Sha256::digest(format!("{salt}{password}").as_bytes());
    hex::encode(digest) == expected
}

fn handle_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let email = match req.params.get("email").and_then(|v| v.as_str()) {
        Some(v) if v.contains('@') => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "invalid email", None),
    };
    let password = match req.params.get("password").and_then(|v| v.as_str()) {
        Some(v) if v.len() >= 6 => v.to_string(),
        _ => {
            return err(
                &req.id,
                "bad_params",
                "password must be at least 6 characters",
                None,
            )
        }
    };
    let role = match req.params.get("role").and_then(|v| v.as_str()) {
        Some(v) if ROLES.contains(&v) => v.to_string(),
        _ => return err(&req.id, "bad_params", "unknown role", None),
    };
    let display_name = match req.params.get("displayName").and_then(|v| v.as_str()) {
        Some(v) if v.trim().len() >= 2 => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing displayName", None),
    };

    let existing: Option<i64> = match conn
        .query_row("SELECT id FROM users WHERE email = ?", [&email], |r| {
            r.get(0)
        })
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if existing.is_some() {
        return err(&req.id, "email_taken", "El correo ya está registrado", None);
    }

    if let Err(e) = conn.execute(
        "INSERT INTO users(email, password_hash, role, display_name, created_at)
         VALUES(?, ?, ?, ?, ?)",
        params![
            email,
            hash_password(&password),
            role,
            display_name,
            Utc::now().to_rfc3339()
        ],
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "users" })),
        );
    }

    ok(&req.id, json!({ "id": conn.last_insert_rowid() }))
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let email = match req.params.get("email").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing email", None),
    };
    let password = match req.params.get("password").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing password", None),
    };

    let row: Option<(i64, String, String, String, i64)> = match conn
        .query_row(
            "SELECT id, password_hash, role, display_name, active
             FROM users WHERE email = ?",
            [&email],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                ))
            },
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let Some((user_id, password_hash, role, display_name, active)) = row else {
        return err(&req.id, "bad_credentials", "Credenciales inválidas", None);
    };
    if active == 0 {
        return err(&req.id, "account_disabled", "Cuenta desactivada", None);
    }
    if !verify_password(&password, &password_hash) {
        return err(&req.id, "bad_credentials", "Credenciales inválidas", None);
    }

    let token = Uuid::new_v4().to_string();
    let expires_at = (Utc::now() + Duration::hours(SESSION_HOURS)).to_rfc3339();
    if let Err(e) = conn.execute(
        "INSERT INTO sessions(token, user_id, expires_at) VALUES(?, ?, ?)",
        params![token, user_id, expires_at],
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "sessions" })),
        );
    }

    ok(
        &req.id,
        json!({
            "token": token,
            "user": {
                "id": user_id,
                "email": email,
                "role": role,
                "displayName": display_name,
                "active": true
            }
        }),
    )
}

fn handle_me(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let token = match req.params.get("token").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_token", "Token inválido", None),
    };

    let row: Option<(String, i64, String, String, String, i64)> = match conn
        .query_row(
            "SELECT s.expires_at, u.id, u.email, u.role, u.display_name, u.active
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token = ?",
            [&token],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                ))
            },
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let Some((expires_at, user_id, email, role, display_name, active)) = row else {
        return err(&req.id, "bad_token", "Token inválido", None);
    };

    let expired = DateTime::parse_from_rfc3339(&expires_at)
        .map(|t| t < Utc::now())
        .unwrap_or(true);
    if expired {
        // Expired rows are dead weight; drop them as we notice them.
        let _ = conn.execute("DELETE FROM sessions WHERE token = ?", [&token]);
        return err(&req.id, "bad_token", "Token inválido", None);
    }

    ok(
        &req.id,
        json!({
            "id": user_id,
            "email": email,
            "role": role,
            "displayName": display_name,
            "active": active != 0
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.register" => Some(handle_register(state, req)),
        "auth.login" => Some(handle_login(state, req)),
        "auth.me" => Some(handle_me(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip_verifies() {
        let stored = hash_password("secreta1");
        assert!(verify_password("secreta1", &stored));
        assert!(!verify_password("secreta2", &stored));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("x", "not-a-salted-hash"));
        assert!(!verify_password("", ""));
    }
}
