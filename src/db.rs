use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("escolar.sqlite3");
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            display_name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions(
            token TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            expires_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS specialties(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            code TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS periods(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            year INTEGER NOT NULL,
            semester_type TEXT NOT NULL,
            start_date TEXT,
            end_date TEXT,
            active INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            xml_id TEXT,
            name TEXT NOT NULL,
            short_name TEXT NOT NULL DEFAULT '',
            specialty TEXT,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teachers_xml ON teachers(xml_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            xml_id TEXT,
            name TEXT NOT NULL,
            short_code TEXT NOT NULL DEFAULT '',
            semester INTEGER,
            specialty_id INTEGER,
            FOREIGN KEY(specialty_id) REFERENCES specialties(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subjects_xml ON subjects(xml_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS groups_table(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            period_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            semester INTEGER NOT NULL DEFAULT 0,
            specialty_id INTEGER,
            FOREIGN KEY(period_id) REFERENCES periods(id),
            FOREIGN KEY(specialty_id) REFERENCES specialties(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_groups_period_name ON groups_table(period_id, name)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            no_control TEXT NOT NULL,
            curp TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL DEFAULT '',
            paterno TEXT NOT NULL DEFAULT '',
            materno TEXT NOT NULL DEFAULT '',
            career TEXT NOT NULL DEFAULT '',
            generation TEXT NOT NULL DEFAULT '',
            semester INTEGER NOT NULL DEFAULT 0,
            grupo TEXT NOT NULL DEFAULT '',
            blood_type TEXT,
            nss TEXT,
            photo_url TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_no_control ON students(no_control)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_grupo ON students(grupo)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS group_students(
            group_id INTEGER NOT NULL,
            student_id INTEGER NOT NULL,
            PRIMARY KEY(group_id, student_id),
            FOREIGN KEY(group_id) REFERENCES groups_table(id),
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_group_students_student ON group_students(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS guardians(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            relationship TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            phone_alt TEXT,
            email TEXT,
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_guardians_student ON guardians(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schedules(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL,
            subject_id INTEGER NOT NULL,
            teacher_id INTEGER NOT NULL,
            day INTEGER NOT NULL,
            period_num INTEGER NOT NULL,
            classroom TEXT,
            FOREIGN KEY(group_id) REFERENCES groups_table(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id),
            FOREIGN KEY(teacher_id) REFERENCES teachers(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_schedules_group ON schedules(group_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_schedules_teacher ON schedules(teacher_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            subject_id INTEGER,
            period_id INTEGER NOT NULL,
            partial_1 REAL,
            partial_2 REAL,
            partial_3 REAL,
            final_score REAL,
            acred_type TEXT,
            source TEXT NOT NULL DEFAULT 'manual',
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id),
            FOREIGN KEY(period_id) REFERENCES periods(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_student_period ON grades(student_id, period_id)",
        [],
    )?;

    seed_specialties(conn)?;

    Ok(())
}

// The three academic tracks are fixed; importers look them up by code.
fn seed_specialties(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO specialties(name, code) VALUES('Acuacultura', 'ACUA')",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO specialties(name, code)
         VALUES('Producción Industrial de Alimentos', 'PIA')",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO specialties(name, code)
         VALUES('Responsabilidad Social', 'RSIA')",
        [],
    )?;
    Ok(())
}
