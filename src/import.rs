use crate::asc::AscData;
use crate::sisems::{SisemsData, SisemsKind};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};

/// Per-import lookup-or-create cache for catalog rows. One resolver lives
/// for exactly one import call; the maps guarantee that resolving the same
/// external key twice in a run returns the same internal id without a
/// second insert.
pub struct CatalogResolver {
    teachers: HashMap<String, i64>,
    subjects: HashMap<String, i64>,
    groups: HashMap<(i64, String), i64>,
    specialties: HashMap<String, Option<i64>>,
}

impl CatalogResolver {
    pub fn new() -> Self {
        CatalogResolver {
            teachers: HashMap::new(),
            subjects: HashMap::new(),
            groups: HashMap::new(),
            specialties: HashMap::new(),
        }
    }

    fn specialty_by_code(
        &mut self,
        conn: &Connection,
        code: &str,
    ) -> rusqlite::Result<Option<i64>> {
        if let Some(cached) = self.specialties.get(code) {
            return Ok(*cached);
        }
        let id: Option<i64> = conn
            .query_row("SELECT id FROM specialties WHERE code = ?", [code], |r| {
                r.get(0)
            })
            .optional()?;
        self.specialties.insert(code.to_string(), id);
        Ok(id)
    }

    /// Upserts a teacher by external id: existing rows are refreshed with
    /// the latest name, new external ids insert a row.
    pub fn resolve_teacher(
        &mut self,
        conn: &Connection,
        xml_id: &str,
        name: &str,
        short_name: &str,
    ) -> rusqlite::Result<i64> {
        if let Some(id) = self.teachers.get(xml_id).copied() {
            conn.execute(
                "UPDATE teachers SET name = ?, short_name = ? WHERE id = ?",
                params![name, short_name, id],
            )?;
            return Ok(id);
        }
        let existing: Option<i64> = conn
            .query_row("SELECT id FROM teachers WHERE xml_id = ?", [xml_id], |r| {
                r.get(0)
            })
            .optional()?;
        let id = match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE teachers SET name = ?, short_name = ? WHERE id = ?",
                    params![name, short_name, id],
                )?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO teachers(xml_id, name, short_name) VALUES(?, ?, ?)",
                    params![xml_id, name, short_name],
                )?;
                conn.last_insert_rowid()
            }
        };
        self.teachers.insert(xml_id.to_string(), id);
        Ok(id)
    }

    pub fn resolve_subject(
        &mut self,
        conn: &Connection,
        xml_id: &str,
        name: &str,
        short_code: &str,
    ) -> rusqlite::Result<i64> {
        if let Some(id) = self.subjects.get(xml_id).copied() {
            conn.execute(
                "UPDATE subjects SET name = ?, short_code = ? WHERE id = ?",
                params![name, short_code, id],
            )?;
            return Ok(id);
        }
        let existing: Option<i64> = conn
            .query_row("SELECT id FROM subjects WHERE xml_id = ?", [xml_id], |r| {
                r.get(0)
            })
            .optional()?;
        let id = match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE subjects SET name = ?, short_code = ? WHERE id = ?",
                    params![name, short_code, id],
                )?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO subjects(xml_id, name, short_code) VALUES(?, ?, ?)",
                    params![xml_id, name, short_code],
                )?;
                conn.last_insert_rowid()
            }
        };
        self.subjects.insert(xml_id.to_string(), id);
        Ok(id)
    }

    /// Groups coalesce on (period, name) so a roster-created group and a
    /// timetable-created group with the same name end up as one row.
    /// Semester and specialty are set on first sight only.
    pub fn resolve_group(
        &mut self,
        conn: &Connection,
        period_id: i64,
        name: &str,
        semester: i64,
        specialty_id: Option<i64>,
    ) -> rusqlite::Result<(i64, bool)> {
        let key = (period_id, name.to_string());
        if let Some(id) = self.groups.get(&key).copied() {
            return Ok((id, false));
        }
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM groups_table WHERE period_id = ? AND name = ?",
                params![period_id, name],
                |r| r.get(0),
            )
            .optional()?;
        match existing {
            Some(id) => {
                self.groups.insert(key, id);
                Ok((id, false))
            }
            None => {
                conn.execute(
                    "INSERT INTO groups_table(period_id, name, semester, specialty_id)
                     VALUES(?, ?, ?, ?)",
                    params![period_id, name, semester, specialty_id],
                )?;
                let id = conn.last_insert_rowid();
                self.groups.insert(key, id);
                Ok((id, true))
            }
        }
    }

    pub fn teacher_id(&self, xml_id: &str) -> Option<i64> {
        self.teachers.get(xml_id).copied()
    }

    pub fn subject_id(&self, xml_id: &str) -> Option<i64> {
        self.subjects.get(xml_id).copied()
    }
}

pub struct SisemsImportSummary {
    pub students_upserted: usize,
    pub grades_imported: usize,
    pub groups_created: Vec<String>,
}

/// Persists a decoded SISEMS file against one school period. Students
/// upsert by no_control (re-activating on update), group memberships are
/// idempotent, and aggregate grades upsert on (student, period, no
/// subject).
pub fn import_sisems(
    conn: &Connection,
    resolver: &mut CatalogResolver,
    data: &SisemsData,
    period_id: i64,
) -> anyhow::Result<SisemsImportSummary> {
    let mut summary = SisemsImportSummary {
        students_upserted: 0,
        grades_imported: 0,
        groups_created: Vec::new(),
    };

    // Distinct groups across the file; the first row naming a group decides
    // its semester and career.
    let mut seen_groups: HashSet<String> = HashSet::new();
    let mut group_ids: HashMap<String, i64> = HashMap::new();
    for s in &data.students {
        if !seen_groups.insert(s.grupo.clone()) {
            continue;
        }
        let specialty_id = match career_specialty_code(&s.career) {
            Some(code) => resolver.specialty_by_code(conn, code)?,
            None => None,
        };
        let (group_id, created) =
            resolver.resolve_group(conn, period_id, &s.grupo, s.semester, specialty_id)?;
        if created {
            summary.groups_created.push(s.grupo.clone());
        }
        group_ids.insert(s.grupo.clone(), group_id);
    }

    for s in &data.students {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM students WHERE no_control = ?",
                [&s.no_control],
                |r| r.get(0),
            )
            .optional()?;
        let student_id = match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE students SET curp = ?, name = ?, paterno = ?, materno = ?,
                       career = ?, generation = ?, semester = ?, grupo = ?, active = 1
                     WHERE id = ?",
                    params![
                        s.curp,
                        s.name,
                        s.paterno,
                        s.materno,
                        s.career,
                        s.generation,
                        s.semester,
                        s.grupo,
                        id
                    ],
                )?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO students(no_control, curp, name, paterno, materno,
                       career, generation, semester, grupo, created_at)
                     VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        s.no_control,
                        s.curp,
                        s.name,
                        s.paterno,
                        s.materno,
                        s.career,
                        s.generation,
                        s.semester,
                        s.grupo,
                        chrono::Utc::now().to_rfc3339()
                    ],
                )?;
                conn.last_insert_rowid()
            }
        };
        summary.students_upserted += 1;

        if let Some(group_id) = group_ids.get(&s.grupo) {
            conn.execute(
                "INSERT OR IGNORE INTO group_students(group_id, student_id) VALUES(?, ?)",
                params![group_id, student_id],
            )?;
        }
    }

    if data.kind == SisemsKind::Grades {
        for g in &data.grades {
            // Best-effort: grade rows whose student never made it into the
            // store are skipped, not errors.
            let student_id: Option<i64> = conn
                .query_row(
                    "SELECT id FROM students WHERE no_control = ?",
                    [&g.no_control],
                    |r| r.get(0),
                )
                .optional()?;
            let Some(student_id) = student_id else {
                continue;
            };

            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM grades
                     WHERE student_id = ? AND period_id = ? AND subject_id IS NULL",
                    params![student_id, period_id],
                    |r| r.get(0),
                )
                .optional()?;
            match existing {
                Some(grade_id) => {
                    conn.execute(
                        "UPDATE grades SET partial_1 = ?, partial_2 = ?, partial_3 = ?,
                           final_score = ?, acred_type = ?
                         WHERE id = ?",
                        params![
                            g.partial_1,
                            g.partial_2,
                            g.partial_3,
                            g.final_score,
                            g.acred_type,
                            grade_id
                        ],
                    )?;
                }
                None => {
                    conn.execute(
                        "INSERT INTO grades(student_id, period_id, partial_1, partial_2,
                           partial_3, final_score, acred_type, source)
                         VALUES(?, ?, ?, ?, ?, ?, ?, 'sisems')",
                        params![
                            student_id,
                            period_id,
                            g.partial_1,
                            g.partial_2,
                            g.partial_3,
                            g.final_score,
                            g.acred_type
                        ],
                    )?;
                }
            }
            summary.grades_imported += 1;
        }
    }

    Ok(summary)
}

pub struct HorariosImportSummary {
    pub teachers_upserted: usize,
    pub subjects_upserted: usize,
    pub groups_created: usize,
    pub schedules_created: usize,
}

/// Persists a decoded timetable against one school period. Existing
/// schedule rows of every group touched by this import are dropped first so
/// a re-import replaces rather than accumulates; cards whose teacher or
/// subject did not resolve are dropped silently.
pub fn import_horarios(
    conn: &Connection,
    resolver: &mut CatalogResolver,
    data: &AscData,
    period_id: i64,
) -> anyhow::Result<HorariosImportSummary> {
    let mut summary = HorariosImportSummary {
        teachers_upserted: 0,
        subjects_upserted: 0,
        groups_created: 0,
        schedules_created: 0,
    };

    for t in &data.teachers {
        resolver.resolve_teacher(conn, &t.xml_id, &t.name, &t.short_name)?;
        summary.teachers_upserted += 1;
    }

    for s in &data.subjects {
        resolver.resolve_subject(conn, &s.xml_id, &s.name, &s.short_code)?;
        summary.subjects_upserted += 1;
    }

    // XML class ids → group rows; cards reference classes by XML id.
    let mut class_groups: HashMap<String, i64> = HashMap::new();
    for cls in &data.classes {
        let specialty_id = match class_specialty_code(&cls.name) {
            Some(code) => resolver.specialty_by_code(conn, code)?,
            None => None,
        };
        let (group_id, created) = resolver.resolve_group(
            conn,
            period_id,
            &cls.name,
            class_semester(&cls.name),
            specialty_id,
        )?;
        if created {
            summary.groups_created += 1;
        }
        class_groups.insert(cls.xml_id.clone(), group_id);
    }

    let touched: HashSet<i64> = class_groups.values().copied().collect();
    for group_id in &touched {
        conn.execute("DELETE FROM schedules WHERE group_id = ?", [group_id])?;
    }

    for card in &data.cards {
        let teacher_id = card
            .teacher_ids
            .first()
            .and_then(|xml_id| resolver.teacher_id(xml_id));
        let subject_id = resolver.subject_id(&card.subject_id);
        let (Some(teacher_id), Some(subject_id)) = (teacher_id, subject_id) else {
            continue;
        };

        // A card may apply to several classes; one schedule row each.
        for class_xml_id in &card.class_ids {
            let Some(group_id) = class_groups.get(class_xml_id) else {
                continue;
            };
            conn.execute(
                "INSERT INTO schedules(group_id, subject_id, teacher_id, day, period_num, classroom)
                 VALUES(?, ?, ?, ?, ?, ?)",
                params![
                    group_id,
                    subject_id,
                    teacher_id,
                    card.day,
                    card.period,
                    card.classroom_ids.first()
                ],
            )?;
            summary.schedules_created += 1;
        }
    }

    Ok(summary)
}

fn career_specialty_code(career: &str) -> Option<&'static str> {
    let upper = career.to_uppercase();
    if upper.contains("ACUACULTURA") {
        Some("ACUA")
    } else if upper.contains("PRODUCCIÓN INDUSTRIAL") || upper.contains("PRODUCCION INDUSTRIAL") {
        Some("PIA")
    } else if upper.contains("RESPONSABILIDAD SOCIAL") {
        Some("RSIA")
    } else {
        None
    }
}

fn class_specialty_code(name: &str) -> Option<&'static str> {
    let upper = name.to_uppercase();
    if upper.contains("ACUA") {
        Some("ACUA")
    } else if upper.contains("PIA") {
        Some("PIA")
    } else if upper.contains("RSIA") {
        Some("RSIA")
    } else {
        None
    }
}

fn class_semester(name: &str) -> i64 {
    name.chars()
        .next()
        .filter(|c| c.is_ascii_digit())
        .map(|c| (c as u8 - b'0') as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asc::parse_asc_xml;
    use crate::sisems::parse_sisems_rows;
    use calamine::Data;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        crate::db::init_schema(&conn).expect("init schema");
        conn
    }

    fn mk_period(conn: &Connection) -> i64 {
        conn.execute(
            "INSERT INTO periods(name, year, semester_type) VALUES('2024B', 2024, 'odd')",
            [],
        )
        .expect("insert period");
        conn.last_insert_rowid()
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn roster_rows() -> Vec<Vec<Data>> {
        let header = [
            "CLV_CENTRO",
            "PLANTEL",
            "CARRERA",
            "GENERACION",
            "TURNO",
            "SEMESTRE",
            "GRUPO",
            "NO CONTROL",
            "NOMBRE",
            "PATERNO",
            "MATERNO",
            "CURP",
        ]
        .iter()
        .map(|h| s(h))
        .collect();
        let row = vec![
            s("X"),
            s("X"),
            s("TÉCNICO EN ACUACULTURA"),
            s("2024-2027"),
            s("M"),
            s("2"),
            s("2A"),
            s("12345"),
            s("JUAN"),
            s("PEREZ"),
            s("GOMEZ"),
            s("ABCD010101HDFXXX01"),
        ];
        vec![header, row]
    }

    fn grades_rows(final_score: &str) -> Vec<Vec<Data>> {
        let mut rows = roster_rows();
        rows[0].extend(
            [
                "PERIODO 1",
                "PERIODO 2",
                "PERIODO 3",
                "CALIFICACION",
                "ASISTENCIA PERIODO 1",
                "ASISTENCIA PERIODO 2",
                "ASISTENCIA PERIODO 3",
                "TIPO ACRED.",
                "PERIODO",
                "FIRMADO",
            ]
            .iter()
            .map(|h| s(h)),
        );
        rows[1].extend([
            s("8"),
            s("9"),
            s("None"),
            s(final_score),
            s(""),
            s(""),
            s(""),
            s("ORD"),
            s("2024B"),
            s(""),
        ]);
        rows
    }

    const TIMETABLE_XML: &str = r#"<timetable>
  <teacher id="T1" name="MARIA LOPEZ" short="MLO"/>
  <teacher id="T2" name="JOSE RAMIREZ" short="JRA"/>
  <subject id="S1" name="Biología Marina" short="BIO"/>
  <class id="C1" name="2 ACUA" short="2A"/>
  <class id="C2" name="4 PIA" short="4P"/>
  <lesson id="L1" classids="C1,C2" subjectid="S1" teacherids="T1" classroomids="A1"/>
  <card lessonid="L1" days="01000" period="0"/>
</timetable>"#;

    fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |r| r.get(0)).expect("count query")
    }

    #[test]
    fn roster_import_creates_student_group_and_membership() {
        let conn = test_conn();
        let period_id = mk_period(&conn);
        let parsed = parse_sisems_rows(&roster_rows());

        let mut resolver = CatalogResolver::new();
        let summary = import_sisems(&conn, &mut resolver, &parsed, period_id).expect("import");

        assert_eq!(summary.students_upserted, 1);
        assert_eq!(summary.groups_created, vec!["2A".to_string()]);

        let (generation, grupo): (String, String) = conn
            .query_row(
                "SELECT generation, grupo FROM students WHERE no_control = '12345'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .expect("student row");
        assert_eq!(generation, "2024 - 2027");
        assert_eq!(grupo, "2A");

        let specialty: String = conn
            .query_row(
                "SELECT sp.code FROM groups_table g
                 JOIN specialties sp ON g.specialty_id = sp.id
                 WHERE g.name = '2A'",
                [],
                |r| r.get(0),
            )
            .expect("group specialty");
        assert_eq!(specialty, "ACUA");

        assert_eq!(count(&conn, "SELECT COUNT(*) FROM group_students"), 1);
    }

    #[test]
    fn reimporting_same_roster_is_idempotent() {
        let conn = test_conn();
        let period_id = mk_period(&conn);
        let parsed = parse_sisems_rows(&roster_rows());

        let mut first = CatalogResolver::new();
        let s1 = import_sisems(&conn, &mut first, &parsed, period_id).expect("first import");
        let mut second = CatalogResolver::new();
        let s2 = import_sisems(&conn, &mut second, &parsed, period_id).expect("second import");

        assert_eq!(s1.students_upserted, s2.students_upserted);
        assert!(s2.groups_created.is_empty());
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM students"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM groups_table"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM group_students"), 1);
    }

    #[test]
    fn reimport_reactivates_deactivated_student() {
        let conn = test_conn();
        let period_id = mk_period(&conn);
        let parsed = parse_sisems_rows(&roster_rows());

        let mut resolver = CatalogResolver::new();
        import_sisems(&conn, &mut resolver, &parsed, period_id).expect("import");
        conn.execute("UPDATE students SET active = 0 WHERE no_control = '12345'", [])
            .expect("deactivate");

        let mut again = CatalogResolver::new();
        import_sisems(&conn, &mut again, &parsed, period_id).expect("reimport");
        let active: i64 = conn
            .query_row(
                "SELECT active FROM students WHERE no_control = '12345'",
                [],
                |r| r.get(0),
            )
            .expect("active flag");
        assert_eq!(active, 1);
    }

    #[test]
    fn aggregate_grade_upserts_instead_of_duplicating() {
        let conn = test_conn();
        let period_id = mk_period(&conn);

        let first = parse_sisems_rows(&grades_rows("7.5"));
        let mut r1 = CatalogResolver::new();
        let s1 = import_sisems(&conn, &mut r1, &first, period_id).expect("first import");
        assert_eq!(s1.grades_imported, 1);

        let corrected = parse_sisems_rows(&grades_rows("9"));
        let mut r2 = CatalogResolver::new();
        let s2 = import_sisems(&conn, &mut r2, &corrected, period_id).expect("second import");
        assert_eq!(s2.grades_imported, 1);

        assert_eq!(
            count(
                &conn,
                "SELECT COUNT(*) FROM grades WHERE subject_id IS NULL"
            ),
            1
        );
        let (final_score, source): (f64, String) = conn
            .query_row("SELECT final_score, source FROM grades", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .expect("grade row");
        assert_eq!(final_score, 9.0);
        assert_eq!(source, "sisems");
    }

    #[test]
    fn grade_without_known_student_is_skipped() {
        let conn = test_conn();
        let period_id = mk_period(&conn);

        let mut rows = grades_rows("8");
        // Blank the student key: the row is skipped entirely at decode time,
        // so no grade record reaches the store either.
        rows[1][7] = s("");
        let parsed = parse_sisems_rows(&rows);
        assert!(parsed.students.is_empty());

        let mut resolver = CatalogResolver::new();
        let summary = import_sisems(&conn, &mut resolver, &parsed, period_id).expect("import");
        assert_eq!(summary.grades_imported, 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM grades"), 0);
    }

    #[test]
    fn timetable_import_expands_cards_per_class() {
        let conn = test_conn();
        let period_id = mk_period(&conn);
        let parsed = parse_asc_xml(TIMETABLE_XML);

        let mut resolver = CatalogResolver::new();
        let summary =
            import_horarios(&conn, &mut resolver, &parsed, period_id).expect("import");

        assert_eq!(summary.teachers_upserted, 2);
        assert_eq!(summary.subjects_upserted, 1);
        assert_eq!(summary.groups_created, 2);
        assert_eq!(summary.schedules_created, 2);

        let (day, period_num, classroom): (i64, i64, Option<String>) = conn
            .query_row(
                "SELECT day, period_num, classroom FROM schedules LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .expect("schedule row");
        assert_eq!(day, 2);
        assert_eq!(period_num, 1);
        assert_eq!(classroom.as_deref(), Some("A1"));

        let semesters: Vec<i64> = conn
            .prepare("SELECT semester FROM groups_table ORDER BY name")
            .and_then(|mut st| {
                st.query_map([], |r| r.get(0))
                    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
            })
            .expect("group semesters");
        assert_eq!(semesters, vec![2, 4]);
    }

    #[test]
    fn timetable_reimport_rebuilds_schedules_without_duplicates() {
        let conn = test_conn();
        let period_id = mk_period(&conn);
        let parsed = parse_asc_xml(TIMETABLE_XML);

        let mut r1 = CatalogResolver::new();
        import_horarios(&conn, &mut r1, &parsed, period_id).expect("first import");
        let mut r2 = CatalogResolver::new();
        let s2 = import_horarios(&conn, &mut r2, &parsed, period_id).expect("second import");

        assert_eq!(s2.groups_created, 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM schedules"), 2);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM teachers"), 2);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM subjects"), 1);
    }

    #[test]
    fn card_with_unresolved_teacher_is_dropped() {
        let conn = test_conn();
        let period_id = mk_period(&conn);
        let xml = r#"<timetable>
  <subject id="S1" name="Quimica" short="QUI"/>
  <class id="C1" name="1 RSIA" short="1R"/>
  <lesson id="L1" classids="C1" subjectid="S1" teacherids="T9" classroomids=""/>
  <card lessonid="L1" days="10000" period="2"/>
</timetable>"#;
        let parsed = parse_asc_xml(xml);
        assert_eq!(parsed.cards.len(), 1);

        let mut resolver = CatalogResolver::new();
        let summary =
            import_horarios(&conn, &mut resolver, &parsed, period_id).expect("import");
        assert_eq!(summary.schedules_created, 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM schedules"), 0);
    }

    #[test]
    fn roster_and_timetable_groups_coalesce_by_period_and_name() {
        let conn = test_conn();
        let period_id = mk_period(&conn);

        let roster = parse_sisems_rows(&roster_rows());
        let mut r1 = CatalogResolver::new();
        import_sisems(&conn, &mut r1, &roster, period_id).expect("roster import");

        let xml = r#"<timetable>
  <teacher id="T1" name="MARIA LOPEZ" short="MLO"/>
  <subject id="S1" name="Acuicultura I" short="ACU"/>
  <class id="C1" name="2A" short="2A"/>
  <lesson id="L1" classids="C1" subjectid="S1" teacherids="T1" classroomids=""/>
  <card lessonid="L1" days="00100" period="3"/>
</timetable>"#;
        let parsed = parse_asc_xml(xml);
        let mut r2 = CatalogResolver::new();
        let summary =
            import_horarios(&conn, &mut r2, &parsed, period_id).expect("timetable import");

        assert_eq!(summary.groups_created, 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM groups_table"), 1);
        assert_eq!(summary.schedules_created, 1);
    }

    #[test]
    fn same_key_resolved_twice_in_one_run_inserts_once() {
        let conn = test_conn();
        let mut resolver = CatalogResolver::new();
        let a = resolver
            .resolve_teacher(&conn, "T1", "MARIA", "MLO")
            .expect("first resolve");
        let b = resolver
            .resolve_teacher(&conn, "T1", "MARIA L.", "MLO")
            .expect("second resolve");
        assert_eq!(a, b);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM teachers"), 1);
        let name: String = conn
            .query_row("SELECT name FROM teachers WHERE id = ?", [a], |r| r.get(0))
            .expect("teacher name");
        assert_eq!(name, "MARIA L.");
    }
}
