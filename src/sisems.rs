use calamine::Data;
use std::collections::HashSet;

// 12-column format: student roster only.
const ROSTER_HEADERS: [&str; 12] = [
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
];

// 22-column format: roster + grades + attendance. Shares the first 12
// columns with the roster format; only indices 12-15 and 19-20 of the tail
// are consumed.
const GRADES_HEADERS: [&str; 22] = [
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
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SisemsKind {
    Roster,
    Grades,
}

impl SisemsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SisemsKind::Roster => "roster",
            SisemsKind::Grades => "grades",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedStudent {
    pub no_control: String,
    pub curp: String,
    pub name: String,
    pub paterno: String,
    pub materno: String,
    pub career: String,
    pub generation: String,
    pub semester: i64,
    pub grupo: String,
}

#[derive(Debug, Clone)]
pub struct ParsedGrade {
    pub no_control: String,
    pub partial_1: Option<f64>,
    pub partial_2: Option<f64>,
    pub partial_3: Option<f64>,
    pub final_score: Option<f64>,
    pub acred_type: Option<String>,
    /// Present in the grades format but not persisted anywhere yet.
    pub periodo_name: Option<String>,
}

pub struct SisemsData {
    pub kind: SisemsKind,
    pub students: Vec<ParsedStudent>,
    pub grades: Vec<ParsedGrade>,
    pub warnings: Vec<String>,
}

/// Parses SISEMS worksheet rows (header row + data rows) into students and,
/// for the 22-column format, one grade record per data row. Never fails:
/// malformed cells degrade to warnings or nulls.
pub fn parse_sisems_rows(rows: &[Vec<Data>]) -> SisemsData {
    let mut warnings: Vec<String> = Vec::new();

    if rows.len() < 2 {
        return SisemsData {
            kind: SisemsKind::Roster,
            students: Vec::new(),
            grades: Vec::new(),
            warnings: vec!["Archivo vacío o sin datos".to_string()],
        };
    }

    let header = &rows[0];
    let kind = if header.len() >= 20 {
        SisemsKind::Grades
    } else {
        SisemsKind::Roster
    };

    let expected: &[&str] = match kind {
        SisemsKind::Grades => &GRADES_HEADERS,
        SisemsKind::Roster => &ROSTER_HEADERS,
    };
    // Only the 12 shared leading columns are validated; the grades tail is
    // accepted as-is.
    for (i, exp) in expected.iter().take(12).enumerate() {
        let found = cell_text(header, i).to_uppercase();
        if found != exp.to_uppercase() {
            warnings.push(format!(
                "Columna {}: esperada \"{}\", encontrada \"{}\"",
                i + 1,
                exp,
                found
            ));
        }
    }

    let mut students: Vec<ParsedStudent> = Vec::new();
    let mut grades: Vec<ParsedGrade> = Vec::new();
    let mut seen_controls: HashSet<String> = HashSet::new();

    for (r, row) in rows.iter().enumerate().skip(1) {
        let no_control = cell_text(row, 7);
        if no_control.is_empty() {
            warnings.push(format!("Fila {}: NO CONTROL vacío, se omitió", r + 1));
            continue;
        }

        // First sighting of a control number wins; later rows with the same
        // key still contribute grade records below.
        if seen_controls.insert(no_control.clone()) {
            students.push(ParsedStudent {
                no_control: no_control.clone(),
                curp: cell_text(row, 11),
                name: cell_text(row, 8),
                paterno: cell_text(row, 9),
                materno: cell_text(row, 10),
                career: cell_text(row, 2),
                generation: normalize_generation(&cell_text(row, 3)),
                semester: cell_number(row, 5).map(|n| n as i64).unwrap_or(0),
                grupo: cell_text(row, 6),
            });
        }

        if kind == SisemsKind::Grades {
            grades.push(ParsedGrade {
                no_control,
                partial_1: cell_number(row, 12),
                partial_2: cell_number(row, 13),
                partial_3: cell_number(row, 14),
                final_score: cell_number(row, 15),
                acred_type: non_empty(cell_text(row, 19)),
                periodo_name: non_empty(cell_text(row, 20)),
            });
        }
    }

    SisemsData {
        kind,
        students,
        grades,
        warnings,
    }
}

fn cell_text(row: &[Data], idx: usize) -> String {
    match row.get(idx) {
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(f)) => {
            // Whole-valued floats are ids/counts mangled by the spreadsheet;
            // render them without the decimal point.
            if (f.floor() - f).abs() < f64::EPSILON {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Some(Data::Int(i)) => format!("{}", i),
        Some(Data::Bool(b)) => format!("{}", b),
        Some(Data::DateTime(dt)) => dt.to_string(),
        Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => s.trim().to_string(),
        Some(Data::Empty) | Some(Data::Error(_)) | None => String::new(),
    }
}

// Score cells are sparse: empty, the literal null marker, and unparsable
// text all degrade to None without a warning.
fn cell_number(row: &[Data], idx: usize) -> Option<f64> {
    match row.get(idx) {
        Some(Data::Float(f)) => Some(*f),
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Data::String(s)) => {
            let t = s.trim();
            if t.is_empty() || t == "None" {
                return None;
            }
            t.parse::<f64>().ok()
        }
        _ => None,
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Rewrites "YYYY-YYYY" (any spacing around the hyphen) to "YYYY - YYYY".
/// Anything else passes through unchanged.
fn normalize_generation(raw: &str) -> String {
    let s = raw.trim();
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();
    let four_digits = |i: usize| i + 4 <= n && chars[i..i + 4].iter().all(|c| c.is_ascii_digit());

    for start in 0..n {
        if !four_digits(start) {
            continue;
        }
        let mut i = start + 4;
        while i < n && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= n || chars[i] != '-' {
            continue;
        }
        i += 1;
        while i < n && chars[i].is_whitespace() {
            i += 1;
        }
        if !four_digits(i) {
            continue;
        }
        let first: String = chars[start..start + 4].iter().collect();
        let second: String = chars[i..i + 4].iter().collect();
        let prefix: String = chars[..start].iter().collect();
        let suffix: String = chars[i + 4..].iter().collect();
        return format!("{}{} - {}{}", prefix, first, second, suffix);
    }

    s.to_string()
}
