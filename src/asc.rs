use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ParsedTeacher {
    pub xml_id: String,
    pub name: String,
    pub short_name: String,
}

#[derive(Debug, Clone)]
pub struct ParsedSubject {
    pub xml_id: String,
    pub name: String,
    pub short_code: String,
}

#[derive(Debug, Clone)]
pub struct ParsedClass {
    pub xml_id: String,
    pub name: String,
    pub short_name: String,
}

/// Time-of-day slot definition. Informational only; nothing downstream
/// references these by id.
#[derive(Debug, Clone)]
pub struct ParsedPeriodDef {
    pub name: String,
    pub short: String,
    pub start_time: String,
    pub end_time: String,
}

/// One weekly schedule slot, already joined with its lesson's linkage.
/// `day` and `period` are 1-based (day 1 = Monday).
#[derive(Debug, Clone)]
pub struct ParsedCard {
    pub lesson_id: String,
    pub class_ids: Vec<String>,
    pub subject_id: String,
    pub teacher_ids: Vec<String>,
    pub classroom_ids: Vec<String>,
    pub day: i64,
    pub period: i64,
}

pub struct AscData {
    pub teachers: Vec<ParsedTeacher>,
    pub subjects: Vec<ParsedSubject>,
    pub classes: Vec<ParsedClass>,
    pub periods: Vec<ParsedPeriodDef>,
    pub cards: Vec<ParsedCard>,
    pub warnings: Vec<String>,
}

struct LessonRef {
    class_ids: Vec<String>,
    subject_id: String,
    teacher_ids: Vec<String>,
    classroom_ids: Vec<String>,
}

/// Decodes an aSc Timetables XML export. The format is flat and
/// attribute-only, so this is a start-tag scan rather than a document parse;
/// tag order and nesting are irrelevant. Malformed elements degrade to
/// warnings and are skipped.
pub fn parse_asc_xml(xml: &str) -> AscData {
    let mut warnings: Vec<String> = Vec::new();
    let mut teachers: Vec<ParsedTeacher> = Vec::new();
    let mut subjects: Vec<ParsedSubject> = Vec::new();
    let mut classes: Vec<ParsedClass> = Vec::new();
    let mut periods: Vec<ParsedPeriodDef> = Vec::new();
    let mut cards: Vec<ParsedCard> = Vec::new();

    for frag in scan_start_tags(xml, "teacher") {
        let attrs = parse_attributes(frag);
        // Elements without an id cannot be referenced by lessons; skip them.
        let Some(id) = attrs.get("id") else { continue };
        let name = match attrs.get("name") {
            Some(n) if !n.is_empty() => n.clone(),
            _ => format!(
                "{} {}",
                attrs.get("firstname").map(String::as_str).unwrap_or(""),
                attrs.get("lastname").map(String::as_str).unwrap_or("")
            )
            .trim()
            .to_string(),
        };
        teachers.push(ParsedTeacher {
            xml_id: id.clone(),
            name,
            short_name: attrs.get("short").cloned().unwrap_or_default(),
        });
    }

    for frag in scan_start_tags(xml, "subject") {
        let attrs = parse_attributes(frag);
        let Some(id) = attrs.get("id") else { continue };
        subjects.push(ParsedSubject {
            xml_id: id.clone(),
            name: attrs.get("name").cloned().unwrap_or_default(),
            short_code: attrs.get("short").cloned().unwrap_or_default(),
        });
    }

    for frag in scan_start_tags(xml, "class") {
        let attrs = parse_attributes(frag);
        let Some(id) = attrs.get("id") else { continue };
        classes.push(ParsedClass {
            xml_id: id.clone(),
            name: attrs.get("name").cloned().unwrap_or_default(),
            short_name: attrs.get("short").cloned().unwrap_or_default(),
        });
    }

    for frag in scan_start_tags(xml, "period") {
        let attrs = parse_attributes(frag);
        let name = attrs.get("name").cloned().unwrap_or_default();
        let short = attrs.get("short").cloned().unwrap_or_default();
        if name.is_empty() && short.is_empty() {
            continue;
        }
        periods.push(ParsedPeriodDef {
            name: if name.is_empty() { short.clone() } else { name },
            short,
            start_time: attrs.get("starttime").cloned().unwrap_or_default(),
            end_time: attrs.get("endtime").cloned().unwrap_or_default(),
        });
    }

    // Lessons are only a join table between cards and the catalogs above;
    // they are consumed here and never emitted.
    let mut lessons: HashMap<String, LessonRef> = HashMap::new();
    for frag in scan_start_tags(xml, "lesson") {
        let attrs = parse_attributes(frag);
        let Some(id) = attrs.get("id") else { continue };
        lessons.insert(
            id.clone(),
            LessonRef {
                class_ids: split_ids(attrs.get("classids")),
                subject_id: attrs.get("subjectid").cloned().unwrap_or_default(),
                teacher_ids: split_ids(attrs.get("teacherids")),
                classroom_ids: split_ids(attrs.get("classroomids")),
            },
        );
    }

    for frag in scan_start_tags(xml, "card") {
        let attrs = parse_attributes(frag);
        let lesson_id = attrs.get("lessonid").cloned().unwrap_or_default();
        let Some(lesson) = lessons.get(&lesson_id) else {
            if !lesson_id.is_empty() {
                warnings.push(format!(
                    "Card referencia lesson \"{}\" no encontrado",
                    lesson_id
                ));
            }
            continue;
        };

        let days = attrs.get("days").map(String::as_str).unwrap_or("");
        let period = attrs
            .get("period")
            .and_then(|p| p.parse::<i64>().ok())
            .unwrap_or(0);

        cards.push(ParsedCard {
            lesson_id,
            class_ids: lesson.class_ids.clone(),
            subject_id: lesson.subject_id.clone(),
            teacher_ids: lesson.teacher_ids.clone(),
            classroom_ids: lesson.classroom_ids.clone(),
            day: decode_day(days) + 1,
            period: period + 1,
        });
    }

    if teachers.is_empty() {
        warnings.push("No se encontraron docentes en el XML".to_string());
    }
    if subjects.is_empty() {
        warnings.push("No se encontraron materias en el XML".to_string());
    }
    if classes.is_empty() {
        warnings.push("No se encontraron grupos/clases en el XML".to_string());
    }

    AscData {
        teachers,
        subjects,
        classes,
        periods,
        cards,
        warnings,
    }
}

/// The day attribute is either a '0'/'1' bitmask whose set bit marks the
/// 0-based day ("01000" = Tuesday), or a plain 0-based integer. A single
/// character is always read as an integer, so "1" means Tuesday too.
fn decode_day(days: &str) -> i64 {
    if days.len() > 1 && days.chars().all(|c| c == '0' || c == '1') {
        match days.find('1') {
            Some(i) => i as i64,
            None => -1,
        }
    } else {
        days.parse::<i64>().unwrap_or(0)
    }
}

fn split_ids(raw: Option<&String>) -> Vec<String> {
    raw.map(String::as_str)
        .unwrap_or("")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Returns the inner fragment of every `<tag ...>` start tag: the text
/// between the tag name and the closing `>` (a trailing `/` is stripped).
/// Requires whitespace after the tag name so `<class` does not match
/// `<classroom`.
fn scan_start_tags<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let needle = format!("<{}", tag);
    let mut out: Vec<&'a str> = Vec::new();
    for (pos, _) in xml.match_indices(&needle) {
        let after = pos + needle.len();
        let Some(next) = xml[after..].chars().next() else {
            continue;
        };
        if !next.is_whitespace() {
            continue;
        }
        let Some(end) = xml[after..].find('>') else {
            continue;
        };
        let frag = xml[after..after + end].trim_end_matches('/');
        out.push(frag);
    }
    out
}

/// Extracts every `name="value"` pair from a start-tag fragment, keyed by
/// lower-cased attribute name. Double quotes only; anything that does not
/// match the pattern is ignored.
pub fn parse_attributes(fragment: &str) -> HashMap<String, String> {
    let mut attrs: HashMap<String, String> = HashMap::new();
    let mut rest = fragment;
    while let Some(eq) = rest.find('=') {
        let (before, after) = rest.split_at(eq);
        let name: String = before
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect::<String>()
            .chars()
            .rev()
            .collect();
        let after = &after[1..];
        if name.is_empty() || !after.starts_with('"') {
            rest = after;
            continue;
        }
        let value_and_rest = &after[1..];
        match value_and_rest.find('"') {
            Some(close) => {
                attrs.insert(
                    name.to_ascii_lowercase(),
                    value_and_rest[..close].to_string(),
                );
                rest = &value_and_rest[close + 1..];
            }
            None => break,
        }
    }
    attrs
}
