//! Context builder: turns a loosely-typed profile record into a fixed-shape
//! snapshot and renders it as the labeled block the model reads.
//!
//! # Determinism
//!
//! Rendering is a pure function of the snapshot and field order is fixed, so
//! identical records always produce byte-identical blocks.
//!
//! # Placeholders
//!
//! A labeled field is never dropped. Absent scalars render as `Unknown`,
//! absent or empty lists as `None`.

use serde::Serialize;
use serde_json::{Map, Value};

pub const CONTEXT_OPEN: &str = "[CURRENT CONTEXT DATA]";
pub const CONTEXT_CLOSE: &str = "[/CURRENT CONTEXT DATA]";
pub const GROUNDING_INSTRUCTION: &str = "Answer the user's question using ONLY the data inside the block above. If the answer is not in that data, state that it is not available.";

const UNKNOWN: &str = "Unknown";
const NONE: &str = "None";

/// A scalar that the dashboard stores either as text or as a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectScore {
    pub name: String,
    pub score: FieldValue,
}

/// Normalized summary of a user's role and academic data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub role: String,
    pub name: String,
    pub grade: Option<FieldValue>,
    pub attendance: Option<FieldValue>,
    pub risk_score: Option<FieldValue>,
    pub risk_factors: Option<Vec<String>>,
    pub subjects: Option<Vec<SubjectScore>>,
}

impl ContextSnapshot {
    /// Snapshot used when no record could be obtained for the user.
    pub fn placeholder() -> Self {
        Self {
            role: UNKNOWN.into(),
            name: UNKNOWN.into(),
            grade: None,
            attendance: None,
            risk_score: None,
            risk_factors: None,
            subjects: None,
        }
    }

    /// Build a snapshot from a raw record. Never fails: anything that is
    /// missing or of the wrong type becomes a placeholder. Unknown keys are
    /// ignored.
    pub fn build(raw: &Value) -> Self {
        let Some(obj) = raw.as_object() else {
            return Self::placeholder();
        };

        Self {
            role: text_field(obj, &["role"]),
            name: text_field(obj, &["name"]),
            grade: field(obj, &["grade", "class"]).and_then(scalar),
            attendance: field(obj, &["attendance"]).and_then(scalar),
            risk_score: field(obj, &["riskScore", "risk_score"]).and_then(scalar),
            risk_factors: field(obj, &["riskFactors", "risk_factors"])
                .and_then(|v| list(v, |item| scalar(item).map(|s| s.to_string()))),
            subjects: field(obj, &["subjects"]).and_then(|v| list(v, subject)),
        }
    }

    /// Render the labeled block, followed by the grounding instruction and a
    /// blank line.
    ///
    /// List items render as `- item`, one per line. An absent or empty list
    /// renders as a bare `None` line under its label, without the bullet.
    pub fn render(&self) -> String {
        let mut lines = vec![
            CONTEXT_OPEN.to_string(),
            format!("ROLE: {}", self.role),
            format!("Name: {}", self.name),
            format!("Class/Grade: {}", or_unknown(&self.grade)),
            format!("Attendance: {}", self.attendance_text()),
            format!("Risk Score: {}", or_unknown(&self.risk_score)),
            "Top Risk Factors:".to_string(),
        ];

        match self.risk_factors.as_deref() {
            Some(factors) if !factors.is_empty() => {
                lines.extend(factors.iter().map(|f| format!("- {f}")));
            }
            _ => lines.push(NONE.to_string()),
        }

        lines.push("Weak Subjects:".to_string());
        match self.subjects.as_deref() {
            Some(subjects) if !subjects.is_empty() => {
                lines.extend(
                    subjects
                        .iter()
                        .map(|s| format!("- {}: {}", s.name, s.score)),
                );
            }
            _ => lines.push(NONE.to_string()),
        }

        lines.push(CONTEXT_CLOSE.to_string());
        lines.push(GROUNDING_INSTRUCTION.to_string());

        let mut block = lines.join("\n");
        block.push_str("\n\n");
        block
    }

    fn attendance_text(&self) -> String {
        match &self.attendance {
            None => UNKNOWN.to_string(),
            Some(FieldValue::Text(s)) if s.ends_with('%') => s.clone(),
            Some(value) => format!("{value}%"),
        }
    }
}

/// Build a snapshot from a raw record.
pub fn build(raw: &Value) -> ContextSnapshot {
    ContextSnapshot::build(raw)
}

/// First present, non-null value among `keys`.
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    field(obj, keys)
        .and_then(scalar)
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn scalar(value: &Value) -> Option<FieldValue> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| FieldValue::Text(trimmed.to_string()))
        }
        Value::Number(n) => Some(FieldValue::Number(whole(n))),
        _ => None,
    }
}

/// Drop the fraction from whole floats so `88.0` renders as `88`.
fn whole(n: &serde_json::Number) -> serde_json::Number {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            serde_json::Number::from(f as i64)
        }
        _ => n.clone(),
    }
}

/// Keep the well-formed elements of an array. A non-array, or an array with
/// nothing usable, counts as absent.
fn list<T>(value: &Value, item: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    let items: Vec<T> = value.as_array()?.iter().filter_map(item).collect();
    (!items.is_empty()).then_some(items)
}

fn subject(value: &Value) -> Option<SubjectScore> {
    let obj = value.as_object()?;
    let name = match field(obj, &["name", "subject"])? {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return None,
    };
    let score = field(obj, &["score"]).and_then(scalar)?;
    Some(SubjectScore { name, score })
}

fn or_unknown(value: &Option<FieldValue>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn asha() -> Value {
        json!({
            "role": "Student",
            "name": "Asha",
            "grade": "10-B",
            "attendance": 92,
            "riskScore": "Low",
            "riskFactors": ["Late submissions", "Missed lab"],
            "subjects": [{"name": "Math", "score": 88}, {"name": "Physics", "score": 61.5}]
        })
    }

    #[test]
    fn renders_full_block_in_fixed_order() {
        let block = build(&asha()).render();
        let expected = format!(
            "[CURRENT CONTEXT DATA]\n\
             ROLE: Student\n\
             Name: Asha\n\
             Class/Grade: 10-B\n\
             Attendance: 92%\n\
             Risk Score: Low\n\
             Top Risk Factors:\n\
             - Late submissions\n\
             - Missed lab\n\
             Weak Subjects:\n\
             - Math: 88\n\
             - Physics: 61.5\n\
             [/CURRENT CONTEXT DATA]\n\
             {GROUNDING_INSTRUCTION}\n\n"
        );
        assert_eq!(block, expected);
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = build(&asha()).render();
        let b = build(&asha()).render();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_fields_render_placeholders() {
        let block = build(&json!({"role": "Teacher", "name": "Ravi"})).render();
        assert!(block.contains("Class/Grade: Unknown\n"));
        assert!(block.contains("Attendance: Unknown\n"));
        assert!(block.contains("Risk Score: Unknown\n"));
        assert!(block.contains("Top Risk Factors:\nNone\n"));
        assert!(block.contains("Weak Subjects:\nNone\n"));
        assert!(!block.contains("null"));
    }

    #[test]
    fn non_object_input_is_all_placeholders() {
        for raw in [json!(null), json!("Asha"), json!([1, 2]), json!(42)] {
            assert_eq!(build(&raw), ContextSnapshot::placeholder());
        }
        let block = ContextSnapshot::placeholder().render();
        assert!(block.contains("ROLE: Unknown\nName: Unknown\n"));
    }

    #[test]
    fn malformed_types_coerce_to_unknown() {
        let snapshot = build(&json!({
            "role": true,
            "name": {"first": "Asha"},
            "attendance": [92],
            "riskScore": null,
            "grade": "   ",
            "riskFactors": "Late submissions",
            "subjects": {"Math": 88}
        }));
        assert_eq!(snapshot, ContextSnapshot::placeholder());
    }

    #[test]
    fn malformed_list_elements_are_skipped() {
        let snapshot = build(&json!({
            "role": "Student",
            "name": "Asha",
            "riskFactors": ["Late submissions", null, {"x": 1}, 3],
            "subjects": [
                {"name": "Math", "score": 88},
                {"name": "Art"},
                {"score": 40},
                "History",
                {"name": "Chemistry", "score": "C+"}
            ]
        }));
        assert_eq!(
            snapshot.risk_factors,
            Some(vec!["Late submissions".to_string(), "3".to_string()])
        );
        let names: Vec<&str> = snapshot
            .subjects
            .as_deref()
            .unwrap()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Math", "Chemistry"]);
    }

    #[test]
    fn empty_lists_render_none() {
        let block = build(&json!({"role": "Student", "name": "Asha", "riskFactors": [], "subjects": []})).render();
        assert!(block.contains("Top Risk Factors:\nNone\n"));
        assert!(block.contains("Weak Subjects:\nNone\n"));
    }

    #[test]
    fn attendance_accepts_text_without_double_percent() {
        let s = build(&json!({"attendance": "87%"}));
        assert!(s.render().contains("Attendance: 87%\n"));
        let s = build(&json!({"attendance": "87.5"}));
        assert!(s.render().contains("Attendance: 87.5%\n"));
    }

    #[test]
    fn numeric_risk_score_and_aliases() {
        let s = build(&json!({
            "role": "Student",
            "name": "Asha",
            "class": 9,
            "risk_score": 0.72,
            "risk_factors": ["Low attendance"]
        }));
        let block = s.render();
        assert!(block.contains("Class/Grade: 9\n"));
        assert!(block.contains("Risk Score: 0.72\n"));
        assert!(block.contains("- Low attendance\n"));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let mut raw = asha();
        raw["email"] = json!("asha@school.test");
        raw["uid"] = json!("s-001");
        assert_eq!(build(&raw), build(&asha()));
    }

    #[test]
    fn block_ends_with_two_newlines() {
        assert!(build(&asha()).render().ends_with(&format!("{GROUNDING_INSTRUCTION}\n\n")));
    }

    #[test]
    fn whole_floats_render_without_fraction() {
        let block = build(&json!({
            "attendance": 92.0,
            "riskScore": 0.5,
            "subjects": [{"name": "Physics", "score": 88.0}]
        }))
        .render();
        assert!(block.contains("Attendance: 92%\n"));
        assert!(block.contains("Risk Score: 0.5\n"));
        assert!(block.contains("- Physics: 88\n"));
    }

    #[test]
    fn empty_list_placeholder_has_no_bullet() {
        let block = ContextSnapshot::placeholder().render();
        assert!(block.contains("Top Risk Factors:\nNone\nWeak Subjects:\nNone\n"));
        assert!(!block.contains("- None"));
    }
}
