//! Client-side form validation and the single-submit guard.
//!
//! Validation runs synchronously before any request and collects every
//! violation, so the user sees all problems in one notice.
//!
//! This module has no network dependencies; form values are the same
//! `serde_json` map the gateway sends as the request body.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::error::CoreError;

/// Form values keyed by field name.
pub type FormValues = serde_json::Map<String, serde_json::Value>;

/// Question types that present a fixed list of choices.
pub const CHOICE_QUESTION_TYPES: &[&str] = &["multiple_choice", "checkbox", "dropdown"];

/// Minimum number of options a choice question must offer.
pub const MIN_CHOICE_OPTIONS: usize = 2;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One validation rule. `label` is the human-readable field name used in
/// messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// Value must be present and non-blank.
    Required { field: String, label: String },
    /// When both are present, `end` must be strictly after `start`.
    EndAfterStart {
        start: String,
        end: String,
        label: String,
    },
    /// An array field must hold at least `min` non-blank entries.
    MinOptions {
        field: String,
        label: String,
        min: usize,
    },
    /// Every choice question in an array of questions must offer at least
    /// `min` options. Questions are objects with `type` and `options`.
    ChoiceQuestions {
        field: String,
        label: String,
        min: usize,
    },
    /// When present, the value must be an email address.
    Email { field: String, label: String },
}

impl FieldRule {
    pub fn required(field: &str, label: &str) -> Self {
        Self::Required {
            field: field.to_string(),
            label: label.to_string(),
        }
    }

    pub fn end_after_start(start: &str, end: &str, label: &str) -> Self {
        Self::EndAfterStart {
            start: start.to_string(),
            end: end.to_string(),
            label: label.to_string(),
        }
    }

    pub fn min_options(field: &str, label: &str, min: usize) -> Self {
        Self::MinOptions {
            field: field.to_string(),
            label: label.to_string(),
            min,
        }
    }

    pub fn choice_questions(field: &str, label: &str) -> Self {
        Self::ChoiceQuestions {
            field: field.to_string(),
            label: label.to_string(),
            min: MIN_CHOICE_OPTIONS,
        }
    }

    pub fn email(field: &str, label: &str) -> Self {
        Self::Email {
            field: field.to_string(),
            label: label.to_string(),
        }
    }
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub label: String,
    pub message: String,
}

/// All violations found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Labels of fields that failed `Required`, in rule order.
    pub fn missing_labels(&self) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.message == REQUIRED_MESSAGE)
            .map(|e| e.label.as_str())
            .collect()
    }

    /// One line listing every problem, suitable for a single notice.
    pub fn summary(&self) -> String {
        let missing = self.missing_labels();
        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!("Please fill in: {}", missing.join(", ")));
        }
        parts.extend(
            self.errors
                .iter()
                .filter(|e| e.message != REQUIRED_MESSAGE)
                .map(|e| e.message.clone()),
        );
        parts.join(". ")
    }

    /// Convert into a `CoreError::Validation` carrying the summary.
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CoreError::Validation(self.summary()))
        }
    }
}

const REQUIRED_MESSAGE: &str = "is required";

/// An ordered list of rules for one form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    rules: Vec<FieldRule>,
}

impl FormSchema {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Check `values` against every rule.
    pub fn validate(&self, values: &FormValues) -> ValidationReport {
        let errors = self
            .rules
            .iter()
            .filter_map(|rule| check_rule(rule, values))
            .collect();
        ValidationReport { errors }
    }
}

fn fail(field: &str, label: &str, message: String) -> Option<FieldError> {
    Some(FieldError {
        field: field.to_string(),
        label: label.to_string(),
        message,
    })
}

fn check_rule(rule: &FieldRule, values: &FormValues) -> Option<FieldError> {
    match rule {
        FieldRule::Required { field, label } => {
            if is_blank(values.get(field)) {
                return fail(field, label, REQUIRED_MESSAGE.to_string());
            }
        }
        FieldRule::EndAfterStart { start, end, label } => {
            let (Some(start_raw), Some(end_raw)) = (
                non_blank_str(values.get(start)),
                non_blank_str(values.get(end)),
            ) else {
                return None;
            };
            let (Some(start_at), Some(end_at)) = (parse_datetime(start_raw), parse_datetime(end_raw))
            else {
                return fail(end, label, format!("{label} has an invalid date"));
            };
            if end_at <= start_at {
                return fail(end, label, format!("{label}: end must be after start"));
            }
        }
        FieldRule::MinOptions { field, label, min } => {
            let count = values
                .get(field)
                .and_then(|v| v.as_array())
                .map_or(0, |items| items.iter().filter(|v| !is_blank(Some(*v))).count());
            if count < *min {
                return fail(
                    field,
                    label,
                    format!("{label} needs at least {min} options"),
                );
            }
        }
        FieldRule::ChoiceQuestions { field, label, min } => {
            let questions = values.get(field).and_then(|v| v.as_array())?;
            for (idx, question) in questions.iter().enumerate() {
                let is_choice = question
                    .get("type")
                    .and_then(|t| t.as_str())
                    .is_some_and(|t| CHOICE_QUESTION_TYPES.contains(&t));
                if !is_choice {
                    continue;
                }
                let options = question
                    .get("options")
                    .and_then(|o| o.as_array())
                    .map_or(0, |o| o.iter().filter(|v| !is_blank(Some(*v))).count());
                if options < *min {
                    return fail(
                        field,
                        label,
                        format!(
                            "{label}: question {} needs at least {min} options",
                            idx + 1
                        ),
                    );
                }
            }
        }
        FieldRule::Email { field, label } => {
            if let Some(raw) = non_blank_str(values.get(field)) {
                if !raw.validate_email() {
                    return fail(field, label, format!("{label} must be a valid email address"));
                }
            }
        }
    }
    None
}

fn is_blank(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.trim().is_empty(),
        Some(serde_json::Value::Array(a)) => a.is_empty(),
        Some(serde_json::Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

fn non_blank_str(value: Option<&serde_json::Value>) -> Option<&str> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parse the date formats date pickers submit: RFC 3339, `YYYY-MM-DDTHH:MM`,
/// `YYYY-MM-DD HH:MM:SS`, or a bare `YYYY-MM-DD` (midnight).
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// Submit guard
// ---------------------------------------------------------------------------

/// Boolean in-flight flag that keeps a form from submitting twice.
#[derive(Debug, Clone, Default)]
pub struct SubmitGuard {
    in_flight: bool,
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a submit as started. Fails if one is already in flight.
    pub fn begin(&mut self) -> Result<(), CoreError> {
        if self.in_flight {
            return Err(CoreError::Conflict(
                "A submission is already in progress".to_string(),
            ));
        }
        self.in_flight = true;
        Ok(())
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn values(v: serde_json::Value) -> FormValues {
        v.as_object().cloned().unwrap()
    }

    fn ticket_schema() -> FormSchema {
        FormSchema::default()
            .rule(FieldRule::required("heading", "Title"))
            .rule(FieldRule::required("category_id", "Category"))
            .rule(FieldRule::required("description", "Description"))
    }

    #[test]
    fn two_missing_fields_reported_together() {
        let report = ticket_schema().validate(&values(json!({
            "heading": "Leaking tap",
            "category_id": null,
            "description": "   ",
        })));

        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.missing_labels(), vec!["Category", "Description"]);
        assert_eq!(report.summary(), "Please fill in: Category, Description");
    }

    #[test]
    fn complete_form_is_valid() {
        let report = ticket_schema().validate(&values(json!({
            "heading": "Leaking tap",
            "category_id": 4,
            "description": "Kitchen, 2nd floor",
        })));
        assert!(report.is_valid());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn end_must_follow_start() {
        let schema =
            FormSchema::default().rule(FieldRule::end_after_start("start_date", "end_date", "Validity"));

        let bad = schema.validate(&values(json!({
            "start_date": "2024-05-10",
            "end_date": "2024-05-09",
        })));
        assert_eq!(bad.errors.len(), 1);
        assert!(bad.summary().contains("end must be after start"));

        let equal = schema.validate(&values(json!({
            "start_date": "2024-05-10T09:00",
            "end_date": "2024-05-10T09:00",
        })));
        assert!(!equal.is_valid());

        let good = schema.validate(&values(json!({
            "start_date": "2024-05-10T09:00",
            "end_date": "2024-05-10T17:30",
        })));
        assert!(good.is_valid());
    }

    #[test]
    fn date_rule_skips_when_either_side_missing() {
        let schema =
            FormSchema::default().rule(FieldRule::end_after_start("start_date", "end_date", "Validity"));
        assert!(schema
            .validate(&values(json!({ "start_date": "2024-05-10" })))
            .is_valid());
    }

    #[test]
    fn unparseable_date_is_reported() {
        let schema =
            FormSchema::default().rule(FieldRule::end_after_start("start_date", "end_date", "Validity"));
        let report = schema.validate(&values(json!({
            "start_date": "tomorrow",
            "end_date": "2024-05-10",
        })));
        assert!(report.summary().contains("invalid date"));
    }

    #[test]
    fn choice_questions_need_two_options() {
        let schema = FormSchema::default().rule(FieldRule::choice_questions("questions", "Checklist"));
        let report = schema.validate(&values(json!({
            "questions": [
                { "type": "text", "options": [] },
                { "type": "multiple_choice", "options": ["Yes", ""] },
            ]
        })));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("question 2"));

        let ok = schema.validate(&values(json!({
            "questions": [{ "type": "dropdown", "options": ["Yes", "No"] }]
        })));
        assert!(ok.is_valid());
    }

    #[test]
    fn min_options_on_plain_array() {
        let schema = FormSchema::default().rule(FieldRule::min_options("options", "Options", 2));
        assert!(!schema.validate(&values(json!({ "options": ["A"] }))).is_valid());
        assert!(schema.validate(&values(json!({ "options": ["A", "B"] }))).is_valid());
    }

    #[test]
    fn email_rule() {
        let schema = FormSchema::default().rule(FieldRule::email("email", "Email"));
        assert!(!schema.validate(&values(json!({ "email": "not-an-email" }))).is_valid());
        assert!(schema.validate(&values(json!({ "email": "guest@example.com" }))).is_valid());
        assert!(schema.validate(&values(json!({}))).is_valid());
    }

    #[test]
    fn mixed_violations_share_one_summary() {
        let schema = ticket_schema().rule(FieldRule::email("email", "Email"));
        let report = schema.validate(&values(json!({ "heading": "x", "email": "nope" })));
        assert_eq!(
            report.summary(),
            "Please fill in: Category, Description. Email must be a valid email address"
        );
    }

    #[test]
    fn submit_guard_blocks_second_submit() {
        let mut guard = SubmitGuard::new();
        guard.begin().unwrap();
        assert_matches!(guard.begin(), Err(CoreError::Conflict(_)));
        guard.finish();
        assert!(guard.begin().is_ok());
    }
}
