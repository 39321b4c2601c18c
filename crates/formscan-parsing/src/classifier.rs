//! Line Classifier: decides which field rule a single trimmed line satisfies.
//!
//! Rules live in [`LINE_RULES`], evaluated top to bottom; the first rule whose
//! predicate accepts the line decides the action, even when that action turns
//! out to be [`LineAction::Ignore`] (e.g. a calendar line without a date).

use once_cell::sync::Lazy;
use regex::Regex;

use formscan_core::FieldRecord;

use crate::config::ExtractionConfig;
use crate::normalize::{after_colon, clean_with_config};

/// A top-level field write produced by one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Form(String),
    Year(String),
    Name(String),
    TaxpayerId(String),
    CalendarYearEnded(String),
    Amended(bool),
    BsaIdentifier(String),
    ReasonIfFilingLate(String),
}

impl FieldUpdate {
    /// Write this value into `record`, overwriting any earlier value.
    pub fn apply(self, record: &mut FieldRecord) {
        match self {
            FieldUpdate::Form(v) => record.form = Some(v),
            FieldUpdate::Year(v) => record.year = Some(v),
            FieldUpdate::Name(v) => record.name = Some(v),
            FieldUpdate::TaxpayerId(v) => record.taxpayer_identification_number = Some(v),
            FieldUpdate::CalendarYearEnded(v) => record.calendar_year_ended = Some(v),
            FieldUpdate::Amended(v) => record.amended = v,
            FieldUpdate::BsaIdentifier(v) => record.bsa_identifier = v,
            FieldUpdate::ReasonIfFilingLate(v) => record.reason_if_filing_late = v,
        }
    }
}

/// What the engine should do with a classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction {
    Set(FieldUpdate),
    /// The line is a bare "Name" label; the value follows on the next line.
    ExpectName,
    /// The line opens a bracketed table blob.
    StartTable,
    Ignore,
}

/// A line plus its lowercase form, computed once per classification.
pub struct Line<'a> {
    pub text: &'a str,
    pub lower: String,
}

impl<'a> Line<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            lower: text.to_lowercase(),
        }
    }
}

/// One entry of the rule table: a predicate and the action it triggers.
pub struct LineRule {
    pub name: &'static str,
    matches: fn(&Line<'_>) -> bool,
    action: fn(&Line<'_>, &ExtractionConfig) -> LineAction,
}

impl LineRule {
    pub fn matches(&self, line: &Line<'_>) -> bool {
        (self.matches)(line)
    }

    pub fn action(&self, line: &Line<'_>, config: &ExtractionConfig) -> LineAction {
        (self.action)(line, config)
    }
}

static FORM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Form\s+(\d+)\b").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

/// Ordered rule table. The expecting-name carry-over is checked before it.
pub static LINE_RULES: [LineRule; 9] = [
    LineRule {
        name: "form",
        matches: |l| FORM_RE.is_match(l.text),
        action: |l, _| match FORM_RE.captures(l.text) {
            Some(caps) => LineAction::Set(FieldUpdate::Form(caps[1].to_string())),
            None => LineAction::Ignore,
        },
    },
    LineRule {
        name: "year",
        matches: |l| YEAR_RE.is_match(l.text),
        action: |l, _| LineAction::Set(FieldUpdate::Year(l.text.to_string())),
    },
    LineRule {
        name: "name_label",
        matches: |l| l.lower == "name",
        action: |_, _| LineAction::ExpectName,
    },
    LineRule {
        name: "taxpayer_id",
        matches: |l| l.lower.starts_with("taxpayer identification number"),
        action: |l, c| {
            LineAction::Set(FieldUpdate::TaxpayerId(clean_with_config(
                after_colon(l.text),
                c,
            )))
        },
    },
    LineRule {
        name: "calendar_year_ended",
        matches: |l| l.lower.contains("calendar year ended"),
        action: |l, _| match calendar_year_ended(l.text) {
            Some(date) => LineAction::Set(FieldUpdate::CalendarYearEnded(date)),
            None => LineAction::Ignore,
        },
    },
    LineRule {
        name: "amended",
        matches: |l| l.lower.starts_with("amended"),
        action: |l, c| LineAction::Set(FieldUpdate::Amended(c.marks().bracketed.is_match(l.text))),
    },
    LineRule {
        name: "bsa_identifier",
        matches: |l| l.lower.starts_with("prior report bsa identifier"),
        action: |l, c| {
            LineAction::Set(FieldUpdate::BsaIdentifier(clean_with_config(
                after_colon(l.text),
                c,
            )))
        },
    },
    LineRule {
        name: "reason_if_filing_late",
        matches: |l| l.lower.starts_with("reason if filing late"),
        action: |l, c| {
            LineAction::Set(FieldUpdate::ReasonIfFilingLate(clean_with_config(
                after_colon(l.text),
                c,
            )))
        },
    },
    LineRule {
        name: "table_start",
        matches: |l| l.text.starts_with("[["),
        action: |_, _| LineAction::StartTable,
    },
];

/// Extract the "calendar year ended" date as `M/D/YYYY`.
///
/// Tries the labelled form first (`calendar year ended 12/31/2023`, also with
/// `:` or `-` before the year), then falls back to the first `M/D` token plus
/// the trailing four digits of the line. `None` if either half is missing.
pub fn calendar_year_ended(line: &str) -> Option<String> {
    static LABELLED_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)calendar year ended\s+(\d{1,2}/\d{1,2})/?\s*[:\-]?\s*(\d{4})").unwrap()
    });
    static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}/\d{1,2}").unwrap());
    static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

    if let Some(caps) = LABELLED_RE.captures(line) {
        return Some(format!("{}/{}", &caps[1], &caps[2]));
    }

    let month_day = MONTH_DAY_RE.find(line)?.as_str();
    // The year is the last four digits of the line, and must end its final digit run.
    let last_run = DIGITS_RE.find_iter(line).last()?.as_str();
    let digits: Vec<char> = last_run.chars().collect();
    if digits.len() < 4 {
        return None;
    }
    let year: String = digits[digits.len() - 4..].iter().collect();
    Some(format!("{month_day}/{year}"))
}

/// Applies [`LINE_RULES`] to lines under a given configuration.
pub struct LineClassifier<'c> {
    config: &'c ExtractionConfig,
}

impl<'c> LineClassifier<'c> {
    pub fn new(config: &'c ExtractionConfig) -> Self {
        Self { config }
    }

    /// Classify one non-empty trimmed line.
    ///
    /// When `expecting_name` is set the line is the value of a preceding
    /// "Name" label and no other rule is consulted.
    pub fn classify(&self, line: &str, expecting_name: bool) -> LineAction {
        if expecting_name {
            return LineAction::Set(FieldUpdate::Name(clean_with_config(line, self.config)));
        }

        let line = Line::new(line);
        match LINE_RULES.iter().find(|rule| rule.matches(&line)) {
            Some(rule) => {
                tracing::trace!(rule = rule.name, line = line.text, "line rule matched");
                rule.action(&line, self.config)
            }
            None => LineAction::Ignore,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionConfigBuilder;

    fn classify(line: &str) -> LineAction {
        let config = ExtractionConfig::default();
        LineClassifier::new(&config).classify(line, false)
    }

    fn set(update: FieldUpdate) -> LineAction {
        LineAction::Set(update)
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<&str> = LINE_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "form",
                "year",
                "name_label",
                "taxpayer_id",
                "calendar_year_ended",
                "amended",
                "bsa_identifier",
                "reason_if_filing_late",
                "table_start",
            ]
        );
    }

    #[test]
    fn test_form() {
        assert_eq!(classify("Form 114"), set(FieldUpdate::Form("114".into())));
        assert_eq!(classify("FORM  114 Report"), set(FieldUpdate::Form("114".into())));
        assert_eq!(classify("Form114"), LineAction::Ignore);
        assert_eq!(classify("Form 114a"), LineAction::Ignore);
    }

    #[test]
    fn test_year() {
        assert_eq!(classify("2023"), set(FieldUpdate::Year("2023".into())));
        assert_eq!(classify("20234"), LineAction::Ignore);
        assert_eq!(classify("2023 "), LineAction::Ignore);
    }

    #[test]
    fn test_name_label() {
        assert_eq!(classify("Name"), LineAction::ExpectName);
        assert_eq!(classify("NAME"), LineAction::ExpectName);
        assert_eq!(classify("Name of filer"), LineAction::Ignore);
    }

    #[test]
    fn test_expecting_name_consumes_any_line() {
        let config = ExtractionConfig::default();
        let classifier = LineClassifier::new(&config);
        assert_eq!(
            classifier.classify("Form 114", true),
            set(FieldUpdate::Name("Form 114".into()))
        );
        assert_eq!(
            classifier.classify("—", true),
            set(FieldUpdate::Name(String::new()))
        );
    }

    #[test]
    fn test_taxpayer_id() {
        assert_eq!(
            classify("Taxpayer Identification Number: 123-45-6789"),
            set(FieldUpdate::TaxpayerId("123-45-6789".into()))
        );
        assert_eq!(
            classify("taxpayer identification number"),
            set(FieldUpdate::TaxpayerId(String::new()))
        );
        assert_eq!(
            classify("Taxpayer identification number: <empty>"),
            set(FieldUpdate::TaxpayerId(String::new()))
        );
    }

    #[test]
    fn test_calendar_year_ended() {
        assert_eq!(
            classify("For calendar year ended 12/31/2023"),
            set(FieldUpdate::CalendarYearEnded("12/31/2023".into()))
        );
        assert_eq!(
            classify("Calendar year ended 12/31 - 2022"),
            set(FieldUpdate::CalendarYearEnded("12/31/2022".into()))
        );
        assert_eq!(classify("calendar year ended"), LineAction::Ignore);
    }

    #[test]
    fn test_calendar_fallback() {
        assert_eq!(
            calendar_year_ended("calendar year ended (MM/DD) 12/31 of 2021").as_deref(),
            Some("12/31/2021")
        );
        assert_eq!(
            calendar_year_ended("calendar year ended on 6/30, year 20219").as_deref(),
            Some("6/30/0219")
        );
        assert_eq!(calendar_year_ended("calendar year ended 12/31"), None);
        assert_eq!(calendar_year_ended("calendar year ended 2023"), None);
        assert_eq!(calendar_year_ended("calendar year ended 1/2, 2023 rev 7"), None);
    }

    #[test]
    fn test_amended() {
        assert_eq!(classify("Amended [x]"), set(FieldUpdate::Amended(true)));
        assert_eq!(classify("AMENDED [☑]"), set(FieldUpdate::Amended(true)));
        assert_eq!(classify("Amended [ ]"), set(FieldUpdate::Amended(false)));
        assert_eq!(classify("Amended"), set(FieldUpdate::Amended(false)));
    }

    #[test]
    fn test_amended_custom_glyph() {
        let config = ExtractionConfigBuilder::new()
            .add_checkbox_mark("☒".to_string())
            .build()
            .unwrap();
        assert_eq!(
            LineClassifier::new(&config).classify("Amended [☒]", false),
            set(FieldUpdate::Amended(true))
        );
        assert_eq!(classify("Amended [☒]"), set(FieldUpdate::Amended(false)));
    }

    #[test]
    fn test_bsa_identifier() {
        assert_eq!(
            classify("Prior report BSA Identifier: 31000123456789"),
            set(FieldUpdate::BsaIdentifier("31000123456789".into()))
        );
        assert_eq!(
            classify("Prior report BSA Identifier: —"),
            set(FieldUpdate::BsaIdentifier(String::new()))
        );
        assert_eq!(
            classify("Prior report BSA Identifier: \\u2014"),
            set(FieldUpdate::BsaIdentifier(String::new()))
        );
    }

    #[test]
    fn test_reason_if_filing_late() {
        assert_eq!(
            classify("Reason if filing late: Forgot"),
            set(FieldUpdate::ReasonIfFilingLate("Forgot".into()))
        );
        assert_eq!(
            classify("Reason if filing late: -"),
            set(FieldUpdate::ReasonIfFilingLate(String::new()))
        );
    }

    #[test]
    fn test_table_start() {
        assert_eq!(classify(r#"[["Type of filer","#), LineAction::StartTable);
        assert_eq!(classify(r#"["Type of filer"]"#), LineAction::Ignore);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(classify("Department of the Treasury"), LineAction::Ignore);
    }

    #[test]
    fn test_apply_overwrites() {
        let mut record = FieldRecord::default();
        FieldUpdate::Year("2022".into()).apply(&mut record);
        FieldUpdate::Year("2023".into()).apply(&mut record);
        FieldUpdate::Amended(true).apply(&mut record);
        assert_eq!(record.year.as_deref(), Some("2023"));
        assert!(record.amended);
    }
}
