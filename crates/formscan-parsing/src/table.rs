//! Table Parser: mines the nested `Filer_Information` record out of the
//! joined Part I blob.
//!
//! The blob is pseudo-CSV, e.g. `[["Type of filer","Individual"],["TIN",...]]`.
//! Every field is an independent pattern search, so a miss only blanks that
//! field.

use once_cell::sync::Lazy;
use regex::Regex;

use formscan_core::{FilerInformation, ForeignIdentification};

use crate::config::ExtractionConfig;
use crate::normalize::clean_with_config;

/// Regex for a `"<label>", "<value>"` cell pair, case-insensitive.
fn labeled_cell(label: &str) -> Regex {
    Regex::new(&format!(r#"(?i)"{label}"\s*,\s*"([^"]*)""#)).unwrap()
}

static TYPE_OF_FILER_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("Type of filer"));
static TIN_RE: Lazy<Regex> =
    Lazy::new(|| labeled_cell(r"(?:U\.S\. Taxpayer Identification Number|TIN)"));
static TIN_TYPE_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("TIN type"));
static FOREIGN_TYPE_CELL_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("4a Type"));
static FOREIGN_TYPE_INLINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"4a Type\s*([^"]+)""#).unwrap());
static FOREIGN_NUMBER_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("4b Number"));
static FOREIGN_COUNTRY_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("4c Country of Issue"));
static DOB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)"Individual['’]s date of birth"\s*,\s*"([^".]*)""#).unwrap()
});
static LAST_NAME_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("Last name or organization"));
static FIRST_NAME_INLINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)First name\s+([^\s\]",]+)"#).unwrap());
static MIDDLE_INITIAL_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("Middle initial"));
static SUFFIX_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("Suffix"));
static MAILING_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("Mailing address"));
static CITY_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("City"));
static STATE_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("State"));
static ZIP_RE: Lazy<Regex> = Lazy::new(|| labeled_cell("Zip/postal code"));
static COUNTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"Country\s+([A-Za-z]{2,})""#).unwrap());

/// A cell that is a field label rather than a value. A blank value lets a
/// cell-pair pattern run on into the next label, e.g. `["TIN","TIN type",...]`.
static FIELD_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^(?:
            \d{1,2}[a-c]\s.*
            | first\s+name(?:\s.*)?
            | type\ of\ filer | u\.s\.\ taxpayer\ identification\ number | tin | tin\ type
            | individual['’]s\ date\ of\ birth | last\ name\ or\ organization
            | middle\ initial | suffix | mailing\ address | city | state
            | zip/postal\ code | country
        )$",
    )
    .unwrap()
});

static ITEM_14A_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)14a").unwrap());
static ITEM_14B_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)14b").unwrap());

/// Parse a joined table blob using the default configuration.
pub fn parse_table_blob(blob: &str) -> FilerInformation {
    parse_table_blob_with_config(blob, &ExtractionConfig::default())
}

/// Config-aware version of [`parse_table_blob`].
pub(crate) fn parse_table_blob_with_config(
    blob: &str,
    config: &ExtractionConfig,
) -> FilerInformation {
    let grab = |re: &Regex| -> String {
        re.captures(blob)
            .map(|caps| clean_with_config(&caps[1], config))
            .filter(|value| !FIELD_LABEL_RE.is_match(value))
            .unwrap_or_default()
    };
    let grab_opt = |re: &Regex| Some(grab(re)).filter(|v| !v.is_empty());

    let foreign_type = grab_opt(&FOREIGN_TYPE_CELL_RE).or_else(|| grab_opt(&FOREIGN_TYPE_INLINE_RE));
    let foreign_identification = ForeignIdentification::from_parts(
        foreign_type,
        grab_opt(&FOREIGN_NUMBER_RE),
        grab_opt(&FOREIGN_COUNTRY_RE),
    );

    FilerInformation {
        type_of_filer: grab(&TYPE_OF_FILER_RE),
        tin: grab(&TIN_RE),
        tin_type: grab(&TIN_TYPE_RE),
        foreign_identification,
        date_of_birth: grab(&DOB_RE),
        last_name_or_organization: grab(&LAST_NAME_RE),
        first_name: grab(&FIRST_NAME_INLINE_RE),
        middle_initial: grab(&MIDDLE_INITIAL_RE),
        suffix: grab(&SUFFIX_RE),
        mailing_address: grab(&MAILING_ADDRESS_RE),
        city: grab(&CITY_RE),
        state: grab(&STATE_RE),
        zip_postal_code: grab(&ZIP_RE),
        country: grab(&COUNTRY_RE),
        financial_interest_accounts: financial_interest(blob, config),
        sign_auth_no_interest: signature_authority(blob, config),
    }
}

/// Item 14a: from the first `14a` marker up to the next `14b`, or to the end.
pub fn item_14a_segment(blob: &str) -> Option<&str> {
    let start = ITEM_14A_RE.find(blob)?.start();
    let rest = &blob[start..];
    let end = ITEM_14B_RE.find(rest).map_or(rest.len(), |m| m.start());
    Some(&rest[..end])
}

/// Item 14b: from the first `14b` marker to the end.
pub fn item_14b_segment(blob: &str) -> Option<&str> {
    ITEM_14B_RE.find(blob).map(|m| &blob[m.start()..])
}

/// Checked "Yes" and no checked "No" within one item segment.
fn answered_yes(segment: &str, config: &ExtractionConfig) -> bool {
    let marks = config.marks();
    if marks.no_checked.is_match(segment) {
        return false;
    }
    marks.yes_checked.is_match(segment)
}

fn financial_interest(blob: &str, config: &ExtractionConfig) -> bool {
    item_14a_segment(blob).is_some_and(|seg| answered_yes(seg, config))
}

fn signature_authority(blob: &str, config: &ExtractionConfig) -> bool {
    item_14b_segment(blob).is_some_and(|seg| answered_yes(seg, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionConfigBuilder;

    const FULL_BLOB: &str = r#"[["Type of filer","Individual"],
["U.S. Taxpayer Identification Number","123456789"],
["TIN type","SSN/ITIN"],
["4a Type Passport"],["4b Number","X1234567"],["4c Country of Issue","CA"],
["Individual's date of birth","01/02/1980"],
["Last name or organization","Doe"],
["First name Jane","Middle initial","—"],
["Suffix","<empty>"],
["Mailing address","1 Main St"],["City","Reno"],["State","NV"],
["Zip/postal code","89501"],["Country US"],
["14a Financial interest in 25 or more accounts"],["Yes"," [x] "],["No"," [ ] "],
["14b Signature authority but no financial interest"],["Yes"," [ ] "],["No"," [X] "]]"#;

    #[test]
    fn test_full_blob() {
        let info = parse_table_blob(FULL_BLOB);
        assert_eq!(info.type_of_filer, "Individual");
        assert_eq!(info.tin, "123456789");
        assert_eq!(info.tin_type, "SSN/ITIN");
        let foreign = info.foreign_identification.unwrap();
        assert_eq!(foreign.id_type.as_deref(), Some("Passport"));
        assert_eq!(foreign.number.as_deref(), Some("X1234567"));
        assert_eq!(foreign.country_of_issue.as_deref(), Some("CA"));
        assert_eq!(info.date_of_birth, "01/02/1980");
        assert_eq!(info.last_name_or_organization, "Doe");
        assert_eq!(info.first_name, "Jane");
        assert_eq!(info.middle_initial, "");
        assert_eq!(info.suffix, "");
        assert_eq!(info.mailing_address, "1 Main St");
        assert_eq!(info.city, "Reno");
        assert_eq!(info.state, "NV");
        assert_eq!(info.zip_postal_code, "89501");
        assert_eq!(info.country, "US");
        assert!(info.financial_interest_accounts);
        assert!(!info.sign_auth_no_interest);
    }

    #[test]
    fn test_short_tin_label() {
        let info = parse_table_blob(r#"[["TIN","987654321"],["TIN type","EIN"]]"#);
        assert_eq!(info.tin, "987654321");
        assert_eq!(info.tin_type, "EIN");
    }

    #[test]
    fn test_empty_blob_all_blank() {
        let info = parse_table_blob("[[]]");
        assert_eq!(info, FilerInformation::default());
        assert!(info.foreign_identification.is_none());
    }

    #[test]
    fn test_foreign_identification_partial() {
        let info = parse_table_blob(r#"[["4b Number","  "],["4c Country of Issue","MX"]]"#);
        let foreign = info.foreign_identification.unwrap();
        assert_eq!(foreign.id_type, None);
        assert_eq!(foreign.number, None);
        assert_eq!(foreign.country_of_issue.as_deref(), Some("MX"));
    }

    #[test]
    fn test_foreign_type_as_cell_pair() {
        let info = parse_table_blob(r#"[["4a Type","Other"]]"#);
        assert_eq!(
            info.foreign_identification.unwrap().id_type.as_deref(),
            Some("Other")
        );
    }

    #[test]
    fn test_foreign_identification_placeholders_omitted() {
        let info = parse_table_blob(r#"[["4a Type —"],["4b Number","-"]]"#);
        assert!(info.foreign_identification.is_none());
    }

    #[test]
    fn test_dob_rejects_dotted_value() {
        let info = parse_table_blob(r#"[["Individual's date of birth","01.02.1980"]]"#);
        assert_eq!(info.date_of_birth, "");
    }

    #[test]
    fn test_first_name_only_inline() {
        let info = parse_table_blob(r#"[["First name","Jane"]]"#);
        assert_eq!(info.first_name, "");
    }

    #[test]
    fn test_blank_first_name_does_not_take_next_label() {
        let info = parse_table_blob(r#"[["First name","Middle initial","J"]]"#);
        assert_eq!(info.first_name, "");
        assert_eq!(info.middle_initial, "J");
    }

    #[test]
    fn test_blank_foreign_type_does_not_take_next_label() {
        let info = parse_table_blob(r#"[["4a Type","4b Number","X1"]]"#);
        let foreign = info.foreign_identification.unwrap();
        assert_eq!(foreign.id_type, None);
        assert_eq!(foreign.number.as_deref(), Some("X1"));
    }

    #[test]
    fn test_blank_tin_does_not_take_next_label() {
        let info = parse_table_blob(r#"[["TIN","TIN type","SSN"]]"#);
        assert_eq!(info.tin, "");
        assert_eq!(info.tin_type, "SSN");
    }

    #[test]
    fn test_blank_cell_before_other_labels() {
        let info = parse_table_blob(
            r#"[["Last name or organization","First name Jane"],["City","State","NV"]]"#,
        );
        assert_eq!(info.last_name_or_organization, "");
        assert_eq!(info.first_name, "Jane");
        assert_eq!(info.city, "");
        assert_eq!(info.state, "NV");
    }

    #[test]
    fn test_labels_case_insensitive() {
        let info = parse_table_blob(r#"[["CITY","Boise"],["country id"]]"#);
        assert_eq!(info.city, "Boise");
        assert_eq!(info.country, "id");
    }

    #[test]
    fn test_segments() {
        let blob = "intro 14a first part 14b second part";
        assert_eq!(item_14a_segment(blob), Some("14a first part "));
        assert_eq!(item_14b_segment(blob), Some("14b second part"));
        assert_eq!(item_14a_segment("only 14A tail"), Some("14A tail"));
        assert_eq!(item_14b_segment("only 14a"), None);
        assert_eq!(item_14a_segment("nothing"), None);
    }

    #[test]
    fn test_14a_no_overrides_yes() {
        let blob = r#"[["14a"],["Yes","[x]"],["No","[x]"]]"#;
        assert!(!parse_table_blob(blob).financial_interest_accounts);
    }

    #[test]
    fn test_14a_without_14b_reads_to_end() {
        let blob = r#"[["14a"],["No"," "],["Yes","✓"]]"#;
        let info = parse_table_blob(blob);
        assert!(info.financial_interest_accounts);
        assert!(!info.sign_auth_no_interest);
    }

    #[test]
    fn test_14a_ignores_14b_answers() {
        let blob = r#"[["14a"],["Yes","[ ]"],["14b"],["Yes","[x]"]]"#;
        let info = parse_table_blob(blob);
        assert!(!info.financial_interest_accounts);
        assert!(info.sign_auth_no_interest);
    }

    #[test]
    fn test_checked_mark_inside_option_cell() {
        let blob = r#"[["14a Financial interest in 25 or more accounts"],["Yes [x]"],["No [ ]"],
["14b Signature authority but no financial interest"],["Yes ☑"],["No"]]"#;
        let info = parse_table_blob(blob);
        assert!(info.financial_interest_accounts);
        assert!(info.sign_auth_no_interest);
    }

    #[test]
    fn test_inline_no_mark_overrides_yes() {
        let blob = r#"[["14a"],["Yes [x]"],["No [X]"],["14b"],["Yes ✓"],["No ✓"]]"#;
        let info = parse_table_blob(blob);
        assert!(!info.financial_interest_accounts);
        assert!(!info.sign_auth_no_interest);
    }

    #[test]
    fn test_14b_unchecked_defaults_false() {
        let blob = r#"[["14b"],["Yes"," "],["No"," "]]"#;
        assert!(!parse_table_blob(blob).sign_auth_no_interest);
    }

    #[test]
    fn test_custom_mark_glyph() {
        let config = ExtractionConfigBuilder::new()
            .add_checkbox_mark("☒".to_string())
            .build()
            .unwrap();
        let blob = r#"[["14a"],["Yes","[☒]"]]"#;
        assert!(parse_table_blob_with_config(blob, &config).financial_interest_accounts);
        assert!(!parse_table_blob(blob).financial_interest_accounts);
    }
}
