use serde::{Deserialize, Serialize};

/// Structured fields reconstructed from one form page.
///
/// Serialized keys match the downstream JSON contract. `Amended`,
/// `BSA_identifier` and `Reason_if_filing_late` are always present; every
/// other top-level key appears only when the page mentioned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(rename = "Form", default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "Taxpayer Identification Number",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub taxpayer_identification_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_year_ended: Option<String>,
    #[serde(rename = "Amended", default)]
    pub amended: bool,
    #[serde(rename = "BSA_identifier", default)]
    pub bsa_identifier: String,
    #[serde(rename = "Reason_if_filing_late", default)]
    pub reason_if_filing_late: String,
    #[serde(
        rename = "Filer_Information",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub filer_information: Option<FilerInformation>,
}

/// Nested record mined from the Part I table blob.
///
/// Sub-fields whose pattern did not match are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilerInformation {
    #[serde(rename = "Type_of_filer", default)]
    pub type_of_filer: String,
    #[serde(rename = "TIN", default)]
    pub tin: String,
    #[serde(rename = "TIN_TYPE", default)]
    pub tin_type: String,
    #[serde(
        rename = "Foreign_identification",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub foreign_identification: Option<ForeignIdentification>,
    #[serde(rename = "DOB", default)]
    pub date_of_birth: String,
    #[serde(rename = "Last_name_or_organization", default)]
    pub last_name_or_organization: String,
    #[serde(rename = "First_Name", default)]
    pub first_name: String,
    #[serde(rename = "Middle_Initial", default)]
    pub middle_initial: String,
    #[serde(rename = "Suffix", default)]
    pub suffix: String,
    #[serde(rename = "Mailing_address", default)]
    pub mailing_address: String,
    #[serde(rename = "City", default)]
    pub city: String,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "zip_postal_code", default)]
    pub zip_postal_code: String,
    #[serde(rename = "Country", default)]
    pub country: String,
    #[serde(rename = "FINANCIAL_Interest_accounts", default)]
    pub financial_interest_accounts: bool,
    #[serde(rename = "Sign_Auth_no_interest", default)]
    pub sign_auth_no_interest: bool,
}

/// Item 4 of Part I. Each part is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignIdentification {
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub id_type: Option<String>,
    #[serde(rename = "Number", default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(
        rename = "Country_of_issue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub country_of_issue: Option<String>,
}

impl ForeignIdentification {
    /// Assemble from the three optional parts, or `None` when all are absent.
    pub fn from_parts(
        id_type: Option<String>,
        number: Option<String>,
        country_of_issue: Option<String>,
    ) -> Option<Self> {
        if id_type.is_none() && number.is_none() && country_of_issue.is_none() {
            return None;
        }
        Some(Self {
            id_type,
            number,
            country_of_issue,
        })
    }
}
