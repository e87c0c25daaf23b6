//! Per-field parameter validation.
//!
//! Every field name maps to exactly one [`FieldValidator`]. Field specific
//! rules always win over the generic tracking-parameter length rule, and
//! unknown fields pass through.

/// Platform click identifier; required on every request regardless of template.
pub const CLICK_ID_FIELD: &str = "fbclid";

/// Fields carrying numeric campaign hierarchy ids.
pub const NUMERIC_ID_FIELDS: [&str; 3] = ["campaign_id", "adset_id", "ad_id"];

pub const PLACEMENT_FIELD: &str = "placement";

/// Prefix of UTM-style tracking fields.
pub const TRACKING_PREFIX: &str = "utm_";

const CLICK_ID_MIN_LEN: usize = 5;
const CLICK_ID_MAX_LEN: usize = 500;
const PLACEMENT_MAX_LEN: usize = 100;
const TRACKING_MAX_LEN: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldValidator {
    /// `[a-zA-Z0-9._-]`, 5 to 500 characters.
    ClickId,
    /// Decimal digits only.
    NumericId,
    /// `[a-zA-Z0-9 ._-]`, at most 100 characters.
    Placement,
    /// Any characters, at most 200.
    TrackingParam,
    /// Anything non-blank.
    Generic,
}

impl FieldValidator {
    pub fn for_field(field_name: &str) -> Self {
        match field_name {
            CLICK_ID_FIELD => FieldValidator::ClickId,
            name if NUMERIC_ID_FIELDS.contains(&name) => FieldValidator::NumericId,
            PLACEMENT_FIELD => FieldValidator::Placement,
            name if name.starts_with(TRACKING_PREFIX) => FieldValidator::TrackingParam,
            _ => FieldValidator::Generic,
        }
    }

    /// Blank values are rejected before any field rule runs; the rule sees
    /// the trimmed value.
    pub fn accepts(self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }

        match self {
            FieldValidator::ClickId => {
                let len = value.chars().count();
                value.chars().all(is_token_char)
                    && (CLICK_ID_MIN_LEN..=CLICK_ID_MAX_LEN).contains(&len)
            }
            FieldValidator::NumericId => value.chars().all(|c| c.is_ascii_digit()),
            FieldValidator::Placement => {
                value.chars().all(|c| c == ' ' || is_token_char(c))
                    && value.chars().count() <= PLACEMENT_MAX_LEN
            }
            FieldValidator::TrackingParam => value.chars().count() <= TRACKING_MAX_LEN,
            FieldValidator::Generic => true,
        }
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Checks `value` against the validator registered for `field_name`.
pub fn validate(field_name: &str, value: &str) -> bool {
    FieldValidator::for_field(field_name).accepts(value)
}
