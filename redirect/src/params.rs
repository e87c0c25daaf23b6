//! Query parameters accepted by the redirect endpoint.
//!
//! The endpoint rejects requests that break the declared parameter contract
//! before the normalizer runs. The normalizer validates again against the
//! active template and has the final say.
use attribution::{RawParams, ValidationError};

#[derive(Clone, Copy, Debug)]
enum Constraint {
    Length { min: usize, max: usize },
    Digits,
    MaxLength(usize),
}

impl Constraint {
    fn allows(self, value: &str) -> bool {
        match self {
            Constraint::Length { min, max } => (min..=max).contains(&value.chars().count()),
            Constraint::Digits => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
            Constraint::MaxLength(max) => value.chars().count() <= max,
        }
    }
}

struct DeclaredParam {
    name: &'static str,
    required: bool,
    constraint: Constraint,
}

const fn required(name: &'static str, constraint: Constraint) -> DeclaredParam {
    DeclaredParam {
        name,
        required: true,
        constraint,
    }
}

const fn optional(name: &'static str, max: usize) -> DeclaredParam {
    DeclaredParam {
        name,
        required: false,
        constraint: Constraint::MaxLength(max),
    }
}

const DECLARED_PARAMS: &[DeclaredParam] = &[
    required("fbclid", Constraint::Length { min: 5, max: 500 }),
    required("campaign_id", Constraint::Digits),
    required("adset_id", Constraint::Digits),
    required("ad_id", Constraint::Digits),
    optional("placement", 100),
    optional("utm_source", 200),
    optional("utm_medium", 200),
    optional("utm_campaign", 200),
    optional("utm_term", 200),
    optional("utm_content", 200),
];

/// Decodes a query string into parameters. A repeated key keeps its last value.
pub fn parse_query(query: Option<&str>) -> RawParams {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Checks the declared parameters in declaration order and reports the first
/// violation. Undeclared parameters are ignored.
pub fn check_declared(params: &RawParams) -> Result<(), ValidationError> {
    for param in DECLARED_PARAMS {
        match params.get(param.name) {
            None if param.required => {
                return Err(ValidationError::MissingRequiredField(param.name.to_string()));
            }
            Some(value) if !param.constraint.allows(value) => {
                let field = param.name.to_string();
                return Err(match param.required {
                    true => ValidationError::InvalidRequiredField(field),
                    false => ValidationError::InvalidOptionalField(field),
                });
            }
            _ => {}
        }
    }
    Ok(())
}
