//! Turns raw click parameters into the canonical session payload.
//!
//! Required fields are strict: the first missing or invalid one rejects the
//! whole request. Mapped fields are lenient: a mapped parameter that is
//! absent or invalid is simply left out of `click_signals`.

use crate::accessor::TemplateAccessor;
use crate::metrics_defs::VALIDATION_FAILURE;
use crate::template::{CLICK_SIGNALS_TARGET, Template};
use crate::validators::{CLICK_ID_FIELD, validate};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use shared::counter;
use std::collections::HashMap;
use std::sync::Arc;

/// Query parameters of the inbound request.
pub type RawParams = HashMap<String, String>;

const CLICK_SIGNALS_KEY: &str = "click_signals";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingRequiredField(String),

    #[error("Invalid required parameter: {0}")]
    InvalidRequiredField(String),

    /// The click identifier is checked on every request, whatever the template says.
    #[error("Missing or invalid {0} parameter")]
    MissingOrInvalidClickId(String),

    /// An optional parameter that breaks the endpoint's declared limits.
    #[error("Invalid parameter: {0}")]
    InvalidOptionalField(String),
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingRequiredField(field)
            | ValidationError::InvalidRequiredField(field)
            | ValidationError::MissingOrInvalidClickId(field)
            | ValidationError::InvalidOptionalField(field) => field,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingRequiredField(_) => "missing",
            ValidationError::InvalidRequiredField(_) => "invalid",
            ValidationError::MissingOrInvalidClickId(_) => "missing_or_invalid",
            ValidationError::InvalidOptionalField(_) => "invalid_optional",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CanonicalPayload {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PayloadContext>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PayloadContext {
    /// Copied from the template's `defaults.context`.
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,
    /// Validated, trimmed values of the mapped parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_signals: Option<IndexMap<String, String>>,
}

#[derive(Clone)]
pub struct Normalizer {
    templates: Arc<TemplateAccessor>,
}

impl Normalizer {
    pub fn new(templates: Arc<TemplateAccessor>) -> Self {
        Normalizer { templates }
    }

    pub fn templates(&self) -> &TemplateAccessor {
        &self.templates
    }

    pub async fn normalize(&self, params: &RawParams) -> Result<CanonicalPayload, ValidationError> {
        let template = self.templates.get_active_template().await;

        normalize_with_template(&template, params).inspect_err(|err| {
            tracing::info!(
                template_id = %template.id,
                field = err.field(),
                reason = err.reason(),
                "Rejected click parameters"
            );
            counter!(
                VALIDATION_FAILURE,
                "reason" => err.reason(),
                "field" => err.field().to_string()
            )
            .increment(1);
        })
    }
}

pub fn normalize_with_template(
    template: &Template,
    params: &RawParams,
) -> Result<CanonicalPayload, ValidationError> {
    check_required(template, params)?;
    check_click_id(params)?;

    let defaults = template.defaults.as_ref();

    Ok(CanonicalPayload {
        channel: template.channel().to_string(),
        consent: defaults.and_then(|d| d.consent.clone()),
        context: template.mapping.as_ref().map(|mapping| {
            let mut context = PayloadContext {
                fields: defaults.and_then(|d| d.context.clone()).unwrap_or_default(),
                click_signals: None,
            };

            for (target, rules) in &mapping.targets {
                if target != CLICK_SIGNALS_TARGET {
                    tracing::debug!(mapping_target = %target, "Skipping unsupported mapping target");
                    continue;
                }

                let signals: IndexMap<String, String> = rules
                    .iter()
                    .filter_map(|(output, source)| {
                        let name = source.query_param()?;
                        let value = params.get(name)?;
                        validate(name, value).then(|| (output.clone(), value.trim().to_string()))
                    })
                    .collect();

                context.fields.shift_remove(CLICK_SIGNALS_KEY);
                context.click_signals = Some(signals);
            }

            context
        }),
    })
}

fn check_required(template: &Template, params: &RawParams) -> Result<(), ValidationError> {
    for field in &template.require {
        let Some(value) = params.get(field) else {
            return Err(ValidationError::MissingRequiredField(field.clone()));
        };
        if !validate(field, value) {
            return Err(ValidationError::InvalidRequiredField(field.clone()));
        }
    }
    Ok(())
}

fn check_click_id(params: &RawParams) -> Result<(), ValidationError> {
    match params.get(CLICK_ID_FIELD) {
        Some(value) if validate(CLICK_ID_FIELD, value) => Ok(()),
        _ => Err(ValidationError::MissingOrInvalidClickId(
            CLICK_ID_FIELD.to_string(),
        )),
    }
}
