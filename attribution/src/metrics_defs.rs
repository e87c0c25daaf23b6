//! Metrics definitions for template resolution and normalization.

use shared::metrics_defs::{MetricDef, MetricType};

pub const TEMPLATE_CACHE_HIT: MetricDef = MetricDef {
    name: "template.cache.hit",
    metric_type: MetricType::Counter,
    description: "Template lookups served from a fresh cache entry",
};

pub const TEMPLATE_CACHE_MISS: MetricDef = MetricDef {
    name: "template.cache.miss",
    metric_type: MetricType::Counter,
    description: "Template lookups that had to query the store",
};

pub const TEMPLATE_FETCH_DURATION: MetricDef = MetricDef {
    name: "template.fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Time spent querying the template store in seconds",
};

pub const TEMPLATE_STORE_ERROR: MetricDef = MetricDef {
    name: "template.store.error",
    metric_type: MetricType::Counter,
    description: "Template store failures. Tagged with kind, recovered_from.",
};

pub const TEMPLATE_FALLBACK_USED: MetricDef = MetricDef {
    name: "template.fallback",
    metric_type: MetricType::Counter,
    description: "Lookups resolved to the built-in fallback template",
};

pub const VALIDATION_FAILURE: MetricDef = MetricDef {
    name: "normalize.validation_failure",
    metric_type: MetricType::Counter,
    description: "Requests rejected by the normalizer. Tagged with reason, field.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    TEMPLATE_CACHE_HIT,
    TEMPLATE_CACHE_MISS,
    TEMPLATE_FETCH_DURATION,
    TEMPLATE_STORE_ERROR,
    TEMPLATE_FALLBACK_USED,
    VALIDATION_FAILURE,
];
