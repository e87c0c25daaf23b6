use shared::metrics_defs::{MetricDef, MetricType};

pub const REDIRECT_REQUESTS: MetricDef = MetricDef {
    name: "redirect.requests",
    metric_type: MetricType::Counter,
    description: "Requests served by the gateway. Tagged with route, status.",
};

pub const REDIRECT_REQUEST_DURATION: MetricDef = MetricDef {
    name: "redirect.request.duration",
    metric_type: MetricType::Histogram,
    description: "End to end redirect handling time in seconds. Tagged with status.",
};

pub const SESSION_REGISTRATION_DURATION: MetricDef = MetricDef {
    name: "session.registration.duration",
    metric_type: MetricType::Histogram,
    description: "Time spent registering click events with the session service in seconds",
};

pub const SESSION_REGISTRATION_FALLBACK: MetricDef = MetricDef {
    name: "session.registration.fallback",
    metric_type: MetricType::Counter,
    description: "Clicks that got a locally generated session uid. Tagged with kind.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REDIRECT_REQUESTS,
    REDIRECT_REQUEST_DURATION,
    SESSION_REGISTRATION_DURATION,
    SESSION_REGISTRATION_FALLBACK,
];
