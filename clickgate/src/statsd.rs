use crate::config::MetricsConfig;
use metrics_exporter_statsd::StatsdBuilder;

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not build statsd recorder: {0}")]
    Build(String),
    #[error("could not install metrics recorder: {0}")]
    Install(String),
}

/// Sends every metric emitted through the `metrics` facade to statsd. Without
/// this the facade's no-op recorder discards them.
pub fn init(config: &MetricsConfig) -> Result<(), MetricsError> {
    let recorder = StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some(&config.prefix))
        .map_err(|e| MetricsError::Build(e.to_string()))?;

    metrics::set_global_recorder(recorder).map_err(|e| MetricsError::Install(e.to_string()))?;

    shared::metrics_defs::describe_all(attribution::metrics_defs::ALL_METRICS);
    shared::metrics_defs::describe_all(redirect::metrics_defs::ALL_METRICS);

    Ok(())
}
