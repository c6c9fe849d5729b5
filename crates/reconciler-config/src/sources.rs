use std::collections::HashMap;

use reconciler_utils::types::ConfigSource;

use super::Config;

fn stable_source_label(source: &ConfigSource) -> &'static str {
    match source {
        ConfigSource::Env => "env",
        ConfigSource::Config => "config",
        ConfigSource::Programmatic => "programmatic",
        ConfigSource::Default => "default",
    }
}

fn source_label(source: Option<&ConfigSource>) -> String {
    stable_source_label(source.unwrap_or(&ConfigSource::Default)).to_string()
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution
    #[must_use]
    pub fn effective_config(&self) -> HashMap<String, (String, String)> {
        let values = [
            ("finalizer_suffix", self.finalizer_suffix().to_string()),
            (
                "requeue_after_secs",
                self.requeue_after().as_secs().to_string(),
            ),
            (
                "phase_timeout_secs",
                self.phase_timeout().as_secs().to_string(),
            ),
            ("verbose", self.verbose().to_string()),
        ];

        values
            .into_iter()
            .map(|(key, value)| {
                let source = source_label(self.source_attribution.get(key));
                (key.to_string(), (value, source))
            })
            .collect()
    }
}
