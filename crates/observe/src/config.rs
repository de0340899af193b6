/// How log lines are filtered and formatted. Built from the `--log-filter`
/// and `--log-json` arguments of every binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// `EnvFilter` directives, e.g. `warn,enosys=debug`.
    pub(crate) env_filter: String,
    /// One JSON object per line instead of human readable text.
    pub(crate) json: bool,
}

impl Config {
    pub fn new(env_filter: &str, json: bool) -> Self {
        Self {
            env_filter: env_filter.to_string(),
            json,
        }
    }
}
