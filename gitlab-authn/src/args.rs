use std::{fmt, io::IsTerminal, net::SocketAddr, path::PathBuf, str::FromStr};

use clap::{Parser, ValueEnum};
use config::Config;
use logforth::filter::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "gitlab-authn",
    version,
    about = "Kubernetes webhook token authentication backed by GitLab"
)]
pub struct Args {
    /// IP address and port of the webhook listener. Overrides `server.listen_address`.
    /// Default: 0.0.0.0:8080
    #[arg(short, long, env = "GITLAB_AUTHN_LISTEN_ADDRESS")]
    pub listen_address: Option<SocketAddr>,
    /// Path to the TOML configuration file. Defaults are used when the file does not exist.
    #[arg(long, short, env = "GITLAB_AUTHN_CONFIG", default_value = "/etc/kubernetes/gitlab-authn.toml")]
    pub config: PathBuf,
    /// Set the logging level of the gitlab-authn crates. Dependencies log warnings and errors only.
    #[arg(long = "log", env = "GITLAB_AUTHN_LOG", default_value_t = LogLevel::default())]
    pub log_level: LogLevel,
    /// Set the style of log output
    #[arg(long, env = "GITLAB_AUTHN_LOG_STYLE", default_value_t = LogStyle::default())]
    pub log_style: LogStyle,
}

impl Args {
    pub fn config(&self) -> anyhow::Result<Config> {
        Config::load(&self.config)
    }
}

/// Output format of the log lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogStyle {
    /// Colored text. Default when stdout is a terminal.
    Color,
    /// Plain text. Default otherwise.
    Text,
    /// One JSON object per line.
    Json,
}

impl Default for LogStyle {
    fn default() -> Self {
        match std::io::stdout().is_terminal() {
            true => LogStyle::Color,
            false => LogStyle::Text,
        }
    }
}

/// Verbosity of the gitlab-authn crates.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Module roots logging at the selected level. Everything else is capped at `warn`.
const OWN_TARGETS: [&str; 7] = [
    "gitlab_authn",
    "server",
    "config",
    "gitlab",
    "access",
    "token_cache",
    "telemetry",
];

impl LogLevel {
    /// Filter directives in `env_logger` syntax, e.g. `warn,server=debug,...`.
    pub fn directives(self) -> String {
        OWN_TARGETS
            .iter()
            .fold(String::from("warn"), |directives, target| format!("{directives},{target}={self}"))
    }

    pub fn env_filter(self) -> EnvFilter {
        EnvFilter::from_str(&self.directives()).expect("directives are built from fixed targets and levels")
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value_name(*self, f)
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value_name(*self, f)
    }
}

/// Writes the name clap accepts for the value, so defaults render the way they are parsed.
fn write_value_name(value: impl ValueEnum, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value.to_possible_value() {
        Some(possible) => f.write_str(possible.get_name()),
        None => Err(fmt::Error),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Args, LogLevel, LogStyle};

    #[test]
    fn defaults() {
        let args = Args::parse_from(["gitlab-authn"]);

        assert_eq!(args.config.to_str(), Some("/etc/kubernetes/gitlab-authn.toml"));
        assert_eq!(args.listen_address, None);
        assert_eq!(args.log_level, LogLevel::Info);
    }

    #[test]
    fn overrides() {
        let args = Args::parse_from([
            "gitlab-authn",
            "--config",
            "./local.toml",
            "--listen-address",
            "127.0.0.1:9443",
            "--log",
            "debug",
            "--log-style",
            "json",
        ]);

        assert_eq!(args.config.to_str(), Some("./local.toml"));
        assert_eq!(args.listen_address, Some("127.0.0.1:9443".parse().unwrap()));
        assert_eq!(args.log_level, LogLevel::Debug);
        assert_eq!(args.log_style, LogStyle::Json);
    }

    #[test]
    fn log_values_display_as_parsed() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogStyle::Json.to_string(), "json");
    }

    #[test]
    fn dependencies_are_capped_at_warn() {
        insta::assert_snapshot!(
            LogLevel::Debug.directives(),
            @"warn,gitlab_authn=debug,server=debug,config=debug,gitlab=debug,access=debug,token_cache=debug,telemetry=debug"
        );
    }

    #[test]
    fn log_off_is_rejected() {
        let result = Args::try_parse_from(["gitlab-authn", "--log", "off"]);

        assert!(result.is_err());
    }
}
