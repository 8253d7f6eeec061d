use std::{fmt::Write, path::Path, str::FromStr};

use anyhow::{Context, bail};
use indoc::formatdoc;
use serde::Deserialize;
use serde_dynamic_string::DynamicString;
use toml::Value;

use crate::{Config, ServerConfig};

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();

    if !path.exists() {
        log::warn!("Configuration file {} does not exist, using defaults", path.display());
        return Ok(Config::default());
    }

    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read configuration file {}", path.display()))?;

    from_str(&content)
}

pub(crate) fn from_str(content: &str) -> anyhow::Result<Config> {
    let mut raw_config: Value = toml::from_str(content)?;
    expand_dynamic_strings(&mut Vec::new(), &mut raw_config)?;

    let config = Config::deserialize(raw_config)?;
    validate(&config)?;

    Ok(config)
}

pub(crate) fn validate(config: &Config) -> anyhow::Result<()> {
    if config.cache.ttl.is_zero() {
        bail!("The cache TTL in [cache] must be greater than zero.");
    }

    if config.cache.eviction_interval.is_zero() {
        bail!("The cache eviction_interval in [cache] must be greater than zero.");
    }

    let limit = config.gitlab.group_filter.limit;

    if !(1..=100).contains(&limit) {
        bail!("The group limit in [gitlab.group_filter] must be between 1 and 100, got {limit}.");
    }

    validate_routes(&config.server)?;

    for name in config.realms.keys() {
        if name.contains('/') {
            bail!(formatdoc! {r#"
                Realm name '{name}' must not contain a '/'.

                Realms are addressed as the last path segment of the webhook route:

                  POST <server.path>/authenticate/<realm>
            "#});
        }
    }

    Ok(())
}

/// Endpoints without a `listen` address are merged into the webhook router, so their routes
/// must not collide with each other or with the webhook.
fn validate_routes(server: &ServerConfig) -> anyhow::Result<()> {
    validate_path("[server]", &server.path)?;

    let mut shared = vec![("[server]", server.authenticate_path())];

    let profile = server.profile.path.trim_end_matches('/');

    let endpoints = [
        (
            "[server.health]",
            server.health.enabled,
            server.health.listen,
            server.health.path.as_ref(),
            vec![server.health.path.to_string()],
        ),
        (
            "[server.metrics]",
            server.metrics.enabled,
            server.metrics.listen,
            server.metrics.path.as_ref(),
            vec![server.metrics.path.to_string()],
        ),
        (
            "[server.profile]",
            server.profile.enabled,
            server.profile.listen,
            server.profile.path.as_ref(),
            vec![format!("{profile}/runtime"), format!("{profile}/cache")],
        ),
        (
            "[server.web]",
            server.web.directory.is_some(),
            None,
            "/",
            vec!["/".to_string(), "/index.html".to_string()],
        ),
    ];

    for (section, enabled, listen, path, routes) in endpoints {
        if !enabled {
            continue;
        }

        validate_path(section, path)?;

        if listen.is_some() {
            continue;
        }

        for route in routes {
            if let Some((other, _)) = shared.iter().find(|(_, existing)| *existing == route) {
                bail!(formatdoc! {r#"
                    The route '{route}' of {section} is already served by {other}.

                    Endpoints without their own listen address share the webhook listener and need distinct paths.
                "#});
            }

            shared.push((section, route));
        }
    }

    Ok(())
}

fn validate_path(section: &str, path: &str) -> anyhow::Result<()> {
    if !path.starts_with('/') {
        bail!("The path '{path}' in {section} must start with a '/'.");
    }

    if path.contains(['{', '}']) {
        bail!("The path '{path}' in {section} must not contain '{{' or '}}'.");
    }

    Ok(())
}

fn expand_dynamic_strings<'a>(path: &mut Vec<Result<&'a str, usize>>, value: &'a mut Value) -> anyhow::Result<()> {
    match value {
        Value::String(s) => match DynamicString::<String>::from_str(s) {
            Ok(out) => *s = out.into_inner(),
            Err(err) => {
                let mut p = String::new();

                for segment in path {
                    match segment {
                        Ok(s) => {
                            p.push_str(s);
                            p.push('.');
                        }
                        Err(i) => write!(p, "[{i}]")?,
                    }
                }

                if p.ends_with('.') {
                    p.pop();
                }

                bail!("Failed to expand dynamic string at path '{p}': {err}");
            }
        },
        Value::Array(values) => {
            for (i, value) in values.iter_mut().enumerate() {
                path.push(Err(i));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Table(map) => {
            for (key, value) in map {
                path.push(Ok(key.as_str()));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => (),
    }

    Ok(())
}
