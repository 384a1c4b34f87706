// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the CI test reporter.
//!
//! Configuration is layered, from lowest to highest priority:
//!
//! 1. the [default config](ReporterConfig::DEFAULT_CONFIG),
//! 2. a user config file, if one is provided,
//! 3. the [`APPVEYOR_API_URL`](ReporterConfig::API_URL_ENV) environment variable,
//! 4. overrides passed in by the caller, typically from the command line.

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::Utf8Path;
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::{collections::BTreeSet, time::Duration};
use tracing::warn;

/// Resolved reporter configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReporterConfig {
    /// The base URL of the reporting API, if configured.
    pub base_url: Option<String>,

    /// The time after which a single request is abandoned.
    pub request_timeout: Duration,

    /// Whether events are also printed to standard error.
    pub display_enabled: bool,
}

/// Values that take priority over every other configuration source.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Overrides `api.base-url`.
    pub base_url: Option<String>,
}

impl ReporterConfig {
    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// The environment variable the build worker uses to publish the API base URL.
    pub const API_URL_ENV: &'static str = "APPVEYOR_API_URL";

    /// Loads configuration, reading the API URL from the process environment.
    pub fn from_env(
        config_file: Option<&Utf8Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigParseError> {
        let env_base_url = std::env::var(Self::API_URL_ENV)
            .ok()
            .filter(|url| !url.is_empty());
        Self::from_sources(config_file, env_base_url, overrides)
    }

    /// Loads configuration from the given sources.
    ///
    /// `env_base_url` is the value of [`API_URL_ENV`](Self::API_URL_ENV), if set.
    pub fn from_sources(
        config_file: Option<&Utf8Path>,
        env_base_url: Option<String>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigParseError> {
        let make_error = |err: ConfigParseErrorKind| {
            ConfigParseError::new(config_file.map(|path| path.to_owned()), err)
        };

        let mut builder = Self::make_default_config();
        if let Some(config_file) = config_file {
            builder = builder.add_source(File::new(config_file.as_str(), FileFormat::Toml));
        }
        builder = builder
            .set_override_option("api.base-url", env_base_url)
            .and_then(|builder| {
                builder.set_override_option("api.base-url", overrides.base_url.clone())
            })
            .map_err(|error| make_error(ConfigParseErrorKind::BuildError(Box::new(error))))?;

        let (deserialized, ignored) =
            Self::build_and_deserialize_config(&builder).map_err(make_error)?;
        if !ignored.is_empty() {
            let keys: Vec<_> = ignored.into_iter().collect();
            match config_file {
                Some(config_file) => warn!(
                    "in config file {config_file}, ignoring unknown configuration keys: {}",
                    keys.join(", "),
                ),
                None => warn!("ignoring unknown configuration keys: {}", keys.join(", ")),
            }
        }

        Ok(Self {
            base_url: deserialized.api.base_url.filter(|url| !url.is_empty()),
            request_timeout: deserialized.api.request_timeout,
            display_enabled: deserialized.display.enabled,
        })
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(ReporterConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config = ReporterConfigDeserialize::deserialize(ignored_de)
            .map_err(|error| ConfigParseErrorKind::DeserializeError(Box::new(error)))?;

        Ok((config, ignored))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReporterConfigDeserialize {
    api: ApiConfigDeserialize,
    display: DisplayConfigDeserialize,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ApiConfigDeserialize {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(with = "humantime_serde")]
    request_timeout: Duration,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DisplayConfigDeserialize {
    enabled: bool,
}
