use std::path::Path;

use anyhow::{Context, Result};
use config as cfg;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the capacity budget of a limited propagation is charged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountingMode {
    /// Every member of an accepted class occupies budget, including members
    /// that already carried the target version before the call. Repeating a
    /// call with the same arguments accepts the same classes and tags nothing.
    #[default]
    Footprint,
    /// Only users tagged by the current call occupy budget. An already tagged
    /// coach is free and already tagged students are ignored, so re-running a
    /// call may admit classes that were rejected the first time.
    NewlyTagged,
}

impl std::fmt::Display for AccountingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AccountingMode::Footprint => "footprint",
            AccountingMode::NewlyTagged => "newly_tagged",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationSettings {
    #[serde(default)]
    pub accounting: AccountingMode,
    /// Capacity used by callers that do not pass one explicitly.
    /// `None` means unbounded.
    #[serde(default)]
    pub default_capacity: Option<usize>,
}

/// Node colors used when building plot payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotPalette {
    #[serde(default = "PlotPalette::default_infected")]
    pub infected: String,
    #[serde(default = "PlotPalette::default_uninfected")]
    pub uninfected: String,
}

impl PlotPalette {
    pub const INFECTED_COLOR: &'static str = "#FF2525";
    pub const UNINFECTED_COLOR: &'static str = "#97C2FC";

    fn default_infected() -> String {
        Self::INFECTED_COLOR.to_string()
    }

    fn default_uninfected() -> String {
        Self::UNINFECTED_COLOR.to_string()
    }
}

impl Default for PlotPalette {
    fn default() -> Self {
        Self {
            infected: Self::default_infected(),
            uninfected: Self::default_uninfected(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "LoggingSettings::default_level")]
    pub level: String,
}

impl LoggingSettings {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfectionSettings {
    #[serde(default)]
    pub propagation: PropagationSettings,
    #[serde(default)]
    pub plot: PlotPalette,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl InfectionSettings {
    pub const ENV_PREFIX: &'static str = "INFECTION";

    pub fn validate(&self) -> Result<()> {
        if let Some(capacity) = self.propagation.default_capacity {
            anyhow::ensure!(
                capacity >= 1,
                "propagation.default_capacity must be >= 1 when set"
            );
        }
        anyhow::ensure!(
            is_hex_color(&self.plot.infected),
            "plot.infected must be a #RRGGBB color, got '{}'",
            self.plot.infected
        );
        anyhow::ensure!(
            is_hex_color(&self.plot.uninfected),
            "plot.uninfected must be a #RRGGBB color, got '{}'",
            self.plot.uninfected
        );
        anyhow::ensure!(
            matches!(
                self.logging.level.to_lowercase().as_str(),
                "trace" | "debug" | "info" | "warn" | "error"
            ),
            "logging.level must be one of trace, debug, info, warn, error"
        );
        Ok(())
    }

    /// Layered load: built-in defaults, then `file` if given (format picked
    /// from the extension), then `INFECTION__SECTION__KEY` environment
    /// variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = cfg::Config::try_from(&Self::default())
            .context("serializing default settings")?;
        let mut builder = cfg::Config::builder().add_source(defaults);

        if let Some(path) = file {
            debug!(path = %path.display(), "loading settings file");
            builder = builder.add_source(cfg::File::from(path).required(true));
        }

        let settings: Self = builder
            .add_source(
                cfg::Environment::with_prefix(Self::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self = toml::from_str(s).context("parsing settings TOML")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serializing settings TOML")
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}
