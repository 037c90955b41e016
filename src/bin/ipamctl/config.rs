// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements the configuration file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use paste::paste;
use serde::{de, Deserialize};

use ipam::dns::Ttl;
use ipam::ipam::DEFAULT_TTL;

use crate::args::Args;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the configuration from the file given by `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let dir = match path.as_ref().parent() {
        Some(p) => p,
        None => return Err(anyhow!("the configuration file path has no parent")),
    };
    let raw_config = fs::read(path.as_ref()).context("failed to read the configuration file")?;
    let mut config: Config =
        toml::from_slice(&raw_config).context("failed to parse the configuration file")?;

    // When loading the configuration from a path, all paths are
    // interpreted relative to the configuration file's directory.
    config.database = dir.join(&config.database);
    config.cache = config.cache.map(|cache| dir.join(cache));
    config.export_dir = dir.join(&config.export_dir);

    log_config_summary(&config);
    Ok(config)
}

/// Loads the configuration from the parsed command line arguments
/// given by `args`.
pub fn load_from_args(args: &Args) -> Result<Config> {
    let database = match args.database {
        Some(ref database) => database.clone(),
        None => return Err(anyhow!("no database document was given")),
    };
    let config = Config {
        database,
        cache: args.cache.clone(),
        export_dir: args.export_dir.clone().unwrap_or_else(default_export_dir),
        default_ttl: args.default_ttl.map_or_else(default_ttl, ConfigTtl),
        annotate: false,
    };
    log_config_summary(&config);
    Ok(config)
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    let cache = match config.cache {
        Some(ref cache) => cache.display().to_string(),
        None => String::from("disabled"),
    };
    debug!(
        "Configuration loaded:\n\
         Database:    {}\n\
         Cache:       {}\n\
         Export dir:  {}\n\
         Default TTL: {}\n\
         Annotate:    {}",
        config.database.display(),
        cache,
        config.export_dir.display(),
        config.default_ttl.0,
        config.annotate,
    );
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub database: PathBuf,
    pub cache: Option<PathBuf>,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    #[serde(default = "default_ttl")]
    pub default_ttl: ConfigTtl,
    #[serde(default)]
    pub annotate: bool,
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_ttl() -> ConfigTtl {
    ConfigTtl(Ttl::from(DEFAULT_TTL))
}

////////////////////////////////////////////////////////////////////////
// WRAPPERS OVER IPAM TYPES FOR SERDE                                 //
////////////////////////////////////////////////////////////////////////

/// Generates a deserializable `ConfigX` structure wrapping an `X` type
/// from [`ipam`], using its [`FromStr`](std::str::FromStr)
/// implementation.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal) => {
        /// A macro-generated deserializable wrapper over an [`ipam`]
        /// type.
        #[derive(Clone, Debug)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_any(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                de::Visitor::visit_str(self, &value.to_string())
            }
        }
    };
}

make_serde_wrapper!(ConfigTtl, Ttl, "TTL");

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
