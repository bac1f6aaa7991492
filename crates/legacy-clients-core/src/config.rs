use std::path::{Path, PathBuf};

use legacy_clients_parser::{FlagTokens, ReaderOptions, COLUMN_COUNT};
use pg_escape::quote_identifier;
use serde::Deserialize;

use crate::error::{LoaderError, Result};

pub const ENV_INPUT: &str = "LEGACY_CLIENTS_INPUT";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DATABASE_URL_FALLBACK: &str = "LEGACY_CLIENTS_DATABASE_URL";
pub const ENV_REST_URL: &str = "SUPABASE_URL";
pub const ENV_REST_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Postgres caps a statement at 65535 bind parameters; one row binds every column.
pub const MAX_POSTGRES_BATCH_SIZE: usize = 2000;

const _: () = assert!(MAX_POSTGRES_BATCH_SIZE * COLUMN_COUNT <= u16::MAX as usize);

/// Where the set of already-loaded client ids comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ExclusionSource {
    #[default]
    None,
    Static {
        #[serde(default)]
        ids: Vec<i64>,
    },
    File {
        path: PathBuf,
    },
    Destination,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    pub schema: String,
    pub table: String,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            table: "legacy_clients".to_string(),
        }
    }
}

impl DestinationConfig {
    /// Schema-qualified table name, quoted where Postgres requires it.
    pub fn qualified_name(&self) -> String {
        format!(
            "{}.{}",
            quote_identifier(&self.schema),
            quote_identifier(&self.table)
        )
    }

    /// Embedded migrations only create `public.legacy_clients`.
    pub fn is_migrated_table(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SqlOutputConfig {
    pub wrap_transaction: bool,
}

impl Default for SqlOutputConfig {
    fn default() -> Self {
        Self {
            wrap_transaction: true,
        }
    }
}

/// Settings for one import run, resolved once at startup.
///
/// Layering: built-in defaults, then the TOML file, then environment
/// variables, then whatever the caller overrides afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub input: Option<String>,
    pub batch_size: usize,
    pub delimiter: String,
    pub flags: FlagTokens,
    pub exclusion: ExclusionSource,
    pub destination: DestinationConfig,
    pub database_url: Option<String>,
    pub rest: RestConfig,
    pub sql: SqlOutputConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            input: None,
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: ",".to_string(),
            flags: FlagTokens::default(),
            exclusion: ExclusionSource::default(),
            destination: DestinationConfig::default(),
            database_url: None,
            rest: RestConfig::default(),
            sql: SqlOutputConfig::default(),
        }
    }
}

impl LoaderConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Read the optional config file and layer the process environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|err| {
                    LoaderError::Config(format!(
                        "failed to read config file {}: {err}",
                        path.display()
                    ))
                })?;
                Self::from_toml_str(&contents)?
            }
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(input) = non_empty(ENV_INPUT) {
            self.input = Some(input);
        }
        if let Some(url) = non_empty(ENV_DATABASE_URL).or_else(|| non_empty(ENV_DATABASE_URL_FALLBACK)) {
            self.database_url = Some(url);
        }
        if let Some(url) = non_empty(ENV_REST_URL) {
            self.rest.url = Some(url);
        }
        if let Some(key) = non_empty(ENV_REST_KEY) {
            self.rest.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(LoaderError::Config("batch_size must be at least 1".into()));
        }
        self.delimiter_byte()?;
        if self.flags.truth_token.trim().is_empty() {
            return Err(LoaderError::Config("flags.truth_token must not be empty".into()));
        }
        if let Some(false_token) = &self.flags.false_token {
            if false_token.trim().eq_ignore_ascii_case(self.flags.truth_token.trim()) {
                return Err(LoaderError::Config(
                    "flags.false_token must differ from flags.truth_token".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn validate_for_postgres(&self) -> Result<()> {
        self.validate()?;
        if self.batch_size > MAX_POSTGRES_BATCH_SIZE {
            return Err(LoaderError::Config(format!(
                "batch_size {} exceeds the Postgres limit of {MAX_POSTGRES_BATCH_SIZE}",
                self.batch_size
            )));
        }
        Ok(())
    }

    /// Migrations create only the default table, so refuse to run them
    /// against a configured destination they would not touch.
    pub fn validate_for_migrations(&self) -> Result<()> {
        if self.destination.is_migrated_table() {
            Ok(())
        } else {
            Err(LoaderError::Config(format!(
                "migrations only create public.legacy_clients; destination {} must be created \
                 separately (use --skip-migrations on import)",
                self.destination.qualified_name()
            )))
        }
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(LoaderError::Config(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ))),
        }
    }

    pub fn reader_options(&self) -> Result<ReaderOptions> {
        Ok(ReaderOptions {
            delimiter: self.delimiter_byte()?,
            flags: self.flags.clone(),
        })
    }

    pub fn input(&self) -> Result<&str> {
        self.input.as_deref().ok_or_else(|| {
            LoaderError::Config(format!("no input file configured (set `input` or {ENV_INPUT})"))
        })
    }

    pub fn database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            LoaderError::Config(format!(
                "{ENV_DATABASE_URL} (or {ENV_DATABASE_URL_FALLBACK}) must be set"
            ))
        })
    }
}
