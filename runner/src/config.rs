use crate::{
    query::{read_query_file, Query},
    script::ScriptOptions,
    staging::ScratchDir,
    template::InvocationDir,
};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use std::{fs, io, num::NonZeroUsize, path::PathBuf};
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Stack size must be at least 1")]
    InvalidStack,
    #[error("No queries were given")]
    NoQueries,
    #[error("Queries were given both as arguments and with --file")]
    ConflictingQuerySources,
    #[error("The command template is empty")]
    EmptyTemplate,
    #[error("Failed to read query file {path:?}: {source}")]
    QueryFile { path: PathBuf, source: io::Error },
    #[error("Failed to read config file {path:?}: {source}")]
    ConfigFile { path: PathBuf, source: io::Error },
    #[error("Config file is invalid: {0}")]
    InvalidConfig(#[from] serde_yaml::Error),
    #[error("Submitter not supported: {0}")]
    UnsupportedSubmitter(String),
    #[error("Failed to determine the current directory: {0}")]
    CurrentDir(io::Error),
    #[error("The current directory {0:?} is not valid UTF-8")]
    NonUtf8CurrentDir(PathBuf),
    #[error("{0} configuration error(s), nothing was submitted")]
    Preflight(usize),
}

/// Accept any YAML scalar and keep its text, the scheduler interprets the value
fn opaque_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(value)) => Ok(Some(value)),
        Some(serde_yaml::Value::Number(value)) => Ok(Some(value.to_string())),
        Some(serde_yaml::Value::Bool(value)) => Ok(Some(value.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a scalar directive value, found {other:?}"
        ))),
    }
}

/// Top level of the optional YAML config file
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub submitter: SubmitterConfig,
}

/// Values for the `#SBATCH` directive block, never interpreted by the runner
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct SchedulerConfig {
    #[serde(deserialize_with = "opaque_value")]
    pub cores: Option<String>,
    #[serde(deserialize_with = "opaque_value")]
    pub nodes: Option<String>,
    #[serde(deserialize_with = "opaque_value")]
    pub partition: Option<String>,
    #[serde(deserialize_with = "opaque_value")]
    pub account: Option<String>,
    #[serde(deserialize_with = "opaque_value")]
    pub walltime: Option<String>,
    // node features, e.g. `mem128GB&usage_mail`
    #[serde(deserialize_with = "opaque_value")]
    pub constraint: Option<String>,
    // defaults to the first query of a batch
    #[serde(deserialize_with = "opaque_value")]
    pub job_name: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cores: Some("1".to_owned()),
            nodes: None,
            partition: Some("core".to_owned()),
            account: None,
            walltime: Some("01:00:00".to_owned()),
            constraint: None,
            job_name: None,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct StagingConfig {
    pub copy_decompress: bool,
    pub scratch_dir: ScratchDir,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct SubmitterConfig {
    // Name of the selected submitter, see Submitters::load for the selection process
    pub name: String,
    // sbatch executable, looked up in PATH unless absolute
    pub program: PathBuf,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            name: "sbatch".to_owned(),
            program: PathBuf::from("sbatch"),
        }
    }
}

impl RunnerConfig {
    pub fn from_yaml(content: &str) -> Result<Self, ConfigErrors> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &PathBuf) -> Result<Self, ConfigErrors> {
        let content = fs::read_to_string(path).map_err(|error| ConfigErrors::ConfigFile {
            path: path.clone(),
            source: error,
        })?;
        debug!(path = ?path, "Loaded config file");

        Self::from_yaml(&content)
    }
}

/// Where the queries of a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySources {
    pub positional: Vec<String>,
    pub file: Option<PathBuf>,
}

/// Run parameters before validation, as collected from the command line and config file
#[derive(Debug, Clone)]
pub struct UncheckedSettings {
    pub template: String,
    pub stack: usize,
    pub queries: QuerySources,
    pub cwd: InvocationDir,
    pub script: ScriptOptions,
    pub submitter: SubmitterConfig,
}

/// Validated parameters of a run
#[derive(Debug, Clone)]
pub struct Settings {
    pub template: String,
    pub queries: Vec<Query>,
    pub stack: NonZeroUsize,
    pub cwd: InvocationDir,
    pub script: ScriptOptions,
    pub submitter: SubmitterConfig,
}

impl Settings {
    /// Validate `unchecked` before anything is submitted.
    ///
    /// All problems are logged instead of stopping at the first one, to make fixing a command
    /// line a single round trip.
    pub fn preflight_checks(unchecked: UncheckedSettings) -> Result<Self, ConfigErrors> {
        let mut errors = Vec::new();

        if unchecked.template.trim().is_empty() {
            errors.push(ConfigErrors::EmptyTemplate);
        }

        let stack = NonZeroUsize::new(unchecked.stack);
        if stack.is_none() {
            errors.push(ConfigErrors::InvalidStack);
        }

        let QuerySources { positional, file } = unchecked.queries;
        let queries = match file {
            Some(_) if !positional.is_empty() => {
                errors.push(ConfigErrors::ConflictingQuerySources);
                None
            }
            Some(path) => match read_query_file(&path) {
                Ok(queries) => Some(queries),
                Err(error) => {
                    errors.push(error);
                    None
                }
            },
            None => Some(positional.into_iter().map(Query::from).collect::<Vec<_>>()),
        };

        if queries.as_ref().is_some_and(Vec::is_empty) {
            errors.push(ConfigErrors::NoQueries);
        }

        if let Some(stack) = stack.filter(|stack| stack.get() > 1) {
            if !unchecked.script.background.requires_join() {
                warn!(
                    "Stacking {stack} queries per job without --background or --wait runs them one after another"
                );
            }
        }

        match (stack, queries) {
            (Some(stack), Some(queries)) if errors.is_empty() => Ok(Self {
                template: unchecked.template,
                queries,
                stack,
                cwd: unchecked.cwd,
                script: unchecked.script,
                submitter: unchecked.submitter,
            }),
            _ => {
                for error in errors.iter() {
                    error!("{error}");
                }

                Err(ConfigErrors::Preflight(errors.len()))
            }
        }
    }
}
