mod dry_run;
mod sbatch;

pub use dry_run::DryRunSubmitter;
pub use sbatch::{parse_job_id, SbatchSubmitter};

use crate::config::{ConfigErrors, SubmitterConfig};
use std::{fmt, io};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Failed to start the submission program: {0}")]
    Spawn(io::Error),
    #[error("Failed to communicate with the submission program: {0}")]
    Io(#[from] io::Error),
    #[error("Scheduler rejected the job (exit code {code:?}): {stderr}")]
    Rejected { code: Option<i32>, stderr: String },
    #[error("Scheduler did not report a job id, output was {stdout:?}")]
    MissingJobId { stdout: String },
}

/// Identifier handed out by the scheduler for a submitted job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands a finished job script to the scheduler
pub trait Submitter {
    fn submit(&mut self, script: &str) -> Result<JobId, SubmitError>;

    /// whether the script text already ends up on stdout during `submit`
    fn prints_scripts(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub enum Submitters {
    Sbatch(SbatchSubmitter),
    DryRun(DryRunSubmitter),
}

impl Submitters {
    pub fn load(config: &SubmitterConfig) -> Result<Self, ConfigErrors> {
        match config.name.to_lowercase().as_str() {
            "sbatch" => Ok(Self::Sbatch(SbatchSubmitter::new(config.program.clone()))),
            "dry-run" | "dry_run" => Ok(Self::DryRun(DryRunSubmitter::default())),
            _ => Err(ConfigErrors::UnsupportedSubmitter(config.name.clone())),
        }
    }
}

impl Submitter for Submitters {
    fn submit(&mut self, script: &str) -> Result<JobId, SubmitError> {
        match self {
            Self::Sbatch(submitter) => submitter.submit(script),
            Self::DryRun(submitter) => submitter.submit(script),
        }
    }

    fn prints_scripts(&self) -> bool {
        match self {
            Self::Sbatch(submitter) => submitter.prints_scripts(),
            Self::DryRun(submitter) => submitter.prints_scripts(),
        }
    }
}
