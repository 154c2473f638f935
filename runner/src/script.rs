use crate::{
    config::{SchedulerConfig, StagingConfig},
    partition::Batch,
    staging,
    template::{expand, InvocationDir},
};
use std::fmt;
use tracing::trace;

pub const SHEBANG: &str = "#!/usr/bin/env bash";
pub const GENERATED_BY: &str = "# Job script automatically generated by stack-runner";
/// line that keeps the job alive until all backgrounded commands returned
pub const JOIN_LINE: &str = "wait";
const BACKGROUND_MARKER: &str = " &";

/// How commands of one batch share a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundMode {
    /// commands run one after another
    #[default]
    Foreground,
    /// the template backgrounds itself, only the final join is added
    Declared,
    /// every command gets a trailing `&`, followed by the final join
    Append,
}

impl BackgroundMode {
    pub fn requires_join(&self) -> bool {
        !matches!(self, Self::Foreground)
    }
}

/// Everything besides the batch itself that shapes a job script
#[derive(Debug, Clone, Default)]
pub struct ScriptOptions {
    pub scheduler: SchedulerConfig,
    pub staging: StagingConfig,
    pub background: BackgroundMode,
}

/// A complete job script for one batch, ready to be handed to a submitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobScript {
    pub batch: usize,
    pub job_name: String,
    text: String,
}

impl JobScript {
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for JobScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn directive(script: &mut String, flag: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|value| !value.is_empty()) {
        script.push_str(&format!("#SBATCH {flag} {value}\n"));
    }
}

/// Build the `#SBATCH` header, values are passed through without interpretation
fn directives(script: &mut String, scheduler: &SchedulerConfig, job_name: &str) {
    script.push_str(SHEBANG);
    script.push('\n');
    script.push_str(GENERATED_BY);
    script.push('\n');

    directive(script, "-n", scheduler.cores.as_deref());
    directive(script, "-p", scheduler.partition.as_deref());
    directive(script, "-A", scheduler.account.as_deref());
    directive(script, "-t", scheduler.walltime.as_deref());
    // zero nodes means "let Slurm decide"
    directive(
        script,
        "-N",
        scheduler
            .nodes
            .as_deref()
            .filter(|nodes| nodes.trim() != "0"),
    );
    directive(script, "-C", scheduler.constraint.as_deref());
    directive(script, "-J", Some(job_name));
}

/// Assemble the job script for `batch`.
///
/// Whether a final `wait` is emitted depends only on `options.background`, the template
/// text is never inspected for trailing `&`.
pub fn assemble(
    batch: &Batch,
    template: &str,
    cwd: &InvocationDir,
    options: &ScriptOptions,
) -> JobScript {
    let job_name = options
        .scheduler
        .job_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| batch.first().as_str())
        .to_owned();

    let mut script = String::new();
    directives(&mut script, &options.scheduler, &job_name);

    for query in batch.queries() {
        let plan = staging::plan(
            query,
            options.staging.copy_decompress,
            &options.staging.scratch_dir,
        );
        trace!(query = %query, mode = ?plan.mode, "Planned staging");

        if plan.needs_staging() {
            script.push_str(&plan.staging_command);
            script.push('\n');
        }

        script.push_str(&expand(template, &plan, cwd));
        if options.background == BackgroundMode::Append {
            script.push_str(BACKGROUND_MARKER);
        }
        script.push('\n');
    }

    if options.background.requires_join() {
        script.push_str(JOIN_LINE);
        script.push('\n');
    }

    JobScript {
        batch: batch.index,
        job_name,
        text: script,
    }
}
