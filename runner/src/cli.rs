use crate::{
    config::{
        ConfigErrors, QuerySources, RunnerConfig, SchedulerConfig, Settings, UncheckedSettings,
    },
    runner::{run, RunReport},
    script::{BackgroundMode, ScriptOptions},
    staging::ScratchDir,
    submit::Submitters,
    template::InvocationDir,
};
use clap::{Args, Parser};
use std::{env, path::PathBuf};
use tracing::{debug, info};

/// Run a command on many files on a Slurm managed cluster, stacking several files per job
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Program and arguments in a single quoted string, e.g.
    /// 'blat db.fasta {query} -t=dnax q=prot {cwd}{query}.blast8'.
    /// {query} is replaced with the (staged) query, {cwd} with the current directory
    #[arg(long)]
    pub call: String,

    /// Number of queries stacked into one job
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub stack: usize,

    /// Run all commands of a job at the same time by appending '&' and a final 'wait'
    #[arg(long, conflicts_with = "wait")]
    pub background: bool,

    /// The command already ends with '&', only add a final 'wait' to each job
    #[arg(long)]
    pub wait: bool,

    /// Copy queries to the node-local scratch directory, decompressing .gz/.bz2/.dsrc files
    #[arg(long)]
    pub copy_decompress: bool,

    /// Node-local scratch directory, expanded by the shell on the node [default: $TMPDIR]
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<String>,

    /// Read queries from a file, one per line
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// YAML file with scheduler, staging and submitter defaults
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the job scripts instead of submitting them
    #[arg(long)]
    pub dry_run: bool,

    /// sbatch executable used for submission
    #[arg(long, value_name = "PROGRAM")]
    pub sbatch: Option<PathBuf>,

    #[command(flatten)]
    pub slurm: SlurmArgs,

    /// Query file(s)
    #[arg(value_name = "QUERY")]
    pub queries: Vec<String>,
}

/// Slurm parameters, written verbatim into each job script
#[derive(Args, Debug, Clone, Default)]
pub struct SlurmArgs {
    /// Number of cores [default: 1]
    #[arg(short = 'n', value_name = "n")]
    pub cores: Option<String>,

    /// Number of nodes, 0 leaves the choice to Slurm
    #[arg(short = 'N', value_name = "N")]
    pub nodes: Option<String>,

    /// Slurm partition [default: core]
    #[arg(short = 'p', value_name = "p")]
    pub partition: Option<String>,

    /// Slurm account
    #[arg(short = 'A', value_name = "account")]
    pub account: Option<String>,

    /// Max runtime per job [default: 01:00:00]
    #[arg(short = 't', value_name = "t")]
    pub walltime: Option<String>,

    /// Node constraints, e.g. 'mem128GB&usage_mail'
    #[arg(short = 'C', value_name = "constraint")]
    pub constraint: Option<String>,

    /// Slurm job name [default: first query of the job]
    #[arg(short = 'J', value_name = "jobname")]
    pub job_name: Option<String>,
}

impl SlurmArgs {
    /// command line values take precedence over `base`
    pub fn merge(self, base: SchedulerConfig) -> SchedulerConfig {
        SchedulerConfig {
            cores: self.cores.or(base.cores),
            nodes: self.nodes.or(base.nodes),
            partition: self.partition.or(base.partition),
            account: self.account.or(base.account),
            walltime: self.walltime.or(base.walltime),
            constraint: self.constraint.or(base.constraint),
            job_name: self.job_name.or(base.job_name),
        }
    }
}

impl Cli {
    pub fn background_mode(&self) -> BackgroundMode {
        if self.background {
            BackgroundMode::Append
        } else if self.wait {
            BackgroundMode::Declared
        } else {
            BackgroundMode::Foreground
        }
    }

    /// Combine the command line with the config file, command line values win
    pub fn into_unchecked(self, config: RunnerConfig, cwd: InvocationDir) -> UncheckedSettings {
        let background = self.background_mode();
        let RunnerConfig {
            scheduler,
            mut staging,
            mut submitter,
        } = config;

        staging.copy_decompress |= self.copy_decompress;
        if let Some(dir) = self.scratch_dir {
            staging.scratch_dir = ScratchDir::new(dir);
        }

        if self.dry_run {
            submitter.name = "dry-run".to_owned();
        }
        if let Some(program) = self.sbatch {
            submitter.program = program;
        }

        UncheckedSettings {
            template: self.call,
            stack: self.stack,
            queries: QuerySources {
                positional: self.queries,
                file: self.file,
            },
            cwd,
            script: ScriptOptions {
                scheduler: self.slurm.merge(scheduler),
                staging,
                background,
            },
            submitter,
        }
    }
}

fn invocation_dir(dir: PathBuf) -> Result<InvocationDir, ConfigErrors> {
    InvocationDir::from_path(&dir).ok_or(ConfigErrors::NonUtf8CurrentDir(dir))
}

/// Entry point behind `main`: validate everything, then submit
pub fn execute(cli: Cli) -> Result<RunReport, ConfigErrors> {
    let config = match &cli.config {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };
    let dir = env::current_dir().map_err(ConfigErrors::CurrentDir)?;
    let cwd = invocation_dir(dir)?;
    debug!(cwd = %cwd, "Resolved invocation directory");

    let settings = Settings::preflight_checks(cli.into_unchecked(config, cwd))?;
    let mut submitter = Submitters::load(&settings.submitter)?;
    info!(
        "Stacking {} queries by {} with {:?}",
        settings.queries.len(),
        settings.stack,
        settings.script.background
    );

    Ok(run(&settings, &mut submitter))
}
