use crate::{
    config::Settings,
    partition::{partition, Batch},
    script::{assemble, JobScript},
    submit::{JobId, SubmitError, Submitter},
};
use rayon::prelude::*;
use tracing::{debug, error, info, instrument};

#[derive(Debug)]
pub enum BatchOutcome {
    Submitted(JobId),
    Failed(SubmitError),
}

#[derive(Debug)]
pub struct BatchReport {
    pub batch: Batch,
    pub job_name: String,
    pub outcome: BatchOutcome,
}

/// Result of all submissions of one run, in partition order
#[derive(Debug, Default)]
pub struct RunReport {
    pub batches: Vec<BatchReport>,
}

impl RunReport {
    pub fn submitted(&self) -> usize {
        self.batches
            .iter()
            .filter(|report| matches!(report.outcome, BatchOutcome::Submitted(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.batches.len() - self.submitted()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Human readable confirmation naming every query a job covers
pub fn confirmation(batch: &Batch, id: &JobId) -> String {
    if batch.len() > 1 {
        format!(
            "Submitted stacked Slurm job {id} for {} queries: {}",
            batch.len(),
            batch.names()
        )
    } else {
        format!("Submitted Slurm job {id} for: {}", batch.names())
    }
}

/// Partition the queries and assemble one job script per batch.
///
/// Batches are independent of each other, so scripts are built in parallel; the result keeps
/// partition order.
pub fn prepare(settings: &Settings) -> Vec<(Batch, JobScript)> {
    partition(&settings.queries, settings.stack)
        .into_par_iter()
        .map(|batch| {
            let script = assemble(&batch, &settings.template, &settings.cwd, &settings.script);

            (batch, script)
        })
        .collect()
}

/// Submit one job per batch.
///
/// A failed submission is reported and the remaining batches are still submitted, nothing is
/// retried.
#[instrument(skip_all, fields(queries = settings.queries.len(), stack = settings.stack.get()))]
pub fn run<S: Submitter>(settings: &Settings, submitter: &mut S) -> RunReport {
    let prepared = prepare(settings);
    info!("Submitting {} jobs", prepared.len());

    let mut report = RunReport::default();

    for (batch, script) in prepared {
        if submitter.prints_scripts() {
            debug!(batch = batch.index, "Job script:\n{script}");
        } else {
            info!(batch = batch.index, "Job script:\n{script}");
        }

        let outcome = match submitter.submit(script.text()) {
            Ok(id) => {
                let message = confirmation(&batch, &id);
                debug!(batch = batch.index, job = %id, "Submitted job {}", script.job_name);
                println!("{message}");

                BatchOutcome::Submitted(id)
            }
            Err(error) => {
                error!(
                    batch = batch.index,
                    "Failed to submit job for {}: {error}",
                    batch.names()
                );

                BatchOutcome::Failed(error)
            }
        };

        report.batches.push(BatchReport {
            batch,
            job_name: script.job_name,
            outcome,
        });
    }

    info!(
        "Submitted {}/{} jobs",
        report.submitted(),
        report.batches.len()
    );

    report
}
