use super::{JobId, SubmitError, Submitter};
use std::io::{self, Write};
use tracing::debug;

/// Prints job scripts instead of submitting them
#[derive(Debug)]
pub struct DryRunSubmitter<W: Write = io::Stdout> {
    out: W,
    submitted: usize,
}

impl Default for DryRunSubmitter {
    fn default() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DryRunSubmitter<W> {
    pub fn new(out: W) -> Self {
        Self { out, submitted: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Submitter for DryRunSubmitter<W> {
    fn submit(&mut self, script: &str) -> Result<JobId, SubmitError> {
        self.submitted += 1;
        debug!("Dry run, not submitting script {}", self.submitted);

        self.out.write_all(script.as_bytes())?;
        writeln!(self.out)?;
        self.out.flush()?;

        Ok(JobId::new(format!("dry-run-{}", self.submitted)))
    }

    fn prints_scripts(&self) -> bool {
        true
    }
}
