use super::{JobId, SubmitError, Submitter};
use std::{
    io::{ErrorKind, Write},
    path::PathBuf,
    process::{Command, Stdio},
};
use tracing::{debug, instrument, warn};

/// Submits scripts by piping them into `sbatch --parsable`
#[derive(Debug, Clone)]
pub struct SbatchSubmitter {
    program: PathBuf,
}

impl SbatchSubmitter {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

/// Extract the job id from `sbatch --parsable` output (`<id>` or `<id>;<cluster>`)
pub fn parse_job_id(stdout: &str) -> Result<JobId, SubmitError> {
    let line = stdout.lines().map(str::trim).find(|line| !line.is_empty());

    match line.and_then(|line| line.split(';').next()).map(str::trim) {
        Some(id) if !id.is_empty() => Ok(JobId::new(id)),
        _ => Err(SubmitError::MissingJobId {
            stdout: stdout.to_owned(),
        }),
    }
}

impl Submitter for SbatchSubmitter {
    #[instrument(skip(self, script), fields(program = ?self.program), level = "debug")]
    fn submit(&mut self, script: &str) -> Result<JobId, SubmitError> {
        let mut child = Command::new(&self.program)
            .arg("--parsable")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(SubmitError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(script.as_bytes()) {
                // the exit status below tells what went wrong
                Err(error) if error.kind() == ErrorKind::BrokenPipe => {
                    debug!("Submission program closed stdin early")
                }
                result => result?,
            }
            // dropping stdin closes the pipe, sbatch reads until EOF
        }

        debug!("Waiting on submission program {}", child.id());
        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(SubmitError::Rejected {
                code: output.status.code(),
                stderr: stderr.trim().to_owned(),
            });
        }

        if !stderr.trim().is_empty() {
            warn!(stderr = %stderr.trim(), "Submission program reported warnings");
        }

        parse_job_id(&stdout)
    }
}
