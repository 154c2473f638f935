use crate::{
    config::Settings,
    partition::partition,
    query::Query,
    runner::{confirmation, prepare, run, BatchOutcome},
    script::{BackgroundMode, ScriptOptions},
    submit::{JobId, SubmitError, Submitter},
    template::InvocationDir,
};
use std::num::NonZeroUsize;

/// records every script and rejects the submissions listed in `reject`
#[derive(Default)]
struct RecordingSubmitter {
    scripts: Vec<String>,
    reject: Vec<usize>,
}

impl Submitter for RecordingSubmitter {
    fn submit(&mut self, script: &str) -> Result<JobId, SubmitError> {
        let attempt = self.scripts.len();
        self.scripts.push(script.to_owned());

        if self.reject.contains(&attempt) {
            Err(SubmitError::Rejected {
                code: Some(1),
                stderr: "sbatch: error: Batch job submission failed".to_owned(),
            })
        } else {
            Ok(JobId::new(format!("{}", 1000 + attempt)))
        }
    }
}

fn settings(names: &[&str], stack: usize) -> Settings {
    Settings {
        template: "echo {query}".to_owned(),
        queries: names.iter().copied().map(Query::from).collect(),
        stack: NonZeroUsize::new(stack).unwrap(),
        cwd: InvocationDir::new("/home/u"),
        script: ScriptOptions {
            background: BackgroundMode::Append,
            ..ScriptOptions::default()
        },
        submitter: Default::default(),
    }
}

#[test]
pub fn one_submission_per_batch_in_order() {
    let settings = settings(&["a", "b", "c", "d", "e"], 2);
    let mut submitter = RecordingSubmitter::default();

    let report = run(&settings, &mut submitter);

    assert_eq!(submitter.scripts.len(), 3);
    assert!(submitter.scripts[0].contains("echo a &\necho b &\nwait\n"));
    assert!(submitter.scripts[1].contains("echo c &\necho d &\nwait\n"));
    assert!(submitter.scripts[2].contains("echo e &\nwait\n"));
    assert_eq!(report.submitted(), 3);
    assert!(report.is_success());
    assert_eq!(
        report
            .batches
            .iter()
            .map(|batch| batch.job_name.as_str())
            .collect::<Vec<_>>(),
        vec!["a", "c", "e"]
    );
}

#[test]
pub fn failure_does_not_stop_later_batches() {
    let settings = settings(&["a", "b", "c"], 1);
    let mut submitter = RecordingSubmitter {
        reject: vec![1],
        ..RecordingSubmitter::default()
    };

    let report = run(&settings, &mut submitter);

    assert_eq!(submitter.scripts.len(), 3);
    assert_eq!(report.submitted(), 2);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_success());
    assert!(matches!(
        report.batches[1].outcome,
        BatchOutcome::Failed(SubmitError::Rejected { .. })
    ));
    assert!(matches!(
        &report.batches[2].outcome,
        BatchOutcome::Submitted(id) if id.as_str() == "1002"
    ));
}

#[test]
pub fn prepared_scripts_keep_partition_order() {
    let names = (0..50).map(|i| format!("q{i}")).collect::<Vec<_>>();
    let names = names.iter().map(String::as_str).collect::<Vec<_>>();
    let settings = settings(&names, 3);

    let prepared = prepare(&settings);

    assert_eq!(prepared.len(), 17);
    for (index, (batch, script)) in prepared.iter().enumerate() {
        assert_eq!(batch.index, index);
        assert_eq!(script.batch, index);
        assert_eq!(script.job_name, batch.first().as_str());
    }
}

#[test]
pub fn repeated_runs_are_identical() {
    let settings = settings(&["x.gz", "y", "z.bz2"], 2);
    let mut first = RecordingSubmitter::default();
    let mut second = RecordingSubmitter::default();

    run(&settings, &mut first);
    run(&settings, &mut second);

    assert_eq!(first.scripts, second.scripts);
}

#[test]
pub fn confirmation_names_queries() {
    let queries = ["a.fq", "b.fq", "c.fq"].map(Query::from);
    let batches = partition(&queries, NonZeroUsize::new(2).unwrap());

    assert_eq!(
        confirmation(&batches[0], &JobId::new("17")),
        "Submitted stacked Slurm job 17 for 2 queries: 'a.fq', 'b.fq'"
    );
    assert_eq!(
        confirmation(&batches[1], &JobId::new("18")),
        "Submitted Slurm job 18 for: 'c.fq'"
    );
}

#[derive(Clone, Default)]
struct SharedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for SharedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedLog {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// run with an info level subscriber and return everything it logged
fn logged_run<S: Submitter>(settings: &Settings, submitter: &mut S) -> String {
    let log = SharedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || run(settings, submitter));

    log.text()
}

/// a submitter that shows its scripts by itself
#[derive(Default)]
struct EchoingSubmitter(RecordingSubmitter);

impl Submitter for EchoingSubmitter {
    fn submit(&mut self, script: &str) -> Result<JobId, SubmitError> {
        self.0.submit(script)
    }

    fn prints_scripts(&self) -> bool {
        true
    }
}

#[test]
pub fn scripts_are_logged_before_submission() {
    let settings = settings(&["a", "b"], 1);
    let mut submitter = RecordingSubmitter::default();

    let log = logged_run(&settings, &mut submitter);

    assert!(log.contains("#SBATCH -J a"));
    assert!(log.contains("#SBATCH -J b"));
}

#[test]
pub fn printing_submitters_are_not_echoed_twice() {
    let settings = settings(&["a", "b"], 1);
    let mut submitter = EchoingSubmitter::default();

    let log = logged_run(&settings, &mut submitter);

    assert_eq!(submitter.0.scripts.len(), 2);
    assert!(!log.contains("#SBATCH"));
}
