//! A worker backed by the `sourmash` command line.
//!
//! One background thread serves every request posted to a
//! [`ProcessWorker`], sketching files one at a time with
//! `sourmash sketch`. Each file is streamed through the child's stdin so
//! progress can be reported as the share of bytes sent.

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread;

use camino::Utf8PathBuf;
use crossbeam_channel::{unbounded, Receiver, Sender};
use itertools::Itertools;

use crate::options::{Moltype, SketchOptions};
use crate::protocol::{SketchWorker, WorkerMessage, WorkerRequest};
use crate::selection::FileHandle;
use crate::{Error, Result};

pub const DEFAULT_PROGRAM: &str = "sourmash";

const CHUNK_SIZE: usize = 64 * 1024;

struct Job {
    files: Vec<Utf8PathBuf>,
    options: SketchOptions,
}

pub struct ProcessWorker {
    jobs: Sender<Job>,
    messages: Receiver<WorkerMessage>,
}

impl ProcessWorker {
    pub fn new<S: Into<String>>(program: S) -> Result<ProcessWorker> {
        let program = program.into();
        let (jobs, job_queue) = unbounded::<Job>();
        let (events, messages) = unbounded::<WorkerMessage>();

        thread::Builder::new()
            .name("snipe-worker".into())
            .spawn(move || {
                for job in job_queue {
                    run_job(&program, job, &events);
                }
                log::debug!("worker shutting down");
            })?;

        Ok(ProcessWorker { jobs, messages })
    }

    /// Events posted back by the worker thread.
    pub fn messages(&self) -> &Receiver<WorkerMessage> {
        &self.messages
    }
}

impl SketchWorker<Utf8PathBuf> for ProcessWorker {
    fn post(&self, request: WorkerRequest<'_, Utf8PathBuf>) -> Result<()> {
        let job = Job {
            files: request.files.to_vec(),
            options: request.options,
        };
        self.jobs.send(job).map_err(|e| Error::WorkerUnavailable {
            message: e.to_string(),
        })
    }
}

/// `sourmash sketch` parameter string for a set of options.
pub fn param_string(options: &SketchOptions) -> String {
    let mut params = vec![format!("k={}", options.ksize)];
    if options.num > 0 {
        params.push(format!("num={}", options.num));
    } else {
        params.push(format!("scaled={}", options.scaled));
    }
    params.push(format!("seed={}", options.seed));
    params.push(if options.track_abundance { "abund" } else { "noabund" }.into());
    match options.moltype() {
        Moltype::Dayhoff => params.push("dayhoff".into()),
        Moltype::Hp => params.push("hp".into()),
        Moltype::Dna | Moltype::Protein => (),
    }
    params.iter().join(",")
}

fn run_job(program: &str, job: Job, events: &Sender<WorkerMessage>) {
    for path in &job.files {
        let filename = path.name().into_owned();
        let msg = match sketch_file(program, path, &filename, &job.options, events) {
            Ok(signature) => WorkerMessage::Generated {
                filename,
                signature,
            },
            Err(error) => WorkerMessage::Failed { filename, error },
        };
        if events.send(msg).is_err() {
            log::debug!("nobody listening for worker messages");
            return;
        }
    }
}

fn sketch_file(
    program: &str,
    path: &Utf8PathBuf,
    filename: &str,
    options: &SketchOptions,
    events: &Sender<WorkerMessage>,
) -> std::result::Result<String, String> {
    let mut input = File::open(path).map_err(|e| format!("{}: {}", path, e))?;
    let total = input.metadata().map(|m| m.len()).unwrap_or(0);

    let moltype = match options.moltype() {
        Moltype::Dna => "dna",
        Moltype::Protein | Moltype::Dayhoff | Moltype::Hp => "protein",
    };
    let mut child = Command::new(program)
        .args(["sketch", moltype, "-p"])
        .arg(param_string(options))
        .args(["-o", "-", "--name", filename, "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to run {}: {}", program, e))?;

    let mut stdin = child.stdin.take().ok_or("child stdin unavailable")?;
    let mut stdout = child.stdout.take().ok_or("child stdout unavailable")?;
    let mut stderr = child.stderr.take().ok_or("child stderr unavailable")?;

    let report = |progress: f64| {
        let _ = events.send(WorkerMessage::Progress {
            filename: filename.into(),
            progress,
        });
    };

    let (feed, out, err) = thread::scope(|scope| {
        let out = scope.spawn(move || {
            let mut buf = String::new();
            stdout.read_to_string(&mut buf).map(|_| buf)
        });
        let err = scope.spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        });

        report(0.0);
        let feed = feed_input(&mut input, &mut stdin, total, report);
        drop(stdin);

        (feed, out.join(), err.join())
    });

    let status = child
        .wait()
        .map_err(|e| format!("waiting for {}: {}", program, e))?;
    let stderr = err.unwrap_or_default();

    if !status.success() {
        let reason = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} exited with {}", program, status));
        return Err(reason);
    }
    if let Err(e) = feed {
        return Err(format!("{}: {}", path, e));
    }

    match out {
        Ok(Ok(signature)) if !signature.trim().is_empty() => Ok(signature),
        Ok(Ok(_)) => Err(format!("{} produced no signature", program)),
        Ok(Err(e)) => Err(format!("reading signature: {}", e)),
        Err(_) => Err("signature reader panicked".into()),
    }
}

/// Copy `input` into `output`, reporting whole-percent progress steps.
fn feed_input<R, W, P>(input: &mut R, output: &mut W, total: u64, report: P) -> io::Result<u64>
where
    R: Read,
    W: Write,
    P: Fn(f64),
{
    let mut buf = vec![0; CHUNK_SIZE];
    let mut sent = 0u64;
    let mut last = 0u64;

    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        match output.write_all(&buf[..n]) {
            Ok(()) => (),
            // the child stopped reading, its exit status tells why
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => break,
            Err(e) => return Err(e),
        }
        sent += n as u64;

        if total > 0 {
            let pct = (sent * 100 / total).min(99);
            if pct > last {
                last = pct;
                report(pct as f64);
            }
        }
    }
    Ok(sent)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn params_for_scaled_dna() {
        assert_eq!(
            param_string(&SketchOptions::default()),
            "k=51,scaled=10000,seed=42,abund"
        );
    }

    #[test]
    fn params_for_num_dayhoff() {
        let opts = SketchOptions::builder()
            .num(500)
            .ksize(19)
            .dayhoff(true)
            .track_abundance(false)
            .build();
        assert_eq!(param_string(&opts), "k=19,num=500,seed=42,noabund,dayhoff");
    }

    #[test]
    fn feed_reports_increasing_progress() {
        let data = vec![b'A'; CHUNK_SIZE * 4];
        let mut out = vec![];
        let seen = RefCell::new(vec![]);

        let sent = feed_input(&mut data.as_slice(), &mut out, data.len() as u64, |p| {
            seen.borrow_mut().push(p)
        })
        .unwrap();

        assert_eq!(sent, data.len() as u64);
        assert_eq!(out, data);
        // completion is signalled by the signature, not by progress
        assert_eq!(*seen.borrow(), vec![25.0, 50.0, 75.0, 99.0]);
    }
}
