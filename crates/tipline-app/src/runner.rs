//! Background analysis runner.
//!
//! Assembly (with its network lookups) runs on a worker thread while the
//! caller polls for completion every 100ms, so status output stays live
//! during slow enrichment runs.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tipline_assembly::assemble::AssembledReport;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum RunOutcome {
    Finished(AssembledReport),
    Failed(String),
}

/// Run `job` on a worker thread, invoking `on_tick` while waiting.
pub fn run<F, T>(job: F, mut on_tick: T) -> RunOutcome
where
    F: FnOnce() -> Result<AssembledReport, String> + Send + 'static,
    T: FnMut(),
{
    let (tx, rx) = mpsc::sync_channel(1);
    let worker = thread::spawn(move || {
        let result = job();
        // Receiver hanging up means the caller is gone; nothing to do.
        let _ = tx.send(result);
    });

    let result = loop {
        match rx.try_recv() {
            Ok(result) => break result,
            Err(mpsc::TryRecvError::Empty) => {
                on_tick();
                thread::sleep(POLL_INTERVAL);
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                break Err("analysis worker exited unexpectedly".to_string());
            }
        }
    };
    let _ = worker.join();

    match result {
        Ok(report) => RunOutcome::Finished(report),
        Err(message) => RunOutcome::Failed(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_job_yields_report() {
        let outcome = run(
            || {
                Ok(AssembledReport {
                    narrative: "body".to_string(),
                    ip_analysis: "ips".to_string(),
                })
            },
            || {},
        );
        match outcome {
            RunOutcome::Finished(report) => assert_eq!(report.full_text(), "bodyips"),
            RunOutcome::Failed(msg) => panic!("unexpected failure: {msg}"),
        }
    }

    #[test]
    fn failing_job_reports_message() {
        let outcome = run(|| Err("boom".to_string()), || {});
        match outcome {
            RunOutcome::Failed(msg) => assert_eq!(msg, "boom"),
            RunOutcome::Finished(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn slow_job_ticks_while_waiting() {
        let mut ticks = 0;
        let outcome = run(
            || {
                thread::sleep(Duration::from_millis(250));
                Ok(AssembledReport {
                    narrative: String::new(),
                    ip_analysis: String::new(),
                })
            },
            || ticks += 1,
        );
        assert!(matches!(outcome, RunOutcome::Finished(_)));
        assert!(ticks >= 1);
    }
}
