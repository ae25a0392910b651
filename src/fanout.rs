//! Run one operation per host concurrently and gather every outcome.

use log::{debug, info};

use rayon::prelude::*;

use crate::error::RunnerError;

/// Anything that is addressed to a single host.
pub trait Target {
    fn host(&self) -> &str;
}

impl Target for String {
    fn host(&self) -> &str {
        self
    }
}

/// The outcome of one task of a batch.
#[derive(Debug)]
pub struct TaskOutcome {
    pub host: String,
    pub result: Result<(), failure::Error>,
}

/// The outcomes of a whole batch, in the order the tasks were given.
#[derive(Debug)]
pub struct Outcomes(pub Vec<TaskOutcome>);

impl Outcomes {
    pub fn failures(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.0.iter().filter(|o| o.result.is_err())
    }

    pub fn all_ok(&self) -> bool {
        self.failures().next().is_none()
    }

    /// The failure of the earliest task (in task order, not completion order), if any.
    pub fn first_failure(&self) -> Option<&TaskOutcome> {
        self.failures().next()
    }

    /// `Ok` if every task succeeded. Otherwise, a `RunnerError::FanOut` that names every host
    /// that failed and why.
    pub fn into_result(self) -> Result<(), failure::Error> {
        let total = self.0.len();
        let details: Vec<String> = self
            .0
            .into_iter()
            .filter_map(|o| match o.result {
                Ok(()) => None,
                Err(err) => Some(format!("{}: {}", o.host, err)),
            })
            .collect();

        if details.is_empty() {
            Ok(())
        } else {
            Err(RunnerError::FanOut {
                failed: details.len(),
                total,
                details: details.join("\n"),
            }
            .into())
        }
    }
}

/// Run `op` on every task concurrently and wait for all of them.
///
/// The tasks run on a dedicated pool of `jobs` threads, or one thread per task if `jobs` is
/// `None`. Tasks block on the network for minutes at a time, so the CPU count is no guide. No task is cancelled when another fails; the caller decides what to do
/// with the returned outcomes.
pub fn fan_out<T, F>(
    jobs: Option<usize>,
    what: &str,
    tasks: &[T],
    op: F,
) -> Result<Outcomes, failure::Error>
where
    T: Target + Sync,
    F: Fn(&T) -> Result<(), failure::Error> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.unwrap_or_else(|| tasks.len().max(1)))
        .build()?;

    info!("{}: {} tasks", what, tasks.len());

    let outcomes = pool.install(|| {
        tasks
            .par_iter()
            .map(|task| {
                debug!("{}: starting on {}", what, task.host());
                let result = op(task);
                debug!("{}: done on {} (ok = {})", what, task.host(), result.is_ok());
                TaskOutcome {
                    host: task.host().to_owned(),
                    result,
                }
            })
            .collect()
    });

    Ok(Outcomes(outcomes))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn hosts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("h{}", i)).collect()
    }

    #[test]
    fn every_task_runs_once() {
        let count = AtomicUsize::new(0);
        let tasks = hosts(10);

        let outcomes = fan_out(Some(3), "test", &tasks, |_| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 10);
        assert!(outcomes.all_ok());
        let order: Vec<_> = outcomes.0.iter().map(|o| o.host.clone()).collect();
        assert_eq!(order, tasks);
        assert!(outcomes.into_result().is_ok());
    }

    #[test]
    fn failures_do_not_cancel_other_tasks() {
        let count = AtomicUsize::new(0);
        let tasks = hosts(6);

        let outcomes = fan_out(None, "test", &tasks, |host| {
            count.fetch_add(1, Ordering::SeqCst);
            if host == "h2" || host == "h4" {
                failure::bail!("boom on {}", host);
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 6);
        assert_eq!(outcomes.failures().count(), 2);
        assert_eq!(outcomes.first_failure().unwrap().host, "h2");

        let err = outcomes.into_result().unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("2 of 6 remote tasks failed"));
        assert!(msg.contains("h2: boom on h2"));
        assert!(msg.contains("h4: boom on h4"));
    }

    #[test]
    fn default_pool_runs_every_task_at_once() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let tasks = hosts(8);

        let start = std::time::Instant::now();
        let outcomes = fan_out(None, "test", &tasks, |_| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(200));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        assert!(outcomes.all_ok());
        assert_eq!(peak.load(Ordering::SeqCst), 8);
        assert!(start.elapsed() < std::time::Duration::from_millis(1200));
    }

    #[test]
    fn jobs_bounds_the_pool() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let tasks = hosts(6);

        fan_out(Some(2), "test", &tasks, |_| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn empty_batch_is_ok() {
        let tasks: Vec<String> = vec![];
        let outcomes = fan_out(None, "test", &tasks, |_| Ok(())).unwrap();
        assert!(outcomes.0.is_empty());
        assert!(outcomes.into_result().is_ok());
    }
}
