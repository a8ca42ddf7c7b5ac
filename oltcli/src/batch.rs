//! Bounded-concurrency batches of facade calls.
//!
//! Each unit of a batch is spawned as its own task and normally opens its
//! own session. A semaphore caps how many run at once. Every unit is
//! joined, whatever happens to the others, and its outcome is recorded in
//! a [`BatchReport`].

use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use log::{debug, warn};
use tokio::sync::Semaphore;

use crate::error::{DeviceError, Error, Result};

/// Units allowed to run at the same time unless configured otherwise.
pub const DEFAULT_LIMIT: usize = 5;

/// Runs one async closure over many inputs with bounded concurrency.
///
/// ```
/// use oltcli::batch::TaskGroup;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let report = TaskGroup::new(2)
///     .run(vec![1u32, 2, 3], |n| async move { Ok(n * 10) })
///     .await;
/// assert_eq!(report.into_result().unwrap(), vec![10, 20, 30]);
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TaskGroup {
    limit: usize,
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl TaskGroup {
    /// A group running at most `limit` units at once (at least one).
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `unit` once per item and wait for all of them.
    pub async fn run<T, R, F, Fut>(&self, items: impl IntoIterator<Item = T>, unit: F) -> BatchReport<R>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R>> + Send + 'static,
        R: Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let tasks: Vec<_> = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let semaphore = Arc::clone(&semaphore);
                let work = unit(item);
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.map_err(|e| {
                        Error::from(DeviceError::TaskAborted {
                            unit: index,
                            reason: e.to_string(),
                        })
                    })?;
                    work.await
                })
            })
            .collect();
        debug!("batch of {} units, limit {}", tasks.len(), self.limit);

        let outcomes = join_all(tasks)
            .await
            .into_iter()
            .enumerate()
            .map(|(unit, joined)| match joined {
                Ok(result) => result,
                Err(e) => Err(DeviceError::TaskAborted {
                    unit,
                    reason: e.to_string(),
                }
                .into()),
            })
            .collect();
        BatchReport { outcomes }
    }
}

/// Per-unit outcomes of a batch, in input order.
#[derive(Debug)]
pub struct BatchReport<R> {
    outcomes: Vec<Result<R>>,
}

impl<R> BatchReport<R> {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcomes(&self) -> &[Result<R>] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Failed units with their input position.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &Error)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.as_ref().err().map(|e| (i, e)))
    }

    /// All results, or the first failure after logging every one.
    pub fn into_result(self) -> Result<Vec<R>> {
        let total = self.outcomes.len();
        let mut values = Vec::with_capacity(total);
        let mut first = None;
        for (unit, outcome) in self.outcomes.into_iter().enumerate() {
            match outcome {
                Ok(v) => values.push(v),
                Err(e) => {
                    warn!("batch unit {} of {} failed: {}", unit, total, e);
                    first.get_or_insert(e);
                }
            }
        }
        match first {
            Some(e) => Err(e),
            None => Ok(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_limit_is_respected() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let report = TaskGroup::new(2)
            .run(0..6, |_| {
                let running = running.clone();
                let peak = peak.clone();
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;
        assert_eq!(report.succeeded(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_every_unit_runs_despite_failures() {
        let ran = Arc::new(AtomicUsize::new(0));
        let report = TaskGroup::default()
            .run(0..4, |n| {
                let ran = ran.clone();
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                    if n % 2 == 0 {
                        Err(Error::not_found(format!("unit {}", n)))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(ran.load(Ordering::SeqCst), 4);
        assert_eq!(report.len(), 4);
        let failed: Vec<usize> = report.failures().map(|(i, _)| i).collect();
        assert_eq!(failed, [0, 2]);
        assert_eq!(report.into_result().unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_panic_is_reported() {
        let report = TaskGroup::default()
            .run([false, true], |boom| async move {
                if boom {
                    panic!("unit blew up");
                }
                Ok(())
            })
            .await;
        assert_eq!(report.succeeded(), 1);
        let (unit, err) = report.failures().next().unwrap();
        assert_eq!(unit, 1);
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = TaskGroup::new(0).run(Vec::<u32>::new(), |n| async move { Ok(n) }).await;
        assert!(report.is_empty());
        assert!(report.into_result().unwrap().is_empty());
    }
}
