//! Polling helpers for state that converges after a command.
//!
//! Both helpers poll an async probe at a fixed interval and give up with
//! [`DeviceError::Timeout`] once the overall budget is spent. Probe errors
//! end the wait immediately.

use std::future::Future;
use std::time::Duration;

use log::{debug, info};
use tokio::time::{sleep, Instant};

use crate::error::{DeviceError, Result};

/// Poll `condition` until it returns `true`.
///
/// The condition is checked once before the first sleep.
///
/// ```
/// use std::time::Duration;
/// use oltcli::wait::wait_for_true;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), oltcli::Error> {
/// let mut polls = 0;
/// wait_for_true(Duration::from_millis(1), Duration::from_secs(1), || {
///     polls += 1;
///     let done = polls == 3;
///     async move { Ok(done) }
/// })
/// .await?;
/// assert_eq!(polls, 3);
/// # Ok(())
/// # }
/// ```
pub async fn wait_for_true<F, Fut>(interval: Duration, overall: Duration, mut condition: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    loop {
        if condition().await? {
            info!("condition met after {:.1?}", start.elapsed());
            return Ok(());
        }
        let waited = start.elapsed();
        if waited >= overall {
            return Err(DeviceError::Timeout { waited }.into());
        }
        debug!("waited {:.1?}, retrying in {:?}", waited, interval);
        sleep(interval.min(overall - waited)).await;
    }
}

/// Poll `probe` until two consecutive readings are equal, and return that
/// reading.
pub async fn wait_until_stable<F, Fut, T>(interval: Duration, overall: Duration, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    T: PartialEq,
{
    let start = Instant::now();
    let mut last = probe().await?;
    loop {
        sleep(interval).await;
        let current = probe().await?;
        if current == last {
            info!("reading stable after {:.1?}", start.elapsed());
            return Ok(current);
        }
        let waited = start.elapsed();
        if waited >= overall {
            return Err(DeviceError::Timeout { waited }.into());
        }
        last = current;
    }
}
