use std::future::Future;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;

/// Outcome of one poll tick, as classified by the caller.
#[derive(Debug)]
pub enum PollCheck<T> {
    InProgress,
    Done(T),
    Failed(ApiError),
}

/// Polls on a fixed interval until the classifier reports a terminal outcome
/// or the token is cancelled.
///
/// The first query happens one full period after arming. At most one query
/// is in flight at a time: the interval is not polled again until the
/// previous continuation has finished, and missed ticks are delayed rather
/// than burst. Cancellation also races the in-flight query, so a torn-down
/// watch never delivers a completion; the caller gets `None` and must not
/// fire its callback.
pub async fn run_poll_loop<T, F, Fut>(
    period: Duration,
    cancel: CancellationToken,
    mut check: F,
) -> Option<Result<T, ApiError>>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = PollCheck<T>>,
{
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // An interval yields immediately; consume that tick so the first query
    // lands one full period after arming.
    ticker.tick().await;

    let mut tick = 0u64;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = ticker.tick() => {}
        }
        tick += 1;
        client_logging::set_poll_tick(tick);
        tokio::select! {
            _ = cancel.cancelled() => return None,
            outcome = check(tick) => match outcome {
                PollCheck::InProgress => {}
                PollCheck::Done(value) => return Some(Ok(value)),
                PollCheck::Failed(err) => return Some(Err(err)),
            }
        }
    }
}
