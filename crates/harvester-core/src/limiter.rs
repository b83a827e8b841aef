use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::{Fuse, FusedStream, FuturesUnordered};
use futures::{Future, Stream, StreamExt};
use pin_project_lite::pin_project;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio::time::{interval, sleep, Instant, MissedTickBehavior, Sleep};

const RETRY_MS: u64 = 50;

/// Hands out `per_second` permits, refilled once a second.
///
/// The refill task ends when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    permits: Arc<Semaphore>,
}

impl RateLimiter {
    pub fn new(per_second: usize) -> Self {
        let permits = Arc::new(Semaphore::new(per_second));

        let weak = Arc::downgrade(&permits);
        tokio::spawn(async move {
            let mut ticks = interval(Duration::from_secs(1));
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticks.tick().await;
            loop {
                ticks.tick().await;
                let Some(permits) = weak.upgrade() else {
                    break;
                };
                let available = permits.available_permits();
                permits.add_permits(per_second.saturating_sub(available));
            }
        });

        Self { permits }
    }

    pub fn try_acquire_owned(&self) -> Result<OwnedSemaphorePermit, TryAcquireError> {
        self.permits.clone().try_acquire_owned()
    }
}

pin_project! {
    pub struct PermittedFuture<F> {
        #[pin]
        fut: F,
        permit: Option<OwnedSemaphorePermit>,
    }

    impl<F> PinnedDrop for PermittedFuture<F> {
        fn drop(this: Pin<&mut Self>) {
            // Spent permits only come back with the next refill
            let this = this.project();
            if let Some(p) = this.permit.take() { p.forget() }
        }
    }
}

impl<F> Future for PermittedFuture<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let this = self.project();
        this.fut.poll(cx)
    }
}

pin_project! {
    pub struct RateLimited<St>
    where
        St: Stream,
    {
        #[pin]
        stream: Fuse<St>,
        in_progress_queue: FuturesUnordered<PermittedFuture<St::Item>>,
        limiter: RateLimiter,
        #[pin]
        retry: Sleep,
    }
}

impl<St> fmt::Debug for RateLimited<St>
where
    St: Stream + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimited")
            .field("stream", &self.stream)
            .field("in_progress_queue", &self.in_progress_queue.len())
            .field("limiter", &self.limiter)
            .finish()
    }
}

impl<St> RateLimited<St>
where
    St: Stream,
    St::Item: Future,
{
    pub fn new(stream: St, limiter: RateLimiter) -> Self {
        Self {
            stream: stream.fuse(),
            in_progress_queue: FuturesUnordered::new(),
            limiter,
            retry: sleep(Duration::ZERO),
        }
    }
}

impl<St> Stream for RateLimited<St>
where
    St: Stream,
    St::Item: Future,
{
    type Item = <St::Item as Future>::Output;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        // Start as many futures as there are permits
        let mut out_of_permits = false;
        while !this.stream.is_done() {
            match this.limiter.try_acquire_owned() {
                Ok(permit) => match this.stream.as_mut().poll_next(cx) {
                    Poll::Ready(Some(fut)) => this.in_progress_queue.push(PermittedFuture {
                        permit: Some(permit),
                        fut,
                    }),
                    Poll::Ready(None) | Poll::Pending => break,
                },
                Err(_) => {
                    out_of_permits = true;
                    break;
                }
            }
        }

        match this.in_progress_queue.poll_next_unpin(cx) {
            x @ Poll::Ready(Some(_)) => return x,
            Poll::Pending => {}
            Poll::Ready(None) => {
                if this.stream.is_done() {
                    return Poll::Ready(None);
                }
            }
        }

        // Permits come back without waking us, poll again after a while
        if out_of_permits && this.retry.as_mut().poll(cx).is_ready() {
            this.retry
                .as_mut()
                .reset(Instant::now() + Duration::from_millis(RETRY_MS));
            let _ = this.retry.as_mut().poll(cx);
        }

        Poll::Pending
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let queue_len = self.in_progress_queue.len();
        let (lower, upper) = self.stream.size_hint();
        let lower = lower.saturating_add(queue_len);
        let upper = match upper {
            Some(x) => x.checked_add(queue_len),
            None => None,
        };
        (lower, upper)
    }
}

impl<St> FusedStream for RateLimited<St>
where
    St: Stream,
    St::Item: Future,
{
    fn is_terminated(&self) -> bool {
        self.in_progress_queue.is_terminated() && self.stream.is_terminated()
    }
}

pub trait RateLimitedExt: Stream {
    fn rate_limited(self, limiter: RateLimiter) -> RateLimited<Self>
    where
        Self::Item: Future,
        Self: Sized,
    {
        RateLimited::new(self, limiter)
    }
}

impl<T: ?Sized> RateLimitedExt for T where T: Stream {}
