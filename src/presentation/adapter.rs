use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::domain::FeedImage;
use crate::loader::{FeedLoader, ImageDataLoader};
use crate::presentation::scheduler::Scheduler;

pub type LoadFuture<R> = Pin<Box<dyn Future<Output = anyhow::Result<R>> + Send>>;

/// Presentation sink driven by a [`ResourceLoadAdapter`].
pub trait ResourceView: Send + Sync {
    type Resource: Send + 'static;

    fn display_start(&self);
    fn display_success(&self, resource: Self::Resource);
    fn display_failure(&self, error: String);
}

struct Flight {
    generation: u64,
    current: Option<CancellationToken>,
}

/// Single-flight bridge from a cold asynchronous producer to a view.
///
/// `start()` notifies the view immediately and runs the producer once,
/// superseding (and cancelling) any load still in flight on this adapter:
/// at most one outstanding load is ever honored, and a superseded load's
/// late completion is ignored. `cancel()` is idempotent and guarantees no
/// view call lands afterwards. Completions reach the view through the
/// scheduler's "inline when already on the designated context, else
/// enqueue" rule.
///
/// `start()` must be called from within a tokio runtime.
pub struct ResourceLoadAdapter<V: ResourceView> {
    producer: Box<dyn Fn() -> LoadFuture<V::Resource> + Send + Sync>,
    view: Arc<V>,
    scheduler: Arc<dyn Scheduler>,
    flight: Arc<Mutex<Flight>>,
}

fn lock(flight: &Mutex<Flight>) -> MutexGuard<'_, Flight> {
    flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<V> ResourceLoadAdapter<V>
where
    V: ResourceView + 'static,
{
    pub fn new(
        producer: impl Fn() -> LoadFuture<V::Resource> + Send + Sync + 'static,
        view: Arc<V>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            producer: Box::new(producer),
            view,
            scheduler,
            flight: Arc::new(Mutex::new(Flight {
                generation: 0,
                current: None,
            })),
        }
    }

    pub fn start(&self) {
        let future = (self.producer)();
        let token = CancellationToken::new();
        let generation = {
            let mut flight = lock(&self.flight);
            if let Some(previous) = flight.current.take() {
                previous.cancel();
            }
            flight.generation += 1;
            flight.current = Some(token.clone());
            flight.generation
        };

        self.view.display_start();

        let view = Arc::clone(&self.view);
        let scheduler = Arc::clone(&self.scheduler);
        let flight = Arc::clone(&self.flight);
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = future => result,
            };

            {
                let flight = lock(&flight);
                if flight.generation != generation || token.is_cancelled() {
                    return;
                }
            }

            // The token is checked again inside the job, under the flight
            // lock. `cancel()` takes the same lock, so it either lands
            // before this check or blocks until the view call has returned;
            // a cancel that lands while the job sits in the scheduler queue
            // still suppresses delivery.
            match result {
                Ok(resource) => {
                    scheduler.dispatch(Box::new(move || {
                        let _guard = lock(&flight);
                        if token.is_cancelled() {
                            return;
                        }
                        view.display_success(resource);
                    }));
                }
                Err(error) => {
                    let message = error.to_string();
                    scheduler.dispatch(Box::new(move || {
                        let _guard = lock(&flight);
                        if token.is_cancelled() {
                            return;
                        }
                        view.display_failure(message);
                    }));
                }
            }
        });
    }

    /// Cancels and discards the in-flight load, if any. Safe to call
    /// repeatedly; no view call is made after this returns. Holds the same
    /// lock delivery runs under, so a delivery racing this call either sees
    /// the cancelled token or finishes before this returns.
    pub fn cancel(&self) {
        let mut flight = lock(&self.flight);
        if let Some(token) = flight.current.take() {
            token.cancel();
        }
    }
}

impl<V> ResourceLoadAdapter<V>
where
    V: ResourceView<Resource = Vec<FeedImage>> + 'static,
{
    pub fn for_feed<L>(loader: Arc<L>, view: Arc<V>, scheduler: Arc<dyn Scheduler>) -> Self
    where
        L: FeedLoader + 'static,
    {
        Self::new(
            move || {
                let loader = Arc::clone(&loader);
                Box::pin(async move { loader.load_feed().await.map_err(anyhow::Error::new) })
            },
            view,
            scheduler,
        )
    }
}

impl<V> ResourceLoadAdapter<V>
where
    V: ResourceView<Resource = Bytes> + 'static,
{
    /// Adapter for one image slot: the URL is fixed at construction, each
    /// `start()` loads it again.
    pub fn for_image_data<L>(
        loader: Arc<L>,
        url: Url,
        view: Arc<V>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self
    where
        L: ImageDataLoader + 'static,
    {
        Self::new(
            move || {
                let loader = Arc::clone(&loader);
                let url = url.clone();
                Box::pin(async move {
                    loader
                        .load_image_data(&url)
                        .await
                        .map_err(anyhow::Error::new)
                })
            },
            view,
            scheduler,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use anyhow::anyhow;
    use tokio::sync::oneshot;
    use uuid::Uuid;

    use super::*;
    use crate::presentation::scheduler::InlineScheduler;

    #[derive(Debug, PartialEq)]
    enum Event {
        Start,
        Success(Vec<FeedImage>),
        Failure(String),
    }

    #[derive(Default)]
    struct ViewSpy {
        events: Mutex<Vec<Event>>,
    }

    impl ViewSpy {
        fn events(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl ResourceView for ViewSpy {
        type Resource = Vec<FeedImage>;

        fn display_start(&self) {
            self.events.lock().unwrap().push(Event::Start);
        }

        fn display_success(&self, resource: Vec<FeedImage>) {
            self.events.lock().unwrap().push(Event::Success(resource));
        }

        fn display_failure(&self, error: String) {
            self.events.lock().unwrap().push(Event::Failure(error));
        }
    }

    type Load = oneshot::Receiver<anyhow::Result<Vec<FeedImage>>>;

    fn make_adapter_with(
        loads: Vec<Load>,
        scheduler: Arc<dyn Scheduler>,
    ) -> (ResourceLoadAdapter<ViewSpy>, Arc<ViewSpy>) {
        let view = Arc::new(ViewSpy::default());
        let queue = Mutex::new(VecDeque::from(loads));
        let adapter = ResourceLoadAdapter::new(
            move || {
                let load = queue
                    .lock()
                    .unwrap()
                    .pop_front()
                    .expect("no queued load left");
                Box::pin(async move { load.await.expect("load sender dropped") }) as LoadFuture<_>
            },
            Arc::clone(&view),
            scheduler,
        );
        (adapter, view)
    }

    fn make_adapter(loads: Vec<Load>) -> (ResourceLoadAdapter<ViewSpy>, Arc<ViewSpy>) {
        make_adapter_with(loads, Arc::new(InlineScheduler))
    }

    /// Holds dispatched jobs until the test releases them, standing in for a
    /// busy designated thread.
    #[derive(Default)]
    struct HeldJobsScheduler {
        jobs: Mutex<Vec<crate::presentation::scheduler::Job>>,
    }

    impl HeldJobsScheduler {
        fn drain(&self) {
            for job in std::mem::take(&mut *self.jobs.lock().unwrap()) {
                job();
            }
        }
    }

    impl Scheduler for HeldJobsScheduler {
        fn dispatch(&self, job: crate::presentation::scheduler::Job) {
            self.jobs.lock().unwrap().push(job);
        }
    }

    fn unique_feed() -> Vec<FeedImage> {
        vec![FeedImage::new(
            Uuid::new_v4(),
            Url::parse("https://example.com/1.png").unwrap(),
        )]
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn start_notifies_the_view_immediately() {
        let (_tx, rx) = oneshot::channel();
        let (adapter, view) = make_adapter(vec![rx]);

        adapter.start();

        assert_eq!(view.events(), vec![Event::Start]);
    }

    #[tokio::test]
    async fn success_reaches_the_view() {
        let (tx, rx) = oneshot::channel();
        let (adapter, view) = make_adapter(vec![rx]);
        let feed = unique_feed();

        adapter.start();
        tx.send(Ok(feed.clone())).unwrap();
        settle().await;

        assert_eq!(view.events(), vec![Event::Start, Event::Success(feed)]);
    }

    #[tokio::test]
    async fn failure_reaches_the_view_as_a_stable_message() {
        let (tx, rx) = oneshot::channel();
        let (adapter, view) = make_adapter(vec![rx]);

        adapter.start();
        tx.send(Err(anyhow!("load failed"))).unwrap();
        settle().await;

        assert_eq!(
            view.events(),
            vec![Event::Start, Event::Failure("load failed".into())]
        );
    }

    #[tokio::test]
    async fn second_start_supersedes_the_first() {
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        let (adapter, view) = make_adapter(vec![rx1, rx2]);
        let superseding = unique_feed();

        adapter.start();
        adapter.start();

        // The first load's late completion must produce no display call; its
        // receiver may already be gone, so the send result is irrelevant.
        let _ = tx1.send(Ok(unique_feed()));
        settle().await;
        assert_eq!(view.events(), vec![Event::Start, Event::Start]);

        tx2.send(Ok(superseding.clone())).unwrap();
        settle().await;
        assert_eq!(view.events(), vec![Event::Success(superseding)]);
    }

    #[tokio::test]
    async fn cancel_suppresses_any_later_completion() {
        let (tx, rx) = oneshot::channel();
        let (adapter, view) = make_adapter(vec![rx]);

        adapter.start();
        adapter.cancel();
        let _ = tx.send(Ok(unique_feed()));
        settle().await;

        assert_eq!(view.events(), vec![Event::Start]);
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_safe_when_idle() {
        let (_tx, rx) = oneshot::channel();
        let (adapter, view) = make_adapter(vec![rx]);

        adapter.cancel();
        adapter.start();
        adapter.cancel();
        adapter.cancel();
        settle().await;

        assert_eq!(view.events(), vec![Event::Start]);
    }

    #[tokio::test]
    async fn cancel_suppresses_a_delivery_already_waiting_on_the_scheduler() {
        let (tx, rx) = oneshot::channel();
        let scheduler = Arc::new(HeldJobsScheduler::default());
        let (adapter, view) =
            make_adapter_with(vec![rx], Arc::clone(&scheduler) as Arc<dyn Scheduler>);

        adapter.start();
        tx.send(Ok(unique_feed())).unwrap();
        settle().await;

        // The completion job is now parked in the scheduler queue. Cancel
        // has returned by the time the queue drains, so the view must stay
        // untouched.
        adapter.cancel();
        scheduler.drain();

        assert_eq!(view.events(), vec![Event::Start]);
    }

    #[tokio::test]
    async fn cancel_discards_the_in_flight_handle() {
        let (_tx, rx) = oneshot::channel();
        let (adapter, _view) = make_adapter(vec![rx]);

        adapter.start();
        assert!(lock(&adapter.flight).current.is_some());

        adapter.cancel();
        assert!(lock(&adapter.flight).current.is_none());
    }

    #[tokio::test]
    async fn restart_after_cancel_still_delivers() {
        let (_tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        let (adapter, view) = make_adapter(vec![rx1, rx2]);
        let feed = unique_feed();

        adapter.start();
        adapter.cancel();
        adapter.start();
        tx2.send(Ok(feed.clone())).unwrap();
        settle().await;

        assert_eq!(
            view.events(),
            vec![Event::Start, Event::Start, Event::Success(feed)]
        );
    }
}
