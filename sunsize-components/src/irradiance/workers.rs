use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    time::Duration,
};

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use super::{IrradianceSource, SolarResource, SourceError};

/// Why a fetch produced no answer.
#[derive(Debug)]
pub(super) enum FetchFailure {
    /// Every worker is busy with an earlier request.
    Busy,
    TimedOut,
    Source(SourceError),
}

/// A fixed set of threads that call an [`IrradianceSource`].
///
/// At most `workers` fetches are in flight at once, counting fetches whose
/// callers already gave up. A source that never answers therefore holds at
/// most `workers` threads and later fetches fail fast with
/// [`FetchFailure::Busy`].
pub(super) struct SourceWorkers {
    source: Arc<dyn IrradianceSource>,
    pool: ThreadPool,
    workers: usize,
    in_flight: Arc<AtomicUsize>,
}

impl SourceWorkers {
    pub(super) fn new(
        source: Arc<dyn IrradianceSource>,
        workers: usize,
    ) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("irradiance-source-{i}"))
            .build()?;
        Ok(Self {
            source,
            pool,
            workers,
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(super) fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        timeout: Duration,
    ) -> Result<Option<SolarResource>, FetchFailure> {
        let reserved = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.workers).then_some(n + 1)
            });
        if reserved.is_err() {
            return Err(FetchFailure::Busy);
        }

        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let in_flight = Arc::clone(&self.in_flight);
        self.pool.spawn(move || {
            let answer = source.fetch(latitude, longitude);
            in_flight.fetch_sub(1, Ordering::SeqCst);
            // The receiver is gone if the caller already timed out.
            let _ = tx.send(answer);
        });

        match rx.recv_timeout(timeout) {
            Ok(answer) => answer.map_err(FetchFailure::Source),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(FetchFailure::TimedOut),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(FetchFailure::Source(
                SourceError::Unavailable("worker exited without answering".into()),
            )),
        }
    }
}
