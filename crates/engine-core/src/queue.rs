use futures::{
    StreamExt, TryStreamExt,
    future::BoxFuture,
    stream,
};
use std::future::Future;

/// Collects fallible tasks and runs them with at most `concurrency` in
/// flight.
///
/// Nothing runs until [`TaskQueue::on_idle`], which drives the queue until
/// it drains or a task fails.
pub struct TaskQueue<'a, E> {
    concurrency: usize,
    tasks: Vec<BoxFuture<'a, Result<(), E>>>,
}

impl<'a, E> TaskQueue<'a, E> {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            tasks: Vec::new(),
        }
    }

    pub fn add<F>(&mut self, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'a,
    {
        self.tasks.push(Box::pin(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub async fn on_idle(self) -> Result<(), E> {
        stream::iter(self.tasks)
            .buffer_unordered(self.concurrency)
            .try_for_each(|()| async { Ok(()) })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;

    #[tokio::test]
    async fn test_single_slot_serializes_tasks() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut queue: TaskQueue<'_, ()> = TaskQueue::new(1);

        for _ in 0..4 {
            let running = running.clone();
            let peak = peak.clone();
            queue.add(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            });
        }

        assert_eq!(queue.len(), 4);
        queue.on_idle().await.unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_failure_is_returned() {
        let mut queue = TaskQueue::new(1);
        queue.add(async { Ok(()) });
        queue.add(async { Err("missing") });
        queue.add(async { Err("never reached") });

        assert_eq!(queue.on_idle().await, Err("missing"));
    }

    #[tokio::test]
    async fn test_empty_queue_is_idle() {
        let queue: TaskQueue<'_, ()> = TaskQueue::new(1);
        assert!(queue.is_empty());
        assert_eq!(queue.on_idle().await, Ok(()));
    }
}
