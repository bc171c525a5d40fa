use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures_util::{stream::BoxStream, Stream, StreamExt};
use tokio::{
    sync::mpsc::{self, error::TrySendError, Receiver, Sender},
    task::JoinHandle,
};

use crate::dbus::{IM_LIST_PROPERTY, INTERFACE_NAME};

/// Events a subscription holds before the relay starts dropping them.
pub const EVENT_BUFFER: usize = 16;

/// One group of property names delivered by a single notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertiesBatch {
    /// Properties which have new values.
    Changed(Vec<String>),
    /// Properties whose cached values are stale.
    Invalidated(Vec<String>),
}

impl PropertiesBatch {
    /// Splits a `PropertiesChanged` signal into its changed and invalidated halves. Signals of other
    /// interfaces and empty halves yield nothing.
    pub fn from_signal<C, I>(interface_name: &str, changed: C, invalidated: I) -> Vec<Self>
    where
        C: IntoIterator<Item = String>,
        I: IntoIterator<Item = String>,
    {
        if interface_name != INTERFACE_NAME {
            return vec![];
        }
        let changed: Vec<_> = changed.into_iter().collect();
        let invalidated: Vec<_> = invalidated.into_iter().collect();
        let mut batches = Vec::with_capacity(2);
        if !changed.is_empty() {
            batches.push(Self::Changed(changed));
        }
        if !invalidated.is_empty() {
            batches.push(Self::Invalidated(invalidated));
        }
        batches
    }

    pub fn names(&self) -> &[String] {
        match self {
            Self::Changed(names) | Self::Invalidated(names) => names,
        }
    }

    pub fn mentions_im_list(&self) -> bool {
        self.names().iter().any(|name| name == IM_LIST_PROPERTY)
    }
}

/// The input method list of the daemon has changed, fetch it again to see the new value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImListChanged;

/// Forwards one [`ImListChanged`] for each batch mentioning IMList. Returns when the batches end
/// or nobody is listening anymore.
///
/// Never waits on a slow receiver: an event is dropped if `tx` is full, the pending ones already
/// tell the receiver to fetch the list again.
pub async fn relay<S>(mut batches: S, tx: Sender<ImListChanged>)
where
    S: Stream<Item = PropertiesBatch> + Unpin,
{
    while let Some(batch) = batches.next().await {
        tracing::trace!("properties batch: {:?}", batch);
        if !batch.mentions_im_list() {
            continue;
        }
        match tx.try_send(ImListChanged) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::debug!("subscription of IMList changes is full, event is dropped");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("subscription of IMList changes is dropped");
                break;
            }
        }
    }
}

/// Receiving end of the relay task. Dropping it stops the task.
#[derive(Debug)]
pub struct ImListChangedSubscription {
    rx: Receiver<ImListChanged>,
    handle: JoinHandle<()>,
}

impl ImListChangedSubscription {
    /// Should be called inside tokio runtime
    pub fn spawn(batches: BoxStream<'static, PropertiesBatch>) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let handle = tokio::spawn(relay(batches, tx));
        Self { rx, handle }
    }

    /// Waits for the next change. `None` means the notification stream is closed.
    pub async fn recv(&mut self) -> Option<ImListChanged> {
        self.rx.recv().await
    }

    pub fn cancel(self) {
        drop(self)
    }
}

impl Stream for ImListChangedSubscription {
    type Item = ImListChanged;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ImListChangedSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::stream;

    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    async fn count_events(batches: Vec<PropertiesBatch>) -> usize {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        relay(stream::iter(batches), tx).await;
        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        count
    }

    #[test]
    fn test_from_signal_splits_halves() {
        let batches = PropertiesBatch::from_signal(
            INTERFACE_NAME,
            names(&["IMList", "Other"]),
            names(&["IMList"]),
        );
        assert_eq!(
            batches,
            vec![
                PropertiesBatch::Changed(names(&["IMList", "Other"])),
                PropertiesBatch::Invalidated(names(&["IMList"])),
            ]
        );
    }

    #[test]
    fn test_from_signal_skips_empty_halves() {
        let batches = PropertiesBatch::from_signal(INTERFACE_NAME, vec![], names(&["IMList"]));
        assert_eq!(batches, vec![PropertiesBatch::Invalidated(names(&["IMList"]))]);
        assert!(PropertiesBatch::from_signal(INTERFACE_NAME, vec![], vec![]).is_empty());
    }

    #[test]
    fn test_from_signal_ignores_other_interfaces() {
        let batches = PropertiesBatch::from_signal(
            "org.fcitx.Fcitx.InputContext",
            names(&["IMList"]),
            names(&["IMList"]),
        );
        assert!(batches.is_empty());
    }

    #[tokio::test]
    async fn test_one_event_per_changed_batch() {
        let count = count_events(vec![PropertiesBatch::Changed(names(&[
            "Foo", "IMList", "Bar",
        ]))])
        .await;
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_no_event_for_other_properties() {
        let count = count_events(vec![
            PropertiesBatch::Changed(names(&["Foo", "Bar"])),
            PropertiesBatch::Invalidated(names(&["Foo"])),
        ])
        .await;
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_one_event_per_invalidated_batch() {
        let count = count_events(vec![PropertiesBatch::Invalidated(names(&[
            "A", "B", "IMList", "C",
        ]))])
        .await;
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_batches_are_not_coalesced() {
        let count = count_events(vec![
            PropertiesBatch::Changed(names(&["IMList"])),
            PropertiesBatch::Changed(names(&["Other"])),
            PropertiesBatch::Changed(names(&["IMList"])),
            PropertiesBatch::Invalidated(names(&["IMList"])),
        ])
        .await;
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_unread_events_are_bounded() {
        let (tx, mut rx) = mpsc::channel(1);
        let batches = (0..3).map(|_| PropertiesBatch::Changed(names(&["IMList"])));
        tokio::time::timeout(Duration::from_secs(5), relay(stream::iter(batches), tx))
            .await
            .expect("relay waits on the receiver");
        assert_eq!(rx.recv().await, Some(ImListChanged));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_subscription_ends_with_stream() {
        let batches = stream::iter(vec![
            PropertiesBatch::Changed(names(&["IMList"])),
            PropertiesBatch::Invalidated(names(&["Other"])),
        ])
        .boxed();
        let mut subscription = ImListChangedSubscription::spawn(batches);
        assert_eq!(subscription.recv().await, Some(ImListChanged));
        assert_eq!(subscription.recv().await, None);
    }

    #[tokio::test]
    async fn test_cancel_stops_relay() {
        let (batch_tx, batch_rx) = mpsc::unbounded_channel::<PropertiesBatch>();
        let batches = stream::unfold(batch_rx, |mut rx| async move {
            rx.recv().await.map(|batch| (batch, rx))
        })
        .boxed();
        let subscription = ImListChangedSubscription::spawn(batches);
        subscription.cancel();
        tokio::time::timeout(Duration::from_secs(5), batch_tx.closed())
            .await
            .expect("relay task is not stopped");
    }
}
