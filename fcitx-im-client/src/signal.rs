use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use anyhow::Result;
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Resolves to the kind of the first signal received.
pub struct Signals(Vec<(SignalKind, Signal)>);

impl Signals {
    /// Should be called inside tokio runtime
    pub fn try_new(signal_kinds: &[SignalKind]) -> Result<Self> {
        let signals = signal_kinds
            .iter()
            .map(|kind| Ok((*kind, signal(*kind)?)))
            .collect::<Result<_>>()?;
        Ok(Self(signals))
    }

    /// SIGINT, SIGTERM, SIGHUP and SIGQUIT.
    pub fn try_default() -> Result<Self> {
        Self::try_new(&[
            SignalKind::interrupt(),
            SignalKind::terminate(),
            SignalKind::hangup(),
            SignalKind::quit(),
        ])
    }
}

impl Future for Signals {
    type Output = SignalKind;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        for (kind, signal) in self.0.iter_mut() {
            if signal.poll_recv(cx).is_ready() {
                return Poll::Ready(*kind);
            }
        }
        Poll::Pending
    }
}
