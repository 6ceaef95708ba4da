//! Delivery of outbound events.
//!
//! A presenter only renders and sends. Failures are reported back to the
//! coordinator and never undo a committed transition.

use crate::errors::DeliveryError;
use crate::events::{Audience, OutboundEvent};
use std::future::Future;
use tokio::sync::mpsc;

pub trait Presenter: Send + Sync {
    fn deliver(&self, event: &OutboundEvent) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Writes each rendered event to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    async fn deliver(&self, event: &OutboundEvent) -> Result<(), DeliveryError> {
        tracing::info!(
            event = event.name(),
            audience = %event.audience(),
            text = %event.format(),
            "deliver"
        );
        Ok(())
    }
}

/// An event paired with where it should go.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub audience: Audience,
    pub event: OutboundEvent,
}

/// Forwards events to a tokio channel, for front ends running their own
/// delivery loop.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    sender: mpsc::Sender<Delivery>,
}

impl ChannelPresenter {
    pub fn new(sender: mpsc::Sender<Delivery>) -> Self {
        ChannelPresenter { sender }
    }

    /// A presenter and the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Delivery>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (ChannelPresenter::new(sender), receiver)
    }
}

impl Presenter for ChannelPresenter {
    async fn deliver(&self, event: &OutboundEvent) -> Result<(), DeliveryError> {
        let audience = event.audience();
        self.sender
            .send(Delivery {
                audience: audience.clone(),
                event: event.clone(),
            })
            .await
            .map_err(|_| DeliveryError {
                event: event.name(),
                audience: audience.to_string(),
                reason: "receiver dropped".to_string(),
            })
    }
}

/// What happened when a batch of events was delivered.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub events: Vec<OutboundEvent>,
    pub failures: Vec<DeliveryError>,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::help_entries;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_channel_presenter_forwards_events() {
        let (presenter, mut receiver) = ChannelPresenter::channel(4);
        let event = OutboundEvent::Help {
            entries: help_entries(),
        };

        presenter.deliver(&event).await.unwrap();
        let delivery = receiver.recv().await.unwrap();
        assert_eq!(delivery.audience, Audience::Channel);
        assert_eq!(delivery.event, event);
    }

    #[tokio::test]
    async fn test_closed_channel_is_a_delivery_error() {
        let (presenter, receiver) = ChannelPresenter::channel(1);
        drop(receiver);

        let err = presenter
            .deliver(&OutboundEvent::Help {
                entries: Vec::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.event, "help");
        assert_eq!(err.audience, "channel");
    }
}
