// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Manager Event Mailbox
//!
//! The single critical-section mailbox a manager's control plane uses to
//! hand endpoint membership changes and lifecycle commands (add/remove/close
//! endpoint, suspend, resume, shutdown) over to the manager's dedicated
//! thread. [`ManagerMailbox::send_and_wait`] is the blocking-event
//! handshake: the caller waits on a one-shot acknowledgement the manager
//! thread sends back once it has actually processed the event, instead of
//! firing the event and moving on.

use std::sync::Arc;
use std::time::Duration;

use async_completion_domain::value_objects::EndpointId;
use crossbeam::channel::{unbounded, Receiver, Sender};
use tokio::sync::oneshot;

use crate::infrastructure::endpoint::Endpoint;

pub enum ManagerEvent {
    AddEndpoint(Arc<Endpoint>),
    RemoveEndpoint(EndpointId),
    CloseEndpoint(EndpointId),
    Suspend,
    Resume,
    Shutdown,
}

/// One mailbox slot: the event plus the handshake the manager thread
/// acknowledges once it has processed it.
struct Envelope {
    event: ManagerEvent,
    ack: Option<oneshot::Sender<()>>,
}

/// A cloneable handle consumer threads use to submit events to a manager's
/// mailbox.
#[derive(Clone)]
pub struct ManagerMailbox {
    sender: Sender<Envelope>,
}

impl ManagerMailbox {
    /// Fire-and-forget. Used only for events no caller needs to block on
    /// (shutdown, which the caller already waits out by joining the
    /// manager's thread).
    pub fn send(&self, event: ManagerEvent) {
        let _ = self.sender.send(Envelope { event, ack: None });
    }

    /// Submits `event` and waits for the manager thread to acknowledge
    /// having processed it — the blocking-event handshake ADD/REMOVE/CLOSE
    /// endpoint and SUSPEND/RESUME use.
    pub async fn send_and_wait(&self, event: ManagerEvent) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(Envelope { event, ack: Some(ack) }).is_ok() {
            let _ = done.await;
        }
    }
}

pub struct EventMailbox {
    sender: Sender<Envelope>,
    receiver: Receiver<Envelope>,
}

impl Default for EventMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl EventMailbox {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn mailbox(&self) -> ManagerMailbox {
        ManagerMailbox { sender: self.sender.clone() }
    }

    /// Manager-thread side: pops one event, if any, along with its
    /// acknowledgement sender.
    pub fn try_recv(&self) -> Option<(ManagerEvent, Option<oneshot::Sender<()>>)> {
        self.receiver.try_recv().ok().map(|envelope| (envelope.event, envelope.ack))
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<(ManagerEvent, Option<oneshot::Sender<()>>)> {
        self.receiver.recv_timeout(timeout).ok().map(|envelope| (envelope.event, envelope.ack))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_delivered_fifo() {
        let mailbox = EventMailbox::new();
        mailbox.mailbox().send(ManagerEvent::Suspend);
        mailbox.mailbox().send(ManagerEvent::Resume);
        assert!(matches!(mailbox.try_recv(), Some((ManagerEvent::Suspend, None))));
        assert!(matches!(mailbox.try_recv(), Some((ManagerEvent::Resume, None))));
        assert!(mailbox.try_recv().is_none());
    }

    #[tokio::test]
    async fn send_and_wait_resolves_once_acknowledged() {
        let mailbox = EventMailbox::new();
        let handle = mailbox.mailbox();
        let waiter = tokio::spawn(async move { handle.send_and_wait(ManagerEvent::Suspend).await });

        let (event, ack) = loop {
            if let Some(popped) = mailbox.try_recv() {
                break popped;
            }
            tokio::task::yield_now().await;
        };
        assert!(matches!(event, ManagerEvent::Suspend));
        ack.unwrap().send(()).unwrap();

        waiter.await.unwrap();
    }
}
