//! Per-user push notifications.
//!
//! [`Listener`] holds at most one live subscription, keyed by the identity
//! of the current session. Switching identity tears the old subscription
//! down before the new one is opened.

use std::mem;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;

use crate::entities::UserId;

mod alert;
mod socket;

pub use alert::{Alert, AlertError, TerminalBell};
pub use socket::{decode_packet, Packet, SocketIoChannel};

#[derive(Error, Debug)]
pub enum PushError {
    #[error("cannot connect push channel: {0}")]
    Connect(String),

    #[error("push protocol error: {0}")]
    Protocol(String),
}

/// One inbound event on a subscribed channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub channel: String,
    pub payload: serde_json::Value,
}

/// Name of the channel carrying notifications for `user`.
pub fn channel_for(user: &UserId) -> String { format!("notification:{}", user) }

/// Opaque publish/subscribe transport.
#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn subscribe(&self, channel: &str) -> Result<Subscription, PushError>;
}

/// Live subscription. Dropping it releases the underlying connection.
pub struct Subscription {
    events: UnboundedReceiver<Event>,
    connection: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(events: UnboundedReceiver<Event>, connection: JoinHandle<()>) -> Self {
        Self {
            events,
            connection: Some(connection),
        }
    }

    /// A subscription whose events are fed by the caller.
    pub fn detached(events: UnboundedReceiver<Event>) -> Self {
        Self {
            events,
            connection: None,
        }
    }

    pub async fn next(&mut self) -> Option<Event> { self.events.recv().await }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(c) = self.connection.take() {
            c.abort();
        }
    }
}

/// Channel for sessions without a push server. Its subscriptions stay open
/// and never deliver.
#[derive(Debug, Default)]
pub struct NoPush;

#[async_trait]
impl PushChannel for NoPush {
    async fn subscribe(&self, _: &str) -> Result<Subscription, PushError> {
        let (tx, rx) = unbounded_channel::<Event>();
        let idle = tokio::spawn(async move {
            let _tx = tx;
            ::std::future::pending::<()>().await
        });

        Ok(Subscription::new(rx, idle))
    }
}

enum State {
    Inactive,
    Subscribed { user: UserId, pump: JoinHandle<()> },
}

pub struct Listener {
    channel: Arc<dyn PushChannel>,
    alert: Arc<dyn Alert>,
    state: State,
}

impl Listener {
    pub fn new(channel: Arc<dyn PushChannel>, alert: Arc<dyn Alert>) -> Self {
        Self {
            channel,
            alert,
            state: State::Inactive,
        }
    }

    /// The identity being listened for. A subscription whose stream has
    /// ended no longer counts.
    pub fn subscribed_as(&self) -> Option<&UserId> {
        match &self.state {
            State::Subscribed { user, pump } if !pump.is_finished() => Some(user),
            _ => None,
        }
    }

    /// Brings the subscription in line with the current session identity,
    /// resubscribing when the previous stream has ended.
    pub async fn sync(&mut self, user: Option<&UserId>) {
        if user.is_some() && self.subscribed_as() == user {
            return;
        }

        self.teardown().await;

        let user = match user {
            Some(u) => u,
            None => return,
        };

        let name = channel_for(user);
        let mut sub = match self.channel.subscribe(&name).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(channel = %name, error = %e, "cannot subscribe to notifications");
                return;
            },
        };

        let alert = self.alert.clone();
        let pump = tokio::spawn({
            let name = name.clone();
            async move {
                while let Some(event) = sub.next().await {
                    tracing::debug!(channel = %event.channel, payload = %event.payload, "notification");

                    if let Err(e) = alert.ring(&event) {
                        tracing::debug!(error = %e, "alert failed");
                    }
                }

                tracing::info!(channel = %name, "notification stream ended");
            }
        });

        tracing::info!(channel = %name, "subscribed");
        self.state = State::Subscribed {
            user: user.clone(),
            pump,
        };
    }

    async fn teardown(&mut self) {
        if let State::Subscribed { user, pump } = mem::replace(&mut self.state, State::Inactive) {
            pump.abort();
            let _ = pump.await;

            tracing::info!(%user, "unsubscribed");
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let State::Subscribed { pump, .. } = &self.state {
            pump.abort();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use tokio::sync::mpsc::UnboundedSender;

    use super::*;

    /// Channel handing out detached subscriptions and keeping their senders.
    #[derive(Default)]
    pub struct FakeChannel {
        pub subscribed: Mutex<Vec<(String, UnboundedSender<Event>)>>,
    }

    impl FakeChannel {
        pub fn open_senders(&self) -> usize {
            self.subscribed
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, tx)| !tx.is_closed())
                .count()
        }

        pub fn push(&self, index: usize, payload: serde_json::Value) {
            let subs = self.subscribed.lock().unwrap();
            let (channel, tx) = &subs[index];
            let _ = tx.send(Event {
                channel: channel.clone(),
                payload,
            });
        }
    }

    #[async_trait]
    impl PushChannel for FakeChannel {
        async fn subscribe(&self, channel: &str) -> Result<Subscription, PushError> {
            let (tx, rx) = unbounded_channel();
            self.subscribed.lock().unwrap().push((channel.to_string(), tx));
            Ok(Subscription::detached(rx))
        }
    }

    #[derive(Default)]
    pub struct CountingAlert(pub AtomicUsize);

    impl Alert for CountingAlert {
        fn ring(&self, _: &Event) -> Result<(), AlertError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(AlertError::Blocked)
        }
    }

    /// Channel whose subscriptions end at once, like a dropped connection.
    #[derive(Default)]
    struct ClosingChannel(AtomicUsize);

    #[async_trait]
    impl PushChannel for ClosingChannel {
        async fn subscribe(&self, _: &str) -> Result<Subscription, PushError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            let (_, rx) = unbounded_channel();
            Ok(Subscription::detached(rx))
        }
    }

    fn listener() -> (Listener, Arc<FakeChannel>, Arc<CountingAlert>) {
        let channel = Arc::new(FakeChannel::default());
        let alert = Arc::new(CountingAlert::default());
        (Listener::new(channel.clone(), alert.clone()), channel, alert)
    }

    #[tokio::test]
    async fn same_identity_subscribes_once() {
        let (mut l, channel, _) = listener();
        let u1 = UserId::from("u1");

        l.sync(Some(&u1)).await;
        l.sync(Some(&u1)).await;

        let subs = channel.subscribed.lock().unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].0, "notification:u1");
    }

    #[tokio::test]
    async fn identity_change_releases_old_subscription_first() {
        let (mut l, channel, _) = listener();

        l.sync(Some(&UserId::from("u1"))).await;
        l.sync(Some(&UserId::from("u2"))).await;

        assert_eq!(channel.subscribed.lock().unwrap().len(), 2);
        assert_eq!(channel.open_senders(), 1);
        assert_eq!(l.subscribed_as(), Some(&UserId::from("u2")));

        l.sync(None).await;
        assert_eq!(channel.open_senders(), 0);
        assert_eq!(l.subscribed_as(), None);
    }

    #[tokio::test]
    async fn events_ring_and_alert_failures_are_swallowed() {
        let (mut l, channel, alert) = listener();
        l.sync(Some(&UserId::from("u1"))).await;

        channel.push(0, serde_json::json!({ "text": "new message" }));
        channel.push(0, serde_json::json!({ "text": "another" }));

        for _ in 0..100 {
            if alert.0.load(Ordering::SeqCst) == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(alert.0.load(Ordering::SeqCst), 2);
        assert!(l.subscribed_as().is_some());
    }

    #[tokio::test]
    async fn ended_stream_is_resubscribed_on_next_sync() {
        let channel = Arc::new(ClosingChannel::default());
        let mut l = Listener::new(channel.clone(), Arc::new(CountingAlert::default()));
        let u1 = UserId::from("u1");

        l.sync(Some(&u1)).await;
        for _ in 0..100 {
            if l.subscribed_as().is_none() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(l.subscribed_as(), None);

        l.sync(Some(&u1)).await;
        assert_eq!(channel.0.load(Ordering::SeqCst), 2);

        l.sync(None).await;
        assert_eq!(l.subscribed_as(), None);
    }
}
