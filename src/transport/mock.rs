//! Scripted channels for unit tests

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use vision_shared::{Command, Response, TransportError};

use crate::transport::traits::{RequestChannel, SendOptions, StateSubscriber};

/// What the mock answers to the next receive
pub(crate) enum MockReply {
    Json(Value),
    Raw(&'static [u8]),
    /// Never answers; the receive times out
    Silent,
    Fail(TransportError),
}

/// Observations shared with the test after the channel is boxed
#[derive(Default)]
pub(crate) struct MockLog {
    pub sent: Vec<Command>,
    pub shutdowns: usize,
}

pub(crate) struct MockChannel {
    endpoint: String,
    replies: VecDeque<MockReply>,
    waiting: bool,
    fail_shutdown: bool,
    log: Arc<Mutex<MockLog>>,
}

impl MockChannel {
    pub fn new(endpoint: &str, replies: Vec<MockReply>) -> (Self, Arc<Mutex<MockLog>>) {
        let log = Arc::new(Mutex::new(MockLog::default()));
        let channel = Self {
            endpoint: endpoint.into(),
            replies: replies.into(),
            waiting: false,
            fail_shutdown: false,
            log: log.clone(),
        };
        (channel, log)
    }

    pub fn failing_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }
}

#[async_trait]
impl RequestChannel for MockChannel {
    async fn send(&mut self, command: &Command, options: SendOptions) -> Result<(), TransportError> {
        if self.waiting {
            return Err(TransportError::Busy(self.endpoint.clone()));
        }
        self.log.lock().unwrap().sent.push(command.clone());
        self.waiting = !options.fire_and_forget;
        Ok(())
    }

    async fn receive(
        &mut self,
        timeout: Duration,
        _recv_json: bool,
        _check_preempt: bool,
    ) -> Result<Response, TransportError> {
        if !self.waiting {
            return Err(TransportError::NotWaiting);
        }
        self.waiting = false;

        match self.replies.pop_front() {
            Some(MockReply::Json(value)) => Ok(Response::Json(value)),
            Some(MockReply::Raw(bytes)) => Ok(Response::Raw(Bytes::from_static(bytes))),
            Some(MockReply::Fail(e)) => Err(e),
            Some(MockReply::Silent) | None => {
                tokio::time::sleep(timeout).await;
                Err(TransportError::Timeout(timeout))
            }
        }
    }

    fn is_waiting_reply(&self) -> bool {
        self.waiting
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.log.lock().unwrap().shutdowns += 1;
        if self.fail_shutdown {
            return Err(io::Error::other("socket already gone").into());
        }
        Ok(())
    }
}

/// Subscriber that hands out scripted state messages
pub(crate) struct MockSubscriber {
    messages: VecDeque<Bytes>,
}

impl MockSubscriber {
    pub fn new(messages: Vec<&'static str>) -> Self {
        Self {
            messages: messages
                .into_iter()
                .map(|m| Bytes::from_static(m.as_bytes()))
                .collect(),
        }
    }
}

#[async_trait]
impl StateSubscriber for MockSubscriber {
    async fn spin_once(
        &mut self,
        _timeout: Option<Duration>,
        _check_preempt: bool,
    ) -> Result<Option<Bytes>, TransportError> {
        Ok(self.messages.pop_front())
    }

    fn endpoint(&self) -> &str {
        "mock:status"
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
