//! WebSocket transport driving one connector.
//!
//! Each connection attempt runs a single loop that owns the socket, the
//! handshake timer and the connector's input queue. Inputs are handled one
//! at a time; the actions they produce are executed in order before the
//! next input is taken.

use crate::services::{CLI, LocalHost};
use anyhow::bail;
use futures_util::{SinkExt, StreamExt};
use gatelink_connector::{Action, Connector, Input, Notice, Recipient, Request, RpcKind, ServiceRef};
use gatelink_core::{Envelope, Payload};
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Sleep;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection attempts a one-shot request makes before giving up.
pub const ONE_SHOT_ATTEMPTS: u32 = 3;

/// A request issued once the session is open, whose answer ends the run.
#[derive(Debug, Clone)]
pub struct OneShot {
    pub kind: RpcKind,
    pub request: Request,
}

impl OneShot {
    pub fn new(kind: RpcKind, name: impl Into<String>, service: Option<String>) -> Self {
        let request = Request::new(name, Payload::new(), ServiceRef::new(CLI)).to_service(service.unwrap_or_default());
        Self { kind, request }
    }

    fn input(&self) -> Input {
        match self.kind {
            RpcKind::Command => Input::SendCommand(self.request.clone()),
            RpcKind::Stats => Input::SendStats(self.request.clone()),
        }
    }
}

enum Wake {
    Message(Option<Result<Message, tungstenite::Error>>),
    Expired,
}

pub struct Link {
    connector: Connector,
    host: LocalHost,
    url: String,
    reconnect_delay: Duration,
    once: Option<OneShot>,
    answer: Option<Envelope>,
    refusal: Option<Payload>,
}

impl Link {
    pub fn new(connector: Connector, host: LocalHost, url: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            connector,
            host,
            url: url.into(),
            reconnect_delay,
            once: None,
            answer: None,
            refusal: None,
        }
    }

    /// Keep a session up, reconnecting after every loss.
    pub async fn serve(mut self) -> anyhow::Result<()> {
        self.drive().await
    }

    /// Open a session, send `shot` and wait for its answer.
    pub async fn request(mut self, shot: OneShot) -> anyhow::Result<Envelope> {
        self.once = Some(shot);
        self.drive().await?;
        if let Some(payload) = self.refusal.take() {
            bail!("identity refused by {}: {}", self.url, Value::Object(payload));
        }
        match self.answer.take() {
            Some(answer) => Ok(answer),
            None => bail!("no answer from {} after {ONE_SHOT_ATTEMPTS} attempts", self.url),
        }
    }

    /// Connect and run sessions until a one-shot request settles or runs
    /// out of attempts.
    async fn drive(&mut self) -> anyhow::Result<()> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match tokio_tungstenite::connect_async(self.url.as_str()).await {
                Ok((ws, _)) => {
                    info!(url = %self.url, "connected");
                    self.session(ws).await?;
                }
                Err(e) => warn!(url = %self.url, error = %e, "connect failed"),
            }
            if self.settled() || (self.once.is_some() && attempts >= ONE_SHOT_ATTEMPTS) {
                return Ok(());
            }
            debug!(delay_ms = self.reconnect_delay.as_millis() as u64, "reconnecting");
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    fn settled(&self) -> bool {
        self.answer.is_some() || self.refusal.is_some()
    }

    async fn session(&mut self, ws: WsStream) -> anyhow::Result<()> {
        let (mut sink, mut stream) = ws.split();
        let mut timer: Option<Pin<Box<Sleep>>> = None;
        let mut queue = VecDeque::from([Input::Connected]);
        let mut closed = false;

        loop {
            while let Some(input) = queue.pop_front() {
                for action in self.step(input) {
                    match action {
                        Action::Send(_) if closed => debug!("transport closed, envelope discarded"),
                        Action::Send(bytes) => {
                            let text = String::from_utf8(bytes)?;
                            if let Err(e) = sink.send(Message::Text(text.into())).await {
                                debug!(error = %e, "send failed");
                                closed = true;
                                queue.push_back(Input::Disconnected);
                            }
                        }
                        Action::Drop => {
                            if !closed {
                                let _ = sink.close().await;
                                closed = true;
                                queue.push_back(Input::Disconnected);
                            }
                        }
                        Action::ArmTimer(after) => timer = Some(Box::pin(tokio::time::sleep(after))),
                        Action::ClearTimer => timer = None,
                        Action::Notify { to, notice } => self.on_notice(to, notice, &mut queue),
                        Action::Deliver { service, envelope } => self.on_deliver(service, envelope),
                        Action::ForwardToParent(envelope) | Action::Publish(envelope) => {
                            let payload = Value::Object(envelope.payload);
                            info!(event = %envelope.event, %payload, "event");
                        }
                    }
                }
            }

            if closed {
                return Ok(());
            }
            if self.settled() {
                let _ = sink.close().await;
                return Ok(());
            }

            let wake = tokio::select! {
                msg = stream.next() => Wake::Message(msg),
                () = expiry(&mut timer) => Wake::Expired,
            };
            let input = match wake {
                Wake::Expired => {
                    timer = None;
                    Input::Timeout
                }
                Wake::Message(Some(Ok(Message::Text(text)))) => Input::RxData(text.as_bytes().to_vec()),
                Wake::Message(Some(Ok(Message::Binary(bytes)))) => Input::RxData(bytes.to_vec()),
                Wake::Message(Some(Ok(Message::Close(_))) | None) => {
                    closed = true;
                    Input::Disconnected
                }
                Wake::Message(Some(Ok(_))) => continue,
                Wake::Message(Some(Err(e))) => {
                    debug!(error = %e, "websocket error");
                    closed = true;
                    Input::Disconnected
                }
            };
            queue.push_back(input);
        }
    }

    fn step(&mut self, input: Input) -> Vec<Action> {
        let cx = self.host.cx();
        let actions = self.connector.handle(&cx, input).unwrap_or_else(|e| {
            warn!(error = %e, "input refused");
            Vec::new()
        });
        self.host.services.record(self.connector.metrics());
        actions
    }

    fn on_notice(&mut self, to: Recipient, notice: Notice, queue: &mut VecDeque<Input>) {
        match notice {
            Notice::Open { peer, data } => {
                info!(?to, role = %peer.role, name = %peer.name, %data, "peer open");
                if let Some(shot) = &self.once {
                    queue.push_back(shot.input());
                }
            }
            Notice::Close { peer } => info!(?to, role = %peer.role, name = %peer.name, "peer closed"),
            Notice::IdNak { payload } => {
                let shown = Value::Object(payload.clone());
                warn!(?to, payload = %shown, "identity refused");
                if self.once.is_some() {
                    self.refusal = Some(payload);
                }
            }
        }
    }

    fn on_deliver(&mut self, service: ServiceRef, envelope: Envelope) {
        if service.name() == CLI && self.once.is_some() {
            self.answer = Some(envelope);
        } else {
            info!(%service, event = %envelope.event, "delivered");
        }
    }
}

async fn expiry(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
