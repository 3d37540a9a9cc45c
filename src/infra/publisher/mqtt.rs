//! MQTT 3.1.1 publisher over plain TCP.
//!
//! Only what result forwarding needs is implemented: CONNECT/CONNACK with a
//! clean session, QoS 0 PUBLISH of one envelope per message, DISCONNECT.
//! Keep-alive defaults to 0 (disabled) because the scheduler may stay idle
//! longer than any sensible keep-alive while gates are closed; dead
//! connections are detected on the next write instead.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::core::{Envelope, PublishError, Publisher};

const CONNECT: u8 = 0x10;
const CONNACK: u8 = 0x20;
const PUBLISH_QOS0: u8 = 0x30;
const PROTOCOL_LEVEL_311: u8 = 4;
const CLEAN_SESSION: u8 = 0x02;
const MAX_REMAINING_LENGTH: usize = 268_435_455;

/// DISCONNECT packet.
pub const DISCONNECT: [u8; 2] = [0xE0, 0x00];

/// Connection settings for [`MqttPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttOptions {
    /// Broker host name or address.
    pub host: String,
    /// Broker TCP port.
    pub port: u16,
    /// Topic every envelope is published to.
    pub topic: String,
    /// MQTT client identifier.
    pub client_id: String,
    /// Keep-alive in seconds; 0 disables broker-side timeouts.
    pub keep_alive_secs: u16,
    /// Bound on opening a session (TCP connect, CONNECT, CONNACK).
    pub connect_timeout: Duration,
}

impl MqttOptions {
    /// Options for `host:port` publishing to `topic`, with a generated client id.
    pub fn new(host: impl Into<String>, port: u16, topic: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            topic: topic.into(),
            client_id: generate_client_id(),
            keep_alive_secs: 0,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Client id of at most 23 bytes, the length every 3.1.1 broker must accept.
pub fn generate_client_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("edgeiq-{}", &id[..16])
}

/// Publisher forwarding envelopes to an MQTT broker.
///
/// Once [`Publisher::connect`] has succeeded the publisher keeps trying to
/// hold a session until [`Publisher::disconnect`]: a publish that finds the
/// session gone reopens it first, and a write that fails with an I/O error
/// triggers one reconnect and one resend. A failed reconnect is returned to
/// the caller and retried on the next publish. Every publish opens at most
/// one session, so it is bounded by one `connect_timeout` plus the write.
pub struct MqttPublisher {
    options: MqttOptions,
    stream: Option<TcpStream>,
    session_wanted: bool,
}

impl MqttPublisher {
    /// Create a disconnected publisher.
    pub const fn new(options: MqttOptions) -> Self {
        Self {
            options,
            stream: None,
            session_wanted: false,
        }
    }

    /// Connection settings.
    pub const fn options(&self) -> &MqttOptions {
        &self.options
    }

    /// Whether a broker session is open.
    pub const fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn open(&self) -> Result<TcpStream, PublishError> {
        let limit = self.options.connect_timeout;
        tokio::time::timeout(limit, self.handshake())
            .await
            .map_err(|_| PublishError::Timeout(limit))?
    }

    async fn handshake(&self) -> Result<TcpStream, PublishError> {
        let mut stream = TcpStream::connect((self.options.host.as_str(), self.options.port)).await?;
        stream.set_nodelay(true)?;

        let connect = encode_connect(&self.options.client_id, self.options.keep_alive_secs)?;
        stream.write_all(&connect).await?;

        let mut ack = [0u8; 4];
        stream.read_exact(&mut ack).await?;
        parse_connack(ack)?;
        Ok(stream)
    }

    /// Drop the session if the broker has already closed it.
    fn discard_if_closed(&mut self) {
        let Some(stream) = self.stream.as_ref() else {
            return;
        };
        let mut probe = [0u8; 1];
        match stream.try_read(&mut probe) {
            Ok(0) => {
                debug!("broker closed the session");
                self.stream = None;
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "broker session unusable");
                self.stream = None;
            }
        }
    }

    async fn send(&mut self, packet: &[u8]) -> Result<(), PublishError> {
        let stream = self.stream.as_mut().ok_or(PublishError::NotConnected)?;
        if let Err(e) = stream.write_all(packet).await {
            self.stream = None;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn connect(&mut self) -> Result<(), PublishError> {
        let stream = self.open().await?;
        self.stream = Some(stream);
        self.session_wanted = true;
        info!(
            host = %self.options.host,
            port = self.options.port,
            client_id = %self.options.client_id,
            "connected to broker"
        );
        Ok(())
    }

    async fn publish(&mut self, envelope: &Envelope) -> Result<(), PublishError> {
        if !self.session_wanted {
            return Err(PublishError::NotConnected);
        }
        let packet = encode_publish(&self.options.topic, &envelope.to_json()?)?;

        self.discard_if_closed();
        let mut reopened = false;
        if self.stream.is_none() {
            info!(task = %envelope.task, "reopening broker session");
            self.stream = Some(self.open().await?);
            reopened = true;
        }

        match self.send(&packet).await {
            Err(PublishError::Io(e)) if !reopened => {
                warn!(task = %envelope.task, error = %e, "broker write failed; reconnecting");
                self.stream = Some(self.open().await?);
                self.send(&packet).await
            }
            other => other,
        }?;
        debug!(task = %envelope.task, topic = %self.options.topic, bytes = packet.len(), "envelope sent");
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.session_wanted = false;
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.write_all(&DISCONNECT).await {
                debug!(error = %e, "disconnect packet not delivered");
            }
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "socket shutdown failed");
            }
            info!("disconnected from broker");
        }
    }
}

/// Encode a CONNECT packet with a clean session and no credentials.
pub fn encode_connect(client_id: &str, keep_alive_secs: u16) -> Result<Vec<u8>, PublishError> {
    let mut body = Vec::with_capacity(12 + client_id.len());
    put_str(&mut body, "MQTT")?;
    body.push(PROTOCOL_LEVEL_311);
    body.push(CLEAN_SESSION);
    body.extend_from_slice(&keep_alive_secs.to_be_bytes());
    put_str(&mut body, client_id)?;
    frame(CONNECT, &body)
}

/// Encode a QoS 0 PUBLISH packet.
pub fn encode_publish(topic: &str, payload: &[u8]) -> Result<Vec<u8>, PublishError> {
    let mut body = Vec::with_capacity(2 + topic.len() + payload.len());
    put_str(&mut body, topic)?;
    body.extend_from_slice(payload);
    frame(PUBLISH_QOS0, &body)
}

/// Check a CONNACK packet; return code 0 means accepted.
pub fn parse_connack(packet: [u8; 4]) -> Result<(), PublishError> {
    if packet[0] != CONNACK || packet[1] != 0x02 {
        return Err(PublishError::Protocol(format!(
            "expected CONNACK, got header {:#04x} {:#04x}",
            packet[0], packet[1]
        )));
    }
    match packet[3] {
        0 => Ok(()),
        code => Err(PublishError::ConnectionRefused(code)),
    }
}

/// Append the variable-length "remaining length" field.
pub fn encode_remaining_length(mut len: usize, buf: &mut Vec<u8>) -> Result<(), PublishError> {
    if len > MAX_REMAINING_LENGTH {
        return Err(PublishError::Protocol(format!("packet too large: {len} bytes")));
    }
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if len == 0 {
            return Ok(());
        }
    }
}

fn frame(header: u8, body: &[u8]) -> Result<Vec<u8>, PublishError> {
    let mut packet = Vec::with_capacity(body.len() + 5);
    packet.push(header);
    encode_remaining_length(body.len(), &mut packet)?;
    packet.extend_from_slice(body);
    Ok(packet)
}

fn put_str(buf: &mut Vec<u8>, s: &str) -> Result<(), PublishError> {
    let len = u16::try_from(s.len())
        .map_err(|_| PublishError::Protocol(format!("string too long: {} bytes", s.len())))?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}
