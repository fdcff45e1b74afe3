//! An MQTT client implementation based on the MQTT 3.1.1 specification.
//!
//! This is the reference [`ProtocolClient`] used by the agent. It speaks just
//! enough MQTT for a Cayenne session: CONNECT with username/password,
//! QoS 0 publishing, single-topic SUBSCRIBE, inbound QoS 0/1 PUBLISH (with
//! PUBACK), PINGREQ and DISCONNECT. Any I/O failure marks the client as
//! disconnected so the session's liveness check picks it up, and so does a
//! ping the broker never answered.
//!
//! A PUBLISH that arrives while a SUBACK is awaited is queued and handed out
//! by the next [`poll`](ProtocolClient::poll).
use crate::config::Credentials;
use crate::network::error::Error;
use crate::network::{Link, MAX_PAYLOAD_LEN, MAX_TOPIC_LEN, ProtocolClient, PublishPacket};
use heapless::{Deque, Vec};

// MQTT Control Packet types
const CONNECT: u8 = 0x10;
const CONNACK: u8 = 0x20;
const PUBLISH: u8 = 0x30;
const PUBACK: u8 = 0x40;
const SUBSCRIBE: u8 = 0x82;
const SUBACK: u8 = 0x90;
const PINGREQ: u8 = 0xC0;
const PINGRESP: u8 = 0xD0;
const DISCONNECT: u8 = 0xE0;

// Protocol constants
const PROTOCOL_NAME: &[u8] = b"MQTT";
const PROTOCOL_LEVEL: u8 = 4; // MQTT 3.1.1

const FLAG_USERNAME: u8 = 0x80;
const FLAG_PASSWORD: u8 = 0x40;
const FLAG_CLEAN_SESSION: u8 = 0x02;

/// SUBACK return code for a refused subscription.
const SUBACK_FAILURE: u8 = 0x80;

/// Largest inbound packet body accepted.
const MAX_PACKET_LEN: usize = MAX_TOPIC_LEN + MAX_PAYLOAD_LEN + 4;

/// Inbound publishes buffered while waiting for a SUBACK.
const MAX_PENDING: usize = 4;

/// Zero-length reads tolerated in the middle of a packet before the peer is
/// considered gone.
const MAX_IDLE_READS: usize = 100;

/// Options for configuring the MQTT client connection.
///
/// The keep-alive interval is not an option: it comes from the session's
/// configuration on every [`connect`](ProtocolClient::connect).
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Whether to start a clean session.
    pub clean_session: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            clean_session: true,
        }
    }
}

/// An MQTT 3.1.1 client.
#[derive(Debug)]
pub struct MqttClient {
    options: Options,
    is_connected: bool,
    ping_outstanding: bool,
    next_packet_id: u16,
    pending: Deque<PublishPacket, MAX_PENDING>,
}

impl MqttClient {
    /// Create a disconnected client.
    pub fn new(options: Options) -> Self {
        Self {
            options,
            is_connected: false,
            ping_outstanding: false,
            next_packet_id: 1,
            pending: Deque::new(),
        }
    }

    /// The options this client connects with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    fn packet_id(&mut self) -> u16 {
        let id = self.next_packet_id;
        self.next_packet_id = self.next_packet_id.checked_add(1).unwrap_or(1);
        id
    }

    /// Write a complete packet, marking the session down if the link fails.
    fn send<L: Link>(&mut self, link: &mut L, header: u8, body: &[u8]) -> Result<(), Error> {
        let mut fixed_header: Vec<u8, 5> = Vec::new();
        fixed_header.push(header).map_err(|_| Error::BufferOverflow)?;
        encode_remaining_length(&mut fixed_header, body.len())?;

        let result = write_all(link, &fixed_header)
            .and_then(|_| write_all(link, body))
            .and_then(|_| link.flush().map_err(|_| Error::WriteError));
        if result.is_err() {
            self.is_connected = false;
        }
        result
    }

    fn receive_exact<L: Link>(&mut self, link: &mut L, buf: &mut [u8]) -> Result<(), Error> {
        let result = read_exact(link, buf);
        if result.is_err() {
            self.is_connected = false;
        }
        result
    }

    fn read_remaining_length<L: Link>(&mut self, link: &mut L) -> Result<usize, Error> {
        let mut remaining_len = 0;
        let mut multiplier = 1;
        for _ in 0..4 {
            let mut byte = [0u8; 1];
            self.receive_exact(link, &mut byte)?;
            remaining_len += (byte[0] as usize & 127) * multiplier;
            if byte[0] & 0x80 == 0 {
                return Ok(remaining_len);
            }
            multiplier *= 128;
        }
        self.is_connected = false;
        Err(Error::ProtocolError)
    }

    /// Read the remaining length and body of a packet whose header byte has
    /// already been consumed.
    fn read_body<L: Link>(&mut self, link: &mut L) -> Result<Vec<u8, MAX_PACKET_LEN>, Error> {
        let remaining_len = self.read_remaining_length(link)?;
        if remaining_len > MAX_PACKET_LEN {
            // The stream cannot be resynchronised after skipping a packet we
            // could not buffer.
            self.is_connected = false;
            return Err(Error::BufferOverflow);
        }

        let mut body = Vec::new();
        body.resize(remaining_len, 0)
            .map_err(|_| Error::BufferOverflow)?;
        self.receive_exact(link, &mut body)?;
        Ok(body)
    }

    /// Read packets until the SUBACK for `packet_id`, queueing any PUBLISH
    /// received in between.
    fn await_suback<L: Link>(&mut self, link: &mut L, packet_id: u16) -> Result<(), Error> {
        loop {
            let mut header = [0u8; 1];
            self.receive_exact(link, &mut header)?;
            let body = self.read_body(link)?;

            match header[0] & 0xF0 {
                SUBACK => return check_suback(&body, packet_id),
                PUBLISH => {
                    let packet = self.parse_publish(link, header[0], &body)?;
                    self.pending
                        .push_back(packet)
                        .map_err(|_| Error::BufferOverflow)?;
                }
                PINGRESP => self.ping_outstanding = false,
                PUBACK => {}
                _ => {
                    self.is_connected = false;
                    return Err(Error::ProtocolError);
                }
            }
        }
    }

    fn parse_publish<L: Link>(
        &mut self,
        link: &mut L,
        header: u8,
        body: &[u8],
    ) -> Result<PublishPacket, Error> {
        if body.len() < 2 {
            return Err(Error::ProtocolError);
        }
        let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
        let topic_end = 2 + topic_len;
        let topic_bytes = body.get(2..topic_end).ok_or(Error::ProtocolError)?;
        let topic = core::str::from_utf8(topic_bytes).map_err(|_| Error::InvalidPayload)?;

        let qos = (header >> 1) & 0x03;
        let payload_start = match qos {
            0 => topic_end,
            1 => {
                let id = body.get(topic_end..topic_end + 2).ok_or(Error::ProtocolError)?;
                self.send(link, PUBACK, id)?;
                topic_end + 2
            }
            // QoS 2 is never granted: the agent subscribes at QoS 0.
            _ => return Err(Error::ProtocolError),
        };

        PublishPacket::new(topic, &body[payload_start..])
    }
}

impl<L: Link> ProtocolClient<L> for MqttClient {
    /// Sends a `CONNECT` packet and waits for the `CONNACK` response.
    fn connect(
        &mut self,
        link: &mut L,
        credentials: &Credentials,
        keep_alive_seconds: u16,
    ) -> Result<(), Error> {
        self.is_connected = false;
        self.ping_outstanding = false;
        self.pending.clear();

        // --- Variable Header ---
        let mut vh: Vec<u8, 10> = Vec::new();
        push_bytes(&mut vh, PROTOCOL_NAME)?;
        vh.push(PROTOCOL_LEVEL).map_err(|_| Error::BufferOverflow)?;

        let mut connect_flags = 0;
        if self.options.clean_session {
            connect_flags |= FLAG_CLEAN_SESSION;
        }
        if !credentials.username.is_empty() {
            connect_flags |= FLAG_USERNAME;
        }
        if !credentials.password.is_empty() {
            connect_flags |= FLAG_PASSWORD;
        }
        vh.push(connect_flags).map_err(|_| Error::BufferOverflow)?;
        vh.extend_from_slice(&keep_alive_seconds.to_be_bytes())
            .map_err(|_| Error::BufferOverflow)?;

        // --- Payload ---
        let mut packet: Vec<u8, 256> = Vec::new();
        packet.extend_from_slice(&vh).map_err(|_| Error::BufferOverflow)?;
        push_bytes(&mut packet, credentials.client_id.as_bytes())?;
        if !credentials.username.is_empty() {
            push_bytes(&mut packet, credentials.username.as_bytes())?;
        }
        if !credentials.password.is_empty() {
            push_bytes(&mut packet, credentials.password.as_bytes())?;
        }

        self.send(link, CONNECT, &packet)?;

        // Wait for and parse CONNACK
        let mut connack_buf = [0u8; 4];
        read_exact(link, &mut connack_buf)?;

        if connack_buf[0] != CONNACK || connack_buf[1] != 2 {
            return Err(Error::ProtocolError);
        }

        match connack_buf[3] {
            0 => {
                self.is_connected = true;
                Ok(())
            }
            rc => Err(Error::ConnectionRefused(rc)),
        }
    }

    fn disconnect(&mut self, link: &mut L) {
        if self.is_connected {
            // Best-effort: the link may already be gone.
            let _ = self.send(link, DISCONNECT, &[]);
        }
        self.is_connected = false;
    }

    fn is_connected(&self) -> bool {
        self.is_connected
    }

    fn publish(&mut self, link: &mut L, topic: &str, payload: &[u8]) -> Result<(), Error> {
        if !self.is_connected {
            return Err(Error::NotConnected);
        }
        let mut packet: Vec<u8, MAX_PACKET_LEN> = Vec::new();
        push_bytes(&mut packet, topic.as_bytes())?;
        packet
            .extend_from_slice(payload)
            .map_err(|_| Error::BufferOverflow)?;

        self.send(link, PUBLISH, &packet)
    }

    fn subscribe(&mut self, link: &mut L, topic: &str) -> Result<(), Error> {
        if !self.is_connected {
            return Err(Error::NotConnected);
        }
        let packet_id = self.packet_id();

        let mut packet: Vec<u8, MAX_PACKET_LEN> = Vec::new();
        packet
            .extend_from_slice(&packet_id.to_be_bytes())
            .map_err(|_| Error::BufferOverflow)?;
        push_bytes(&mut packet, topic.as_bytes())?;
        packet.push(0).map_err(|_| Error::BufferOverflow)?; // requested QoS 0

        self.send(link, SUBSCRIBE, &packet)?;

        self.await_suback(link, packet_id)
    }

    fn poll(&mut self, link: &mut L) -> Result<Option<PublishPacket>, Error> {
        if !self.is_connected {
            return Err(Error::NotConnected);
        }
        if let Some(packet) = self.pending.pop_front() {
            return Ok(Some(packet));
        }

        let mut header_buf = [0u8; 1];
        match link.read(&mut header_buf) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            Err(_) => {
                self.is_connected = false;
                return Err(Error::ReadError);
            }
        }

        let body = self.read_body(link)?;

        match header_buf[0] & 0xF0 {
            PUBLISH => self.parse_publish(link, header_buf[0], &body).map(Some),
            PINGRESP => {
                self.ping_outstanding = false;
                Ok(None)
            }
            SUBACK | PUBACK => Ok(None),
            _ => Err(Error::ProtocolError),
        }
    }

    fn ping(&mut self, link: &mut L) -> Result<(), Error> {
        if !self.is_connected {
            return Err(Error::NotConnected);
        }
        if self.ping_outstanding {
            self.is_connected = false;
            return Err(Error::Timeout);
        }
        self.send(link, PINGREQ, &[])?;
        self.ping_outstanding = true;
        Ok(())
    }
}

fn check_suback(body: &[u8], packet_id: u16) -> Result<(), Error> {
    let [id_hi, id_lo, return_code, ..] = body else {
        return Err(Error::ProtocolError);
    };
    if u16::from_be_bytes([*id_hi, *id_lo]) != packet_id {
        return Err(Error::ProtocolError);
    }
    if *return_code == SUBACK_FAILURE {
        return Err(Error::SubscribeRejected);
    }
    Ok(())
}

/// Append a 2-byte length prefix followed by `bytes`.
fn push_bytes<const N: usize>(buf: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), Error> {
    let len = u16::try_from(bytes.len()).map_err(|_| Error::BufferOverflow)?;
    buf.extend_from_slice(&len.to_be_bytes())
        .map_err(|_| Error::BufferOverflow)?;
    buf.extend_from_slice(bytes)
        .map_err(|_| Error::BufferOverflow)
}

fn write_all<L: Link>(link: &mut L, mut buf: &[u8]) -> Result<(), Error> {
    while !buf.is_empty() {
        match link.write(buf) {
            Ok(0) | Err(_) => return Err(Error::WriteError),
            Ok(n) => buf = &buf[n..],
        }
    }
    Ok(())
}

fn read_exact<L: Link>(link: &mut L, buf: &mut [u8]) -> Result<(), Error> {
    let mut total_read = 0;
    let mut idle_reads = 0;
    while total_read < buf.len() {
        match link.read(&mut buf[total_read..]) {
            Ok(0) => {
                idle_reads += 1;
                if idle_reads >= MAX_IDLE_READS {
                    return Err(Error::ConnectionClosed);
                }
            }
            Ok(n) => total_read += n,
            Err(_) => return Err(Error::ReadError),
        }
    }
    Ok(())
}

/// Encode the remaining length field for an MQTT packet.
///
/// The encoding uses up to 4 bytes where each byte encodes 7 bits of the
/// length value; the most significant bit indicates that another byte follows.
fn encode_remaining_length(buf: &mut Vec<u8, 5>, mut len: usize) -> Result<(), Error> {
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        buf.push(byte).map_err(|_| Error::ProtocolError)?;
        if len == 0 {
            break;
        }
    }
    Ok(())
}
