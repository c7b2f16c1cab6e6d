use crate::ice::{
    IceCredentials, SelectedPath,
    stun::{StunClass, StunMessage, is_stun},
};
use crate::log::LogSink;
use crate::message::{self, Decoded, Envelope};
use crate::subscription::Hook;
use crate::transport::{
    channel_config::ChannelConfig, channel_error::ChannelError, channel_event::ChannelEvent,
    channel_state::ChannelState, close_handle::CloseHandle, sctp_role::SctpRole,
};
use crate::{sink_debug, sink_info, sink_trace, sink_warn};
use bytes::Bytes;
use sctp_proto::{
    Association, AssociationHandle, ClientConfig, DatagramEvent, Endpoint, EndpointConfig, Event,
    Payload, PayloadProtocolIdentifier, ServerConfig, StreamEvent, TransportConfig,
};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// Every envelope travels on this one ordered, reliable stream.
const STREAM_ID: u16 = 0;
const RECV_BUF_LEN: usize = 65_536;
/// After closing, keep driving the association this long so the SHUTDOWN
/// exchange can complete.
const LINGER: Duration = Duration::from_secs(2);

/// What one pass over the association produced.
#[derive(Default)]
struct AssociationOutput {
    connected: bool,
    lost: Option<String>,
    frames: Vec<Vec<u8>>,
}

/// Ordered, reliable envelope pipe over the selected UDP path.
///
/// STUN traffic on the same socket is answered here (consent freshness);
/// everything else is SCTP. Like the rest of the crate it is driven by
/// [`poll`](Self::poll) and never blocks.
pub struct DataChannel {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
    role: SctpRole,
    config: ChannelConfig,
    local_credentials: IceCredentials,
    remote_credentials: IceCredentials,
    endpoint: Endpoint,
    association: Option<(AssociationHandle, Association)>,
    state: ChannelState,
    created_at: Instant,
    last_rx: Instant,
    last_keepalive: Instant,
    linger_until: Option<Instant>,
    close_flag: Arc<AtomicBool>,
    pending: Vec<ChannelEvent>,
    recv_buf: Vec<u8>,
    log: Arc<dyn LogSink>,
    on_open: Hook<()>,
    on_close: Hook<()>,
    on_message: Hook<Envelope>,
}

impl DataChannel {
    /// Takes over the selected path. The client side sends INIT right away;
    /// datagrams that arrived during connectivity checks are replayed first.
    pub fn new(
        path: SelectedPath,
        role: SctpRole,
        config: ChannelConfig,
        log: Arc<dyn LogSink>,
    ) -> Result<Self, ChannelError> {
        let transport = Arc::new(TransportConfig::default().with_max_message_size(
            u32::try_from(config.max_message_size).unwrap_or(u32::MAX),
        ));
        let server_config = match role {
            SctpRole::Server => {
                let mut server = ServerConfig::default();
                server.transport = Arc::clone(&transport);
                Some(Arc::new(server))
            }
            SctpRole::Client => None,
        };
        let endpoint = Endpoint::new(Arc::new(EndpointConfig::default()), server_config);
        let now = Instant::now();

        let mut channel = Self {
            socket: path.socket,
            remote: path.remote,
            role,
            config,
            local_credentials: path.local_credentials,
            remote_credentials: path.remote_credentials,
            endpoint,
            association: None,
            state: ChannelState::Connecting,
            created_at: now,
            last_rx: now,
            last_keepalive: now,
            linger_until: None,
            close_flag: Arc::new(AtomicBool::new(false)),
            pending: Vec::new(),
            recv_buf: vec![0u8; RECV_BUF_LEN],
            log,
            on_open: Hook::new(),
            on_close: Hook::new(),
            on_message: Hook::new(),
        };

        if role == SctpRole::Client {
            let (handle, assoc) = channel
                .endpoint
                .connect(ClientConfig { transport }, channel.remote)
                .map_err(|e| ChannelError::Connect(format!("{e:?}")))?;
            channel.association = Some((handle, assoc));
            sink_info!(
                channel.log,
                "[CHANNEL] SCTP association initiated towards {}",
                channel.remote
            );
        }

        let mut events = Vec::new();
        for packet in path.early_packets {
            channel.handle_sctp(now, packet);
        }
        channel.drive(now, &mut events);
        channel.pending = events;
        Ok(channel)
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    pub fn role(&self) -> SctpRole {
        self.role
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle(Arc::downgrade(&self.close_flag))
    }

    pub fn on_open(&mut self) -> &mut Hook<()> {
        &mut self.on_open
    }

    pub fn on_close(&mut self) -> &mut Hook<()> {
        &mut self.on_close
    }

    pub fn on_message(&mut self) -> &mut Hook<Envelope> {
        &mut self.on_message
    }

    /// Sends `envelope` if the channel is open; otherwise does nothing.
    /// Unsent traffic is never queued.
    pub fn send(&mut self, envelope: &Envelope) {
        if self.state != ChannelState::Open {
            sink_debug!(
                self.log,
                "[CHANNEL] not open ({:?}), dropping outbound {}",
                self.state,
                envelope.kind()
            );
            return;
        }
        let bytes = match message::encode(envelope) {
            Ok(b) => b,
            Err(e) => {
                sink_warn!(self.log, "[CHANNEL] could not encode {}: {}", envelope.kind(), e);
                return;
            }
        };
        if bytes.len() > self.config.max_message_size {
            sink_warn!(
                self.log,
                "[CHANNEL] dropping outbound {} of {} bytes (limit {})",
                envelope.kind(),
                bytes.len(),
                self.config.max_message_size
            );
            return;
        }
        self.send_frame(&bytes);
    }

    /// Writes one raw frame on the stream. Returns whether it was accepted.
    pub(crate) fn send_frame(&mut self, bytes: &[u8]) -> bool {
        if self.state != ChannelState::Open {
            return false;
        }
        let Some((_, assoc)) = self.association.as_mut() else {
            return false;
        };
        let accepted = match assoc.stream(STREAM_ID) {
            Ok(mut stream) => match stream.write(bytes) {
                Ok(_) => true,
                Err(e) => {
                    sink_warn!(self.log, "[CHANNEL] stream write failed: {:?}", e);
                    false
                }
            },
            Err(e) => {
                sink_warn!(self.log, "[CHANNEL] stream {} unavailable: {:?}", STREAM_ID, e);
                false
            }
        };
        flush_transmits(assoc, &self.socket, self.remote, Instant::now(), &self.log);
        accepted
    }

    /// Performs an SCTP shutdown and closes the channel. `on_close` fires
    /// here, synchronously. Returns `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        if self.state == ChannelState::Closed {
            return false;
        }
        self.shutdown(Instant::now());
        sink_info!(self.log, "[CHANNEL] closed locally");
        self.on_close.emit(&());
        true
    }

    /// Receives, drives the association and timers, fires this channel's
    /// hooks and returns the same events in order.
    pub fn poll(&mut self, now: Instant) -> Vec<ChannelEvent> {
        let mut events = std::mem::take(&mut self.pending);

        if self.state == ChannelState::Closed {
            self.linger(now);
            self.dispatch(&events);
            return events;
        }

        if self.close_flag.swap(false, Ordering::AcqRel) {
            self.lose("closed through handle", now, &mut events);
            self.dispatch(&events);
            return events;
        }

        self.receive(now, &mut events);
        self.drive(now, &mut events);
        self.check_timers(now, &mut events);
        self.dispatch(&events);
        events
    }

    fn dispatch(&mut self, events: &[ChannelEvent]) {
        for event in events {
            match event {
                ChannelEvent::Open => {
                    self.on_open.emit(&());
                }
                ChannelEvent::Message(envelope) => {
                    self.on_message.emit(envelope);
                }
                ChannelEvent::Close => {
                    self.on_close.emit(&());
                }
            }
        }
    }

    fn receive(&mut self, now: Instant, events: &mut Vec<ChannelEvent>) {
        let mut buf = std::mem::take(&mut self.recv_buf);
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    if from != self.remote {
                        sink_trace!(self.log, "[CHANNEL] ignoring datagram from {}", from);
                        continue;
                    }
                    self.last_rx = now;
                    if is_stun(&buf[..n]) {
                        self.handle_stun(&buf[..n]);
                    } else {
                        self.handle_sctp(now, buf[..n].to_vec());
                        self.drive(now, events);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::ConnectionReset => continue,
                Err(e) => {
                    sink_debug!(self.log, "[CHANNEL] recv error: {}", e);
                    break;
                }
            }
        }
        self.recv_buf = buf;
    }

    fn handle_stun(&self, data: &[u8]) {
        let msg = match StunMessage::decode(data) {
            Ok(m) => m,
            Err(e) => {
                sink_debug!(self.log, "[CHANNEL] bad STUN from peer: {}", e);
                return;
            }
        };
        match msg.class {
            StunClass::Request => {
                let prefix = format!("{}:", self.local_credentials.ufrag);
                let user_ok = msg
                    .username
                    .as_deref()
                    .is_some_and(|u| u.starts_with(&prefix));
                if !user_ok || !msg.verify_integrity(&self.local_credentials.pwd) {
                    sink_debug!(self.log, "[CHANNEL] rejecting unauthenticated binding request");
                    return;
                }
                let response = StunMessage::success_response(msg.transaction_id, self.remote);
                match response.encode(&self.local_credentials.pwd) {
                    Ok(bytes) => {
                        if let Err(e) = self.socket.send_to(&bytes, self.remote) {
                            sink_debug!(self.log, "[CHANNEL] keepalive answer failed: {}", e);
                        }
                    }
                    Err(e) => sink_warn!(self.log, "[CHANNEL] encode keepalive answer: {}", e),
                }
            }
            StunClass::SuccessResponse => {
                if !msg.verify_integrity(&self.remote_credentials.pwd) {
                    sink_debug!(self.log, "[CHANNEL] keepalive response failed integrity");
                } else {
                    sink_trace!(self.log, "[CHANNEL] keepalive answered");
                }
            }
        }
    }

    fn handle_sctp(&mut self, now: Instant, packet: Vec<u8>) {
        match self
            .endpoint
            .handle(now, self.remote, None, None, Bytes::from(packet))
        {
            Some((handle, DatagramEvent::NewAssociation(assoc))) => {
                if self.association.is_some() {
                    sink_warn!(self.log, "[CHANNEL] ignoring second SCTP association");
                    return;
                }
                sink_info!(self.log, "[CHANNEL] SCTP association accepted from {}", self.remote);
                self.association = Some((handle, assoc));
            }
            Some((_, DatagramEvent::AssociationEvent(event))) => {
                if let Some((_, assoc)) = self.association.as_mut() {
                    assoc.handle_event(event);
                }
            }
            None => {}
        }
    }

    fn drive(&mut self, now: Instant, events: &mut Vec<ChannelEvent>) {
        let Some((_, assoc)) = self.association.as_mut() else {
            return;
        };
        let output = drain_association(assoc, &self.socket, self.remote, now, &self.log);

        if output.connected && self.state == ChannelState::Connecting {
            self.state = ChannelState::Open;
            sink_info!(
                self.log,
                "[CHANNEL] open ({:?}) after {:?}",
                self.role,
                now.saturating_duration_since(self.created_at)
            );
            events.push(ChannelEvent::Open);
        }

        for frame in output.frames {
            self.deliver(&frame, events);
        }

        if let Some(reason) = output.lost {
            self.lose(&format!("association lost: {reason}"), now, events);
        }
    }

    fn deliver(&self, frame: &[u8], events: &mut Vec<ChannelEvent>) {
        if frame.len() > self.config.max_message_size {
            sink_warn!(
                self.log,
                "[CHANNEL] dropping inbound frame of {} bytes (limit {})",
                frame.len(),
                self.config.max_message_size
            );
            return;
        }
        match message::decode(frame) {
            Ok(Decoded::Envelope(envelope)) => events.push(ChannelEvent::Message(envelope)),
            Ok(Decoded::UnknownKind(kind)) => {
                sink_debug!(self.log, "[CHANNEL] ignoring envelope of unknown kind {:?}", kind);
            }
            Err(e) => {
                sink_warn!(self.log, "[CHANNEL] dropping malformed envelope: {}", e);
            }
        }
    }

    fn check_timers(&mut self, now: Instant, events: &mut Vec<ChannelEvent>) {
        match self.state {
            ChannelState::Connecting => {
                if now.saturating_duration_since(self.created_at) >= self.config.handshake_timeout {
                    self.lose("SCTP handshake timed out", now, events);
                }
            }
            ChannelState::Open => {
                if now.saturating_duration_since(self.last_rx) >= self.config.idle_timeout {
                    let reason = format!(
                        "nothing received from peer for {:?}",
                        self.config.idle_timeout
                    );
                    self.lose(&reason, now, events);
                } else if now.saturating_duration_since(self.last_keepalive)
                    >= self.config.keepalive_interval
                {
                    self.last_keepalive = now;
                    self.send_keepalive();
                }
            }
            ChannelState::Closed => {}
        }
    }

    fn send_keepalive(&self) {
        let username = format!(
            "{}:{}",
            self.remote_credentials.ufrag, self.local_credentials.ufrag
        );
        match StunMessage::binding_request(username, false).encode(&self.remote_credentials.pwd) {
            Ok(bytes) => {
                if let Err(e) = self.socket.send_to(&bytes, self.remote) {
                    sink_debug!(self.log, "[CHANNEL] keepalive send failed: {}", e);
                }
            }
            Err(e) => sink_warn!(self.log, "[CHANNEL] encode keepalive: {}", e),
        }
    }

    /// Transport-level loss: close and report it as an event.
    fn lose(&mut self, reason: &str, now: Instant, events: &mut Vec<ChannelEvent>) {
        if self.state == ChannelState::Closed {
            return;
        }
        sink_warn!(self.log, "[CHANNEL] closed: {}", reason);
        self.shutdown(now);
        events.push(ChannelEvent::Close);
    }

    fn shutdown(&mut self, now: Instant) {
        self.state = ChannelState::Closed;
        self.linger_until = Some(now + LINGER);
        if let Some((_, assoc)) = self.association.as_mut() {
            let _ = assoc.shutdown();
            flush_transmits(assoc, &self.socket, self.remote, now, &self.log);
        }
    }

    /// Keeps the association alive just long enough to finish SHUTDOWN.
    /// STUN is no longer answered, so the peer's consent check fails too.
    fn linger(&mut self, now: Instant) {
        if self.linger_until.is_none_or(|t| now >= t) {
            return;
        }
        let mut buf = std::mem::take(&mut self.recv_buf);
        while let Ok((n, from)) = self.socket.recv_from(&mut buf) {
            if from == self.remote && !is_stun(&buf[..n]) {
                self.handle_sctp(now, buf[..n].to_vec());
            }
        }
        self.recv_buf = buf;
        if let Some((_, assoc)) = self.association.as_mut() {
            let _ = drain_association(assoc, &self.socket, self.remote, now, &self.log);
        }
    }
}

/// One pass over the association: timers, outbound packets, events.
fn drain_association(
    assoc: &mut Association,
    socket: &UdpSocket,
    remote: SocketAddr,
    now: Instant,
    log: &Arc<dyn LogSink>,
) -> AssociationOutput {
    let mut out = AssociationOutput::default();

    if let Some(deadline) = assoc.poll_timeout()
        && now >= deadline
    {
        assoc.handle_timeout(now);
    }
    flush_transmits(assoc, socket, remote, now, log);

    while let Some(event) = assoc.poll() {
        match event {
            Event::Connected => {
                if assoc.stream(STREAM_ID).is_err()
                    && let Err(e) = assoc.open_stream(STREAM_ID, PayloadProtocolIdentifier::String)
                {
                    sink_warn!(log, "[CHANNEL] could not open stream {}: {:?}", STREAM_ID, e);
                }
                out.connected = true;
            }
            Event::AssociationLost { reason } => {
                out.lost = Some(format!("{reason:?}"));
            }
            Event::Stream(StreamEvent::Readable { id }) => {
                read_stream(assoc, id, &mut out.frames, log);
            }
            _ => {}
        }
    }

    // reads and stream opens can produce SACKs
    flush_transmits(assoc, socket, remote, now, log);
    out
}

fn read_stream(assoc: &mut Association, id: u16, frames: &mut Vec<Vec<u8>>, log: &Arc<dyn LogSink>) {
    let mut stream = match assoc.stream(id) {
        Ok(s) => s,
        Err(e) => {
            sink_warn!(log, "[CHANNEL] stream {} readable but unavailable: {:?}", id, e);
            return;
        }
    };
    loop {
        match stream.read_sctp() {
            Ok(Some(chunks)) => {
                let mut buf = vec![0u8; chunks.len()];
                match chunks.read(&mut buf) {
                    Ok(len) => {
                        buf.truncate(len);
                        frames.push(buf);
                    }
                    Err(e) => sink_warn!(log, "[CHANNEL] dropping unreadable message: {:?}", e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                sink_warn!(log, "[CHANNEL] error reading stream {}: {:?}", id, e);
                break;
            }
        }
    }
}

fn flush_transmits(
    assoc: &mut Association,
    socket: &UdpSocket,
    remote: SocketAddr,
    now: Instant,
    log: &Arc<dyn LogSink>,
) {
    while let Some(transmit) = assoc.poll_transmit(now) {
        if let Payload::RawEncode(packets) = transmit.payload {
            for packet in packets {
                if let Err(e) = socket.send_to(&packet, remote) {
                    sink_debug!(log, "[CHANNEL] send failed: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;
    use crate::message::{Payload, PlayerState, RoomInfo};
    use std::sync::Mutex;
    use std::thread;

    fn socket() -> Arc<UdpSocket> {
        let s = UdpSocket::bind("127.0.0.1:0").unwrap();
        s.set_nonblocking(true).unwrap();
        Arc::new(s)
    }

    fn pair() -> (DataChannel, DataChannel) {
        pair_with(ChannelConfig::loopback())
    }

    fn pair_with(config: ChannelConfig) -> (DataChannel, DataChannel) {
        let (sa, sb) = (socket(), socket());
        let (ca, cb) = (IceCredentials::generate(), IceCredentials::generate());
        let path = |s: &Arc<UdpSocket>, peer: &Arc<UdpSocket>, l: &IceCredentials, r: &IceCredentials| {
            SelectedPath {
                socket: Arc::clone(s),
                local: s.local_addr().unwrap(),
                remote: peer.local_addr().unwrap(),
                local_credentials: l.clone(),
                remote_credentials: r.clone(),
                early_packets: Vec::new(),
            }
        };
        let log: Arc<dyn LogSink> = Arc::new(NoopLogSink);
        let client = DataChannel::new(
            path(&sa, &sb, &ca, &cb),
            SctpRole::Client,
            config.clone(),
            Arc::clone(&log),
        )
        .unwrap();
        let server = DataChannel::new(
            path(&sb, &sa, &cb, &ca),
            SctpRole::Server,
            config,
            log,
        )
        .unwrap();
        (client, server)
    }

    fn pump_until(
        a: &mut DataChannel,
        b: &mut DataChannel,
        limit: Duration,
        mut done: impl FnMut(&[ChannelEvent], &[ChannelEvent]) -> bool,
    ) -> bool {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            let now = Instant::now();
            let ea = a.poll(now);
            let eb = b.poll(now);
            if done(&ea, &eb) {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    fn open_pair() -> (DataChannel, DataChannel) {
        open_pair_with(ChannelConfig::loopback())
    }

    fn open_pair_with(config: ChannelConfig) -> (DataChannel, DataChannel) {
        let (mut client, mut server) = pair_with(config);
        let (mut a_open, mut b_open) = (false, false);
        assert!(pump_until(&mut client, &mut server, Duration::from_secs(5), |ea, eb| {
            a_open |= ea.contains(&ChannelEvent::Open);
            b_open |= eb.contains(&ChannelEvent::Open);
            a_open && b_open
        }));
        (client, server)
    }

    fn state_update(health: i32, at: u64) -> Envelope {
        Envelope::new(
            Payload::StateUpdate(PlayerState {
                health,
                ..PlayerState::default()
            }),
            at,
        )
    }

    #[test]
    fn opens_and_delivers_in_order() {
        let (mut client, mut server) = open_pair();
        assert!(client.is_open() && server.is_open());

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        server
            .on_message()
            .subscribe(move |env: &Envelope| sink.lock().unwrap().push(env.sent_at()))
            .unwrap();

        for i in 0..20 {
            client.send(&state_update(100 - i, u64::try_from(i).unwrap()));
        }
        assert!(pump_until(&mut client, &mut server, Duration::from_secs(5), |_, _| {
            received.lock().unwrap().len() == 20
        }));
        assert_eq!(*received.lock().unwrap(), (0..20).collect::<Vec<u64>>());
    }

    #[test]
    fn delivers_envelopes_above_64k_when_configured() {
        let (mut client, mut server) = open_pair_with(ChannelConfig {
            max_message_size: 200_000,
            ..ChannelConfig::loopback()
        });
        let big = Envelope::new(
            Payload::RoomJoin(RoomInfo {
                room_id: "x".repeat(100_000),
            }),
            3,
        );
        client.send(&big);

        let mut messages = Vec::new();
        assert!(pump_until(&mut client, &mut server, Duration::from_secs(5), |_, eb| {
            messages.extend(eb.iter().filter_map(|e| match e {
                ChannelEvent::Message(env) => Some(env.clone()),
                _ => None,
            }));
            !messages.is_empty()
        }));
        assert_eq!(messages, vec![big]);
    }

    #[test]
    fn malformed_frame_is_dropped_and_channel_stays_open() {
        let (mut client, mut server) = open_pair();
        assert!(client.send_frame(b"definitely not an envelope"));
        assert!(client.send_frame(br#"{"kind":"emote","data":{},"timestamp":1}"#));
        client.send(&state_update(80, 7));

        let mut messages = Vec::new();
        assert!(pump_until(&mut client, &mut server, Duration::from_secs(5), |_, eb| {
            messages.extend(eb.iter().filter_map(|e| match e {
                ChannelEvent::Message(env) => Some(env.clone()),
                _ => None,
            }));
            !messages.is_empty()
        }));
        assert_eq!(messages, vec![state_update(80, 7)]);
        assert!(server.is_open());
    }

    #[test]
    fn send_before_open_is_not_delivered() {
        let (mut client, mut server) = pair();
        client.send(&state_update(1, 1));
        assert!(!client.send_frame(b"{}"));

        let mut got_message = false;
        let mut a_open = false;
        pump_until(&mut client, &mut server, Duration::from_secs(2), |ea, eb| {
            a_open |= ea.contains(&ChannelEvent::Open);
            got_message |= eb.iter().any(|e| matches!(e, ChannelEvent::Message(_)));
            false
        });
        assert!(a_open);
        assert!(!got_message);
    }

    #[test]
    fn close_handle_closes_on_next_poll() {
        let (mut client, mut server) = open_pair();
        let handle = client.close_handle();
        assert!(handle.close());
        let events = client.poll(Instant::now());
        assert_eq!(events, vec![ChannelEvent::Close]);
        assert_eq!(client.state(), ChannelState::Closed);
        assert!(client.poll(Instant::now()).is_empty());
        client.send(&state_update(1, 1));

        // the peer notices through the association or the idle timeout
        assert!(pump_until(&mut client, &mut server, Duration::from_secs(8), |_, eb| {
            eb.contains(&ChannelEvent::Close)
        }));
        assert!(!server.close(), "already closed");
    }

    #[test]
    fn explicit_close_fires_hook_once() {
        let (mut client, _server) = open_pair();
        let closes = Arc::new(Mutex::new(0));
        let c = Arc::clone(&closes);
        client
            .on_close()
            .subscribe(move |_| *c.lock().unwrap() += 1)
            .unwrap();
        assert!(client.close());
        assert!(!client.close());
        client.poll(Instant::now());
        assert_eq!(*closes.lock().unwrap(), 1);
    }
}
