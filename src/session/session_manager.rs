use crate::log::LogSink;
use crate::message::{Envelope, Payload, PlayerState, ShootEvent};
use crate::negotiation::{EngineNotice, NegotiationEngine, NegotiationState, Role};
use crate::session::{
    room_id::RoomId, session_config::SessionConfig, session_error::SessionError,
};
use crate::subscription::Hook;
use crate::transport::{ChannelEvent, DataChannel};
use crate::utils::MonotonicClock;
use crate::{sink_debug, sink_info};
use std::sync::Arc;
use std::time::Instant;

/// The façade the game talks to: one two-peer session from room creation
/// to teardown.
///
/// Nothing runs in the background on the caller's behalf; call
/// [`poll`](Self::poll) from the game loop. Every hook fires from inside
/// `poll` (or from [`close`](Self::close)), never from another thread.
///
/// ```no_run
/// use duelrtc::session::{Session, SessionConfig};
/// use duelrtc::log::NoopLogSink;
/// use std::sync::Arc;
///
/// let mut host = Session::new(SessionConfig::default(), Arc::new(NoopLogSink));
/// host.on_offer_ready()
///     .subscribe(|offer: &String| println!("send this to your friend:\n{offer}"))
///     .ok();
/// let room = host.create_room()?;
/// println!("room {room}");
/// loop {
///     host.poll();
///     # break;
/// }
/// # Ok::<(), duelrtc::session::SessionError>(())
/// ```
pub struct Session {
    engine: NegotiationEngine,
    channel: Option<DataChannel>,
    clock: MonotonicClock,
    room_id_length: usize,
    close_notified: bool,
    log: Arc<dyn LogSink>,
    on_open: Hook<()>,
    on_close: Hook<()>,
    on_message: Hook<Envelope>,
    on_offer_ready: Hook<String>,
    on_answer_ready: Hook<String>,
}

impl Session {
    pub fn new(config: SessionConfig, log: Arc<dyn LogSink>) -> Self {
        Self {
            engine: NegotiationEngine::new(config.ice, config.channel, Arc::clone(&log)),
            channel: None,
            clock: MonotonicClock::new(),
            room_id_length: config.room_id_length,
            close_notified: false,
            log,
            on_open: Hook::new(),
            on_close: Hook::new(),
            on_message: Hook::new(),
            on_offer_ready: Hook::new(),
            on_answer_ready: Hook::new(),
        }
    }

    /// Becomes the host. The offer arrives later through `on_offer_ready`.
    pub fn create_room(&mut self) -> Result<RoomId, SessionError> {
        let room = RoomId::generate(self.room_id_length);
        self.engine.create_room(room.as_str())?;
        sink_info!(self.log, "[SESSION] hosting room {}", room);
        Ok(room)
    }

    /// Becomes the guest of `room_id` and returns the answer to relay back.
    pub fn join_room(&mut self, room_id: &str, offer: &str) -> Result<String, SessionError> {
        let room: RoomId = room_id.parse()?;
        let answer = self.engine.join_room(room.as_str(), offer)?;
        sink_info!(self.log, "[SESSION] joined room {}", room);
        Ok(answer)
    }

    /// Host only: consumes the guest's answer.
    pub fn finalize(&mut self, answer: &str) -> Result<(), SessionError> {
        self.engine.finalize(answer)?;
        Ok(())
    }

    /// Sends `envelope` once connected; before that (or after close) it is
    /// dropped without error.
    pub fn send_message(&mut self, envelope: &Envelope) {
        match self.channel.as_mut() {
            Some(channel) if self.engine.state().is_connected() => channel.send(envelope),
            _ => sink_debug!(
                self.log,
                "[SESSION] not connected, dropping {}",
                envelope.kind()
            ),
        }
    }

    /// Stamps `payload` with this session's clock and sends it.
    pub fn send(&mut self, payload: Payload) {
        let envelope = Envelope::new(payload, self.clock.stamp());
        self.send_message(&envelope);
    }

    pub fn send_state_update(&mut self, state: PlayerState) {
        self.send(Payload::StateUpdate(state));
    }

    pub fn send_shoot(&mut self, shot: ShootEvent) {
        self.send(Payload::Shoot(shot));
    }

    /// Drives negotiation and the channel, firing hooks for whatever happened.
    pub fn poll(&mut self) {
        let now = Instant::now();
        for notice in self.engine.poll(now) {
            match notice {
                EngineNotice::OfferReady(offer) => {
                    self.on_offer_ready.emit(&offer);
                }
                EngineNotice::AnswerReady(answer) => {
                    self.on_answer_ready.emit(&answer);
                }
                EngineNotice::ChannelOpen {
                    channel,
                    early_events,
                } => {
                    sink_info!(self.log, "[SESSION] connected as {:?}", self.role());
                    self.channel = Some(channel);
                    self.on_open.emit(&());
                    self.handle_channel_events(early_events);
                }
                EngineNotice::Failed(reason) => {
                    sink_info!(self.log, "[SESSION] negotiation failed: {}", reason);
                    self.notify_close();
                }
            }
        }

        if let Some(channel) = self.channel.as_mut() {
            let events = channel.poll(now);
            self.handle_channel_events(events);
        }
    }

    fn handle_channel_events(&mut self, events: Vec<ChannelEvent>) {
        for event in events {
            match event {
                ChannelEvent::Open => {}
                ChannelEvent::Message(envelope) => {
                    self.on_message.emit(&envelope);
                }
                ChannelEvent::Close => {
                    self.engine.transport_lost("channel closed");
                    self.notify_close();
                }
            }
        }
    }

    fn notify_close(&mut self) {
        if !self.close_notified {
            self.close_notified = true;
            self.on_close.emit(&());
        }
    }

    /// Ends the session and releases the transport. Safe to call more than
    /// once; `on_close` fires at most once and only if a room was started.
    pub fn close(&mut self) {
        let started = self.engine.state() != NegotiationState::Idle;
        if let Some(channel) = self.channel.as_mut() {
            channel.close();
        }
        self.engine.teardown();
        if started {
            sink_info!(self.log, "[SESSION] closed");
            self.notify_close();
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.engine.state()
    }

    pub fn role(&self) -> Option<Role> {
        self.engine.connection().role()
    }

    pub fn is_host(&self) -> bool {
        self.role() == Some(Role::Host)
    }

    pub fn is_connected(&self) -> bool {
        self.engine.state().is_connected()
    }

    /// Empty until a room is created or joined.
    pub fn room_id(&self) -> &str {
        self.engine.connection().room_id()
    }

    pub fn local_description(&self) -> Option<&str> {
        self.engine.connection().local_description()
    }

    pub fn remote_description(&self) -> Option<&str> {
        self.engine.connection().remote_description()
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

    pub fn on_offer_ready(&mut self) -> &mut Hook<String> {
        &mut self.on_offer_ready
    }

    pub fn on_answer_ready(&mut self) -> &mut Hook<String> {
        &mut self.on_answer_ready
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
