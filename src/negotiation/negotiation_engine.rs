use crate::ice::{IceAgent, IceConfig, IceEvent, IceRole};
use crate::log::LogSink;
use crate::negotiation::{
    connection::Connection,
    engine_notice::EngineNotice,
    negotiation_error::NegotiationError,
    negotiation_state::{NegotiationEvent, NegotiationState, transition},
    role::Role,
    session_description::{DescriptionKind, SessionDescription},
};
use crate::transport::{ChannelConfig, ChannelEvent, CloseHandle, DataChannel, SctpRole};
use crate::{sink_debug, sink_info, sink_warn};
use rand::{RngCore, rngs::OsRng};
use std::sync::Arc;
use std::time::Instant;

/// Drives one connection from `Idle` to an open [`DataChannel`].
///
/// The host gathers in the background and reports its offer from
/// [`poll`](Self::poll); the guest gathers inline so that
/// [`join_room`](Self::join_room) can return the answer directly. Once both
/// descriptions are set, `poll` runs the connectivity checks and the SCTP
/// handshake, then hands the open channel to the caller and keeps only a
/// [`CloseHandle`].
pub struct NegotiationEngine {
    connection: Connection,
    ice_config: IceConfig,
    channel_config: ChannelConfig,
    session_id: u64,
    agent: Option<IceAgent>,
    local: Option<SessionDescription>,
    channel: Option<DataChannel>,
    close_handle: Option<CloseHandle>,
    pending: Vec<EngineNotice>,
    log: Arc<dyn LogSink>,
}

impl NegotiationEngine {
    pub fn new(ice_config: IceConfig, channel_config: ChannelConfig, log: Arc<dyn LogSink>) -> Self {
        Self {
            connection: Connection::new(),
            ice_config,
            channel_config,
            session_id: OsRng.next_u64() >> 1,
            agent: None,
            local: None,
            channel: None,
            close_handle: None,
            pending: Vec::new(),
            log,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn state(&self) -> NegotiationState {
        self.connection.state()
    }

    /// Weak reference to the channel, once one exists.
    pub fn close_handle(&self) -> Option<&CloseHandle> {
        self.close_handle.as_ref()
    }

    fn apply(&mut self, event: NegotiationEvent) -> Result<(), NegotiationError> {
        let prev = self.connection.state();
        let next = transition(prev, event)?;
        sink_info!(
            self.log,
            "[NEGOTIATION] {:?} --{:?}--> {:?}",
            prev,
            event,
            next
        );
        self.connection.set_state(next);
        Ok(())
    }

    /// Host entry point: assigns the role and starts gathering. The offer is
    /// reported later as [`EngineNotice::OfferReady`].
    pub fn create_room(&mut self, room_id: impl Into<String>) -> Result<(), NegotiationError> {
        transition(self.state(), NegotiationEvent::CreateRoom)?;

        let mut agent = IceAgent::new(
            IceRole::Controlling,
            self.ice_config.clone(),
            Arc::clone(&self.log),
        );
        agent.start_gathering()?;
        self.agent = Some(agent);
        self.connection.assign(Role::Host, room_id.into());
        self.apply(NegotiationEvent::CreateRoom)
    }

    /// Guest entry point: consumes the offer, gathers and returns the answer.
    /// The answer is also reported once as [`EngineNotice::AnswerReady`].
    pub fn join_room(
        &mut self,
        room_id: impl Into<String>,
        offer: &str,
    ) -> Result<String, NegotiationError> {
        transition(self.state(), NegotiationEvent::RemoteOffer)?;

        let remote = SessionDescription::parse(offer)?;
        if remote.kind != DescriptionKind::Offer {
            return Err(NegotiationError::UnexpectedArtifact {
                expected: DescriptionKind::Offer,
                found: remote.kind,
            });
        }
        sink_info!(
            self.log,
            "[NEGOTIATION] offer consumed: session {} with {} candidate(s)",
            remote.session_id,
            remote.candidates.len()
        );

        let mut agent = IceAgent::new(
            IceRole::Controlled,
            self.ice_config.clone(),
            Arc::clone(&self.log),
        );
        agent.gather_now()?;
        let answer = SessionDescription::answer(
            &remote,
            self.session_id,
            agent.credentials().clone(),
            agent.local_candidates(),
        );
        agent.set_remote(remote.credentials, remote.candidates)?;

        let text = answer.encode();
        sink_info!(
            self.log,
            "[NEGOTIATION] answer ready with {} candidate(s)",
            answer.candidates.len()
        );
        self.agent = Some(agent);
        self.local = Some(answer);
        self.connection.assign(Role::Guest, room_id.into());
        self.connection.set_remote_description(offer.trim().to_owned());
        self.connection.set_local_description(text.clone());
        self.apply(NegotiationEvent::RemoteOffer)?;
        self.apply(NegotiationEvent::LocalDescriptionReady)?;
        self.pending.push(EngineNotice::AnswerReady(text.clone()));
        Ok(text)
    }

    /// Host: consumes the guest's answer. It must answer our own offer.
    pub fn finalize(&mut self, answer: &str) -> Result<(), NegotiationError> {
        let state = self.state();
        transition(state, NegotiationEvent::RemoteAnswer)?;

        let remote = SessionDescription::parse(answer)?;
        if remote.kind != DescriptionKind::Answer {
            return Err(NegotiationError::UnexpectedArtifact {
                expected: DescriptionKind::Answer,
                found: remote.kind,
            });
        }
        let (Some(offer), Some(agent)) = (self.local.as_ref(), self.agent.as_mut()) else {
            return Err(NegotiationError::InvalidTransition {
                state,
                event: NegotiationEvent::RemoteAnswer,
            });
        };
        if remote.offer_digest.as_deref() != Some(offer.digest().as_str()) {
            sink_warn!(
                self.log,
                "[NEGOTIATION] rejecting answer bound to another offer"
            );
            return Err(NegotiationError::ForeignAnswer);
        }
        agent.set_remote(remote.credentials, remote.candidates)?;

        sink_info!(self.log, "[NEGOTIATION] answer consumed");
        self.connection
            .set_remote_description(answer.trim().to_owned());
        self.apply(NegotiationEvent::RemoteAnswer)
    }

    /// Drives gathering, checks and the handshake. Never blocks.
    pub fn poll(&mut self, now: Instant) -> Vec<EngineNotice> {
        let mut notices = std::mem::take(&mut self.pending);
        match self.state() {
            NegotiationState::AwaitingLocalDescription { role: Role::Host } => {
                self.poll_gathering(&mut notices);
            }
            NegotiationState::AwaitingRemoteDescription => {
                // answer early checks from the guest while the answer is relayed
                if let Some(agent) = self.agent.as_mut() {
                    let _ = agent.poll(now);
                }
            }
            NegotiationState::Checking { role } => self.poll_checking(role, now, &mut notices),
            _ => {}
        }
        notices
    }

    fn poll_gathering(&mut self, notices: &mut Vec<EngineNotice>) {
        let Some(agent) = self.agent.as_mut() else {
            return;
        };
        match agent.poll_gathering() {
            None => {}
            Some(Ok(())) => {
                let offer = SessionDescription::offer(
                    self.session_id,
                    agent.credentials().clone(),
                    agent.local_candidates(),
                );
                let text = offer.encode();
                sink_info!(
                    self.log,
                    "[NEGOTIATION] offer ready with {} candidate(s)",
                    offer.candidates.len()
                );
                self.local = Some(offer);
                self.connection.set_local_description(text.clone());
                if self.apply(NegotiationEvent::LocalDescriptionReady).is_ok() {
                    notices.push(EngineNotice::OfferReady(text));
                }
            }
            Some(Err(e)) => self.fail(format!("candidate gathering failed: {e}"), notices),
        }
    }

    fn poll_checking(&mut self, role: Role, now: Instant, notices: &mut Vec<EngineNotice>) {
        if self.channel.is_none() {
            let Some(agent) = self.agent.as_mut() else {
                return;
            };
            match agent.poll(now) {
                None => return,
                Some(IceEvent::Failed(reason)) => {
                    self.fail(reason, notices);
                    return;
                }
                Some(IceEvent::Selected { local, remote }) => {
                    let Some(path) = agent.take_selected() else {
                        self.fail("selected path is no longer available", notices);
                        return;
                    };
                    sink_info!(
                        self.log,
                        "[NEGOTIATION] path selected {} <-> {}",
                        local,
                        remote
                    );
                    let sctp_role = match role {
                        Role::Host => SctpRole::Client,
                        Role::Guest => SctpRole::Server,
                    };
                    match DataChannel::new(
                        path,
                        sctp_role,
                        self.channel_config.clone(),
                        Arc::clone(&self.log),
                    ) {
                        Ok(channel) => {
                            self.close_handle = Some(channel.close_handle());
                            self.channel = Some(channel);
                        }
                        Err(e) => {
                            self.fail(format!("could not start channel: {e}"), notices);
                            return;
                        }
                    }
                    // the other candidate sockets are no longer needed
                    self.agent = None;
                }
            }
        }

        let Some(channel) = self.channel.as_mut() else {
            return;
        };
        let mut events = channel.poll(now);
        if let Some(pos) = events.iter().position(|e| *e == ChannelEvent::Open) {
            let early_events = events.split_off(pos + 1);
            if self.apply(NegotiationEvent::TransportConnected).is_ok()
                && let Some(channel) = self.channel.take()
            {
                sink_debug!(
                    self.log,
                    "[NEGOTIATION] handing off open channel ({} early event(s))",
                    early_events.len()
                );
                notices.push(EngineNotice::ChannelOpen {
                    channel,
                    early_events,
                });
            }
        } else if events.contains(&ChannelEvent::Close) {
            self.fail("channel closed before opening", notices);
        }
    }

    fn fail(&mut self, reason: impl Into<String>, notices: &mut Vec<EngineNotice>) {
        let reason = reason.into();
        if self.apply(NegotiationEvent::TransportFailed).is_err() {
            return;
        }
        sink_warn!(self.log, "[NEGOTIATION] failed: {}", reason);
        self.release();
        notices.push(EngineNotice::Failed(reason));
    }

    /// Reports the loss of a channel that was already handed off. Returns
    /// whether this moved the engine to `Failed`.
    pub fn transport_lost(&mut self, reason: &str) -> bool {
        if self.apply(NegotiationEvent::TransportFailed).is_err() {
            return false;
        }
        sink_info!(self.log, "[NEGOTIATION] transport lost: {}", reason);
        self.release();
        true
    }

    /// Releases everything the engine still holds. A channel that was already
    /// handed off is closed through its handle. Any negotiation in progress
    /// ends as `Failed`.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.close_handle.take()
            && self.channel.is_none()
        {
            handle.close();
        }
        let _ = self.transport_lost("torn down");
        self.release();
        self.pending.clear();
    }

    fn release(&mut self) {
        self.agent = None;
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
    }
}

impl Drop for NegotiationEngine {
    fn drop(&mut self) {
        self.release();
    }
}
