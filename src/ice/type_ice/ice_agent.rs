use super::candidate::Candidate;
use super::candidate_pair::{CandidatePair, CandidatePairState};
use crate::ice::{
    gathering_service::gather_host_candidates,
    ice_config::IceConfig,
    ice_credentials::IceCredentials,
    ice_error::IceError,
    stun::{StunClass, StunMessage, TransactionId, is_stun},
    type_ice::candidate::TRANSPORT_UDP,
};
use crate::log::LogSink;
use crate::{sink_debug, sink_info, sink_trace, sink_warn};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    Arc,
    mpsc::{self, TryRecvError},
};
use std::thread;
use std::time::{Duration, Instant};

/// Reasonable upper bound to avoid combinatorial explosion.
const MAX_PAIR_LIMIT: usize = 100;
/// Non-STUN datagrams kept for the transport while checks are still running.
const MAX_EARLY_PACKETS: usize = 64;
const RECV_BUF_LEN: usize = 65_536;
/// Checks without an answer after this long are forgotten.
const PENDING_TTL: Duration = Duration::from_secs(5);

///Role for an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceRole {
    /// Makes the final decision on which candidate pair will be used.
    Controlling,
    /// Accepts the pair nominated by the controlling agent.
    Controlled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IceEvent {
    Selected {
        local: SocketAddr,
        remote: SocketAddr,
    },
    Failed(String),
}

/// The nominated path, handed to the transport once checks are over.
#[derive(Debug)]
pub struct SelectedPath {
    pub socket: Arc<UdpSocket>,
    pub local: SocketAddr,
    pub remote: SocketAddr,
    pub local_credentials: IceCredentials,
    pub remote_credentials: IceCredentials,
    /// Non-STUN datagrams from the remote that arrived before selection, in order.
    pub early_packets: Vec<Vec<u8>>,
}

#[derive(Debug)]
enum Gathering {
    Idle,
    Running(mpsc::Receiver<Result<Vec<Candidate>, IceError>>),
    Complete,
    Failed,
}

#[derive(Debug)]
struct PendingCheck {
    pair: usize,
    nominating: bool,
    sent_at: Instant,
}

#[derive(Debug)]
struct EarlyPacket {
    local: usize,
    from: SocketAddr,
    data: Vec<u8>,
}

/// Non-blocking ICE agent: gathering, connectivity checks and nomination.
///
/// Everything happens inside [`poll`](Self::poll); the agent never blocks the
/// caller except for [`gather_now`](Self::gather_now).
pub struct IceAgent {
    role: IceRole,
    config: IceConfig,
    credentials: IceCredentials,
    remote_credentials: Option<IceCredentials>,
    local_candidates: Vec<Candidate>,
    remote_candidates: Vec<Candidate>,
    pairs: Vec<CandidatePair>,
    pending: HashMap<TransactionId, PendingCheck>,
    gathering: Gathering,
    remote_set_at: Option<Instant>,
    checks_started: Option<Instant>,
    last_tick: Option<Instant>,
    selected: Option<usize>,
    outcome_reported: bool,
    early: Vec<EarlyPacket>,
    recv_buf: Vec<u8>,
    log: Arc<dyn LogSink>,
}

impl IceAgent {
    pub fn new(role: IceRole, config: IceConfig, log: Arc<dyn LogSink>) -> Self {
        Self {
            role,
            config,
            credentials: IceCredentials::generate(),
            remote_credentials: None,
            local_candidates: Vec::new(),
            remote_candidates: Vec::new(),
            pairs: Vec::new(),
            pending: HashMap::new(),
            gathering: Gathering::Idle,
            remote_set_at: None,
            checks_started: None,
            last_tick: None,
            selected: None,
            outcome_reported: false,
            early: Vec::new(),
            recv_buf: vec![0u8; RECV_BUF_LEN],
            log,
        }
    }

    pub fn role(&self) -> IceRole {
        self.role
    }

    pub fn credentials(&self) -> &IceCredentials {
        &self.credentials
    }

    pub fn local_candidates(&self) -> &[Candidate] {
        &self.local_candidates
    }

    pub fn pairs(&self) -> &[CandidatePair] {
        &self.pairs
    }

    pub fn is_gathering_complete(&self) -> bool {
        matches!(self.gathering, Gathering::Complete)
    }

    /// Starts gathering on a background thread; completion is reported by
    /// [`poll_gathering`](Self::poll_gathering).
    pub fn start_gathering(&mut self) -> Result<(), IceError> {
        if !matches!(self.gathering, Gathering::Idle) {
            return Ok(());
        }
        let (tx, rx) = mpsc::channel();
        let config = self.config.clone();
        let log = Arc::clone(&self.log);
        thread::Builder::new()
            .name("ice-gathering".into())
            .spawn(move || {
                let _ = tx.send(gather_host_candidates(&config, &log));
            })?;
        self.gathering = Gathering::Running(rx);
        sink_debug!(self.log, "[ICE] gathering started in background");
        Ok(())
    }

    /// Gathers on the calling thread.
    pub fn gather_now(&mut self) -> Result<(), IceError> {
        match gather_host_candidates(&self.config, &self.log) {
            Ok(candidates) => {
                self.finish_gathering(candidates);
                Ok(())
            }
            Err(e) => {
                self.gathering = Gathering::Failed;
                Err(e)
            }
        }
    }

    /// `Some` exactly once, when background gathering finishes.
    pub fn poll_gathering(&mut self) -> Option<Result<(), IceError>> {
        let result = match &self.gathering {
            Gathering::Running(rx) => rx.try_recv(),
            _ => return None,
        };
        match result {
            Ok(Ok(candidates)) => {
                self.finish_gathering(candidates);
                Some(Ok(()))
            }
            Ok(Err(e)) => {
                self.gathering = Gathering::Failed;
                Some(Err(e))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.gathering = Gathering::Failed;
                Some(Err(IceError::GatheringAborted))
            }
        }
    }

    fn finish_gathering(&mut self, candidates: Vec<Candidate>) {
        sink_info!(
            self.log,
            "[ICE] gathering complete: {} local candidate(s)",
            candidates.len()
        );
        self.local_candidates = candidates;
        self.gathering = Gathering::Complete;
    }

    /// Applies the peer's credentials and candidates and forms the check list.
    /// The controlling side starts its connect timer here; the controlled side
    /// starts it on the first authenticated check from its peer.
    pub fn set_remote(
        &mut self,
        credentials: IceCredentials,
        candidates: Vec<Candidate>,
    ) -> Result<(), IceError> {
        if self.remote_credentials.is_some() {
            return Err(IceError::RemoteAlreadySet);
        }
        if !self.is_gathering_complete() {
            return Err(IceError::NotGathered);
        }
        let usable: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| c.transport == TRANSPORT_UDP && c.component == 1)
            .map(|c| c.clone_light())
            .collect();
        if usable.is_empty() {
            return Err(IceError::NoRemoteCandidates);
        }

        self.remote_credentials = Some(credentials);
        self.remote_candidates = usable;
        self.form_candidate_pairs();
        let now = Instant::now();
        self.remote_set_at = Some(now);
        if self.role == IceRole::Controlling {
            self.checks_started = Some(now);
        }
        Ok(())
    }

    fn form_candidate_pairs(&mut self) {
        let mut pairs = Vec::new();
        for (li, local) in self.local_candidates.iter().enumerate() {
            for remote in &self.remote_candidates {
                let (l, r) = (local.address, remote.address);
                if l.is_ipv4() != r.is_ipv4() || l.ip().is_loopback() != r.ip().is_loopback() {
                    continue;
                }
                let priority = self.pair_priority(local.priority, remote.priority);
                pairs.push(CandidatePair::new(li, r, priority));
            }
        }
        pairs.sort_by(|a, b| b.priority.cmp(&a.priority));
        if pairs.len() > MAX_PAIR_LIMIT {
            sink_warn!(
                self.log,
                "[ICE] maximum candidate pair limit reached, dropping {}",
                pairs.len() - MAX_PAIR_LIMIT
            );
            pairs.truncate(MAX_PAIR_LIMIT);
        }
        sink_info!(self.log, "[ICE] formed {} candidate pair(s)", pairs.len());
        self.pairs = pairs;
    }

    fn pair_priority(&self, local: u32, remote: u32) -> u64 {
        match self.role {
            IceRole::Controlling => CandidatePair::compute_priority(local, remote),
            IceRole::Controlled => CandidatePair::compute_priority(remote, local),
        }
    }

    /// Drives checks. Returns the outcome once; `None` while still checking
    /// and after the outcome has been reported.
    pub fn poll(&mut self, now: Instant) -> Option<IceEvent> {
        if self.outcome_reported {
            return None;
        }
        self.receive(now);

        if let Some((local, remote)) = self.selected_addresses() {
            self.outcome_reported = true;
            return Some(IceEvent::Selected { local, remote });
        }

        let remote_set_at = self.remote_set_at?;
        let Some(started) = self.checks_started else {
            if now.saturating_duration_since(remote_set_at) >= self.config.answer_timeout {
                self.outcome_reported = true;
                sink_warn!(
                    self.log,
                    "[ICE] controlling peer never started checks within {:?}",
                    self.config.answer_timeout
                );
                return Some(IceEvent::Failed(format!(
                    "no check from the peer after {:?}",
                    self.config.answer_timeout
                )));
            }
            self.tick(now);
            return None;
        };
        if now.saturating_duration_since(started) >= self.config.connect_timeout {
            self.outcome_reported = true;
            sink_warn!(
                self.log,
                "[ICE] no candidate pair nominated within {:?}",
                self.config.connect_timeout
            );
            return Some(IceEvent::Failed(format!(
                "connectivity checks timed out after {:?}",
                self.config.connect_timeout
            )));
        }

        self.tick(now);
        None
    }

    fn tick(&mut self, now: Instant) {
        if self
            .last_tick
            .is_none_or(|t| now.saturating_duration_since(t) >= self.config.check_interval)
        {
            self.last_tick = Some(now);
            self.send_checks(now);
        }
    }

    fn selected_addresses(&self) -> Option<(SocketAddr, SocketAddr)> {
        let pair = self.pairs.get(self.selected?)?;
        let local = self.local_candidates.get(pair.local)?;
        Some((local.address, pair.remote))
    }

    /// Moves the nominated socket and the buffered early datagrams out of the agent.
    pub fn take_selected(&mut self) -> Option<SelectedPath> {
        let pair = self.pairs.get(self.selected?)?;
        let local = self.local_candidates.get(pair.local)?;
        let socket = local.socket.clone()?;
        let remote_credentials = self.remote_credentials.clone()?;
        let early_packets = std::mem::take(&mut self.early)
            .into_iter()
            .filter(|p| p.local == pair.local && p.from == pair.remote)
            .map(|p| p.data)
            .collect();
        Some(SelectedPath {
            socket,
            local: local.address,
            remote: pair.remote,
            local_credentials: self.credentials.clone(),
            remote_credentials,
            early_packets,
        })
    }

    fn receive(&mut self, now: Instant) {
        let mut buf = std::mem::take(&mut self.recv_buf);
        for idx in 0..self.local_candidates.len() {
            let Some(sock) = self.local_candidates[idx].socket.clone() else {
                continue;
            };
            loop {
                match sock.recv_from(&mut buf) {
                    Ok((n, from)) => self.handle_datagram(idx, from, &buf[..n], now),
                    Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                    // ICMP port unreachable surfaced on the next read (Windows)
                    Err(e) if e.kind() == ErrorKind::ConnectionReset => continue,
                    Err(e) => {
                        sink_debug!(self.log, "[ICE] recv error on candidate {}: {}", idx, e);
                        break;
                    }
                }
            }
        }
        self.recv_buf = buf;
    }

    fn handle_datagram(&mut self, local: usize, from: SocketAddr, data: &[u8], now: Instant) {
        if !is_stun(data) {
            if self.early.len() < MAX_EARLY_PACKETS {
                self.early.push(EarlyPacket {
                    local,
                    from,
                    data: data.to_vec(),
                });
            } else {
                sink_trace!(self.log, "[ICE] early packet buffer full, dropping");
            }
            return;
        }
        let msg = match StunMessage::decode(data) {
            Ok(m) => m,
            Err(e) => {
                sink_debug!(self.log, "[ICE] ignoring bad STUN from {}: {}", from, e);
                return;
            }
        };
        match msg.class {
            StunClass::Request => self.handle_request(local, from, &msg),
            StunClass::SuccessResponse => self.handle_response(from, &msg, now),
        }
    }

    fn handle_request(&mut self, local: usize, from: SocketAddr, msg: &StunMessage) {
        let expected_prefix = format!("{}:", self.credentials.ufrag);
        let user_ok = msg
            .username
            .as_deref()
            .is_some_and(|u| u.starts_with(&expected_prefix));
        if !user_ok || !msg.verify_integrity(&self.credentials.pwd) {
            sink_debug!(self.log, "[ICE] rejecting check from {}: bad credentials", from);
            return;
        }

        let response = StunMessage::success_response(msg.transaction_id, from);
        match response.encode(&self.credentials.pwd) {
            Ok(bytes) => {
                if let Some(sock) = &self.local_candidates[local].socket
                    && let Err(e) = sock.send_to(&bytes, from)
                {
                    sink_debug!(self.log, "[ICE] failed to answer check from {}: {}", from, e);
                }
            }
            Err(e) => sink_warn!(self.log, "[ICE] failed to encode response: {}", e),
        }

        // pairs only exist once the remote description is known
        if self.remote_credentials.is_none() {
            return;
        }
        if self.checks_started.is_none() {
            sink_debug!(self.log, "[ICE] first check from {}, connect timer started", from);
            self.checks_started = Some(Instant::now());
        }
        let pair = self.find_or_add_pair(local, from);
        if self.role == IceRole::Controlled && msg.use_candidate && self.selected.is_none() {
            sink_info!(
                self.log,
                "[ICE] pair {} <-> {} nominated by controlling agent",
                self.local_candidates[local].address,
                from
            );
            self.selected = Some(pair);
        }
    }

    fn find_or_add_pair(&mut self, local: usize, remote: SocketAddr) -> usize {
        if let Some(i) = self
            .pairs
            .iter()
            .position(|p| p.local == local && p.remote == remote)
        {
            return i;
        }
        let priority = self.pair_priority(
            self.local_candidates[local].priority,
            Candidate::peer_reflexive_priority(),
        );
        sink_debug!(self.log, "[ICE] learned peer-reflexive candidate {}", remote);
        self.pairs.push(CandidatePair::new(local, remote, priority));
        self.pairs.len() - 1
    }

    fn handle_response(&mut self, from: SocketAddr, msg: &StunMessage, now: Instant) {
        let Some(remote) = &self.remote_credentials else {
            return;
        };
        let Some(check) = self.pending.remove(&msg.transaction_id) else {
            sink_trace!(self.log, "[ICE] response for unknown transaction from {}", from);
            return;
        };
        if !msg.verify_integrity(&remote.pwd) {
            sink_debug!(self.log, "[ICE] response from {} failed integrity", from);
            return;
        }
        let Some(pair) = self.pairs.get_mut(check.pair) else {
            return;
        };
        if pair.remote != from {
            sink_debug!(self.log, "[ICE] response from unexpected address {}", from);
            return;
        }
        if pair.state != CandidatePairState::Succeeded {
            pair.state = CandidatePairState::Succeeded;
            sink_debug!(
                self.log,
                "[ICE] pair -> {} succeeded in {:?} (mapped {:?})",
                from,
                now.saturating_duration_since(check.sent_at),
                msg.mapped_address
            );
        }
        if check.nominating && self.role == IceRole::Controlling && self.selected.is_none() {
            sink_info!(self.log, "[ICE] nominated pair -> {} confirmed", from);
            self.selected = Some(check.pair);
        }
    }

    fn send_checks(&mut self, now: Instant) {
        let Some(remote) = self.remote_credentials.clone() else {
            return;
        };
        self.pending
            .retain(|_, p| now.saturating_duration_since(p.sent_at) < PENDING_TTL);
        let username = format!("{}:{}", remote.ufrag, self.credentials.ufrag);

        if self.role == IceRole::Controlling
            && let Some(best) = self.best_succeeded()
        {
            self.send_check(best, &username, &remote.pwd, true, now);
            return;
        }
        for i in 0..self.pairs.len() {
            if matches!(
                self.pairs[i].state,
                CandidatePairState::Waiting | CandidatePairState::InProgress
            ) {
                self.send_check(i, &username, &remote.pwd, false, now);
            }
        }
    }

    fn best_succeeded(&self) -> Option<usize> {
        self.pairs
            .iter()
            .enumerate()
            .filter(|(_, p)| p.state == CandidatePairState::Succeeded)
            .max_by_key(|(_, p)| p.priority)
            .map(|(i, _)| i)
    }

    fn send_check(&mut self, i: usize, username: &str, pwd: &str, nominating: bool, now: Instant) {
        let (local, remote) = (self.pairs[i].local, self.pairs[i].remote);
        let Some(sock) = self
            .local_candidates
            .get(local)
            .and_then(|c| c.socket.clone())
        else {
            return;
        };
        let request = StunMessage::binding_request(username, nominating);
        let bytes = match request.encode(pwd) {
            Ok(b) => b,
            Err(e) => {
                sink_warn!(self.log, "[ICE] failed to encode check: {}", e);
                return;
            }
        };
        match sock.send_to(&bytes, remote) {
            Ok(_) => {
                self.pending.insert(
                    request.transaction_id,
                    PendingCheck {
                        pair: i,
                        nominating,
                        sent_at: now,
                    },
                );
                if self.pairs[i].state == CandidatePairState::Waiting {
                    self.pairs[i].state = CandidatePairState::InProgress;
                }
                sink_trace!(
                    self.log,
                    "[ICE] check -> {} (nominating: {})",
                    remote,
                    nominating
                );
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => {
                sink_debug!(self.log, "[ICE] pair -> {} failed: {}", remote, e);
                self.pairs[i].state = CandidatePairState::Failed;
            }
        }
    }
}
