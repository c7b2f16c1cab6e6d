use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidatePairState {
    Waiting,
    InProgress,
    Succeeded,
    Failed,
}

/// A local candidate (by index into the agent's list) matched with a remote address.
#[derive(Debug, Clone)]
pub struct CandidatePair {
    pub local: usize,
    pub remote: SocketAddr,
    pub priority: u64,
    pub state: CandidatePairState,
}

impl CandidatePair {
    pub fn new(local: usize, remote: SocketAddr, priority: u64) -> Self {
        Self {
            local,
            remote,
            priority,
            state: CandidatePairState::Waiting,
        }
    }

    /// RFC 8445 §6.1.2.3: `2^32*MIN(G,D) + 2*MAX(G,D) + (G>D?1:0)`,
    /// G being the controlling agent's candidate priority.
    pub fn compute_priority(controlling: u32, controlled: u32) -> u64 {
        let (g, d) = (u64::from(controlling), u64::from(controlled));
        (g.min(d) << 32) + 2 * g.max(d) + u64::from(g > d)
    }
}
