use crate::negotiation::{negotiation_error::NegotiationError, role::Role};

/// Where a connection is in the offer/answer exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    /// Gathering candidates for our own description.
    AwaitingLocalDescription { role: Role },
    /// Host only: the offer is out, waiting for the answer to be relayed back.
    AwaitingRemoteDescription,
    /// Both descriptions are set; connectivity checks and the SCTP handshake run.
    Checking { role: Role },
    Connected { role: Role },
    /// Terminal.
    Failed,
}

/// Inputs to [`transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationEvent {
    CreateRoom,
    RemoteOffer,
    LocalDescriptionReady,
    RemoteAnswer,
    TransportConnected,
    TransportFailed,
}

impl NegotiationState {
    /// The role this state belongs to, if one has been assigned.
    pub fn role(&self) -> Option<Role> {
        match *self {
            NegotiationState::AwaitingLocalDescription { role }
            | NegotiationState::Checking { role }
            | NegotiationState::Connected { role } => Some(role),
            NegotiationState::AwaitingRemoteDescription => Some(Role::Host),
            NegotiationState::Idle | NegotiationState::Failed => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, NegotiationState::Connected { .. })
    }

    pub fn is_terminal(&self) -> bool {
        *self == NegotiationState::Failed
    }
}

/// Pure state transition. An error leaves the caller's state untouched.
pub fn transition(
    state: NegotiationState,
    event: NegotiationEvent,
) -> Result<NegotiationState, NegotiationError> {
    use NegotiationEvent as E;
    use NegotiationState as S;

    match (state, event) {
        (S::Failed, _) => Err(NegotiationError::Terminal),

        (S::Idle, E::CreateRoom) => Ok(S::AwaitingLocalDescription { role: Role::Host }),
        (S::Idle, E::RemoteOffer) => Ok(S::AwaitingLocalDescription { role: Role::Guest }),

        (S::AwaitingLocalDescription { role: Role::Host }, E::LocalDescriptionReady) => {
            Ok(S::AwaitingRemoteDescription)
        }
        (S::AwaitingLocalDescription { role: Role::Guest }, E::LocalDescriptionReady) => {
            Ok(S::Checking { role: Role::Guest })
        }
        (S::AwaitingRemoteDescription, E::RemoteAnswer) => Ok(S::Checking { role: Role::Host }),
        (S::Checking { role }, E::TransportConnected) => Ok(S::Connected { role }),

        (S::Idle, E::TransportFailed) => Err(NegotiationError::InvalidTransition { state, event }),
        (_, E::TransportFailed) => Ok(S::Failed),

        // role-specific inputs arriving on the other side of the session
        (s, E::RemoteOffer | E::CreateRoom) if s.role() == Some(Role::Host) => {
            Err(NegotiationError::RoleMismatch { role: Role::Host, event })
        }
        (s, E::RemoteAnswer | E::CreateRoom) if s.role() == Some(Role::Guest) => {
            Err(NegotiationError::RoleMismatch { role: Role::Guest, event })
        }

        (state, event) => Err(NegotiationError::InvalidTransition { state, event }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const ALL_EVENTS: [NegotiationEvent; 6] = [
        NegotiationEvent::CreateRoom,
        NegotiationEvent::RemoteOffer,
        NegotiationEvent::LocalDescriptionReady,
        NegotiationEvent::RemoteAnswer,
        NegotiationEvent::TransportConnected,
        NegotiationEvent::TransportFailed,
    ];

    fn all_states() -> Vec<NegotiationState> {
        let mut states = vec![
            NegotiationState::Idle,
            NegotiationState::AwaitingRemoteDescription,
            NegotiationState::Failed,
        ];
        for role in [Role::Host, Role::Guest] {
            states.push(NegotiationState::AwaitingLocalDescription { role });
            states.push(NegotiationState::Checking { role });
            states.push(NegotiationState::Connected { role });
        }
        states
    }

    fn run(events: &[NegotiationEvent]) -> Result<NegotiationState, NegotiationError> {
        events
            .iter()
            .try_fold(NegotiationState::Idle, |s, e| transition(s, *e))
    }

    #[test]
    fn host_happy_path() {
        let end = run(&[
            NegotiationEvent::CreateRoom,
            NegotiationEvent::LocalDescriptionReady,
            NegotiationEvent::RemoteAnswer,
            NegotiationEvent::TransportConnected,
        ])
        .unwrap();
        assert_eq!(end, NegotiationState::Connected { role: Role::Host });
    }

    #[test]
    fn guest_happy_path() {
        let end = run(&[
            NegotiationEvent::RemoteOffer,
            NegotiationEvent::LocalDescriptionReady,
            NegotiationEvent::TransportConnected,
        ])
        .unwrap();
        assert_eq!(end, NegotiationState::Connected { role: Role::Guest });
    }

    #[test]
    fn second_offer_is_rejected_for_both_roles() {
        let host = NegotiationState::AwaitingRemoteDescription;
        assert!(matches!(
            transition(host, NegotiationEvent::RemoteOffer),
            Err(NegotiationError::RoleMismatch { role: Role::Host, .. })
        ));
        let guest = NegotiationState::Checking { role: Role::Guest };
        assert!(matches!(
            transition(guest, NegotiationEvent::RemoteOffer),
            Err(NegotiationError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn answer_before_offer_is_rejected() {
        assert!(matches!(
            transition(NegotiationState::Idle, NegotiationEvent::RemoteAnswer),
            Err(NegotiationError::InvalidTransition { .. })
        ));
        let gathering = NegotiationState::AwaitingLocalDescription { role: Role::Host };
        assert!(transition(gathering, NegotiationEvent::RemoteAnswer).is_err());
        let guest = NegotiationState::Checking { role: Role::Guest };
        assert!(matches!(
            transition(guest, NegotiationEvent::RemoteAnswer),
            Err(NegotiationError::RoleMismatch { role: Role::Guest, .. })
        ));
    }

    #[test]
    fn failure_reachable_from_every_non_idle_state() {
        for state in all_states() {
            let result = transition(state, NegotiationEvent::TransportFailed);
            match state {
                NegotiationState::Idle => assert!(result.is_err()),
                NegotiationState::Failed => {
                    assert!(matches!(result, Err(NegotiationError::Terminal)));
                }
                _ => assert_eq!(result.unwrap(), NegotiationState::Failed),
            }
        }
    }

    #[test]
    fn transition_is_total_and_failed_rejects_everything() {
        for state in all_states() {
            for event in ALL_EVENTS {
                // every pair yields a state or an error; none panics
                let result = transition(state, event);
                if state == NegotiationState::Failed {
                    assert!(matches!(result, Err(NegotiationError::Terminal)));
                }
            }
        }
    }

    #[test]
    fn connected_only_accepts_failure() {
        for role in [Role::Host, Role::Guest] {
            let state = NegotiationState::Connected { role };
            for event in ALL_EVENTS {
                let result = transition(state, event);
                if event == NegotiationEvent::TransportFailed {
                    assert_eq!(result.unwrap(), NegotiationState::Failed);
                } else {
                    assert!(result.is_err(), "{event:?} accepted in {state:?}");
                }
            }
        }
    }
}
