use crate::negotiation::{negotiation_state::NegotiationState, role::Role};

/// The one connection a session negotiates.
///
/// Role and descriptions are write-once; the engine is the only writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    role: Option<Role>,
    room_id: String,
    state: NegotiationState,
    local_description: Option<String>,
    remote_description: Option<String>,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection {
    pub fn new() -> Self {
        Self {
            role: None,
            room_id: String::new(),
            state: NegotiationState::Idle,
            local_description: None,
            remote_description: None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Empty until a room is created or joined.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn local_description(&self) -> Option<&str> {
        self.local_description.as_deref()
    }

    pub fn remote_description(&self) -> Option<&str> {
        self.remote_description.as_deref()
    }

    pub(crate) fn assign(&mut self, role: Role, room_id: String) {
        if self.role.is_none() {
            self.role = Some(role);
            self.room_id = room_id;
        }
    }

    pub(crate) fn set_state(&mut self, state: NegotiationState) {
        self.state = state;
    }

    pub(crate) fn set_local_description(&mut self, text: String) {
        if self.local_description.is_none() {
            self.local_description = Some(text);
        }
    }

    pub(crate) fn set_remote_description(&mut self, text: String) {
        if self.remote_description.is_none() {
            self.remote_description = Some(text);
        }
    }
}
