//! Command definitions
//!
//! The closed set of behaviors a decoded message can map to.

/// Dispatchable commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Read a value
    Get,
    /// Write locally, then replicate as `SyncPut`
    Put,
    /// Delete locally, then replicate as `SyncDelete`
    Delete,
    /// Write applied on behalf of a peer
    SyncPut,
    /// Delete applied on behalf of a peer
    SyncDelete,
    /// Read a value truncated to a length
    Head,
    /// Discovery heartbeat carrying a peer's identity and address
    Host,
    /// Probe every known peer
    Check,
    Nop,
    /// End this session
    Bye,
    /// Shut down the node
    Die,
    /// Anything without a handler
    Unknown,
}

impl Command {
    pub fn from_token(token: &str) -> Self {
        match token {
            "get" => Command::Get,
            "put" => Command::Put,
            "del" => Command::Delete,
            "spt" => Command::SyncPut,
            "sdl" => Command::SyncDelete,
            "hed" => Command::Head,
            "hst" => Command::Host,
            "chk" => Command::Check,
            "nop" => Command::Nop,
            "bye" => Command::Bye,
            "die" => Command::Die,
            _ => Command::Unknown,
        }
    }

    /// Wire token, `None` for `Unknown`
    pub fn token(self) -> Option<&'static str> {
        let token = match self {
            Command::Get => "get",
            Command::Put => "put",
            Command::Delete => "del",
            Command::SyncPut => "spt",
            Command::SyncDelete => "sdl",
            Command::Head => "hed",
            Command::Host => "hst",
            Command::Check => "chk",
            Command::Nop => "nop",
            Command::Bye => "bye",
            Command::Die => "die",
            Command::Unknown => return None,
        };
        Some(token)
    }
}
