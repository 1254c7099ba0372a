//! Address resolution: channel identifiers to store field names
//!
//! Field names are a wire contract shared with the counterpart runtime and
//! must stay bit-exact:
//!
//! | consumer | ready flag               | payload                  |
//! |----------|--------------------------|--------------------------|
//! | py       | `__py_dispatch<addr>`    | `__py_registry<addr>`    |
//! | lua      | `__lua_dispatch<addr>`   | `__lua_registry<addr>`   |
//!
//! All four prefixes have distinct leading bytes and equal length within a
//! side, so no two (side, role, address) triples map to the same name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PY_DISPATCH: &str = "__py_dispatch";
const PY_REGISTRY: &str = "__py_registry";
const LUA_DISPATCH: &str = "__lua_dispatch";
const LUA_REGISTRY: &str = "__lua_registry";

/// One end of the bridge; also names the channel that end consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Py,
    Lua,
}

impl Side {
    /// The opposite end
    pub fn other(self) -> Side {
        match self {
            Side::Py => Side::Lua,
            Side::Lua => Side::Py,
        }
    }

    /// Runtime name used in heartbeat payloads
    pub fn runtime_name(self) -> &'static str {
        match self {
            Side::Py => "python",
            Side::Lua => "lua",
        }
    }

    fn dispatch_prefix(self) -> &'static str {
        match self {
            Side::Py => PY_DISPATCH,
            Side::Lua => LUA_DISPATCH,
        }
    }

    fn registry_prefix(self) -> &'static str {
        match self {
            Side::Py => PY_REGISTRY,
            Side::Lua => LUA_REGISTRY,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Py => write!(f, "py"),
            Side::Lua => write!(f, "lua"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "py" | "python" => Ok(Side::Py),
            "lua" => Ok(Side::Lua),
            _ => Err(format!("Unknown side: {}", s)),
        }
    }
}

/// Channel address; the empty address selects the primary channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self(suffix.into())
    }

    /// The primary (unsuffixed) channel
    pub fn primary() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_primary(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<Option<&str>> for Address {
    fn from(s: Option<&str>) -> Self {
        s.map(Address::from).unwrap_or_default()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_primary() {
            write!(f, "<primary>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// The two store fields backing one channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelFields {
    /// Code to execute ("registry")
    pub payload: String,
    /// Handshake flag ("dispatch")
    pub ready: String,
}

/// Field names for both directions of one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    /// Channel consumed by the py side
    pub to_py: ChannelFields,
    /// Channel consumed by the lua side
    pub to_lua: ChannelFields,
}

impl ResolvedAddress {
    /// Fields of the channel consumed by `side`
    pub fn for_side(&self, side: Side) -> &ChannelFields {
        match side {
            Side::Py => &self.to_py,
            Side::Lua => &self.to_lua,
        }
    }
}

/// Field names of the channel consumed by `side` at `address`
pub fn channel_fields(side: Side, address: &Address) -> ChannelFields {
    ChannelFields {
        payload: format!("{}{}", side.registry_prefix(), address.as_str()),
        ready: format!("{}{}", side.dispatch_prefix(), address.as_str()),
    }
}

/// Resolve an address into field names for both directions
pub fn resolve(address: &Address) -> ResolvedAddress {
    ResolvedAddress {
        to_py: channel_fields(Side::Py, address),
        to_lua: channel_fields(Side::Lua, address),
    }
}
