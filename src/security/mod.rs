//! Header policy for both directions of the relay.

pub mod headers;
