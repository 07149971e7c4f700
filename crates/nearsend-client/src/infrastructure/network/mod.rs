//! Network infrastructure for the client.
//!
//! # Sub-modules
//!
//! - **`peer_table`** – The discovery engine the client queries.  It answers
//!   from a table of peers that the multicast announcement listener keeps up
//!   to date, so a "find nearby devices" request never blocks on the network.

pub mod peer_table;
