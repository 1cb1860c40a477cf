//! Relay pair driver
//!
//! Two relay coils drive one actuator: A extends it (OPEN), B retracts it
//! (CLOSE). The pair is the only place outputs are energized.

mod pair;

pub use pair::RelayPair;
