//! Connection lifecycle: state machine, backoff policy, heartbeat, driver task.

pub mod backoff;
pub mod driver;
pub mod heartbeat;
pub mod state;
