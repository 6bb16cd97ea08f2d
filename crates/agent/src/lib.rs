//! Response orchestration: the part of chatrelay that decides whether the
//! assistant speaks and what it says.
//!
//! 1. **Gate**: [`ResponseGate`] filters messages nobody addressed to the assistant
//! 2. **Remember**: the session's turn goes into the context store
//! 3. **Generate**: [`FallbackOrchestrator`] tries intercepts, then providers in
//!    order, then the [`LocalResponder`]
//! 4. **Deliver**: [`Coordinator`] adds typing delays and broadcasts the reply
//!
//! Nothing past the gate can fail from a participant's point of view: the
//! worst case is the coordinator's apology message.

pub mod coordinator;
pub mod gate;
pub mod local;
pub mod orchestrator;

pub use coordinator::{Coordinator, apology};
pub use gate::{ResponseGate, strip_command_prefix};
pub use local::{LocalResponder, ResponseCategory};
pub use orchestrator::{FallbackOrchestrator, Intercept, Reply, ReplySource};
