//! Guided conversation state machine
//!
//! Pure transitions: `transition` maps the current state and an event to the
//! next step plus the effects the runtime must carry out.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Event, SocialChoice};
pub use state::{Affordances, ConversationState, PendingCall, Step};
pub use transition::{transition, TransitionResult};
