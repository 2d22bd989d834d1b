//! Cross-process call bridge and command router for the renderer side of the
//! desktop client.
//!
//! The crate owns the protocol state (pending correlated calls, named deferred
//! tasks, command tables, startup sequence). Everything that touches a real
//! window is reached through the traits in [`collaborators`].

pub mod boundary;
pub mod bridge;
pub mod collaborators;
pub mod correlator;
pub mod debounce;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod router;
pub mod settings;
pub mod shell;

pub use boundary::{Boundary, ChannelBoundary};
pub use bridge::Bridge;
pub use collaborators::Collaborators;
pub use correlator::{CallCorrelator, CallOutcome, PendingCall};
pub use debounce::DebounceRegistry;
pub use error::{BridgeError, CallError, CorrelationError, UnrecognizedActionError};
pub use lifecycle::{InitialState, LifecycleState, StartPath};
pub use router::{
    commands::{AppCommand, RequestAction},
    ApplicationCommandTable, CommandArgs, RequestActionTable,
};
pub use settings::BridgeSettings;
pub use shell::{compose, Shell};
