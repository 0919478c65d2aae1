pub mod handler;
pub mod section_state;
pub mod signal;

pub use handler::{HandlerError, SignalBus, SignalHandler, SubscriptionId};
pub use section_state::{SectionLifecycleManager, SectionRollover, SectionState};
pub use signal::{EngineSignal, SectionEndReason, SignalKind};
