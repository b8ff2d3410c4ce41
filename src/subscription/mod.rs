// Subscriber fan-out and per-connection sessions

pub mod broadcaster;
pub mod protocol;
pub mod queue;
pub mod session;

pub use broadcaster::{Broadcaster, Subscriber};
pub use protocol::{encode_notification, EntityMessage, InboundError};
pub use queue::{OutboundQueue, PushOutcome};
pub use session::{apply_frame, CloseReason, Session, SessionState};
