// Crowdpulse core domain
//
// DB-agnostic domain types shared by the control-plane API and storage:
// - Event, Activity and ActivityResponse entities
// - Validation of activity payloads and audience answers
// - Live notification payloads pushed over SSE
// - The closed DomainError taxonomy mapped to transport codes at the edge

pub mod activity;
pub mod error;
pub mod event;
pub mod notification;
pub mod response;
pub mod short_code;

// Logging initialization
pub mod telemetry;

pub use activity::{Activity, ActivityKind};
pub use error::{DomainError, ErrorKind, Result};
pub use event::{Event, PublicEvent};
pub use notification::Notification;
pub use response::{ActivityResponse, ActivityResults, Respondent, ResponseAnswer};
pub use short_code::{InvalidShortCode, ShortCode};
