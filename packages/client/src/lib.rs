pub mod config;
pub mod dashboard;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod session;
pub mod socket;
pub mod toast;

pub use dispatch::{FrameOutcome, LiveHandler, dispatch, handle_frame};
pub use endpoint::Endpoints;
pub use error::ClientError;
pub use session::LiveSession;
pub use socket::{ConnectionManager, SessionEnd};
pub use toast::ToastTray;
