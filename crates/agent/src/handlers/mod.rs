//! One handler per service worker event

mod activate;
pub use activate::*;

mod fetch;
pub use fetch::*;

mod install;
pub use install::*;

mod message;
pub use message::*;

mod notification_click;
pub use notification_click::*;

mod push;
pub use push::*;
