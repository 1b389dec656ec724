pub mod heartbeat;
pub mod shared;

pub use heartbeat::Heartbeat;
pub use shared::SharedPoll;
