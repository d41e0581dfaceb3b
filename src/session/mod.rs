pub mod clock;
pub mod controller;
pub mod loop_worker;
pub mod pipeline;

pub use clock::SessionClock;
pub use controller::{SessionController, SessionHandle};
pub use pipeline::Pipeline;
