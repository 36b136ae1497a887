// Services layer for business logic
// Services own validation and call the core pipeline and stores

pub mod event;
pub mod responder;

pub use event::EventService;
pub use responder::ResponderService;
