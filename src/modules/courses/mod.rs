pub mod controller;
pub mod events;
pub mod router;
pub mod service;

pub use events::spawn_lecture_event_consumer;
pub use router::init_courses_router;
