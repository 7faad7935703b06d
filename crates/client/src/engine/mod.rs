// Temporal core: expiry classification, discard scheduling, the event queue.

pub mod events;
pub mod expiry;
pub mod scheduler;
