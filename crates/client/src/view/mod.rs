// Derived views: message records, narrative, fireplace, identicons.

pub mod fireplace;
pub mod identicon;
pub mod narrative;
pub mod projector;
