// twodays-common: shared document vocabulary for the twodays workspace.

pub mod command;
pub mod path;
pub mod time;
pub mod types;
