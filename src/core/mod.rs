// Core primitives shared by forms, lists and screens

pub mod epoch;
pub mod values;

pub use epoch::{EpochTicket, RequestEpoch};
pub use values::{display_text, is_truthy, resolve_path, Record};
