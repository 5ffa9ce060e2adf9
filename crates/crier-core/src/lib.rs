pub mod content;
pub mod delivery;
pub mod draft;
pub mod errors;
pub mod events;
pub mod ids;
