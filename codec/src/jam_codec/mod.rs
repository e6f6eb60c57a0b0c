pub mod accumulate;
pub mod assurances;
pub mod block;
pub mod disputes;
pub mod guarantees;
pub mod header;
pub mod preimages;
pub mod recent_history;
pub mod reports;
pub mod services;
pub mod statistics;
pub mod tickets;
pub mod validators;
