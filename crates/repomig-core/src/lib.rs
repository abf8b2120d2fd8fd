pub mod collab;
pub mod config;
pub mod context;
pub mod event;
pub mod phase;
pub mod plan;
pub mod poller;
pub mod selection;
pub mod step;
pub mod time;
pub mod transport;
