pub mod api;
pub mod features;
pub mod list;
pub mod resolve;
