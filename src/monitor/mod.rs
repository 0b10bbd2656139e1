pub(crate) mod connector;
pub(crate) mod edid;
mod mapper;
mod probe;

pub use mapper::{Discovery, map_all_monitors};
