use crate::{search::WebSearch, vision::Vision};

pub mod connectivity;
pub mod credentials;
pub mod retry;
pub mod search;
pub mod session;
pub mod vision;

#[cfg(test)]
mod testing;

pub type VisionBox = Box<dyn Vision + Send + Sync>;
pub type SearchBox = Box<dyn WebSearch + Send + Sync>;

pub const MAX_RETRIES: u32 = 3;
pub const REQUEST_TIMEOUT_SECS: u64 = 60;
