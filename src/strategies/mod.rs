mod recycle_bin;
mod service;
mod trim;
mod wipe;

pub use recycle_bin::RecycleBin;
pub use service::ServiceWipe;
pub use trim::TrimNewest;
pub use wipe::Wipe;
