pub mod asset_loader;
pub mod progress;
pub mod registry;

pub use asset_loader::{AssetLoader, LoadEvent};
pub use progress::LoadProgress;
pub use registry::{PendingLoads, Placement, PostLoad, PropDefinition};
