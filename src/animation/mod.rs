pub mod easing;
pub mod mixer;
pub mod ping_pong;
pub mod scheduler;
pub mod tween;

pub use easing::Easing;
pub use mixer::{AnimationClip, AnimationMixer};
pub use ping_pong::PingPong;
pub use scheduler::{AnimationScheduler, SchedulerEvent};
pub use tween::Tween;
