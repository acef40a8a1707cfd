mod config;
pub use config::{AuthorDefaults, TreeConfig, DEFAULT_MAX_DEPTH, MAX_DEPTH_VAR};

mod forest;
pub use forest::{Forest, Roots};

mod fuzz;

mod node;
pub use node::{count_nested, flatten, ThreadNode};

mod normalize;
pub use normalize::{normalize, Normalizer};

mod reply;
pub use reply::Insertion;

mod thread;
pub use thread::flatten_thread;

mod view;
pub use view::{walk, ThreadSummary};

pub mod api {
    pub use colloquy_api::*;
}
