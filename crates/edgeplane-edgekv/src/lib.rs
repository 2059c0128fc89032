//! EdgeKV for edgeplane
//!
//! - `read_group_items`: every item of a group, keyed `namespace:network:group`
//! - `ItemClient` / `ItemResource`: the `edgekv_item` resource kind

pub mod api;
pub mod error;
pub mod group;
pub mod item;

pub use api::{EdgeKvApi, HttpEdgeKvApi, ItemGroup};
pub use error::{EdgeKvError, Result};
pub use group::{GroupItems, read_group_items};
pub use item::{ItemClient, ItemResource, ItemSpec};
