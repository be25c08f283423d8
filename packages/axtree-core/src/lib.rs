#![forbid(unsafe_code)]
//! Core of an accessibility tree: a node graph mutated only through atomic
//! [`TreeUpdate`]s, derived views (ignored-aware traversal, table grids,
//! set positions, line breaks), and a [`TreeSerializer`] that diffs any
//! [`TreeSource`] against what a client already holds.
//!
//! Everything here is single-threaded and synchronous. Hosts own transport
//! and install their own `tracing` subscriber.

pub mod attributes;
pub mod error;
pub mod ids;
pub mod node;
pub mod node_data;
pub mod observer;
pub mod ordered_set;
pub mod role;
pub mod serializer;
pub mod source;
pub mod table_info;
pub mod text;
pub mod tree;
pub mod tree_data;
pub mod tree_update;

pub use attributes::{
    BoolAttribute, FloatAttribute, IntAttribute, IntListAttribute, StringAttribute,
    StringListAttribute,
};
pub use error::{Error, Result};
pub use ids::NodeId;
pub use node::NodeRef;
pub use node_data::{NodeData, Rect, RelativeBounds, Transform};
pub use observer::{Change, ChangeType, TreeObserver};
pub use ordered_set::SetInfo;
pub use role::{ItemFamily, Role, State};
pub use serializer::{SerializerConfig, TreeSerializer};
pub use source::TreeSource;
pub use table_info::{CellData, TableInfo, MAX_TABLE_DIMENSION};
pub use tree::{Tree, TreeConfig};
pub use tree_data::TreeData;
pub use tree_update::TreeUpdate;
