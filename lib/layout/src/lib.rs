//! Auto-layout for tailor workflows.
//!
//! Layout is computed by an external [`LayoutService`] from a plain
//! [`LayoutRequest`] snapshot of the graph. The [`LayoutAdapter`] tags every
//! request with a token and applies only the newest response, so a slow
//! layout never overwrites positions from a later one.

pub mod adapter;
pub mod error;
pub mod grid;
pub mod request;

pub use adapter::{LayoutAdapter, LayoutOutcome, LayoutTicket};
pub use error::LayoutError;
pub use grid::{GridLayout, GridLayoutConfig};
pub use request::{LayoutEdge, LayoutNode, LayoutRequest, LayoutResponse, LayoutService, SizeHints};
