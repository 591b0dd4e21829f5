//! Core types for the text-buffer engine: lines, snapshots, coordinates and
//! edit descriptors.

/// Edit descriptors, chain links and position remapping.
pub mod change;
/// Coordinate and edit validation errors.
pub mod error;
/// Identifier types for editor entities.
pub mod ids;
/// Lines and end-of-line markers.
pub mod line;
/// Text coordinates, ranges and tracking modes.
pub mod location;
/// Immutable document snapshots and edit application.
pub mod snapshot;

pub use change::{ChainIter, EditDescriptor};
pub use error::EditError;
pub use ids::ViewId;
pub use line::{Line, LineEnding};
pub use location::{RangeTracking, TextLocation, TextRange, Tracking};
pub use snapshot::Snapshot;
