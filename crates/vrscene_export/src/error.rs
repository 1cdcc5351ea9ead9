// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export errors.

use vrscene_graph::LoadError;

/// Error during export
///
/// Only sink I/O and input loading abort a pass. Cycles abort the subgraph
/// being resolved and are absorbed at the tree boundary.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Writing to the output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A node depends on its own output
    #[error("Cycle detected at node {node} in tree {tree}")]
    Cycle {
        /// Tree name
        tree: String,
        /// Node found while still being resolved
        node: String,
    },

    /// Scene, catalog or settings could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),
}
