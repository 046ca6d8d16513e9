//! UI components: the force-directed graph and its pan/zoom surface.

pub mod force_graph;
pub mod pan_zoom;
