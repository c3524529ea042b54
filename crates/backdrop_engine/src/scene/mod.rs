//! Scene module
//!
//! The hierarchical scene graph and the builder that fills it with the
//! workplace and building environments.

pub mod builder;
pub mod palette;
pub mod scene_graph;

pub use builder::{build_scene, build_scene_with_rng, BuiltScene};
pub use palette::MaterialPalette;
pub use scene_graph::{
    DisposalReport, DrawItem, Fog, Light, LightKind, MeshBinding, Node, NodeId, SceneGraph, ShadowFlags,
};
