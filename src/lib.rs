//! Reconstruction of renderable polygon meshes and convex collision hulls from
//! compiled [BSP](https://en.wikipedia.org/wiki/Binary_space_partitioning) level geometry.
//!
//! The pipeline has two independent paths:
//!
//! - **Geometry**: traverse the node tree gathering the faces referenced by its
//!   leaves ([`bsp::traverse`]), rebuild them into a topological
//!   [`MeshDescription`](mesh::MeshDescription) with UVs and smoothing-derived
//!   edge hardness ([`mesh::build`]), split the result into 1024-unit spatial
//!   tiles by repeated plane clipping ([`tiles`], [`mesh::clip`]), and hand each
//!   surviving tile to a [`MeshSink`](importer::MeshSink).
//! - **Collision**: weld a raw triangle soup into a connectivity graph, flood-fill
//!   it into connected components, and decompose each component into convex hulls
//!   via a secondary space-partition build ([`collision`]).
//!
//! Parsing the binary file format is the caller's concern; the crate consumes the
//! already-parsed arrays of [`bsp::BspFile`] and never performs I/O.
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - **earcut**: use `geo`'s `earcutr` feature for triangulation
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **delaunay**: use `geo`'s `spade` feature for triangulation
//! - **parallel**: use rayon to clip spatial tiles concurrently

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod errors;
pub mod float_types;
pub mod material;
pub mod bsp;
pub mod mesh;
pub mod tiles;
pub mod collision;
pub mod importer;

#[cfg(any(
    all(feature = "delaunay", feature = "earcut"),
    not(any(feature = "delaunay", feature = "earcut"))
))]
compile_error!("Either 'delaunay' or 'earcut' feature must be specified, but not both");

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use bsp::BspFile;
pub use errors::BspError;
pub use mesh::MeshDescription;
pub use mesh::clip::ClipPlane;
