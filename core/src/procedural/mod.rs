//! Procedural mesh generation
//!
//! Functions for generating the primitives the monster body and parts are
//! assembled from, plus the deformers that turn them into toy shapes.
//!
//! All generators produce an f32 [`Mesh`] with positions, smooth normals and UVs.

pub mod deform;
mod extrude;
mod primitives;
mod types;


pub use types::{Mesh, MeshBuilder};

pub use extrude::{Bevel, QuadraticPath, extrude_outline, signed_area};

pub use primitives::{
    generate_capsule, generate_cone, generate_cylinder, generate_disc, generate_rounded_box,
    generate_sphere, generate_tube,
};
