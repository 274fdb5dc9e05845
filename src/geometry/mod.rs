// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation, spatial index and predicates

mod bbox;
mod bvh;
mod frame;
mod mesh;
pub mod predicates;
mod topology;
mod validate;

pub use bbox::BoundingBox;
pub use bvh::Bvh;
pub use frame::CellFrame;
pub use mesh::{newell_normal, Cell, Edge, Mesh};
pub use topology::MeshTopology;
pub use validate::{validate_mesh, InvalidMeshReason};
