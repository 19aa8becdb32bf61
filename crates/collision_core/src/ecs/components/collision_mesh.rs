//! Collision mesh component
//!
//! Local-space vertex and index streams plus surface materials, as handed
//! over by an asset loader. The triangle sets transform these into world
//! space on rebuild.

use crate::ecs::Component;
use crate::foundation::math::Vec3;
use crate::physics::collision::SurfaceMaterial;

/// Errors raised while constructing a collision mesh
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Index stream length is not a multiple of three
    #[error("index count {0} is not a multiple of 3")]
    IndexCount(usize),

    /// An index points past the vertex stream
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index value
        index: u32,
        /// Number of vertices in the mesh
        vertex_count: usize,
    },

    /// Per-triangle material list does not match the triangle count
    #[error("expected {expected} per-triangle materials, found {found}")]
    MaterialCount {
        /// Triangle count
        expected: usize,
        /// Materials provided
        found: usize,
    },

    /// A raw byte stream cannot be reinterpreted as the element type
    #[error("misaligned {stream} stream: {reason}")]
    Misaligned {
        /// Which stream failed
        stream: &'static str,
        /// bytemuck's reason
        reason: String,
    },
}

/// Material assignment for a mesh
#[derive(Debug, Clone, PartialEq)]
pub enum MeshMaterials {
    /// One material for every triangle
    Uniform(SurfaceMaterial),
    /// One material per triangle, in index order
    PerTriangle(Vec<SurfaceMaterial>),
}

impl MeshMaterials {
    /// Material for local triangle `triangle`
    pub fn for_triangle(&self, triangle: usize) -> SurfaceMaterial {
        match self {
            Self::Uniform(material) => *material,
            Self::PerTriangle(materials) => materials.get(triangle).copied().unwrap_or_default(),
        }
    }
}

impl Default for MeshMaterials {
    fn default() -> Self {
        Self::Uniform(SurfaceMaterial::default())
    }
}

/// Local-space triangle mesh that contributes to collision queries
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionMeshComponent {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    materials: MeshMaterials,
}

impl Component for CollisionMeshComponent {}

impl CollisionMeshComponent {
    /// Create a validated mesh
    pub fn new(
        vertices: Vec<Vec3>,
        indices: Vec<u32>,
        materials: MeshMaterials,
    ) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        if let MeshMaterials::PerTriangle(list) = &materials {
            if list.len() != indices.len() / 3 {
                return Err(MeshError::MaterialCount {
                    expected: indices.len() / 3,
                    found: list.len(),
                });
            }
        }

        Ok(Self {
            vertices,
            indices,
            materials,
        })
    }

    /// Create a mesh from raw `f32` xyz and `u32` index byte streams
    pub fn from_bytes(
        vertex_bytes: &[u8],
        index_bytes: &[u8],
        materials: MeshMaterials,
    ) -> Result<Self, MeshError> {
        let floats: &[f32] = bytemuck::try_cast_slice(vertex_bytes).map_err(|e| MeshError::Misaligned {
            stream: "vertex",
            reason: format!("{e:?}"),
        })?;
        if floats.len() % 3 != 0 {
            return Err(MeshError::Misaligned {
                stream: "vertex",
                reason: format!("{} floats is not a whole number of positions", floats.len()),
            });
        }
        let indices: &[u32] = bytemuck::try_cast_slice(index_bytes).map_err(|e| MeshError::Misaligned {
            stream: "index",
            reason: format!("{e:?}"),
        })?;

        let vertices = floats
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]))
            .collect();
        Self::new(vertices, indices.to_vec(), materials)
    }

    /// Local-space vertex positions
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangle list indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Material assignment
    pub fn materials(&self) -> &MeshMaterials {
        &self.materials
    }

    /// Number of triangles before degenerate culling
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Replace the vertex positions, keeping indices. Fails if any index
    /// would fall out of range.
    pub fn set_vertices(&mut self, vertices: Vec<Vec3>) -> Result<(), MeshError> {
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        self.vertices = vertices;
        Ok(())
    }
}
