use super::bounds::Bounds3;
use crate::shading::vertex::{VertexInput, VertexPosNorm};
use anyhow::{bail, Result};

/// How consecutive indices are grouped into triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Triangles,
    TriangleStrip,
    TriangleFan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexData {
    Indices(Vec<u32>),
    /// Vertices are consumed in order, the value is their count.
    NonIndexed(usize),
}

impl IndexData {
    pub fn num_indices(&self) -> usize {
        match self {
            IndexData::Indices(indices) => indices.len(),
            IndexData::NonIndexed(n) => *n,
        }
    }

    fn index(&self, i: usize) -> u32 {
        match self {
            IndexData::Indices(indices) => indices[i],
            IndexData::NonIndexed(_) => i as u32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub pos: Vec<na::Point3<f32>>,
    pub normal: Option<Vec<na::Vector3<f32>>>,
    pub indices: IndexData,
    pub primitive_type: PrimitiveType,
}

impl Mesh {
    pub fn new(
        pos: Vec<na::Point3<f32>>,
        normal: Option<Vec<na::Vector3<f32>>>,
        indices: IndexData,
        primitive_type: PrimitiveType,
    ) -> Result<Self> {
        if let Some(normal) = &normal {
            if normal.len() != pos.len() {
                bail!(
                    "mesh has {} positions but {} normals",
                    pos.len(),
                    normal.len()
                );
            }
        }

        if let IndexData::Indices(indices) = &indices {
            if let Some(index) = indices.iter().find(|&&i| i as usize >= pos.len()) {
                bail!(
                    "index {} out of range for mesh with {} vertices",
                    index,
                    pos.len()
                );
            }
        } else if indices.num_indices() > pos.len() {
            bail!(
                "non indexed mesh draws {} vertices but only has {}",
                indices.num_indices(),
                pos.len()
            );
        }

        Ok(Mesh {
            pos,
            normal,
            indices,
            primitive_type,
        })
    }

    /// Builds an indexed triangle list from interleaved position/normal floats.
    pub fn from_interleaved(data: &[f32], indices: Vec<u32>) -> Result<Self> {
        let vertices: &[VertexPosNorm] = match bytemuck::try_cast_slice(data) {
            Ok(vertices) => vertices,
            Err(err) => bail!(
                "{} floats do not form whole position/normal vertices: {:?}",
                data.len(),
                err
            ),
        };

        let (pos, normal): (Vec<_>, Vec<_>) = vertices
            .iter()
            .map(VertexInput::from)
            .map(|v| (na::Point3::from(v.position), v.normal))
            .unzip();

        Mesh::new(
            pos,
            Some(normal),
            IndexData::Indices(indices),
            PrimitiveType::Triangles,
        )
    }

    /// Drops the normal attribute, which makes renderers fall back to flat normals.
    pub fn without_normals(mut self) -> Self {
        self.normal = None;
        self
    }

    pub fn has_normals(&self) -> bool {
        self.normal.is_some()
    }

    pub fn num_vertices(&self) -> usize {
        self.pos.len()
    }

    /// Attributes of one vertex. Meshes without normals feed a zero normal.
    pub fn vertex_input(&self, i: usize) -> VertexInput {
        let normal = match &self.normal {
            Some(normal) => normal[i],
            None => glm::vec3(0.0, 0.0, 0.0),
        };
        VertexInput::new(self.pos[i].coords, normal)
    }

    /// Assembles the primitives into triangle index triples.
    pub fn triangles(&self) -> Result<Vec<[u32; 3]>> {
        let n = self.indices.num_indices();
        let idx = |i: usize| self.indices.index(i);

        match self.primitive_type {
            PrimitiveType::Triangles => {
                if n % 3 != 0 {
                    bail!("triangle list with {} indices is not a multiple of 3", n);
                }
                Ok((0..n / 3)
                    .map(|t| [idx(3 * t), idx(3 * t + 1), idx(3 * t + 2)])
                    .collect())
            }
            PrimitiveType::TriangleStrip => Ok((0..n.saturating_sub(2))
                .map(|i| {
                    // every other triangle is flipped to keep the winding consistent
                    if i % 2 == 0 {
                        [idx(i), idx(i + 1), idx(i + 2)]
                    } else {
                        [idx(i + 1), idx(i), idx(i + 2)]
                    }
                })
                .collect()),
            PrimitiveType::TriangleFan => Ok((1..n.saturating_sub(1))
                .map(|i| [idx(0), idx(i), idx(i + 1)])
                .collect()),
        }
    }

    pub fn bounds(&self) -> Bounds3 {
        self.pos
            .iter()
            .fold(Bounds3::empty(), |b, p| Bounds3::union_p(&b, p))
    }
}
