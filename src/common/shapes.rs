use super::mesh::{IndexData, Mesh, PrimitiveType};
use genmesh::generators::{Cube, Cylinder, IcoSphere, IndexedPolygon, Plane, SharedVertex, SphereUv, Torus};
use genmesh::{Triangulate, Vertices};
use itertools::Itertools;

/// Procedural test geometry, so the viewer can render without a model loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Cube,
    Sphere,
    IcoSphere,
    Torus,
    Cylinder,
    Plane,
}

macro_rules! generate_mesh {
    ($generator:expr) => {{
        let generator = $generator;
        let (pos, normal): (Vec<_>, Vec<_>) = generator
            .shared_vertex_iter()
            .map(|v: genmesh::Vertex| {
                let p: [f32; 3] = v.pos.into();
                let n: [f32; 3] = v.normal.into();
                (na::Point3::from(p), glm::make_vec3(&n))
            })
            .unzip();
        let indices = generator
            .indexed_polygon_iter()
            .triangulate()
            .vertices()
            .map(|i| i as u32)
            .collect_vec();

        Mesh::new(
            pos,
            Some(normal),
            IndexData::Indices(indices),
            PrimitiveType::Triangles,
        )
    }};
}

impl Shape {
    pub const ALL: [Shape; 6] = [
        Shape::Cube,
        Shape::Sphere,
        Shape::IcoSphere,
        Shape::Torus,
        Shape::Cylinder,
        Shape::Plane,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Cube => "cube",
            Shape::Sphere => "sphere",
            Shape::IcoSphere => "icosphere",
            Shape::Torus => "torus",
            Shape::Cylinder => "cylinder",
            Shape::Plane => "plane",
        }
    }

    /// Triangulated mesh with per-vertex normals, roughly spanning `[-1, 1]` on every axis.
    pub fn mesh(&self) -> anyhow::Result<Mesh> {
        match self {
            Shape::Cube => generate_mesh!(Cube::new()),
            Shape::Sphere => generate_mesh!(SphereUv::new(32, 16)),
            Shape::IcoSphere => generate_mesh!(IcoSphere::subdivide(2)),
            Shape::Torus => generate_mesh!(Torus::new(0.7, 0.3, 32, 16)),
            Shape::Cylinder => generate_mesh!(Cylinder::new(32)),
            Shape::Plane => generate_mesh!(Plane::new()),
        }
    }
}

impl std::str::FromStr for Shape {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Shape::ALL.iter().find(|shape| shape.name() == s) {
            Some(shape) => Ok(*shape),
            None => anyhow::bail!(
                "unknown shape '{}', expected one of: {}",
                s,
                Shape::ALL.iter().map(|shape| shape.name()).join(", ")
            ),
        }
    }
}
