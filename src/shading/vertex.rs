use super::glsl::{NORMAL_LOCATION, POSITION_LOCATION};

/// Per-vertex attributes consumed by the vertex stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexInput {
    pub position: glm::Vec3,
    pub normal: glm::Vec3,
}

impl VertexInput {
    pub fn new(position: glm::Vec3, normal: glm::Vec3) -> Self {
        VertexInput { position, normal }
    }
}

/// `normalMat * N`, left unnormalized for the fragment stage.
#[inline]
pub fn transform_normal(normal_mat: &glm::Mat3, normal: &glm::Vec3) -> glm::Vec3 {
    normal_mat * normal
}

/// `combinedMat * vec4(P, 1)`
#[inline]
pub fn clip_position(combined_mat: &glm::Mat4, position: &glm::Vec3) -> glm::Vec4 {
    combined_mat * glm::vec4(position.x, position.y, position.z, 1.0)
}

/// `(modelMat * vec4(P, 1)).xyz`. The w component is dropped, not divided out.
#[inline]
pub fn model_position(model_mat: &glm::Mat4, position: &glm::Vec3) -> glm::Vec3 {
    (model_mat * glm::vec4(position.x, position.y, position.z, 1.0)).xyz()
}

/// Describes where one shader input lives inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    pub offset: usize,
}

/// Interleaved position/normal vertex as a host uploads it.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VertexPosNorm {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

unsafe impl bytemuck::Zeroable for VertexPosNorm {}

unsafe impl bytemuck::Pod for VertexPosNorm {}

impl VertexPosNorm {
    pub const STRIDE: usize = std::mem::size_of::<VertexPosNorm>();

    pub const ATTRIBUTES: [VertexAttribute; 2] = [
        VertexAttribute {
            location: POSITION_LOCATION,
            components: 3,
            offset: 0,
        },
        VertexAttribute {
            location: NORMAL_LOCATION,
            components: 3,
            offset: std::mem::size_of::<[f32; 3]>(),
        },
    ];
}

impl From<&VertexPosNorm> for VertexInput {
    fn from(vertex: &VertexPosNorm) -> Self {
        VertexInput {
            position: glm::make_vec3(&vertex.position),
            normal: glm::make_vec3(&vertex.normal),
        }
    }
}
