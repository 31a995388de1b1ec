pub mod fragment;
pub mod glsl;
pub mod program;
pub mod uniforms;
pub mod vertex;

pub use glsl::{ShaderVariant, Stage};
pub use program::{
    DerivedNormalProgram, DerivedVaryings, FragmentInput, ShaderProgram, SmoothProgram,
    SmoothVaryings, Varyings, VertexOutput,
};
pub use uniforms::{Material, ShadingMode, Uniforms};
pub use vertex::{VertexInput, VertexPosNorm};
