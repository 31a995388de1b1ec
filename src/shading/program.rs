use super::fragment::{resolve_normal, shade, smooth_normal};
use super::uniforms::Uniforms;
use super::vertex::{clip_position, model_position, transform_normal, VertexInput};

/// Values handed from the vertex to the fragment stage.
///
/// Everything the rasterizer does with them (clipping, barycentric interpolation and
/// derivatives) reduces to these linear operations.
pub trait Varyings: Copy + Send + Sync + std::fmt::Debug {
    fn combine(&self, rhs: &Self) -> Self;
    fn scaled(&self, s: f32) -> Self;

    fn difference(&self, rhs: &Self) -> Self {
        self.combine(&rhs.scaled(-1.0))
    }

    fn lerp(&self, rhs: &Self, t: f32) -> Self {
        self.scaled(1.0 - t).combine(&rhs.scaled(t))
    }

    fn blend(v: [&Self; 3], w: [f32; 3]) -> Self {
        v[0].scaled(w[0])
            .combine(&v[1].scaled(w[1]))
            .combine(&v[2].scaled(w[2]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput<V> {
    /// `gl_Position`
    pub clip_position: glm::Vec4,
    pub varyings: V,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentInput<V> {
    /// Window-space pixel center and depth (`gl_FragCoord.xyz`).
    pub frag_coord: glm::Vec3,
    pub varyings: V,
    /// `dFdx` of every varying.
    pub ddx: V,
    /// `dFdy` of every varying.
    pub ddy: V,
}

pub trait ShaderProgram: Sync {
    type Varyings: Varyings;

    fn vertex(&self, input: &VertexInput) -> VertexOutput<Self::Varyings>;
    fn fragment(&self, input: &FragmentInput<Self::Varyings>) -> glm::Vec4;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothVaryings {
    /// `varNormal`
    pub normal: glm::Vec3,
}

impl Varyings for SmoothVaryings {
    fn combine(&self, rhs: &Self) -> Self {
        SmoothVaryings {
            normal: self.normal + rhs.normal,
        }
    }

    fn scaled(&self, s: f32) -> Self {
        SmoothVaryings {
            normal: self.normal * s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedVaryings {
    /// `varNormal`
    pub normal: glm::Vec3,
    /// `varPos`
    pub position: glm::Vec3,
}

impl Varyings for DerivedVaryings {
    fn combine(&self, rhs: &Self) -> Self {
        DerivedVaryings {
            normal: self.normal + rhs.normal,
            position: self.position + rhs.position,
        }
    }

    fn scaled(&self, s: f32) -> Self {
        DerivedVaryings {
            normal: self.normal * s,
            position: self.position * s,
        }
    }
}

/// The first variant: always shades with the interpolated normal.
#[derive(Debug, Clone, Default)]
pub struct SmoothProgram {
    pub uniforms: Uniforms,
}

impl SmoothProgram {
    pub fn new(uniforms: Uniforms) -> Self {
        SmoothProgram { uniforms }
    }
}

impl ShaderProgram for SmoothProgram {
    type Varyings = SmoothVaryings;

    fn vertex(&self, input: &VertexInput) -> VertexOutput<SmoothVaryings> {
        VertexOutput {
            clip_position: clip_position(&self.uniforms.combined_mat, &input.position),
            varyings: SmoothVaryings {
                normal: transform_normal(&self.uniforms.normal_mat, &input.normal),
            },
        }
    }

    fn fragment(&self, input: &FragmentInput<SmoothVaryings>) -> glm::Vec4 {
        let normal = smooth_normal(&input.varyings.normal);
        shade(&normal, &self.uniforms.diffuse_color)
    }
}

/// The second variant: chooses between interpolated and derivative-based normals.
#[derive(Debug, Clone, Default)]
pub struct DerivedNormalProgram {
    pub uniforms: Uniforms,
}

impl DerivedNormalProgram {
    pub fn new(uniforms: Uniforms) -> Self {
        DerivedNormalProgram { uniforms }
    }
}

impl ShaderProgram for DerivedNormalProgram {
    type Varyings = DerivedVaryings;

    fn vertex(&self, input: &VertexInput) -> VertexOutput<DerivedVaryings> {
        VertexOutput {
            clip_position: clip_position(&self.uniforms.combined_mat, &input.position),
            varyings: DerivedVaryings {
                normal: transform_normal(&self.uniforms.normal_mat, &input.normal),
                position: model_position(&self.uniforms.model_mat, &input.position),
            },
        }
    }

    fn fragment(&self, input: &FragmentInput<DerivedVaryings>) -> glm::Vec4 {
        let normal = resolve_normal(
            self.uniforms.shading_mode(),
            &input.varyings.normal,
            &input.ddx.position,
            &input.ddy.position,
        );
        shade(&normal, &self.uniforms.diffuse_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::ShadingMode;

    fn fragment_with_normal<V: Varyings>(varyings: V, zero: V) -> FragmentInput<V> {
        FragmentInput {
            frag_coord: glm::vec3(0.5, 0.5, 0.5),
            varyings,
            ddx: zero,
            ddy: zero,
        }
    }

    #[test]
    fn test_varyings_blend() {
        let a = SmoothVaryings {
            normal: glm::vec3(1.0, 0.0, 0.0),
        };
        let b = SmoothVaryings {
            normal: glm::vec3(0.0, 1.0, 0.0),
        };
        let c = SmoothVaryings {
            normal: glm::vec3(0.0, 0.0, 1.0),
        };

        let blended = SmoothVaryings::blend([&a, &b, &c], [0.5, 0.25, 0.25]);
        approx::assert_relative_eq!(blended.normal, glm::vec3(0.5, 0.25, 0.25));
        approx::assert_relative_eq!(a.lerp(&b, 0.5).normal, glm::vec3(0.5, 0.5, 0.0));
        approx::assert_relative_eq!(a.difference(&b).normal, glm::vec3(1.0, -1.0, 0.0));
    }

    #[test]
    fn test_identity_vertex_stage() {
        let program = DerivedNormalProgram::default();
        let input = VertexInput::new(glm::vec3(0.1, 0.2, 0.3), glm::vec3(0.0, 2.0, 0.0));
        let out = program.vertex(&input);

        assert_eq!(out.clip_position, glm::vec4(0.1, 0.2, 0.3, 1.0));
        assert_eq!(out.varyings.position, input.position);
        assert_eq!(out.varyings.normal, input.normal);
    }

    #[test]
    fn test_normals_enabled_facing() {
        let diffuse = glm::vec3(0.9, 0.5, 0.1);
        let uniforms = Uniforms::default()
            .with_diffuse_color(diffuse)
            .with_shading_mode(ShadingMode::Interpolated);
        let zero = DerivedVaryings {
            normal: glm::vec3(0.0, 0.0, 0.0),
            position: glm::vec3(0.0, 0.0, 0.0),
        };

        let program = DerivedNormalProgram::new(uniforms);
        let color = program.fragment(&fragment_with_normal(
            DerivedVaryings {
                normal: glm::vec3(0.0, 0.0, 1.0),
                ..zero
            },
            zero,
        ));
        approx::assert_relative_eq!(color, glm::vec4(0.9, 0.5, 0.1, 1.0));

        let color = program.fragment(&fragment_with_normal(
            DerivedVaryings {
                normal: glm::vec3(1.0, 0.0, 0.0),
                ..zero
            },
            zero,
        ));
        approx::assert_relative_eq!(color, glm::vec4(0.225, 0.125, 0.025, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_flat_mode_ignores_varying_normal() {
        let uniforms = Uniforms::default()
            .with_diffuse_color(glm::vec3(1.0, 1.0, 1.0))
            .with_shading_mode(ShadingMode::Flat);
        let program = DerivedNormalProgram::new(uniforms);

        let input = FragmentInput {
            frag_coord: glm::vec3(0.5, 0.5, 0.5),
            varyings: DerivedVaryings {
                normal: glm::vec3(0.0, 0.0, 1.0),
                position: glm::vec3(0.0, 0.0, 0.0),
            },
            ddx: DerivedVaryings {
                normal: glm::vec3(0.0, 0.0, 0.0),
                position: glm::vec3(0.0, 1.0, 0.0),
            },
            ddy: DerivedVaryings {
                normal: glm::vec3(0.0, 0.0, 0.0),
                position: glm::vec3(0.0, 0.0, 1.0),
            },
        };

        // the derivatives span the yz plane, so the flat normal is the x axis
        approx::assert_relative_eq!(program.fragment(&input), glm::vec4(0.25, 0.25, 0.25, 1.0));
    }

    #[test]
    fn test_smooth_program_uses_normal_matrix() {
        let uniforms = Uniforms::new(
            glm::Mat4::identity(),
            glm::mat4_to_mat3(&glm::rotation(
                std::f32::consts::FRAC_PI_2,
                &glm::vec3(0.0, 1.0, 0.0),
            )),
        )
        .with_diffuse_color(glm::vec3(1.0, 1.0, 1.0));
        let program = SmoothProgram::new(uniforms);

        let out = program.vertex(&VertexInput::new(
            glm::vec3(0.0, 0.0, 0.0),
            glm::vec3(1.0, 0.0, 0.0),
        ));
        approx::assert_relative_eq!(out.varyings.normal, glm::vec3(0.0, 0.0, -1.0), epsilon = 1e-6);

        let zero = SmoothVaryings {
            normal: glm::vec3(0.0, 0.0, 0.0),
        };
        let color = program.fragment(&fragment_with_normal(out.varyings, zero));
        approx::assert_relative_eq!(color, glm::vec4(1.0, 1.0, 1.0, 1.0), epsilon = 1e-6);
    }
}
