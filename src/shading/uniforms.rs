/// Selects where the fragment stage takes its normal from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingMode {
    /// Normalize the interpolated vertex normal (`normalsEnabled == 1`).
    Interpolated,
    /// Derive a per-primitive normal from screen-space position derivatives.
    Flat,
}

impl ShadingMode {
    /// Interprets the integer uniform flag. Only `1` enables interpolated normals.
    pub fn from_flag(flag: i32) -> Self {
        if flag == 1 {
            ShadingMode::Interpolated
        } else {
            ShadingMode::Flat
        }
    }

    pub fn flag(self) -> i32 {
        match self {
            ShadingMode::Interpolated => 1,
            ShadingMode::Flat => 0,
        }
    }
}

impl std::str::FromStr for ShadingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interpolated" | "smooth" => Ok(ShadingMode::Interpolated),
            "flat" => Ok(ShadingMode::Flat),
            _ => anyhow::bail!("unknown shading mode '{}'", s),
        }
    }
}

/// Material bound to a draw, reduced to what the shaders consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Phong { diffuse_color: glm::Vec3 },
    None,
}

impl Material {
    /// The `diffuseColor` value for this material; black when no material is set.
    pub fn diffuse_color(&self) -> glm::Vec3 {
        match self {
            Material::Phong { diffuse_color } => *diffuse_color,
            Material::None => glm::vec3(0.0, 0.0, 0.0),
        }
    }
}

/// Per-draw constants, one field per uniform of the GLSL programs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    /// `combinedMat`: object to clip space.
    pub combined_mat: glm::Mat4,
    /// `normalMat`: object to view space for normals.
    pub normal_mat: glm::Mat3,
    /// `modelMat`: object to the space `varPos` lives in. Only read by the derived normal variant.
    pub model_mat: glm::Mat4,
    /// `diffuseColor`
    pub diffuse_color: glm::Vec3,
    /// `normalsEnabled`
    pub normals_enabled: i32,
}

impl Default for Uniforms {
    fn default() -> Self {
        Uniforms {
            combined_mat: glm::Mat4::identity(),
            normal_mat: glm::Mat3::identity(),
            model_mat: glm::Mat4::identity(),
            diffuse_color: Material::None.diffuse_color(),
            normals_enabled: ShadingMode::Interpolated.flag(),
        }
    }
}

impl Uniforms {
    pub fn new(combined_mat: glm::Mat4, normal_mat: glm::Mat3) -> Self {
        Uniforms {
            combined_mat,
            normal_mat,
            ..Default::default()
        }
    }

    /// Builds the matrix uniforms from separate projection, view and model transforms.
    ///
    /// `modelMat` receives the model-view matrix so that flat normals are derived in view space,
    /// the same space the normal matrix maps into.
    pub fn from_transforms(projection: &glm::Mat4, view: &glm::Mat4, model: &glm::Mat4) -> Self {
        let model_view = view * model;
        Uniforms {
            combined_mat: projection * model_view,
            normal_mat: normal_matrix(&model_view),
            model_mat: model_view,
            ..Default::default()
        }
    }

    pub fn with_model_mat(mut self, model_mat: glm::Mat4) -> Self {
        self.model_mat = model_mat;
        self
    }

    pub fn with_diffuse_color(mut self, diffuse_color: glm::Vec3) -> Self {
        self.diffuse_color = diffuse_color;
        self
    }

    pub fn with_material(self, material: &Material) -> Self {
        self.with_diffuse_color(material.diffuse_color())
    }

    pub fn with_shading_mode(mut self, mode: ShadingMode) -> Self {
        self.normals_enabled = mode.flag();
        self
    }

    pub fn shading_mode(&self) -> ShadingMode {
        ShadingMode::from_flag(self.normals_enabled)
    }
}

/// Returns the normal matrix for the given model-view matrix.
///
/// Near-singular matrices fall back to their upper 3x3 instead of being inverted.
pub fn normal_matrix(model_view: &glm::Mat4) -> glm::Mat3 {
    let mat = glm::mat4_to_mat3(model_view);

    if mat.determinant().abs() <= 1e-9 {
        mat
    } else {
        mat.try_inverse().map_or(mat, |inv| inv.transpose())
    }
}
