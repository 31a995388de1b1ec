//! GLSL sources of both shader variants and the names a host binds them by.
//!
//! The sources carry no `#version` directive; the host prepends the one matching its context,
//! see [`ShaderVariant::versioned_source`].

/// Vertex input location of the object-space position.
pub const POSITION_LOCATION: u32 = 0;
/// Vertex input location of the object-space normal.
pub const NORMAL_LOCATION: u32 = 1;

pub const DEFAULT_VERSION: &str = "#version 410";

pub mod uniform {
    pub const COMBINED_MAT: &str = "combinedMat";
    pub const NORMAL_MAT: &str = "normalMat";
    pub const MODEL_MAT: &str = "modelMat";
    pub const DIFFUSE_COLOR: &str = "diffuseColor";
    pub const NORMALS_ENABLED: &str = "normalsEnabled";
}

pub mod varying {
    pub const NORMAL: &str = "varNormal";
    pub const POSITION: &str = "varPos";
}

lazy_static::lazy_static! {
    static ref SMOOTH_VERTEX: String =
    "
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 normal;

uniform mat4 combinedMat;
uniform mat3 normalMat;

out vec3 varNormal;

void main() {
    varNormal = normalMat * normal;
    gl_Position = combinedMat * vec4(position, 1.0);
}
    ".to_string();

    static ref SMOOTH_FRAGMENT: String =
    "
in vec3 varNormal;

uniform vec3 diffuseColor;

out vec4 fragColor;

void main() {
    vec3 normal = normalize(varNormal);
    float f = abs(normal.z) * 0.75 + 0.25;

    fragColor = vec4(f * diffuseColor, 1.0);
}
    ".to_string();

    static ref DERIVED_VERTEX: String =
    "
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 normal;

uniform mat4 combinedMat;
uniform mat3 normalMat;
uniform mat4 modelMat;

out vec3 varNormal;
out vec3 varPos;

void main() {
    varNormal = normalMat * normal;
    varPos = (modelMat * vec4(position, 1.0)).xyz;
    gl_Position = combinedMat * vec4(position, 1.0);
}
    ".to_string();

    static ref DERIVED_FRAGMENT: String =
    "
in vec3 varNormal;
in vec3 varPos;

uniform vec3 diffuseColor;
uniform int normalsEnabled;

out vec4 fragColor;

void main() {
    vec3 normal;
    if (normalsEnabled == 1) {
        normal = normalize(varNormal);
    } else {
        normal = normalize(cross(dFdx(varPos), dFdy(varPos)));
    }

    float f = abs(normal.z) * 0.75 + 0.25;

    fragColor = vec4(f * diffuseColor, 1.0);
}
    ".to_string();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderVariant {
    /// Interpolated normals only.
    Smooth,
    /// Interpolated or derivative-based normals, selected by `normalsEnabled`.
    DerivedNormal,
}

impl ShaderVariant {
    pub fn source(self, stage: Stage) -> &'static str {
        match (self, stage) {
            (ShaderVariant::Smooth, Stage::Vertex) => SMOOTH_VERTEX.as_str(),
            (ShaderVariant::Smooth, Stage::Fragment) => SMOOTH_FRAGMENT.as_str(),
            (ShaderVariant::DerivedNormal, Stage::Vertex) => DERIVED_VERTEX.as_str(),
            (ShaderVariant::DerivedNormal, Stage::Fragment) => DERIVED_FRAGMENT.as_str(),
        }
    }

    /// Source with the given version directive line prepended.
    pub fn versioned_source(self, stage: Stage, version: &str) -> String {
        format!("{}\n{}", version, self.source(stage))
    }

    /// Uniforms the linked program exposes.
    pub fn uniform_names(self) -> &'static [&'static str] {
        match self {
            ShaderVariant::Smooth => &[
                uniform::COMBINED_MAT,
                uniform::NORMAL_MAT,
                uniform::DIFFUSE_COLOR,
            ],
            ShaderVariant::DerivedNormal => &[
                uniform::COMBINED_MAT,
                uniform::NORMAL_MAT,
                uniform::MODEL_MAT,
                uniform::DIFFUSE_COLOR,
                uniform::NORMALS_ENABLED,
            ],
        }
    }

    pub fn varying_names(self) -> &'static [&'static str] {
        match self {
            ShaderVariant::Smooth => &[varying::NORMAL],
            ShaderVariant::DerivedNormal => &[varying::NORMAL, varying::POSITION],
        }
    }

    /// File-like tag for compiler diagnostics, e.g. `smooth.vert`.
    pub fn tag(self, stage: Stage) -> String {
        let name = match self {
            ShaderVariant::Smooth => "smooth",
            ShaderVariant::DerivedNormal => "derived_normal",
        };
        let extension = match stage {
            Stage::Vertex => "vert",
            Stage::Fragment => "frag",
        };
        format!("{}.{}", name, extension)
    }
}

impl std::str::FromStr for ShaderVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smooth" => Ok(ShaderVariant::Smooth),
            "derived" | "derived_normal" => Ok(ShaderVariant::DerivedNormal),
            _ => anyhow::bail!("unknown shader variant '{}'", s),
        }
    }
}
