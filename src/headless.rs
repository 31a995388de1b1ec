use crate::common::bounds::Bounds3;
use crate::common::film::{Film, DEFAULT_CLEAR_COLOR};
use crate::common::mesh::Mesh;
use crate::common::shapes::Shape;
use crate::common::DEFAULT_RESOLUTION;
use crate::raster::{DrawStats, Pipeline};
use crate::shading::{
    DerivedNormalProgram, Material, ShaderVariant, ShadingMode, SmoothProgram, Uniforms,
};
use anyhow::{bail, Context};
use std::path::PathBuf;
use std::time::Instant;

/// Distance between neighbouring shape centers along X.
pub const SHAPE_SPACING: f32 = 3.0;

/// Vertical field of view of the demo camera, radians.
const FOVY: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub resolution: glm::UVec2,
    pub shapes: Vec<Shape>,
    pub variant: ShaderVariant,
    pub shading_mode: ShadingMode,
    pub material: Material,
    pub clear_color: glm::Vec4,
    /// Camera rotation around the up axis, radians.
    pub yaw: f32,
    /// Camera elevation, radians. Must stay strictly between -pi/2 and pi/2.
    pub pitch: f32,
    /// Render the meshes as if they had no normals.
    pub strip_normals: bool,
    pub output_path: PathBuf,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            resolution: *DEFAULT_RESOLUTION,
            shapes: vec![Shape::Cube],
            variant: ShaderVariant::DerivedNormal,
            shading_mode: ShadingMode::Interpolated,
            material: Material::Phong {
                diffuse_color: glm::vec3(0.8, 0.8, 0.8),
            },
            clear_color: *DEFAULT_CLEAR_COLOR,
            yaw: 0.6,
            pitch: 0.4,
            strip_normals: false,
            output_path: PathBuf::from("render.png"),
        }
    }
}

/// Projection and view matrices that fit `bounds` into the view from the given direction.
///
/// Near and far planes hug the bounding sphere of the scene.
pub fn frame_scene(bounds: &Bounds3, aspect: f32, yaw: f32, pitch: f32) -> (glm::Mat4, glm::Mat4) {
    let center = bounds.center().coords;
    let diagonal = bounds.diagonal().norm().max(1e-3);
    let radius = diagonal * 0.5;
    let distance = 1.5 * diagonal;

    let direction = glm::vec3(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos());
    let eye = center + direction * distance;
    let view = glm::look_at_rh(&eye, &center, &glm::vec3(0.0, 1.0, 0.0));

    let far = distance + radius * 1.5;
    let near = (distance - radius).max(far * 1e-6);

    (glm::perspective(aspect, FOVY, near, far), view)
}

/// The flag a mesh is drawn with: without normals only derived ones are meaningful.
fn shading_mode_for(mesh: &Mesh, requested: ShadingMode) -> ShadingMode {
    if mesh.has_normals() {
        requested
    } else {
        ShadingMode::Flat
    }
}

/// Generates the requested shapes, lays them out along X and their model matrices.
fn build_scene(settings: &RenderSettings) -> anyhow::Result<Vec<(Shape, Mesh, glm::Mat4)>> {
    let offset = (settings.shapes.len() - 1) as f32 * SHAPE_SPACING * 0.5;

    settings
        .shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| -> anyhow::Result<_> {
            let mesh = shape
                .mesh()
                .with_context(|| format!("failed to generate {}", shape.name()))?;
            let mesh = if settings.strip_normals {
                mesh.without_normals()
            } else {
                mesh
            };
            let model = glm::translation(&glm::vec3(i as f32 * SHAPE_SPACING - offset, 0.0, 0.0));
            Ok((*shape, mesh, model))
        })
        .collect()
}

pub fn render(log: &slog::Logger, settings: &RenderSettings) -> anyhow::Result<Film> {
    let log = log.new(o!("module" => "headless"));

    if settings.shapes.is_empty() {
        bail!("no shapes to render");
    }
    if settings.resolution.x == 0 || settings.resolution.y == 0 {
        bail!("invalid resolution {}x{}", settings.resolution.x, settings.resolution.y);
    }
    if settings.resolution.x > i32::MAX as u32 || settings.resolution.y > i32::MAX as u32 {
        bail!(
            "resolution {}x{} exceeds {} pixels per axis",
            settings.resolution.x,
            settings.resolution.y,
            i32::MAX
        );
    }
    if !(settings.pitch.abs() < std::f32::consts::FRAC_PI_2) {
        bail!("pitch {} must be within (-pi/2, pi/2)", settings.pitch);
    }
    // the smooth program never reads normalsEnabled
    if matches!(settings.variant, ShaderVariant::Smooth)
        && matches!(settings.shading_mode, ShadingMode::Flat)
    {
        bail!("flat shading needs the derived normal variant");
    }

    let start = Instant::now();
    let scene = build_scene(settings)?;
    let bounds = scene.iter().fold(Bounds3::empty(), |b, (_, mesh, model)| {
        Bounds3::union(&b, &mesh.bounds().transformed(model))
    });
    debug!(log, "scene bounds: {}", bounds);

    let aspect = settings.resolution.x as f32 / settings.resolution.y as f32;
    let (projection, view) = frame_scene(&bounds, aspect, settings.yaw, settings.pitch);

    let mut film = Film::new(&settings.resolution);
    film.clear(&settings.clear_color);

    let pipeline = Pipeline::new(&log);
    let mut stats = DrawStats::default();
    for (shape, mesh, model) in scene.iter() {
        let uniforms = Uniforms::from_transforms(&projection, &view, model)
            .with_material(&settings.material)
            .with_shading_mode(shading_mode_for(mesh, settings.shading_mode));

        let shape_stats = match settings.variant {
            ShaderVariant::Smooth => {
                if !mesh.has_normals() {
                    bail!(
                        "the smooth variant needs vertex normals, but {} has none",
                        shape.name()
                    );
                }
                pipeline.draw(&mut film, &SmoothProgram::new(uniforms), mesh)
            }
            ShaderVariant::DerivedNormal => {
                pipeline.draw(&mut film, &DerivedNormalProgram::new(uniforms), mesh)
            }
        }
        .with_context(|| format!("failed to draw {}", shape.name()))?;

        trace!(log, "{}: {:?}", shape.name(), shape_stats);
        stats += shape_stats;
    }

    info!(
        log,
        "rendered {} shapes ({} triangles, {} fragments) in {:?}",
        scene.len(),
        stats.triangles_rasterized,
        stats.fragments_shaded,
        start.elapsed()
    );

    Ok(film)
}

pub fn run(log: slog::Logger, settings: RenderSettings) -> anyhow::Result<()> {
    let film = render(&log, &settings)?;

    info!(log, "saving image to {:?}", &settings.output_path);
    film.save(&settings.output_path)
}
