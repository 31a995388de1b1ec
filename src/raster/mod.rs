mod clip;
mod triangle;

use crate::common::bounds::Bounds2i;
use crate::common::film::{Film, FilmTile};
use crate::common::mesh::Mesh;
use crate::shading::{FragmentInput, ShaderProgram, Varyings, VertexOutput};
use itertools::Itertools;
#[cfg(not(feature = "disable_rayon"))]
use rayon::prelude::*;
use std::time::Instant;
use triangle::TriangleSetup;

pub const TILE_SIZE: i32 = 16;

/// Pixel offsets of a 2x2 quad: origin, +x, +y, +x+y.
const QUAD_OFFSETS: [(i32, i32); 4] = [(0, 0), (1, 0), (0, 1), (1, 1)];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrawStats {
    pub triangles_submitted: usize,
    /// Triangles that survived clipping and setup, counting each piece of a clipped triangle.
    pub triangles_rasterized: usize,
    pub fragments_shaded: usize,
}

impl std::ops::AddAssign for DrawStats {
    fn add_assign(&mut self, rhs: DrawStats) {
        self.triangles_submitted += rhs.triangles_submitted;
        self.triangles_rasterized += rhs.triangles_rasterized;
        self.fragments_shaded += rhs.fragments_shaded;
    }
}

/// Software stand-in for the fixed function part of a GL draw call.
///
/// Vertices go through the program's vertex stage, triangles are clipped against the near plane
/// and mapped to the whole film, and fragments are shaded in 2x2 quads so `dFdx`/`dFdy` are
/// available to the fragment stage. Depth testing uses `GL_LESS` and no faces are culled.
pub struct Pipeline {
    log: slog::Logger,
}

impl Pipeline {
    pub fn new(log: &slog::Logger) -> Self {
        let log = log.new(o!("module" => "raster"));
        Pipeline { log }
    }

    pub fn draw<P: ShaderProgram>(
        &self,
        film: &mut Film,
        program: &P,
        mesh: &Mesh,
    ) -> anyhow::Result<DrawStats> {
        let start = Instant::now();
        let triangles = mesh.triangles()?;
        let vertices = run_vertex_stage(program, mesh);
        let viewport = film.get_sample_bounds();

        let setups = triangles
            .iter()
            .flat_map(|t| {
                clip::clip_near([
                    &vertices[t[0] as usize],
                    &vertices[t[1] as usize],
                    &vertices[t[2] as usize],
                ])
            })
            .filter_map(|t| TriangleSetup::new([&t[0], &t[1], &t[2]], &viewport))
            .collect_vec();

        trace!(
            self.log,
            "{} of {} triangles left after clipping and setup",
            setups.len(),
            triangles.len()
        );

        let sample_extent = viewport.diagonal();
        let num_tiles = na::Point2::new(
            (sample_extent.x + TILE_SIZE - 1) / TILE_SIZE,
            (sample_extent.y + TILE_SIZE - 1) / TILE_SIZE,
        );

        let tiles = (0..num_tiles.x)
            .cartesian_product(0..num_tiles.y)
            .map(|(x, y)| {
                let x0 = viewport.p_min.x + x * TILE_SIZE;
                let y0 = viewport.p_min.y + y * TILE_SIZE;
                Bounds2i::new(
                    na::Point2::new(x0, y0),
                    na::Point2::new(
                        std::cmp::min(x0 + TILE_SIZE, viewport.p_max.x),
                        std::cmp::min(y0 + TILE_SIZE, viewport.p_max.y),
                    ),
                )
            })
            .filter(|tile_bounds| {
                setups
                    .iter()
                    .any(|s| Bounds2i::overlaps(&s.bounds, tile_bounds))
            })
            .collect_vec();

        let target = &*film;
        let shade_tile = |tile_bounds: &Bounds2i| {
            let mut film_tile = target.get_film_tile(tile_bounds);
            let fragments = rasterize_tile(program, &setups, &mut film_tile);
            (film_tile, fragments)
        };

        #[cfg(not(feature = "disable_rayon"))]
        let shaded = tiles.par_iter().map(shade_tile).collect::<Vec<_>>();
        #[cfg(feature = "disable_rayon")]
        let shaded = tiles.iter().map(shade_tile).collect::<Vec<_>>();

        let mut stats = DrawStats {
            triangles_submitted: triangles.len(),
            triangles_rasterized: setups.len(),
            fragments_shaded: 0,
        };
        for (film_tile, fragments) in shaded {
            film.merge_film_tile(film_tile);
            stats.fragments_shaded += fragments;
        }

        debug!(
            self.log,
            "drew {} triangles into {} tiles, {} fragments shaded in {:?}",
            stats.triangles_rasterized,
            tiles.len(),
            stats.fragments_shaded,
            start.elapsed()
        );

        Ok(stats)
    }
}

fn run_vertex_stage<P: ShaderProgram>(program: &P, mesh: &Mesh) -> Vec<VertexOutput<P::Varyings>> {
    #[cfg(not(feature = "disable_rayon"))]
    let vertices = (0..mesh.num_vertices())
        .into_par_iter()
        .map(|i| program.vertex(&mesh.vertex_input(i)))
        .collect();
    #[cfg(feature = "disable_rayon")]
    let vertices = (0..mesh.num_vertices())
        .map(|i| program.vertex(&mesh.vertex_input(i)))
        .collect();

    vertices
}

fn rasterize_tile<P: ShaderProgram>(
    program: &P,
    setups: &[TriangleSetup<P::Varyings>],
    film_tile: &mut FilmTile,
) -> usize {
    let tile_bounds = film_tile.get_pixel_bounds();
    let mut fragments = 0;

    // submission order is kept within a tile, which keeps depth ties deterministic
    for setup in setups
        .iter()
        .filter(|s| Bounds2i::overlaps(&s.bounds, &tile_bounds))
    {
        let region = Bounds2i::intersect(&setup.bounds, &tile_bounds);
        // quads are aligned to even pixels, and tiles start on even pixels
        let x0 = region.p_min.x & !1;
        let y0 = region.p_min.y & !1;

        for (qy, qx) in (y0..region.p_max.y)
            .step_by(2)
            .cartesian_product((x0..region.p_max.x).step_by(2))
        {
            fragments += shade_quad(program, setup, film_tile, &tile_bounds, qx, qy);
        }
    }

    fragments
}

fn shade_quad<P: ShaderProgram>(
    program: &P,
    setup: &TriangleSetup<P::Varyings>,
    film_tile: &mut FilmTile,
    tile_bounds: &Bounds2i,
    qx: i32,
    qy: i32,
) -> usize {
    let samples = QUAD_OFFSETS
        .map(|(dx, dy)| setup.sample((qx + dx) as f32 + 0.5, (qy + dy) as f32 + 0.5));
    if !samples.iter().any(|s| s.covered) {
        return 0;
    }

    // uncovered pixels still get varyings, they only feed the derivatives
    let varyings = samples.map(|s| setup.varyings(&s.weights));
    let ddx = varyings[1].difference(&varyings[0]);
    let ddy = varyings[2].difference(&varyings[0]);

    let mut fragments = 0;
    for ((sample, v), (dx, dy)) in samples.iter().zip(varyings.iter()).zip(QUAD_OFFSETS.iter()) {
        let pixel = na::Point2::new(qx + dx, qy + dy);
        if !sample.covered || !tile_bounds.contains(&pixel) {
            continue;
        }

        let depth = setup.depth(&sample.weights);
        if !(0.0..=1.0).contains(&depth) || depth >= film_tile.get_depth(&pixel) {
            continue;
        }

        let color = program.fragment(&FragmentInput {
            frag_coord: glm::vec3(pixel.x as f32 + 0.5, pixel.y as f32 + 0.5, depth),
            varyings: *v,
            ddx,
            ddy,
        });
        film_tile.set_pixel(&pixel, color, depth);
        fragments += 1;
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::film::FAR_DEPTH;
    use crate::common::mesh::{IndexData, PrimitiveType};
    use crate::shading::fragment::flat_normal;
    use crate::shading::{
        DerivedNormalProgram, DerivedVaryings, ShadingMode, SmoothProgram, Uniforms, VertexInput,
    };

    fn logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, o!())
    }

    /// Two triangles covering clip space, with `z = slope * x + offset`.
    fn quad(slope: f32, offset: f32) -> Mesh {
        let pos = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .iter()
            .map(|&(x, y)| na::Point3::new(x, y, slope * x + offset))
            .collect_vec();
        let normal = vec![glm::vec3(0.0, 0.0, 1.0); 4];

        Mesh::new(
            pos,
            Some(normal),
            IndexData::Indices(vec![0, 1, 2, 0, 2, 3]),
            PrimitiveType::Triangles,
        )
        .unwrap()
    }

    fn for_each_pixel(film: &Film, mut f: impl FnMut(na::Point2<i32>)) {
        let bounds = film.get_sample_bounds();
        for (y, x) in (bounds.p_min.y..bounds.p_max.y).cartesian_product(bounds.p_min.x..bounds.p_max.x) {
            f(na::Point2::new(x, y));
        }
    }

    /// Writes the flat normal as the color so tests can inspect it.
    struct FlatNormalProgram {
        uniforms: Uniforms,
    }

    impl ShaderProgram for FlatNormalProgram {
        type Varyings = DerivedVaryings;

        fn vertex(&self, input: &VertexInput) -> VertexOutput<DerivedVaryings> {
            DerivedNormalProgram::new(self.uniforms).vertex(input)
        }

        fn fragment(&self, input: &FragmentInput<DerivedVaryings>) -> glm::Vec4 {
            let n = flat_normal(&input.ddx.position, &input.ddy.position);
            glm::vec4(n.x, n.y, n.z, 1.0)
        }
    }

    #[test]
    fn test_full_screen_quad_covers_every_pixel_once() {
        let pipeline = Pipeline::new(&logger());
        let mut film = Film::new(&glm::vec2(8, 8));
        let program = SmoothProgram::new(Uniforms::default().with_diffuse_color(glm::vec3(1.0, 0.0, 0.0)));

        let stats = pipeline.draw(&mut film, &program, &quad(0.0, 0.0)).unwrap();
        assert_eq!(
            stats,
            DrawStats {
                triangles_submitted: 2,
                triangles_rasterized: 2,
                fragments_shaded: 64,
            }
        );

        for_each_pixel(&film, |p| {
            approx::assert_relative_eq!(film.get_pixel(&p), glm::vec4(1.0, 0.0, 0.0, 1.0), epsilon = 1e-6);
            approx::assert_relative_eq!(film.get_depth(&p), 0.5, epsilon = 1e-6);
        });
    }

    #[test]
    fn test_tiles_cover_non_multiple_resolution() {
        let pipeline = Pipeline::new(&logger());
        let mut film = Film::new(&glm::vec2(37, 21));
        let program = SmoothProgram::default();

        let stats = pipeline.draw(&mut film, &program, &quad(0.0, 0.0)).unwrap();
        assert_eq!(stats.fragments_shaded, 37 * 21);
    }

    #[test]
    fn test_flat_normal_of_facing_plane() {
        let pipeline = Pipeline::new(&logger());
        let mut film = Film::new(&glm::vec2(8, 8));
        let diffuse = glm::vec3(0.8, 0.4, 0.2);
        let program = DerivedNormalProgram::new(
            Uniforms::default()
                .with_diffuse_color(diffuse)
                .with_shading_mode(ShadingMode::Flat),
        );

        pipeline.draw(&mut film, &program, &quad(0.0, 0.0)).unwrap();
        for_each_pixel(&film, |p| {
            approx::assert_relative_eq!(film.get_pixel(&p), glm::vec4(0.8, 0.4, 0.2, 1.0), epsilon = 1e-5);
        });
    }

    #[test]
    fn test_flat_normal_of_tilted_plane() {
        let pipeline = Pipeline::new(&logger());
        let white = glm::vec3(1.0, 1.0, 1.0);
        let expected = 0.75 * 2.0 / 5.0f32.sqrt() + 0.25;

        let mut film = Film::new(&glm::vec2(16, 16));
        let flat = DerivedNormalProgram::new(
            Uniforms::default()
                .with_diffuse_color(white)
                .with_shading_mode(ShadingMode::Flat),
        );
        pipeline.draw(&mut film, &flat, &quad(0.5, 0.0)).unwrap();
        for_each_pixel(&film, |p| {
            approx::assert_relative_eq!(film.get_pixel(&p).x, expected, epsilon = 1e-4);
        });

        // the supplied normals face the viewer, so the interpolated path stays fully lit
        let mut film = Film::new(&glm::vec2(16, 16));
        let interpolated = DerivedNormalProgram::new(Uniforms::default().with_diffuse_color(white));
        pipeline.draw(&mut film, &interpolated, &quad(0.5, 0.0)).unwrap();
        for_each_pixel(&film, |p| {
            approx::assert_relative_eq!(film.get_pixel(&p).x, 1.0, epsilon = 1e-5);
        });
    }

    #[test]
    fn test_flat_normal_is_consistent_under_perspective() {
        let pipeline = Pipeline::new(&logger());
        let mut film = Film::new(&glm::vec2(32, 32));
        let projection = glm::perspective(1.0, 1.0, 0.1, 10.0);
        let view = glm::look_at_rh(
            &glm::vec3(0.3, 0.2, 2.0),
            &glm::vec3(0.0, 0.0, 0.0),
            &glm::vec3(0.0, 1.0, 0.0),
        );
        let program = FlatNormalProgram {
            uniforms: Uniforms::from_transforms(&projection, &view, &glm::Mat4::identity()),
        };

        let stats = pipeline.draw(&mut film, &program, &quad(0.0, 0.0)).unwrap();
        assert!(stats.fragments_shaded > 0);

        // the plane normal in view space, pointing back at the camera
        let expected = (view * glm::vec4(0.0, 0.0, 1.0, 0.0)).xyz();
        for_each_pixel(&film, |p| {
            if film.get_depth(&p) < FAR_DEPTH {
                approx::assert_relative_eq!(film.get_pixel(&p).xyz(), expected, epsilon = 1e-3);
            }
        });
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let pipeline = Pipeline::new(&logger());
        let red = glm::vec3(1.0, 0.0, 0.0);
        let green = glm::vec3(0.0, 1.0, 0.0);
        let near = quad(0.0, -0.5);
        let far = quad(0.0, 0.5);

        for order in [[(&near, green), (&far, red)], [(&far, red), (&near, green)]] {
            let mut film = Film::new(&glm::vec2(8, 8));
            for (mesh, color) in order {
                let program = SmoothProgram::new(Uniforms::default().with_diffuse_color(color));
                pipeline.draw(&mut film, &program, mesh).unwrap();
            }
            for_each_pixel(&film, |p| {
                approx::assert_relative_eq!(
                    film.get_pixel(&p),
                    glm::vec4(0.0, 1.0, 0.0, 1.0),
                    epsilon = 1e-6
                );
                approx::assert_relative_eq!(film.get_depth(&p), 0.25, epsilon = 1e-6);
            });
        }
    }

    #[test]
    fn test_equal_depth_fails() {
        let pipeline = Pipeline::new(&logger());
        let mut film = Film::new(&glm::vec2(8, 8));
        let program = SmoothProgram::default();

        pipeline.draw(&mut film, &program, &quad(0.0, 0.0)).unwrap();
        let stats = pipeline.draw(&mut film, &program, &quad(0.0, 0.0)).unwrap();
        assert_eq!(stats.fragments_shaded, 0);
    }

    #[test]
    fn test_index_errors_propagate() {
        let pipeline = Pipeline::new(&logger());
        let mut film = Film::new(&glm::vec2(8, 8));
        let mesh = Mesh::new(
            quad(0.0, 0.0).pos,
            None,
            IndexData::Indices(vec![0, 1, 2, 3]),
            PrimitiveType::Triangles,
        )
        .unwrap();

        assert!(pipeline.draw(&mut film, &SmoothProgram::default(), &mesh).is_err());
    }

    #[test]
    fn test_near_plane_clipping() {
        let pipeline = Pipeline::new(&logger());
        let program = SmoothProgram::default();
        let crossing = Mesh::new(
            vec![
                na::Point3::new(-1.0, -1.0, 0.0),
                na::Point3::new(1.0, -1.0, 0.0),
                na::Point3::new(0.0, 1.0, -3.0),
            ],
            None,
            IndexData::NonIndexed(3),
            PrimitiveType::Triangles,
        )
        .unwrap();

        let mut film = Film::new(&glm::vec2(16, 16));
        let stats = pipeline.draw(&mut film, &program, &crossing).unwrap();
        assert_eq!(stats.triangles_rasterized, 2);
        assert!(stats.fragments_shaded > 0);
        for_each_pixel(&film, |p| {
            let depth = film.get_depth(&p);
            assert!((0.0..=1.0).contains(&depth));
            // the part beyond the near plane is gone
            if p.y >= 8 {
                assert_eq!(depth, FAR_DEPTH);
            }
        });

        let behind = Mesh::new(
            vec![
                na::Point3::new(-1.0, -1.0, -2.0),
                na::Point3::new(1.0, -1.0, -2.0),
                na::Point3::new(0.0, 1.0, -3.0),
            ],
            None,
            IndexData::NonIndexed(3),
            PrimitiveType::Triangles,
        )
        .unwrap();
        let mut film = Film::new(&glm::vec2(16, 16));
        let stats = pipeline.draw(&mut film, &program, &behind).unwrap();
        assert_eq!(stats.triangles_rasterized, 0);
        assert_eq!(stats.fragments_shaded, 0);
    }

    #[test]
    fn test_missing_normals_shade_nan_as_black() {
        let pipeline = Pipeline::new(&logger());
        let mut film = Film::new(&glm::vec2(4, 4));
        let program = SmoothProgram::new(Uniforms::default().with_diffuse_color(glm::vec3(1.0, 1.0, 1.0)));

        let stats = pipeline
            .draw(&mut film, &program, &quad(0.0, 0.0).without_normals())
            .unwrap();
        assert_eq!(stats.fragments_shaded, 16);
        assert_eq!(film.to_rgba_image().get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_near_zero_w_draws_without_fault() {
        let pipeline = Pipeline::new(&logger());
        let mut film = Film::new(&glm::vec2(8, 8));
        let mut uniforms = Uniforms::default();
        uniforms.combined_mat[(3, 3)] = 1e-30;
        let triangle = Mesh::new(
            vec![
                na::Point3::new(-1.0, -1.0, 0.0),
                na::Point3::new(1.0, -1.0, 0.0),
                na::Point3::new(0.0, 1.0, 0.0),
            ],
            None,
            IndexData::NonIndexed(3),
            PrimitiveType::Triangles,
        )
        .unwrap();

        let stats = pipeline
            .draw(&mut film, &SmoothProgram::new(uniforms), &triangle)
            .unwrap();
        assert_eq!(stats.triangles_submitted, 1);
        for_each_pixel(&film, |p| {
            assert!((0.0..=1.0).contains(&film.get_depth(&p)));
        });
    }
}
