#[macro_use]
extern crate slog;

extern crate nalgebra_glm as glm;

use cad_viewer_rs::common::shapes::Shape;
use cad_viewer_rs::headless::{self, RenderSettings};
use cad_viewer_rs::shading::{Material, ShaderVariant, ShadingMode};
use clap::clap_app;
use slog::Drain;
use std::path::PathBuf;

fn parse_arg<T>(val: String) -> Result<(), String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    val.parse::<T>().map(|_| ()).map_err(|e| e.to_string())
}

fn color_arg_legal(val: String) -> Result<(), String> {
    parse_color(&val).map(|_| ())
}

fn parse_color(val: &str) -> Result<glm::Vec3, String> {
    let channels = val
        .split(',')
        .map(|c| c.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("could not parse color: {}", e))?;

    match channels[..] {
        [r, g, b] => Ok(glm::vec3(r, g, b)),
        _ => Err(String::from("color must have three comma separated channels")),
    }
}

fn new_drain(level: slog::Level) -> slog::Fuse<slog::LevelFilter<slog::Fuse<slog_async::Async>>> {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    drain.filter_level(level).fuse()
}

fn settings_from_args(matches: &clap::ArgMatches) -> anyhow::Result<RenderSettings> {
    let defaults = RenderSettings::default();

    let shapes = match matches.values_of("SHAPES") {
        Some(values) => values
            .map(|s| s.parse::<Shape>())
            .collect::<anyhow::Result<Vec<_>>>()?,
        None => defaults.shapes,
    };

    let mut resolution = defaults.resolution;
    if let Some(width) = matches.value_of("width") {
        resolution.x = width.parse()?;
    }
    if let Some(height) = matches.value_of("height") {
        resolution.y = height.parse()?;
    }

    let material = match matches.value_of("color") {
        Some(color) => Material::Phong {
            diffuse_color: parse_color(color).map_err(anyhow::Error::msg)?,
        },
        None => defaults.material,
    };

    let shading_mode = if matches.is_present("flat") {
        ShadingMode::Flat
    } else {
        defaults.shading_mode
    };

    Ok(RenderSettings {
        resolution,
        shapes,
        variant: matches
            .value_of("variant")
            .map_or(Ok(defaults.variant), |v| v.parse::<ShaderVariant>())?,
        shading_mode,
        material,
        clear_color: defaults.clear_color,
        yaw: matches
            .value_of("yaw")
            .map_or(Ok(defaults.yaw), |v| v.parse::<f32>())?,
        pitch: matches
            .value_of("pitch")
            .map_or(Ok(defaults.pitch), |v| v.parse::<f32>())?,
        strip_normals: matches.is_present("strip"),
        output_path: matches
            .value_of("output")
            .map_or(defaults.output_path, PathBuf::from),
    })
}

fn main() {
    let info_drain = new_drain(slog::Level::Info);
    let drain = slog_atomic::AtomicSwitch::new(info_drain);
    let ctrl = drain.ctrl();
    let log = slog::Logger::root(drain.fuse(), o!());

    let matches = clap_app!(cad_viewer_rs =>
        (version: "1.0")
        (about: "Headless renderer for the CAD viewer shading programs")
        (@arg SHAPES: ... "Shapes to render side by side: cube, sphere, icosphere, torus, cylinder, plane")
        (@arg output: -o --output +takes_value "Sets the path of the rendered png")
        (@arg width: --width +takes_value validator(parse_arg::<u32>) "Image width in pixels")
        (@arg height: --height +takes_value validator(parse_arg::<u32>) "Image height in pixels")
        (@arg variant: --variant +takes_value possible_value[smooth derived derived_normal] "Shader program to render with")
        (@arg flat: --flat "Shade with normals derived from screen space derivatives (derived variant only)")
        (@arg strip: --strip "Drop vertex normals from the meshes")
        (@arg color: --color +takes_value validator(color_arg_legal) "Diffuse color as r,g,b")
        (@arg yaw: --yaw +takes_value validator(parse_arg::<f32>) "Camera yaw in radians")
        (@arg pitch: --pitch +takes_value validator(parse_arg::<f32>) "Camera pitch in radians")
        (@arg verbose: -v --verbose "Print trace information")
    )
    .get_matches();

    if matches.is_present("verbose") {
        ctrl.set(new_drain(slog::Level::Trace));
        debug!(log, "setting log level to trace");
    }

    let exit_code = match settings_from_args(&matches) {
        Ok(settings) => {
            debug!(log, "render settings: {:?}", settings);
            match headless::run(log.clone(), settings) {
                Ok(()) => 0,
                Err(err) => {
                    error!(log, "rendering failed: {:?}", err);
                    1
                }
            }
        }
        Err(err) => {
            error!(log, "invalid arguments: {:?}", err);
            2
        }
    };

    // flush the async drain before exiting
    drop(ctrl);
    drop(log);
    std::process::exit(exit_code);
}
