use std::env;

use anyhow::{anyhow, Context, Result};
use pollster::block_on;

use sceneview_core::{load_model, FileSource, GroundBounds, LoadedModel};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let source = FileSource::new(".");
    let model = block_on(load_model(&source, &options.path))
        .with_context(|| format!("failed to load {}", options.path))?;

    print_summary(&options.path, &model);

    if options.show_materials {
        print_materials(&model);
    }
    if options.ground_bounds {
        let text = std::fs::read_to_string(&options.path)
            .with_context(|| format!("unable to read {}", options.path))?;
        let bounds = GroundBounds::from_obj_text(&text);
        println!(
            "Ground bounds: x=[{:.2}, {:.2}] z=[{:.2}, {:.2}]",
            bounds.min_x, bounds.max_x, bounds.min_z, bounds.max_z
        );
    }
    Ok(())
}

fn print_summary(path: &str, model: &LoadedModel) {
    let vertex_count: usize = model
        .parts
        .iter()
        .map(|part| part.streams.vertex_count())
        .sum();
    println!(
        "Loaded {path}: {} part(s), {} vertices",
        model.parts.len(),
        vertex_count
    );
    for part in &model.parts {
        println!(
            " - {} [{}] {} vertices",
            part.object,
            part.material.name,
            part.streams.vertex_count()
        );
    }
    println!(
        "Centering offset: ({:.2}, {:.2}, {:.2})",
        model.offset.x, model.offset.y, model.offset.z
    );
}

fn print_materials(model: &LoadedModel) {
    println!("Materials:");
    for part in &model.parts {
        let material = &part.material;
        println!(
            " - {}: diffuse=({:.2}, {:.2}, {:.2}) specular=({:.2}, {:.2}, {:.2}) shininess={:.0} opacity={:.2}",
            material.name,
            material.diffuse.x,
            material.diffuse.y,
            material.diffuse.z,
            material.specular.x,
            material.specular.y,
            material.specular.z,
            material.shininess,
            material.opacity
        );
        for (slot, texture) in [
            ("diffuse map", &material.diffuse_map),
            ("specular map", &material.specular_map),
            ("normal map", &material.normal_map),
        ] {
            if let Some(file) = texture.file_name() {
                println!("   {slot}: {file}");
            }
        }
    }
}

struct CliOptions {
    path: String,
    show_materials: bool,
    ground_bounds: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: sceneview-core <model.obj> [--materials] [--ground-bounds]"
            ));
        };
        let mut show_materials = false;
        let mut ground_bounds = false;
        for arg in args {
            match arg.as_str() {
                "--materials" => show_materials = true,
                "--ground-bounds" => ground_bounds = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --materials or --ground-bounds"
                    ));
                }
            }
        }
        Ok(Self {
            path,
            show_materials,
            ground_bounds,
        })
    }
}
