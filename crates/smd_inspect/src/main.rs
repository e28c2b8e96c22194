//! Import an SMD model and print what was built.
//!
//! Run with: cargo run --bin smd_inspect -- assets/hero.smd [--scale 0.0254] [--force-rig] [--json] [--no-save]

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use serde_json::json;
use smd_core::mesh::Mesh;
use smd_core::scene::{NodeId, Renderer, Scene};
use smd_core::smd::{ImportedAsset, SmdImporter};
use smd_core::ImportSettings;

/// Command line options
struct Options {
    path: PathBuf,
    scale: Option<f32>,
    force_rig: bool,
    json: bool,
    save: bool,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self> {
        let mut path = None;
        let mut scale = None;
        let mut force_rig = false;
        let mut json = false;
        let mut save = true;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--scale" => {
                    let value = iter.next().context("--scale needs a value")?;
                    scale = Some(value.parse().with_context(|| format!("Invalid scale {:?}", value))?);
                }
                "--force-rig" => force_rig = true,
                "--json" => json = true,
                "--no-save" => save = false,
                flag if flag.starts_with("--") => bail!("Unknown option {}", flag),
                file => {
                    if path.replace(PathBuf::from(file)).is_some() {
                        bail!("Only one model path may be given");
                    }
                }
            }
        }

        Ok(Self {
            path: path.context("No model path given")?,
            scale,
            force_rig,
            json,
            save,
        })
    }

    fn apply(&self, settings: &mut ImportSettings) {
        if let Some(scale) = self.scale {
            settings.scale = scale;
        }
        if self.force_rig {
            settings.force_rig = true;
        }
    }
}

fn print_usage(program: &str) {
    println!("Usage: {} <model.smd> [options]", program);
    println!("\nOptions:");
    println!("  --scale <f>   Multiply vertex and bone positions");
    println!("  --force-rig   Build a skeleton even for single-bone models");
    println!("  --json        Print a JSON summary instead of text");
    println!("  --no-save     Do not write the settings sidecar");
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }
    let options = Options::parse(&args[1..])?;

    let mut importer = SmdImporter::for_model(&options.path)
        .with_context(|| format!("Failed to read settings for {}", options.path.display()))?;
    options.apply(&mut importer.settings);

    let asset = importer
        .import(&options.path)
        .with_context(|| format!("Failed to import {}", options.path.display()))?;

    if options.json {
        let summary = summary_json(&asset, &importer.settings);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&asset);
    }

    if options.save {
        importer
            .save_settings(&options.path)
            .context("Failed to write settings sidecar")?;
        log::info!(
            "Saved settings to {}",
            ImportSettings::sidecar_path(&options.path).display()
        );
    }

    Ok(())
}

fn print_summary(asset: &ImportedAsset) {
    let scene = &asset.scene;
    println!("\n=== Model: {} ===", scene.name);
    println!("Nodes: {}", scene.node_count());
    println!("Bones: {}", scene.bones().len());
    println!("Rigged: {}", asset.is_rigged());

    if let Some(mesh) = asset.mesh() {
        println!("Vertices: {}", mesh.vertex_count());
        println!("Triangles: {}", mesh.triangle_count());
        println!("Surface area: {:.3}", surface_area(mesh));
        println!(
            "Bounds: ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})",
            mesh.bounds.min.x,
            mesh.bounds.min.y,
            mesh.bounds.min.z,
            mesh.bounds.max.x,
            mesh.bounds.max.y,
            mesh.bounds.max.z
        );

        let world = scene.world_bounds();
        println!(
            "World bounds: ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})",
            world.min.x, world.min.y, world.min.z, world.max.x, world.max.y, world.max.z
        );

        println!("\n--- Submeshes ---");
        for (i, (submesh, material)) in mesh.submeshes.iter().zip(scene.materials()).enumerate() {
            let source = asset.material_names.get(i).map(String::as_str).unwrap_or("?");
            println!(
                "  [{}] {} ({}) - {} triangles, shader {}{}",
                i,
                material.name,
                source,
                submesh.triangle_count(),
                material.shader,
                if material.is_persisted() { ", persisted" } else { "" }
            );
        }
    }

    println!("\n--- Hierarchy ---");
    print_node(scene, scene.root, 0);

    println!("\n--- Objects ---");
    for key in asset.keys() {
        let marker = if key == asset.main_object { " (main)" } else { "" };
        println!("  {}{}", key, marker);
    }

    if !asset.warnings.is_empty() {
        println!("\n--- Warnings ---");
        for warning in &asset.warnings {
            println!("  {}", warning);
        }
    }
}

/// Total area of all triangles in mesh space.
fn surface_area(mesh: &Mesh) -> f32 {
    mesh.extract_triangle_vertices()
        .iter()
        .map(|[a, b, c]| (*b - *a).cross(*c - *a).length() * 0.5)
        .sum()
}

fn print_node(scene: &Scene, id: NodeId, depth: usize) {
    let node = scene.node(id);
    let position = scene.world_matrix(id).transform_point3(smd_math::Vec3::ZERO);
    let renderer = match node.renderer {
        Some(Renderer::Static(_)) => " [mesh]",
        Some(Renderer::Skinned(_)) => " [skinned mesh]",
        None => "",
    };
    println!(
        "  {}{}{} at ({:.2}, {:.2}, {:.2})",
        "  ".repeat(depth),
        node.name,
        renderer,
        position.x,
        position.y,
        position.z
    );
    for &child in &node.children {
        print_node(scene, child, depth + 1);
    }
}

fn summary_json(asset: &ImportedAsset, settings: &ImportSettings) -> serde_json::Value {
    let scene = &asset.scene;
    let mesh = asset.mesh();
    let bones: Vec<_> = scene.bones().iter().map(|&b| scene.node(b).name.clone()).collect();

    json!({
        "name": scene.name,
        "rigged": asset.is_rigged(),
        "nodes": scene.node_count(),
        "bones": bones,
        "vertices": mesh.map(|m| m.vertex_count()).unwrap_or(0),
        "triangles": mesh.map(|m| m.triangle_count()).unwrap_or(0),
        "submeshes": mesh.map(|m| m.submesh_count()).unwrap_or(0),
        "surface_area": mesh.map(|m| surface_area(m)).unwrap_or(0.0),
        "objects": asset.keys().collect::<Vec<_>>(),
        "warnings": asset.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "settings": settings,
    })
}
