//! Tessera CLI - inspect meshes from the command line.
//!
//! Usage: tessera [--no-normalize-mesh] <COMMAND> <INPUT> [OPTIONS]
//!
//! Run `tessera --help` for available commands. Set `RUST_LOG=debug` for
//! pipeline details.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use tessera::algo::curvature::{CurvatureKind, CurvatureOptions};
use tessera::algo::geodesic::{PathAlgorithm, PathOptions};
use tessera::algo::parameterize::DistortionOptions;
use tessera::mesh::VertexId;
use tessera::model::{LoadOptions, MeshModel};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about = "Mesh curvature, path and UV inspection", long_about = None)]
struct Cli {
    /// Keep the mesh in its file coordinates instead of centering and scaling it
    #[arg(long, global = true)]
    no_normalize_mesh: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Compute a per-vertex curvature field
    Curvature {
        /// Input mesh file
        input: PathBuf,

        /// Curvature measure
        #[arg(short, long, value_enum, default_value = "gaussian")]
        kind: KindArg,

        /// Print raw values instead of values rescaled to [0, 1]
        #[arg(long)]
        no_normalize: bool,

        /// Print the value of every vertex
        #[arg(long)]
        all: bool,
    },

    /// Shortest path through two or more vertices
    Path {
        /// Input mesh file
        input: PathBuf,

        /// Vertex indices to visit in order
        #[arg(required = true, num_args = 2..)]
        vertices: Vec<usize>,

        /// Search algorithm
        #[arg(short, long, value_enum, default_value = "dijkstra")]
        algorithm: AlgorithmArg,

        /// Give up on legs longer than this, in units of the loaded mesh
        #[arg(long)]
        max_distance: Option<f64>,
    },

    /// Analyze the texture coordinates of a mesh
    Uv {
        /// Input mesh file
        input: PathBuf,

        /// Determinant threshold for degenerate UV triangles
        #[arg(long, default_value = "1e-12")]
        epsilon: f64,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// Angle defect over mixed area
    Gaussian,
    /// Half the square root of the mixed area
    Mean,
    /// Gaussian plus mean
    Max,
    /// Cotangent Laplace-Beltrami mean curvature
    MeanLaplacian,
}

impl From<KindArg> for CurvatureKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Gaussian => CurvatureKind::Gaussian,
            KindArg::Mean => CurvatureKind::Mean,
            KindArg::Max => CurvatureKind::Max,
            KindArg::MeanLaplacian => CurvatureKind::MeanLaplacian,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum AlgorithmArg {
    /// Dijkstra's algorithm
    Dijkstra,
    /// A* with a straight-line heuristic
    Astar,
}

impl From<AlgorithmArg> for PathAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Dijkstra => PathAlgorithm::Dijkstra,
            AlgorithmArg::Astar => PathAlgorithm::AStar,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = LoadOptions::default().with_normalize(!cli.no_normalize_mesh);

    match cli.command {
        Commands::Info { input } => cmd_info(&input, &options)?,
        Commands::Curvature {
            input,
            kind,
            no_normalize,
            all,
        } => {
            let curvature = CurvatureOptions::new(kind.into()).with_normalize(!no_normalize);
            cmd_curvature(&input, options.with_curvature(curvature), all)?;
        }
        Commands::Path {
            input,
            vertices,
            algorithm,
            max_distance,
        } => cmd_path(&input, &options, &vertices, algorithm.into(), max_distance)?,
        Commands::Uv { input, epsilon } => cmd_uv(&input, &options, epsilon)?,
    }

    Ok(())
}

fn load(input: &Path, options: &LoadOptions) -> Result<MeshModel, Box<dyn std::error::Error>> {
    let mut model = MeshModel::new();
    let start = Instant::now();
    model.load(input, options)?;
    println!(
        "Loaded: {} ({} vertices, {} faces, {:.2?})",
        input.display(),
        model.mesh().num_vertices(),
        model.mesh().num_faces(),
        start.elapsed()
    );
    Ok(model)
}

fn cmd_info(input: &Path, options: &LoadOptions) -> Result<(), Box<dyn std::error::Error>> {
    let model = load(input, options)?;
    let mesh = model.mesh();

    println!("Half-edges: {}", mesh.num_halfedges());
    println!("Edges: {}", model.edge_indices().len() / 2);
    println!("Triangles: {}", model.triangle_indices().len() / 3);
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }
    if let Some(n) = model.normalization() {
        println!(
            "Normalization: center ({:.4}, {:.4}, {:.4}), scale {:.6}",
            n.center.x, n.center.y, n.center.z, n.scale
        );
    }

    if mesh.is_triangle_mesh() {
        println!("Mesh type: Triangle mesh");
    } else {
        println!("Mesh type: Polygon mesh");
    }

    let boundary = mesh
        .vertex_ids()
        .filter(|&v| mesh.is_boundary_vertex(v))
        .count();
    if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary);
    }

    match model.tex_coords() {
        Some(tex) => println!("Texture coordinates: {}", tex.len()),
        None => println!("Texture coordinates: none"),
    }

    Ok(())
}

fn cmd_curvature(input: &Path, options: LoadOptions, all: bool) -> Result<(), Box<dyn std::error::Error>> {
    let model = load(input, &options)?;
    let field = model.curvature();

    println!("Curvature: {}", field.kind);
    match field.range {
        Some((min, max)) => println!("Raw range: [{:.6}, {:.6}]", min, max),
        None => println!("Raw range: none (no interior vertices)"),
    }

    if !field.is_empty() {
        let avg = field.values.iter().sum::<f64>() / field.len() as f64;
        println!("Average: {:.6}", avg);
    }

    if all {
        for (i, value) in field.values.iter().enumerate() {
            println!("{} {:.6}", i, value);
        }
    }

    Ok(())
}

fn cmd_path(
    input: &Path,
    options: &LoadOptions,
    vertices: &[usize],
    algorithm: PathAlgorithm,
    max_distance: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let model = load(input, options)?;
    let waypoints: Vec<VertexId> = vertices.iter().map(|&v| VertexId::new(v)).collect();
    let mut path_options = PathOptions::default().with_algorithm(algorithm);
    if let Some(max) = max_distance {
        if !(max.is_finite() && max >= 0.0) {
            return Err(format!("--max-distance must be a non-negative number, got {}", max).into());
        }
        path_options = path_options.with_max_distance(max);
    }

    let start = Instant::now();
    let path = model.path_through(&waypoints, &path_options);
    let elapsed = start.elapsed();

    if path.is_empty() {
        match max_distance {
            Some(max) => println!("No path within {} ({}, {:.2?})", max, algorithm, elapsed),
            None => println!("No path ({}, {:.2?})", algorithm, elapsed),
        }
        return Ok(());
    }

    let ids: Vec<String> = path.vertices.iter().map(|v| v.index().to_string()).collect();
    println!("Path ({}, {:.2?}): {}", algorithm, elapsed, ids.join(" "));
    println!("Vertices: {}", path.len());
    println!("Edges: {}", model.path_edges(&path).len());
    println!("Length: {:.6}", path.length);

    Ok(())
}

fn cmd_uv(input: &Path, options: &LoadOptions, epsilon: f64) -> Result<(), Box<dyn std::error::Error>> {
    let model = load(input, options)?;
    let analysis = model.analyze_parameterization(&DistortionOptions::default().with_epsilon(epsilon))?;
    let report = &analysis.distortion;

    println!("UV vertices: {}", analysis.para.para.num_vertices());
    println!("Charts: {}", analysis.charts.num_charts);
    println!("Average distortion: {:.6}", report.average);
    if let Some(max) = report.max() {
        println!("Max distortion: {:.6}", max);
    }
    println!(
        "Orientation: {} positive, {} flipped, {} skipped",
        report.n_positive, report.n_negative, report.skipped
    );
    println!("Area factor: {:.6}", report.area_factor);
    println!("Cut length: {:.6} (normalized {:.6})", report.cut_length, report.normalized_cut_length);
    if let Some((min, max)) = report.uv_bbox {
        println!("UV bounds: ({:.4}, {:.4}) to ({:.4}, {:.4})", min.x, min.y, max.x, max.y);
    }

    let boundary = &analysis.boundary;
    println!(
        "Boundary: {} loops, {} corners, {} segments{}",
        boundary.num_loops(),
        boundary.corners.len(),
        boundary.segments.len(),
        if boundary.is_consistent() { "" } else { " (inconsistent)" }
    );

    Ok(())
}
