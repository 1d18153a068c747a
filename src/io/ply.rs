//! PLY (Stanford polygon) format support.
//!
//! Faces are kept as polygons. Per-vertex texture coordinates are read from
//! `u`/`v`, `s`/`t` or `texture_u`/`texture_v` properties when present.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use nalgebra::{Point2, Point3};
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::algo::parameterize::TexCoords;
use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, HalfEdgeMesh, MeshIndex};

const UV_PROPERTY_NAMES: [(&str, &str); 3] = [("u", "v"), ("s", "t"), ("texture_u", "texture_v")];

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use tessera::io::ply;
/// use tessera::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    load_with_uvs(path).map(|(mesh, _)| mesh)
}

/// Load a mesh and its per-vertex texture coordinates, if any.
pub fn load_with_uvs<P: AsRef<Path>, I: MeshIndex>(
    path: P,
) -> Result<(HalfEdgeMesh<I>, Option<TexCoords>)> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!("loading PLY {}", path.display());
    parse_with_uvs(&mut BufReader::new(file)).map_err(|e| match e {
        MeshError::InvalidState(message) => MeshError::LoadError {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })
}

/// Parse a mesh and per-vertex texture coordinates from PLY data.
///
/// Format problems are reported as [`MeshError::InvalidState`]; [`load`]
/// turns them into [`MeshError::LoadError`] carrying the path.
pub fn parse_with_uvs<R: BufRead, I: MeshIndex>(
    reader: &mut R,
) -> Result<(HalfEdgeMesh<I>, Option<TexCoords>)> {
    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(reader)
        .map_err(|e| MeshError::InvalidState(e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| MeshError::InvalidState("PLY file has no vertex element".to_string()))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let coord = |name: &str| {
            get_float_property(vertex, name)
                .ok_or_else(|| MeshError::InvalidState(format!("vertex missing {} coordinate", name)))
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
    }

    let uvs: Option<Vec<Point2<f64>>> = UV_PROPERTY_NAMES.iter().find_map(|(u, v)| {
        vertex_element
            .iter()
            .map(|e| Some(Point2::new(get_float_property(e, u)?, get_float_property(e, v)?)))
            .collect()
    });

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| MeshError::InvalidState("PLY file has no face element".to_string()))?;

    let mut faces: Vec<Vec<usize>> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| {
                MeshError::InvalidState("face missing vertex_indices property".to_string())
            })?;
        faces.push(indices);
    }

    let mesh: HalfEdgeMesh<I> = build_from_polygons(&vertices, &faces)?;
    let tex = uvs
        .filter(|uvs| !uvs.is_empty())
        .map(|uvs| TexCoords::from_vertex_coords(&mesh, uvs));

    debug!(
        "parsed PLY: {} vertices, {} faces, texture coordinates: {}",
        mesh.num_vertices(),
        mesh.num_faces(),
        tex.is_some()
    );
    Ok((mesh, tex))
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to a PLY file (ASCII format).
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh as ASCII PLY.
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by tessera")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    for f in &faces {
        write!(writer, "{}", f.len())?;
        for i in f {
            write!(writer, " {}", i)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}
