//! Wavefront OBJ format support.
//!
//! Reads `v`, `vt` and `f` records. Faces may be polygons and corners may use
//! the `v`, `v/t`, `v/t/n` and `v//n` forms, with 1-based or negative
//! (relative) indices. Normals, groups, materials and unknown records are
//! ignored.
//!
//! Loading is tolerant: malformed records and degenerate faces are skipped
//! with a warning. A face referencing a vertex that does not exist fails the
//! whole load.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, warn};
use nalgebra::{Point2, Point3};

use crate::algo::parameterize::TexCoords;
use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use tessera::io::obj;
/// use tessera::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    load_with_uvs(path).map(|(mesh, _)| mesh)
}

/// Load a mesh and its per-corner texture coordinates from an OBJ file.
///
/// The texture coordinates are `None` when the file has no `vt` record or no
/// face references one.
pub fn load_with_uvs<P: AsRef<Path>, I: MeshIndex>(
    path: P,
) -> Result<(HalfEdgeMesh<I>, Option<TexCoords>)> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!("loading OBJ {}", path.display());
    parse_with_uvs(BufReader::new(file))
}

/// Parse a mesh from OBJ text.
pub fn parse<R: BufRead, I: MeshIndex>(reader: R) -> Result<HalfEdgeMesh<I>> {
    parse_with_uvs(reader).map(|(mesh, _)| mesh)
}

/// One face corner: resolved position index and optional texture reference.
struct Corner {
    vertex: usize,
    tex: Option<i64>,
}

/// Parse a mesh and its per-corner texture coordinates from OBJ text.
pub fn parse_with_uvs<R: BufRead, I: MeshIndex>(
    reader: R,
) -> Result<(HalfEdgeMesh<I>, Option<TexCoords>)> {
    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut tex_coords: Vec<Point2<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();
    let mut face_tex: Vec<Option<Vec<usize>>> = Vec::new();
    let mut used_edges: HashSet<(usize, usize)> = HashSet::new();
    let mut skipped = 0usize;

    for (lineno, line) in reader.lines().enumerate() {
        let lineno = lineno + 1;
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };
        let args: Vec<&str> = parts.collect();

        match keyword {
            "v" => match parse_floats::<3>(&args) {
                Some([x, y, z]) => positions.push(Point3::new(x, y, z)),
                None => {
                    warn!("line {}: malformed vertex record skipped", lineno);
                    skipped += 1;
                }
            },
            "vt" => match parse_floats::<2>(&args) {
                Some([u, v]) => tex_coords.push(Point2::new(u, v)),
                None => {
                    warn!("line {}: malformed texture coordinate skipped", lineno);
                    skipped += 1;
                }
            },
            "f" => {
                let Some(corners) = parse_corners(&args, positions.len(), lineno)? else {
                    skipped += 1;
                    continue;
                };
                let Some(corners) = clean_face(corners) else {
                    warn!("line {}: degenerate face skipped", lineno);
                    skipped += 1;
                    continue;
                };

                let n = corners.len();
                let edges: Vec<(usize, usize)> = (0..n)
                    .map(|k| (corners[k].vertex, corners[(k + 1) % n].vertex))
                    .collect();
                if edges.iter().any(|e| used_edges.contains(e)) {
                    warn!(
                        "line {}: face would reuse a directed edge (non-manifold or flipped), skipped",
                        lineno
                    );
                    skipped += 1;
                    continue;
                }
                used_edges.extend(edges);

                face_tex.push(resolve_face_tex(&corners, tex_coords.len(), lineno));
                faces.push(corners.iter().map(|c| c.vertex).collect());
            }
            // vn, o, g, s, usemtl, mtllib, ...
            _ => {}
        }
    }

    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let mesh: HalfEdgeMesh<I> = build_from_polygons(&positions, &faces)?;

    let tex = if face_tex.iter().any(Option::is_some) {
        Some(TexCoords::from_face_indices(&mesh, tex_coords, &face_tex))
    } else {
        None
    };

    debug!(
        "parsed OBJ: {} vertices, {} faces, {} texture coordinates, {} records skipped",
        mesh.num_vertices(),
        mesh.num_faces(),
        tex.as_ref().map_or(0, TexCoords::len),
        skipped
    );

    Ok((mesh, tex))
}

fn parse_floats<const N: usize>(args: &[&str]) -> Option<[f64; N]> {
    if args.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, s) in out.iter_mut().zip(args) {
        *slot = s.parse().ok()?;
    }
    Some(out)
}

/// Resolve a 1-based or negative OBJ index against `count` defined entries.
fn resolve_index(raw: i64, count: usize) -> Option<usize> {
    let resolved = match raw {
        0 => return None,
        r if r > 0 => r - 1,
        r => count as i64 + r,
    };
    usize::try_from(resolved).ok().filter(|&i| i < count)
}

/// Parse the corners of a face record.
///
/// `Ok(None)` means the record is malformed and should be skipped; a corner
/// referencing an undefined vertex is an error.
fn parse_corners(args: &[&str], num_positions: usize, lineno: usize) -> Result<Option<Vec<Corner>>> {
    let mut corners = Vec::with_capacity(args.len());

    for arg in args {
        let mut fields = arg.split('/');
        let raw_vertex = fields.next().and_then(|s| s.parse::<i64>().ok());
        let Some(raw_vertex) = raw_vertex else {
            warn!("line {}: unparsable face corner '{}', face skipped", lineno, arg);
            return Ok(None);
        };

        let vertex = resolve_index(raw_vertex, num_positions).ok_or_else(|| {
            MeshError::parse(
                lineno,
                format!(
                    "face references vertex {} but only {} are defined",
                    raw_vertex, num_positions
                ),
            )
        })?;

        let tex = match fields.next() {
            None | Some("") => None,
            Some(s) => match s.parse::<i64>() {
                Ok(t) => Some(t),
                Err(_) => {
                    warn!("line {}: unparsable texture index '{}', face skipped", lineno, s);
                    return Ok(None);
                }
            },
        };

        corners.push(Corner { vertex, tex });
    }

    Ok(Some(corners))
}

/// Drop consecutive repeated vertices (cyclically) and reject faces that
/// still have fewer than three corners or repeat a vertex.
fn clean_face(mut corners: Vec<Corner>) -> Option<Vec<Corner>> {
    corners.dedup_by(|b, a| a.vertex == b.vertex);
    while corners.len() > 1 && corners.first().map(|c| c.vertex) == corners.last().map(|c| c.vertex) {
        corners.pop();
    }

    if corners.len() < 3 {
        return None;
    }

    let mut seen = HashSet::with_capacity(corners.len());
    if corners.iter().all(|c| seen.insert(c.vertex)) {
        Some(corners)
    } else {
        None
    }
}

/// Texture indices of a face, if every corner has a valid one.
fn resolve_face_tex(corners: &[Corner], num_tex: usize, lineno: usize) -> Option<Vec<usize>> {
    if corners.iter().all(|c| c.tex.is_none()) {
        return None;
    }

    let resolved: Option<Vec<usize>> = corners
        .iter()
        .map(|c| c.tex.and_then(|t| resolve_index(t, num_tex)))
        .collect();

    if resolved.is_none() {
        warn!(
            "line {}: missing or out-of-range texture index, face left untextured",
            lineno
        );
    }
    resolved
}

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use tessera::io::obj;
/// use tessera::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("model.obj").unwrap();
/// obj::save(&mesh, "copy.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, None, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh, and optionally its texture coordinates, as OBJ text.
pub fn write<W: Write, I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    tex: Option<&TexCoords>,
    writer: &mut W,
) -> Result<()> {
    writeln!(writer, "# tessera")?;
    for v in mesh.vertex_ids() {
        let p = mesh.position(v);
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    if let Some(tex) = tex {
        for uv in tex.coords() {
            writeln!(writer, "vt {} {}", uv.x, uv.y)?;
        }
    }

    for f in mesh.face_ids() {
        let corner_tex = tex.and_then(|t| t.face_indices(mesh, f));
        write!(writer, "f")?;
        for (k, v) in mesh.face_vertices(f).enumerate() {
            match &corner_tex {
                Some(t) => write!(writer, " {}/{}", v.index() + 1, t[k] + 1)?,
                None => write!(writer, " {}", v.index() + 1)?,
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;

    fn parse_str(src: &str) -> Result<(HalfEdgeMesh, Option<TexCoords>)> {
        parse_with_uvs(src.as_bytes())
    }

    #[test]
    fn test_parse_triangle() {
        let (mesh, tex) = parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert!(tex.is_none());
    }

    #[test]
    fn test_corner_forms_and_relative_indices() {
        let src = "\
# comment
o thing
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl red
f 1/1/1 2/2/1 3/3/1
f -4//1 -2//1 -1//1
";
        let (mesh, tex) = parse_str(src).unwrap();
        assert_eq!(mesh.num_faces(), 2);
        let corners: Vec<usize> = mesh.face_vertices(FaceId::new(1)).map(|v| v.index()).collect();
        assert_eq!(corners, vec![0, 2, 3]);

        let tex = tex.unwrap();
        assert_eq!(tex.face_indices(&mesh, FaceId::new(0)), Some(vec![0, 1, 2]));
        assert_eq!(tex.face_indices(&mesh, FaceId::new(1)), None);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let src = "\
v 0 0 0
v 1 0
v 1 0 0
v 0 1 0
vt nope
f 1 2 3
f 1 x 3
f 1 1 2
f 1 2 1 3
";
        let (mesh, _) = parse_str(src).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
    }

    #[test]
    fn test_consecutive_duplicates_collapse() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 2 3 1\n";
        let (mesh, _) = parse_str(src).unwrap();
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.face_valence(FaceId::new(0)), 3);
    }

    #[test]
    fn test_undefined_vertex_fails() {
        let err = parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\n\nf 1 2 7\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 5, .. }));
    }

    #[test]
    fn test_duplicate_directed_edge_skipped() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 -1 0\nf 1 2 3\nf 1 2 4\n";
        let (mesh, _) = parse_str(src).unwrap();
        assert_eq!(mesh.num_faces(), 1);
    }

    #[test]
    fn test_out_of_range_tex_drops_face_tex() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/2 3/1\n";
        let (mesh, tex) = parse_str(src).unwrap();
        assert_eq!(mesh.num_faces(), 1);
        assert!(tex.is_none());
    }

    #[test]
    fn test_no_faces() {
        assert!(matches!(parse_str("v 0 0 0\n"), Err(MeshError::EmptyMesh)));
        assert!(matches!(parse_str(""), Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_write_then_parse() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\nf 1/1 2/2 3/3 4/4\n";
        let (mesh, tex) = parse_str(src).unwrap();

        let mut out = Vec::new();
        write(&mesh, tex.as_ref(), &mut out).unwrap();
        let (again, tex_again) = parse_str(std::str::from_utf8(&out).unwrap()).unwrap();

        assert_eq!(again.num_faces(), 1);
        assert_eq!(again.face_valence(FaceId::new(0)), 4);
        assert_eq!(
            tex_again.unwrap().face_indices(&again, FaceId::new(0)),
            Some(vec![0, 1, 2, 3])
        );
    }
}
