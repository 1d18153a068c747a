//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Texture coordinates |
//! |--------|-----------|------|------|---------------------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | per corner (`vt`) |
//! | PLY | `.ply` | ✓ | ✓ (ASCII) | per vertex |
//!
//! # Usage
//!
//! ```no_run
//! use tessera::io::{load, save};
//! use tessera::mesh::HalfEdgeMesh;
//!
//! let mesh: HalfEdgeMesh = load("model.obj").unwrap();
//! save(&mesh, "output.ply").unwrap();
//! ```

pub mod obj;
pub mod ply;

use std::path::Path;

use crate::algo::parameterize::TexCoords;
use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    fn detect(path: &Path) -> Result<Format> {
        Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_string(),
        })
    }
}

/// Load a mesh from a file, detecting the format from its extension.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    load_with_uvs(path).map(|(mesh, _)| mesh)
}

/// Load a mesh and whatever texture coordinates the file carries.
pub fn load_with_uvs<P: AsRef<Path>, I: MeshIndex>(
    path: P,
) -> Result<(HalfEdgeMesh<I>, Option<TexCoords>)> {
    let path = path.as_ref();
    match Format::detect(path)? {
        Format::Obj => obj::load_with_uvs(path),
        Format::Ply => ply::load_with_uvs(path),
    }
}

/// Save a mesh to a file, detecting the format from its extension.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let saved = match Format::detect(path)? {
        Format::Obj => obj::save(mesh, path),
        Format::Ply => ply::save(mesh, path),
    };
    saved.map_err(|e| match e {
        MeshError::Io(io) => MeshError::SaveError {
            path: path.to_path_buf(),
            message: io.to_string(),
        },
        other => other,
    })
}
