use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::PathBuf;

use glam::Vec3;
use log::info;

use crate::error::ReconstructError;
use crate::error::Result;
use crate::{Point, Triangle};

static ATTRIBUTE_COUNT: [u8; 2] = [0; 2];

/// Write triangles to file as a binary STL.
///
/// # Errors
///   When the file cannot be created or written to.
///
/// # Panics
///   When the number of triangles exceeds that allow by the stl format.
pub fn save_triangles(path: &PathBuf, triangles: &[Triangle]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;

    let mut writer = BufWriter::new(file);

    // Header
    writer.write_all(&[b' '; 80])?;

    let count = u32::try_from(triangles.len())
        .expect("stl file format cannot contain more than 4,294,967,295 triangles");
    writer.write_all(&count.to_le_bytes())?;

    for t in triangles {
        let [v0, v1, v2] = *t.vertices();
        // Normals
        let normal = (v0 - v1).cross(v0 - v2).normalize();
        let normal_bytes = normal.to_array().map(f32::to_le_bytes).concat();
        writer.write_all(&normal_bytes)?;
        // Triangles
        let triangle_bytes = [v0, v1, v2]
            .map(|v| v.to_array())
            .iter()
            .flatten()
            .map(|f| f.to_le_bytes())
            .collect::<Vec<_>>()
            .concat();
        writer.write_all(&triangle_bytes)?;

        // Attribute count
        writer.write_all(&ATTRIBUTE_COUNT)?;
    }

    Ok(())
}

/// Write triangles as a STL file (in ascii format).
///
/// Use only when debugging.
///
/// # Errors
///   When the file cannot be created or written to.
pub fn save_triangles_ascii(path: &PathBuf, triangles: &[Triangle]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "solid {}", path.to_str().unwrap_or("mesh"))?;

    for t in triangles {
        let [v0, v1, v2] = *t.vertices();
        let normal = (v0 - v1).cross(v0 - v2).normalize();
        writeln!(
            writer,
            "  facet normal {} {} {}",
            normal.x, normal.y, normal.z
        )?;
        writeln!(writer, "    outer loop")?;
        writeln!(writer, "      vertex {} {} {}", v0.x, v0.y, v0.z)?;
        writeln!(writer, "      vertex {} {} {}", v1.x, v1.y, v1.z)?;
        writeln!(writer, "      vertex {} {} {}", v2.x, v2.y, v2.z)?;
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid")?;

    Ok(())
}

/// Builds an exact-equality position to vertex-index lookup, mirroring the
/// original reconstruction host's `unordered_map<glm::vec3, int>` index table.
///
/// Positions are keyed on the bit pattern of each coordinate so the lookup
/// never depends on `Eq`/`Hash` for `f32` (which the language doesn't provide),
/// while still matching positions drawn verbatim from `points`.
fn position_index(points: &[Point]) -> HashMap<[u32; 3], usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            (
                [p.pos.x.to_bits(), p.pos.y.to_bits(), p.pos.z.to_bits()],
                i,
            )
        })
        .collect()
}

fn index_of(index: &HashMap<[u32; 3], usize>, pos: Vec3) -> Result<usize> {
    let key = [pos.x.to_bits(), pos.y.to_bits(), pos.z.to_bits()];
    index.get(&key).copied().ok_or_else(|| {
        ReconstructError::Ply(format!("triangle vertex {pos} is not one of the input points"))
    })
}

/// Write an indexed mesh as an ASCII PLY file: a vertex element holding the
/// original point positions and a face element of vertex-index triples.
///
/// Face-to-vertex indices are resolved by an exact-equality position lookup
/// against `points`, matching the original host's contract (the core engine
/// never constructs indices itself).
///
/// # Errors
///   When the file cannot be created or written to, or when a triangle
///   references a position absent from `points`.
pub fn save_mesh_ply(path: &PathBuf, points: &[Point], triangles: &[Triangle]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let index = position_index(points);

    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "element vertex {}", points.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    writeln!(writer, "element face {}", triangles.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for p in points {
        writeln!(writer, "{} {} {}", p.pos.x, p.pos.y, p.pos.z)?;
    }

    for t in triangles {
        let [v0, v1, v2] = *t.vertices();
        let i0 = index_of(&index, v0)?;
        let i1 = index_of(&index, v1)?;
        let i2 = index_of(&index, v2)?;
        writeln!(writer, "3 {i0} {i1} {i2}")?;
    }

    Ok(())
}

/// Write Point cloud to file.
///
/// outout point and normal.
///
/// # Errors
///   Problems writing to file.
pub fn save_points_and_normals(path: &PathBuf, points: &[Point]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "element vertex {}", points.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    writeln!(writer, "property float nx")?;
    writeln!(writer, "property float ny")?;
    writeln!(writer, "property float nz")?;
    writeln!(writer, "end_header")?;
    let mut buffer: Vec<u8> = Vec::new();
    for point in points {
        buffer.extend_from_slice(
            &point
                .pos
                .to_array()
                .iter()
                .flat_map(|f| f.to_le_bytes())
                .collect::<Vec<u8>>(),
        );
        buffer.extend_from_slice(
            &point
                .normal
                .to_array()
                .iter()
                .flat_map(|f| f.to_le_bytes())
                .collect::<Vec<u8>>(),
        );
    }
    writer.write_all(&buffer)?;

    Ok(())
}

/// Write Point cloud to file.
///
/// # Errors
///   Problems writing to file.
pub fn save_points(path: &PathBuf, points: &[Vec3]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "element vertex {}", points.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    writeln!(writer, "end_header")?;
    let mut buffer: Vec<u8> = Vec::new();
    for point in points {
        buffer.extend_from_slice(
            &point
                .to_array()
                .iter()
                .flat_map(|f| f.to_le_bytes())
                .collect::<Vec<u8>>(),
        );
    }
    writer.write_all(&buffer)?;

    Ok(())
}

/// Return a point cloud stored in a whitespace-delimited XYZ file.
///
/// # Errors
///   If the file cannot be opened, or a line does not parse as six floats.
pub fn load_xyz(path: &PathBuf) -> Result<Vec<Point>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut points = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            continue;
        }
        let parse = |s: &str| -> Result<f32> {
            s.parse()
                .map_err(|_| ReconstructError::Ply(format!("could not parse '{s}' as a float")))
        };
        let x = parse(parts[0])?;
        let y = parse(parts[1])?;
        let z = parse(parts[2])?;
        let nx = parse(parts[3])?;
        let ny = parse(parts[4])?;
        let nz = parse(parts[5])?;
        points.push(Point {
            pos: Vec3::new(x, y, z),
            normal: Vec3::new(nx, ny, nz),
        });
    }
    Ok(points)
}

/// Return a point cloud stored in an ASCII PLY file.
///
/// # Errors
///   If the file cannot be opened or its header cannot be parsed.
pub fn load_ply(path: &PathBuf) -> Result<Vec<Point>> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);

    let header = parse_ply_header(&mut reader)?;

    if !matches!(header.format, Format::Ascii) {
        return Err(ReconstructError::Ply(
            "only ascii-format PLY files are supported".to_string(),
        ));
    }

    info!("parsed PLY header: {} vertices expected", header.vertex_count);
    let col_count = header.ordered_properties.len();

    let mut points = Vec::new();

    for next in reader.lines() {
        let line = next?;
        let parts: Vec<&str> = line.split_whitespace().collect();

        if parts.len() != col_count {
            return Err(ReconstructError::Ply(format!(
                "expected {col_count} columns, found {}",
                parts.len()
            )));
        }

        let mut nx = 0_f32;
        let mut ny = 0_f32;
        let mut nz = 0_f32;
        let mut x = 0_f32;
        let mut y = 0_f32;
        let mut z = 0_f32;
        for (i, (label, _property_type)) in header.ordered_properties.iter().enumerate() {
            let value: f32 = parts[i]
                .parse()
                .map_err(|_| ReconstructError::Ply(format!("could not parse column '{label}'")))?;
            match label.as_str() {
                "x" => x = value,
                "y" => y = value,
                "z" => z = value,
                "nx" => nx = value,
                "ny" => ny = value,
                "nz" => nz = value,
                // drop comment labels such as r,g,b
                _ => {}
            }
        }
        points.push(Point {
            pos: Vec3::new(x, y, z),
            normal: Vec3::new(nx, ny, nz),
        });
    }
    info!("load_ply - extracted {} points", points.len());
    Ok(points)
}

// The file type of the PLY file.
#[derive(Debug)]
enum Format {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

/// Possible types of properties in a PLY file.
///
/// "The type can be specified with one of
///   char uchar short ushort int uint float double,
/// or one of
///   int8 uint8 int16 uint16 int32 uint32 float32 float64"
///
/// As described here <https://en.wikipedia.org/wiki/PLY_(file_format)>
#[derive(Debug)]
enum PropertyType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl TryFrom<&str> for PropertyType {
    type Error = ReconstructError;
    fn try_from(input: &str) -> std::result::Result<Self, Self::Error> {
        match input {
            "char" | "int8" => Ok(Self::Int8),
            "uchar" | "uint8" => Ok(Self::Uint8),
            "short" | "int16" => Ok(Self::Int16),
            "ushort" | "uint16" => Ok(Self::Uint16),
            "int" | "int32" => Ok(Self::Int32),
            "uint" | "uint32" => Ok(Self::Uint32),
            "float" | "float32" => Ok(Self::Float32),
            "double" | "float64" => Ok(Self::Float64),
            other => Err(ReconstructError::Ply(format!("unknown property type '{other}'"))),
        }
    }
}

/// The header of a PLY file
#[derive(Debug)]
struct Header {
    /// The format of the PLY file.
    format: Format,
    /// The number of vertices in the PLY file.
    vertex_count: u64,
    /// The columns of the data section (label, type)
    ordered_properties: Vec<(String, PropertyType)>,
}

// Extract data from a PLY header
//header format
// ply
// format ascii 1.0
// comment This is a comment!
// element vertex 779966
// property float x
// property float y
// property float z
// end_header
//
// The second line is one of
// format ascii 1.0
// format binary_little_endian 1.0
// format binary_big_endian 1.0
//
fn parse_ply_header(buffer: &mut BufReader<File>) -> Result<Header> {
    let mut line = String::new();
    buffer.read_line(&mut line)?;

    if !line.trim_end().starts_with("ply") {
        return Err(ReconstructError::Ply(
            "file does not start with the 'ply' magic token".to_string(),
        ));
    }

    let mut format: Option<Format> = None;
    let mut ordered_properties = vec![];
    let mut vertex_count: u64 = 0;

    for line in buffer.lines() {
        let line = line?;
        let line = line.trim();

        if line == "end_header" {
            let format = format
                .ok_or_else(|| ReconstructError::Ply("header has no format line".to_string()))?;
            return Ok(Header {
                format,
                vertex_count,
                ordered_properties,
            });
        }

        if line.starts_with("comment") || line.starts_with("element face") {
            continue;
        }

        if line.starts_with("element vertex") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(ReconstructError::Ply(format!("malformed line: {line}")));
            }
            vertex_count = parts[2]
                .parse::<u64>()
                .map_err(|_| ReconstructError::Ply(format!("unrecognized vertex count: {line}")))?;
            continue;
        }

        match line {
            "format ascii 1.0" => format = Some(Format::Ascii),
            "format binary_little_endian 1.0" => format = Some(Format::BinaryLittleEndian),
            "format binary_big_endian 1.0" => format = Some(Format::BinaryBigEndian),
            _ => {}
        }

        if line.starts_with("property") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(ReconstructError::Ply(format!("malformed line: {line}")));
            }
            let prop_type = PropertyType::try_from(parts[1])?;
            let label = parts[2].to_string();
            ordered_properties.push((label, prop_type));
            continue;
        }
    }

    Err(ReconstructError::Ply(
        "header never reached end_header".to_string(),
    ))
}
