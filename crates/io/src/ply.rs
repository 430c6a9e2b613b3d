use pointclouds_core::{Colors, Normals, PointCloud};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
}

/// Scalar property type as declared in the PLY header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropType {
    Char,
    Uchar,
    Short,
    Ushort,
    Int,
    Uint,
    Float,
    Double,
}

impl PropType {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "char" | "int8" => PropType::Char,
            "uchar" | "uint8" => PropType::Uchar,
            "short" | "int16" => PropType::Short,
            "ushort" | "uint16" => PropType::Ushort,
            "int" | "int32" => PropType::Int,
            "uint" | "uint32" => PropType::Uint,
            "float" | "float32" => PropType::Float,
            "double" | "float64" => PropType::Double,
            _ => return None,
        })
    }

    fn byte_size(self) -> usize {
        match self {
            PropType::Char | PropType::Uchar => 1,
            PropType::Short | PropType::Ushort => 2,
            PropType::Int | PropType::Uint | PropType::Float => 4,
            PropType::Double => 8,
        }
    }

    /// Decode one little-endian value. `bytes` holds at least `byte_size()`.
    fn read_le(self, bytes: &[u8]) -> f64 {
        match self {
            PropType::Char => bytes[0] as i8 as f64,
            PropType::Uchar => bytes[0] as f64,
            PropType::Short => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            PropType::Ushort => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            PropType::Int => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            PropType::Uint => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            PropType::Float => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            PropType::Double => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }
}

struct Property {
    name: String,
    ty: PropType,
}

struct PlyHeader {
    format: PlyFormat,
    vertex_count: usize,
    properties: Vec<Property>,
    /// Byte offset just after the `end_header` line.
    body_offset: usize,
}

impl PlyHeader {
    fn position(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    fn columns(&self, names: [&str; 3]) -> Option<[usize; 3]> {
        Some([
            self.position(names[0])?,
            self.position(names[1])?,
            self.position(names[2])?,
        ])
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_ply_header(data: &[u8]) -> io::Result<PlyHeader> {
    let marker = b"end_header";
    let header_end =
        find_bytes(data, marker).ok_or_else(|| invalid("missing end_header in PLY file"))?;
    let body_offset = data[header_end..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| header_end + p + 1)
        .unwrap_or(data.len());

    let header_text = std::str::from_utf8(&data[..header_end])
        .map_err(|_| invalid("PLY header not valid UTF-8"))?;

    let mut lines = header_text.lines().map(str::trim);
    if lines.next() != Some("ply") {
        return Err(invalid("file does not start with 'ply'"));
    }

    let mut format = None;
    let mut vertex_count = 0usize;
    let mut properties = Vec::new();
    let mut in_vertex_element = false;

    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["format", "ascii", ..] => format = Some(PlyFormat::Ascii),
            ["format", "binary_little_endian", ..] => {
                format = Some(PlyFormat::BinaryLittleEndian)
            }
            ["format", other, ..] => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported PLY format: {}", other),
                ));
            }
            ["element", "vertex", count, ..] => {
                in_vertex_element = true;
                vertex_count = count
                    .parse()
                    .map_err(|e| invalid(format!("invalid vertex count: {}", e)))?;
            }
            ["element", ..] => in_vertex_element = false,
            ["property", "list", ..] if in_vertex_element => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "list properties on vertices are not supported",
                ));
            }
            ["property", ty, name, ..] if in_vertex_element => {
                let ty = PropType::parse(ty).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::Unsupported,
                        format!("unsupported property type: {}", ty),
                    )
                })?;
                properties.push(Property {
                    name: name.to_string(),
                    ty,
                });
            }
            _ => {}
        }
    }

    let format = format.ok_or_else(|| invalid("PLY format line missing"))?;

    Ok(PlyHeader {
        format,
        vertex_count,
        properties,
        body_offset,
    })
}

/// Decode the vertex rows into one `Vec<f64>` per property, row-major.
fn read_rows(header: &PlyHeader, body: &[u8]) -> io::Result<Vec<f64>> {
    let width = header.properties.len();
    // Sized from what the body holds, never from the declared count alone.
    let mut values = Vec::new();

    match header.format {
        PlyFormat::Ascii => {
            let text =
                std::str::from_utf8(body).map_err(|_| invalid("PLY body not valid UTF-8"))?;
            let rows = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .take(header.vertex_count);

            let mut count = 0usize;
            for line in rows {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() < width {
                    return Err(invalid(format!(
                        "vertex line has {} fields, expected {}",
                        fields.len(),
                        width
                    )));
                }
                for (field, prop) in fields.iter().zip(&header.properties) {
                    // Non-double columns parse at f32 so ASCII float text round-trips exactly.
                    let parsed = match prop.ty {
                        PropType::Double => field.parse::<f64>().map_err(|e| e.to_string()),
                        _ => field
                            .parse::<f32>()
                            .map(f64::from)
                            .map_err(|e| e.to_string()),
                    };
                    let v = parsed.map_err(|e| {
                        invalid(format!("failed to parse {} '{}': {}", prop.name, field, e))
                    })?;
                    values.push(v);
                }
                count += 1;
            }

            if count < header.vertex_count {
                return Err(invalid(format!(
                    "PLY body has {} vertices, header declares {}",
                    count, header.vertex_count
                )));
            }
        }
        PlyFormat::BinaryLittleEndian => {
            let stride: usize = header.properties.iter().map(|p| p.ty.byte_size()).sum();
            let needed = header
                .vertex_count
                .checked_mul(stride)
                .ok_or_else(|| {
                    invalid(format!("PLY vertex count {} is too large", header.vertex_count))
                })?;
            if body.len() < needed {
                return Err(invalid(format!(
                    "PLY binary body too short: need {} bytes, got {}",
                    needed,
                    body.len()
                )));
            }
            values.reserve_exact(header.vertex_count * width);

            for row in body[..needed].chunks_exact(stride.max(1)) {
                let mut off = 0;
                for prop in &header.properties {
                    values.push(prop.ty.read_le(&row[off..]));
                    off += prop.ty.byte_size();
                }
            }
        }
    }

    Ok(values)
}

pub fn read_ply(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let data = fs::read(&path)?;
    let header = parse_ply_header(&data)?;

    let xyz = header
        .columns(["x", "y", "z"])
        .ok_or_else(|| invalid("PLY file missing required x, y, z properties"))?;
    let nxyz = header.columns(["nx", "ny", "nz"]);
    let rgb = header.columns(["red", "green", "blue"]);

    let width = header.properties.len();
    let values = read_rows(&header, &data[header.body_offset..])?;
    let rows = values.chunks_exact(width.max(1));

    let column_f32 = |col: usize| -> Vec<f32> { rows.clone().map(|r| r[col] as f32).collect() };
    let column_u8 = |col: usize| -> Vec<u8> {
        rows.clone()
            .map(|r| r[col].clamp(0.0, 255.0) as u8)
            .collect()
    };

    let mut cloud = PointCloud::from_xyz(column_f32(xyz[0]), column_f32(xyz[1]), column_f32(xyz[2]));

    if let Some([nx, ny, nz]) = nxyz {
        cloud.normals = Some(Normals {
            nx: column_f32(nx),
            ny: column_f32(ny),
            nz: column_f32(nz),
        });
    }

    if let Some([r, g, b]) = rgb {
        cloud.colors = Some(Colors {
            r: column_u8(r),
            g: column_u8(g),
            b: column_u8(b),
        });
    }

    Ok(cloud)
}

fn write_header(w: &mut impl Write, cloud: &PointCloud, format: PlyFormat) -> io::Result<()> {
    w.write_all(b"ply\n")?;
    match format {
        PlyFormat::Ascii => w.write_all(b"format ascii 1.0\n")?,
        PlyFormat::BinaryLittleEndian => w.write_all(b"format binary_little_endian 1.0\n")?,
    }
    writeln!(w, "element vertex {}", cloud.len())?;
    w.write_all(b"property float x\nproperty float y\nproperty float z\n")?;
    if cloud.has_normals() {
        w.write_all(b"property float nx\nproperty float ny\nproperty float nz\n")?;
    }
    if cloud.has_colors() {
        w.write_all(b"property uchar red\nproperty uchar green\nproperty uchar blue\n")?;
    }
    w.write_all(b"end_header\n")
}

fn write_ply_with(path: &Path, cloud: &PointCloud, format: PlyFormat) -> io::Result<()> {
    let mut w = BufWriter::new(fs::File::create(path)?);
    write_header(&mut w, cloud, format)?;

    let normals = cloud.normals.as_ref().filter(|_| cloud.has_normals());
    let colors = cloud.colors.as_ref().filter(|_| cloud.has_colors());

    for i in 0..cloud.len() {
        match format {
            PlyFormat::Ascii => {
                write!(w, "{} {} {}", cloud.x[i], cloud.y[i], cloud.z[i])?;
                if let Some(n) = normals {
                    write!(w, " {} {} {}", n.nx[i], n.ny[i], n.nz[i])?;
                }
                if let Some(c) = colors {
                    write!(w, " {} {} {}", c.r[i], c.g[i], c.b[i])?;
                }
                w.write_all(b"\n")?;
            }
            PlyFormat::BinaryLittleEndian => {
                for v in [cloud.x[i], cloud.y[i], cloud.z[i]] {
                    w.write_all(&v.to_le_bytes())?;
                }
                if let Some(n) = normals {
                    for v in [n.nx[i], n.ny[i], n.nz[i]] {
                        w.write_all(&v.to_le_bytes())?;
                    }
                }
                if let Some(c) = colors {
                    w.write_all(&[c.r[i], c.g[i], c.b[i]])?;
                }
            }
        }
    }

    w.flush()
}

/// Write a PLY file in ASCII format.
pub fn write_ply(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    write_ply_with(path.as_ref(), cloud, PlyFormat::Ascii)
}

/// Write a PLY file in binary_little_endian format.
pub fn write_ply_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    write_ply_with(path.as_ref(), cloud, PlyFormat::BinaryLittleEndian)
}
