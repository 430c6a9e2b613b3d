use pointclouds_core::{Colors, Normals, PointCloud};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataFormat {
    Ascii,
    Binary,
}

/// One `FIELDS` entry with its `SIZE`/`TYPE`/`COUNT`.
#[derive(Debug, Clone)]
struct Field {
    name: String,
    size: usize,
    kind: char,
    count: usize,
}

impl Field {
    fn byte_len(&self) -> usize {
        self.size * self.count
    }

    /// Decode the first element of this field from little-endian bytes.
    fn read_le(&self, b: &[u8]) -> io::Result<f64> {
        Ok(match (self.kind, self.size) {
            ('F', 4) => f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ('F', 8) => f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
            ('U', 1) => b[0] as f64,
            ('I', 1) => b[0] as i8 as f64,
            ('U', 2) => u16::from_le_bytes([b[0], b[1]]) as f64,
            ('I', 2) => i16::from_le_bytes([b[0], b[1]]) as f64,
            ('U', 4) => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ('I', 4) => i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            (kind, size) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported PCD field type {}{} for '{}'", kind, size, self.name),
                ))
            }
        })
    }

    /// Packed `rgb` keeps its raw 32 bits whether declared F or U.
    fn read_packed_rgb(&self, b: &[u8]) -> u32 {
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }
}

struct PcdHeader {
    fields: Vec<Field>,
    points: usize,
    data: DataFormat,
    body_offset: usize,
}

impl PcdHeader {
    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    fn columns(&self, names: [&str; 3]) -> Option<[usize; 3]> {
        Some([
            self.position(names[0])?,
            self.position(names[1])?,
            self.position(names[2])?,
        ])
    }

    fn rgb_column(&self) -> Option<usize> {
        self.position("rgb").or_else(|| self.position("rgba"))
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn parse_header(raw: &[u8]) -> io::Result<PcdHeader> {
    let mut names: Vec<String> = Vec::new();
    let mut sizes: Vec<usize> = Vec::new();
    let mut kinds: Vec<char> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    let mut width: Option<usize> = None;
    let mut height: usize = 1;
    let mut points: Option<usize> = None;

    let mut offset = 0usize;
    while offset < raw.len() {
        let end = raw[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| offset + p + 1)
            .unwrap_or(raw.len());
        let line = std::str::from_utf8(&raw[offset..end])
            .map_err(|_| invalid("PCD header is not valid UTF-8"))?
            .trim();
        offset = end;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let key = parts.next().unwrap_or_default();
        let values: Vec<&str> = parts.collect();
        let parse_usize = |v: &str| {
            v.parse::<usize>()
                .map_err(|e| invalid(format!("invalid {} value '{}': {}", key, v, e)))
        };

        match key {
            "FIELDS" => names = values.iter().map(|s| s.to_string()).collect(),
            "SIZE" => sizes = values.iter().map(|v| parse_usize(*v)).collect::<io::Result<_>>()?,
            "TYPE" => {
                kinds = values
                    .iter()
                    .map(|v| v.chars().next().unwrap_or('F').to_ascii_uppercase())
                    .collect()
            }
            "COUNT" => counts = values.iter().map(|v| parse_usize(*v)).collect::<io::Result<_>>()?,
            "WIDTH" => width = values.first().map(|v| parse_usize(*v)).transpose()?,
            "HEIGHT" => height = values.first().map(|v| parse_usize(*v)).transpose()?.unwrap_or(1),
            "POINTS" => points = values.first().map(|v| parse_usize(*v)).transpose()?,
            "DATA" => {
                let data = match values.first().copied() {
                    Some("ascii") => DataFormat::Ascii,
                    Some("binary") => DataFormat::Binary,
                    other => {
                        return Err(io::Error::new(
                            io::ErrorKind::Unsupported,
                            format!("unsupported PCD DATA format: {}", other.unwrap_or("")),
                        ))
                    }
                };

                if names.is_empty() {
                    names = vec!["x".into(), "y".into(), "z".into()];
                }
                let fields: Vec<Field> = names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| Field {
                        name: name.clone(),
                        size: sizes.get(i).copied().unwrap_or(4),
                        kind: kinds.get(i).copied().unwrap_or('F'),
                        count: counts.get(i).copied().unwrap_or(1),
                    })
                    .collect();
                for field in &fields {
                    if !matches!(field.size, 1 | 2 | 4 | 8) || field.count == 0 {
                        return Err(invalid(format!(
                            "invalid PCD field '{}': SIZE {} COUNT {}",
                            field.name, field.size, field.count
                        )));
                    }
                }
                fields
                    .iter()
                    .try_fold(0usize, |acc, f| f.size.checked_mul(f.count)?.checked_add(acc))
                    .ok_or_else(|| invalid("PCD field COUNT is too large"))?;

                let points = match (points, width) {
                    (Some(p), _) => p,
                    (None, Some(w)) => w
                        .checked_mul(height)
                        .ok_or_else(|| invalid("PCD WIDTH x HEIGHT is too large"))?,
                    (None, None) => return Err(invalid("PCD file missing POINTS/WIDTH header")),
                };

                return Ok(PcdHeader {
                    fields,
                    points,
                    data,
                    body_offset: offset,
                });
            }
            // VERSION, VIEWPOINT
            _ => {}
        }
    }

    Err(invalid("PCD file missing DATA line"))
}

/// Per-point values for every field, row-major; packed rgb kept separately.
struct Rows {
    values: Vec<f64>,
    rgb: Vec<u32>,
}

fn read_ascii(header: &PcdHeader, body: &[u8]) -> io::Result<Rows> {
    let text = std::str::from_utf8(body).map_err(|_| invalid("PCD body is not valid UTF-8"))?;
    let rgb_col = header.rgb_column();
    let mut rows = Rows {
        values: Vec::new(),
        rgb: Vec::new(),
    };
    let mut count = 0usize;

    for line in text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .take(header.points)
    {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let mut cursor = 0usize;
        for (col, field) in header.fields.iter().enumerate() {
            let token = tokens.get(cursor).ok_or_else(|| {
                invalid(format!(
                    "PCD row has {} values, missing field '{}'",
                    tokens.len(),
                    field.name
                ))
            })?;
            cursor += field.count;

            if Some(col) == rgb_col {
                let bits = match field.kind {
                    'F' => token.parse::<f32>().map(f32::to_bits).map_err(|e| e.to_string()),
                    _ => token.parse::<u32>().map_err(|e| e.to_string()),
                };
                rows.rgb
                    .push(bits.map_err(|e| invalid(format!("invalid rgb '{}': {}", token, e)))?);
                rows.values.push(0.0);
                continue;
            }

            let v = match (field.kind, field.size) {
                ('F', 4) => token.parse::<f32>().map(f64::from).map_err(|e| e.to_string()),
                _ => token.parse::<f64>().map_err(|e| e.to_string()),
            };
            rows.values.push(
                v.map_err(|e| invalid(format!("invalid {} '{}': {}", field.name, token, e)))?,
            );
        }
        count += 1;
    }

    if count < header.points {
        return Err(invalid(format!(
            "PCD body has {} points, header declares {}",
            count, header.points
        )));
    }
    Ok(rows)
}

fn read_binary(header: &PcdHeader, body: &[u8]) -> io::Result<Rows> {
    let rgb_col = header.rgb_column();
    let stride: usize = header.fields.iter().map(Field::byte_len).sum();
    let needed = header
        .points
        .checked_mul(stride)
        .ok_or_else(|| invalid(format!("PCD point count {} is too large", header.points)))?;
    if body.len() < needed {
        return Err(invalid(format!(
            "binary PCD data too short: have {} bytes, expected {} ({} points x {} bytes)",
            body.len(),
            needed,
            header.points,
            stride
        )));
    }

    // `needed` fits in the body, so this capacity is bounded by the file size.
    let mut rows = Rows {
        values: Vec::with_capacity(header.points * header.fields.len()),
        rgb: Vec::new(),
    };
    for row in body[..needed].chunks_exact(stride.max(1)) {
        let mut off = 0;
        for (col, field) in header.fields.iter().enumerate() {
            let bytes = &row[off..off + field.byte_len()];
            if Some(col) == rgb_col && field.size == 4 {
                rows.rgb.push(field.read_packed_rgb(bytes));
                rows.values.push(0.0);
            } else {
                rows.values.push(field.read_le(bytes)?);
            }
            off += field.byte_len();
        }
    }
    Ok(rows)
}

/// Reads a PCD file (ASCII or binary). Recognised fields are `x y z`,
/// `normal_x normal_y normal_z` and packed `rgb`/`rgba`; others are skipped.
pub fn read_pcd(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let raw = fs::read(path)?;
    let header = parse_header(&raw)?;

    let xyz = header
        .columns(["x", "y", "z"])
        .ok_or_else(|| invalid("PCD file missing x, y, z fields"))?;
    let nxyz = header.columns(["normal_x", "normal_y", "normal_z"]);

    let body = &raw[header.body_offset..];
    let rows = match header.data {
        DataFormat::Ascii => read_ascii(&header, body)?,
        DataFormat::Binary => read_binary(&header, body)?,
    };

    let width = header.fields.len();
    let column = |col: usize| -> Vec<f32> {
        rows.values
            .chunks_exact(width)
            .map(|r| r[col] as f32)
            .collect()
    };

    let mut cloud = PointCloud::from_xyz(column(xyz[0]), column(xyz[1]), column(xyz[2]));

    if let Some([nx, ny, nz]) = nxyz {
        cloud.normals = Some(Normals {
            nx: column(nx),
            ny: column(ny),
            nz: column(nz),
        });
    }

    if !rows.rgb.is_empty() && rows.rgb.len() == cloud.len() {
        cloud.colors = Some(Colors {
            r: rows.rgb.iter().map(|v| (v >> 16) as u8).collect(),
            g: rows.rgb.iter().map(|v| (v >> 8) as u8).collect(),
            b: rows.rgb.iter().map(|v| *v as u8).collect(),
        });
    }

    Ok(cloud)
}

fn packed_rgb(c: &Colors, i: usize) -> u32 {
    ((c.r[i] as u32) << 16) | ((c.g[i] as u32) << 8) | c.b[i] as u32
}

fn write_pcd_with(path: &Path, cloud: &PointCloud, data: DataFormat) -> io::Result<()> {
    let normals = cloud.normals.as_ref().filter(|_| cloud.has_normals());
    let colors = cloud.colors.as_ref().filter(|_| cloud.has_colors());

    let mut names = vec!["x", "y", "z"];
    if normals.is_some() {
        names.extend(["normal_x", "normal_y", "normal_z"]);
    }
    let float_fields = names.len();
    if colors.is_some() {
        names.push("rgb");
    }
    let repeat = |s: &str| vec![s; names.len()].join(" ");

    let mut w = BufWriter::new(fs::File::create(path)?);
    w.write_all(b"# .PCD v0.7 - Point Cloud Data file format\nVERSION 0.7\n")?;
    writeln!(w, "FIELDS {}", names.join(" "))?;
    writeln!(w, "SIZE {}", repeat("4"))?;
    // packed rgb is stored as U4
    let mut types = vec!["F"; float_fields];
    if colors.is_some() {
        types.push("U");
    }
    writeln!(w, "TYPE {}", types.join(" "))?;
    writeln!(w, "COUNT {}", repeat("1"))?;
    writeln!(w, "WIDTH {}", cloud.len())?;
    w.write_all(b"HEIGHT 1\nVIEWPOINT 0 0 0 1 0 0 0\n")?;
    writeln!(w, "POINTS {}", cloud.len())?;
    match data {
        DataFormat::Ascii => w.write_all(b"DATA ascii\n")?,
        DataFormat::Binary => w.write_all(b"DATA binary\n")?,
    }

    for i in 0..cloud.len() {
        let mut floats = vec![cloud.x[i], cloud.y[i], cloud.z[i]];
        if let Some(n) = normals {
            floats.extend([n.nx[i], n.ny[i], n.nz[i]]);
        }
        let rgb = colors.map(|c| packed_rgb(c, i));

        match data {
            DataFormat::Ascii => {
                let mut line: Vec<String> = floats.iter().map(|v| v.to_string()).collect();
                if let Some(rgb) = rgb {
                    line.push(rgb.to_string());
                }
                writeln!(w, "{}", line.join(" "))?;
            }
            DataFormat::Binary => {
                for v in floats {
                    w.write_all(&v.to_le_bytes())?;
                }
                if let Some(rgb) = rgb {
                    w.write_all(&rgb.to_le_bytes())?;
                }
            }
        }
    }

    w.flush()
}

/// Writes a PCD file in ASCII format.
pub fn write_pcd(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    write_pcd_with(path.as_ref(), cloud, DataFormat::Ascii)
}

/// Writes a PCD file in binary format.
pub fn write_pcd_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    write_pcd_with(path.as_ref(), cloud, DataFormat::Binary)
}
