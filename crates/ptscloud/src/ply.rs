//! Binary little-endian PLY writer for colored point clouds.
//!
//! Every vertex is 15 bytes: `float x, y, z` followed by `uchar red, green, blue`.

use std::io::{self, Write};

pub const VERTEX_BYTES: usize = 15;

/// Header for an `x y z red green blue` vertex-only PLY file.
#[derive(Debug, Clone, Default)]
pub struct PlyHeader {
    pub comments: Vec<String>,
    pub vertex_count: usize,
}

impl PlyHeader {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            comments: Vec::new(),
            vertex_count,
        }
    }

    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.comments.push(text.into());
        self
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(b"ply\n")?;
        w.write_all(b"format binary_little_endian 1.0\n")?;
        for c in &self.comments {
            // A newline inside a comment would end the header line early.
            writeln!(w, "comment {}", c.replace(['\n', '\r'], " "))?;
        }
        writeln!(w, "element vertex {}", self.vertex_count)?;
        w.write_all(b"property float x\n")?;
        w.write_all(b"property float y\n")?;
        w.write_all(b"property float z\n")?;
        w.write_all(b"property uchar red\n")?;
        w.write_all(b"property uchar green\n")?;
        w.write_all(b"property uchar blue\n")?;
        w.write_all(b"end_header\n")?;
        Ok(())
    }
}

/// Writes vertex records and counts them.
pub struct VertexWriter<'w, W: Write> {
    w: &'w mut W,
    written: usize,
}

impl<'w, W: Write> VertexWriter<'w, W> {
    pub fn new(w: &'w mut W) -> Self {
        Self { w, written: 0 }
    }

    #[inline]
    pub fn vertex(&mut self, xyz: [f32; 3], rgb: [u8; 3]) -> io::Result<()> {
        let mut rec = [0u8; VERTEX_BYTES];
        rec[0..4].copy_from_slice(&xyz[0].to_le_bytes());
        rec[4..8].copy_from_slice(&xyz[1].to_le_bytes());
        rec[8..12].copy_from_slice(&xyz[2].to_le_bytes());
        rec[12..15].copy_from_slice(&rgb);
        self.w.write_all(&rec)?;
        self.written += 1;
        Ok(())
    }

    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }
}

/// Parsed view of a file produced by this module; used to check exports.
#[derive(Debug, Clone, PartialEq)]
pub struct PlyVertices {
    pub comments: Vec<String>,
    pub declared: usize,
    pub vertices: Vec<([f32; 3], [u8; 3])>,
    /// Bytes after `end_header\n`.
    pub body_len: usize,
}

/// Read back a PLY written by [`PlyHeader`] + [`VertexWriter`].
pub fn read_vertices(bytes: &[u8]) -> io::Result<PlyVertices> {
    const END: &[u8] = b"end_header\n";
    let bad = |msg: &str| io::Error::new(io::ErrorKind::InvalidData, msg.to_string());

    let end = bytes
        .windows(END.len())
        .position(|w| w == END)
        .ok_or_else(|| bad("missing end_header"))?
        + END.len();

    let header = std::str::from_utf8(&bytes[..end]).map_err(|_| bad("header is not UTF-8"))?;
    let mut lines = header.lines();
    if lines.next() != Some("ply") || lines.next() != Some("format binary_little_endian 1.0") {
        return Err(bad("not a binary little-endian PLY"));
    }

    let mut comments = Vec::new();
    let mut declared = None;
    for line in lines {
        if let Some(c) = line.strip_prefix("comment ") {
            comments.push(c.to_string());
        } else if let Some(n) = line.strip_prefix("element vertex ") {
            declared = Some(n.trim().parse::<usize>().map_err(|_| bad("bad vertex count"))?);
        }
    }
    let declared = declared.ok_or_else(|| bad("missing element vertex"))?;

    let body = &bytes[end..];
    let vertices = body
        .chunks_exact(VERTEX_BYTES)
        .map(|r| {
            let f = |o: usize| f32::from_le_bytes([r[o], r[o + 1], r[o + 2], r[o + 3]]);
            ([f(0), f(4), f(8)], [r[12], r[13], r[14]])
        })
        .collect();

    Ok(PlyVertices {
        comments,
        declared,
        vertices,
        body_len: body.len(),
    })
}
