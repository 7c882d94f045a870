//! Fixed-capacity CPU-side vertex storage.
//!
//! A [`VertexBuffer`] is one buffer-set of a render batch: four parallel
//! arrays (positions, texcoords, colors, static quad indices) sized for a
//! fixed number of quads at construction, plus three write cursors that
//! advance in lockstep as vertices are emitted. There is no growth path;
//! overflow is handled one level up by a forced flush.
//!
//! Writes are bounds-checked in debug builds. Stale data beyond the cursors
//! is never uploaded or drawn, so `reset` only rewinds the cursors.

use crate::backend::BufferSetId;

/// Structure-of-arrays vertex storage for one buffer-set.
#[derive(Debug)]
pub struct VertexBuffer {
    positions: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    colors: Vec<[u8; 4]>,
    indices: Vec<u32>,
    positions_used: usize,
    texcoords_used: usize,
    colors_used: usize,
    /// GPU-side handle, assigned when the owning batch registers with a
    /// backend.
    pub(crate) gpu_set: Option<BufferSetId>,
}

impl VertexBuffer {
    /// Allocate storage for `elements` quads (4 vertices and 6 indices per
    /// quad) and pre-fill the static quad→triangle index pattern.
    pub fn new(elements: usize) -> Self {
        assert!(elements > 0, "vertex buffer needs at least one element");

        let mut indices = Vec::with_capacity(elements * 6);
        for quad in 0..elements as u32 {
            let base = quad * 4;
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            positions: vec![[0.0; 3]; elements * 4],
            texcoords: vec![[0.0; 2]; elements * 4],
            colors: vec![[0; 4]; elements * 4],
            indices,
            positions_used: 0,
            texcoords_used: 0,
            colors_used: 0,
            gpu_set: None,
        }
    }

    /// Total vertex capacity (quads × 4).
    pub fn vertex_capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions_used == 0
    }

    /// Whether `incoming` more vertices fit without a flush.
    pub fn can_fit(&self, incoming: usize) -> bool {
        self.positions_used + incoming <= self.positions.len()
    }

    /// Within one quad of capacity; `end()` flushes early at this point so
    /// the next primitive group starts in a buffer with room for a quad.
    pub(crate) fn near_capacity(&self) -> bool {
        self.positions_used + 4 >= self.positions.len()
    }

    pub(crate) fn push_position(&mut self, position: [f32; 3]) {
        debug_assert!(self.positions_used < self.positions.len(), "vertex overflow");
        self.positions[self.positions_used] = position;
        self.positions_used += 1;
    }

    pub(crate) fn push_texcoord(&mut self, texcoord: [f32; 2]) {
        debug_assert!(self.texcoords_used < self.texcoords.len(), "texcoord overflow");
        self.texcoords[self.texcoords_used] = texcoord;
        self.texcoords_used += 1;
    }

    pub(crate) fn push_color(&mut self, color: [u8; 4]) {
        debug_assert!(self.colors_used < self.colors.len(), "color overflow");
        self.colors[self.colors_used] = color;
        self.colors_used += 1;
    }

    /// Advance all three cursors by `count` without writing. The skipped
    /// slots are alignment padding: charged to a draw call's offset but
    /// never indexed by a draw.
    pub(crate) fn advance_padding(&mut self, count: usize) {
        debug_assert!(self.can_fit(count), "padding overflow");
        self.positions_used += count;
        self.texcoords_used += count;
        self.colors_used += count;
    }

    /// Rewind the write cursors. Array contents are left as-is.
    pub fn reset(&mut self) {
        self.positions_used = 0;
        self.texcoords_used = 0;
        self.colors_used = 0;
    }

    pub fn positions_used(&self) -> usize {
        self.positions_used
    }

    pub fn texcoords_used(&self) -> usize {
        self.texcoords_used
    }

    pub fn colors_used(&self) -> usize {
        self.colors_used
    }

    /// Positions written this cycle.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions[..self.positions_used]
    }

    /// Texcoords written this cycle.
    pub fn texcoords(&self) -> &[[f32; 2]] {
        &self.texcoords[..self.texcoords_used]
    }

    /// Colors written this cycle.
    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors[..self.colors_used]
    }

    /// The full static index pattern.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}
