//! Recording backend with no GPU behind it.
//!
//! [`HeadlessBackend`] satisfies the full [`GraphicsBackend`] contract by
//! recording what a real adapter would execute: uploads, submissions, and
//! state switches. The test suite drives the batch engine against it and
//! asserts on the recorded frames; it also lets the examples run anywhere,
//! GPU or not.

use glam::Mat4;

use super::{
    BlendMode, BufferSetId, DrawSubmission, GraphicsBackend, ScissorRect, TextureId, VertexSlice,
};

/// One recorded `submit` call.
#[derive(Debug, Clone)]
pub struct SubmitRecord {
    pub set: BufferSetId,
    pub mvp: Mat4,
    pub calls: Vec<DrawSubmission>,
    /// Vertices uploaded to the set by the preceding `upload`.
    pub vertices_uploaded: usize,
}

#[derive(Debug, Default)]
struct RecordedSet {
    vertex_capacity: usize,
    index_count: usize,
    last_positions: Vec<[f32; 3]>,
    last_texcoords: Vec<[f32; 2]>,
    last_colors: Vec<[u8; 4]>,
    loaded: bool,
}

/// A [`GraphicsBackend`] that records instead of drawing.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    sets: Vec<RecordedSet>,
    submits: Vec<SubmitRecord>,
    blend_mode: BlendMode,
    scissor: Option<ScissorRect>,
    viewport: Option<(i32, i32, u32, u32)>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `submit` recorded since construction or [`clear_records`](Self::clear_records).
    pub fn submits(&self) -> &[SubmitRecord] {
        &self.submits
    }

    pub fn last_submit(&self) -> Option<&SubmitRecord> {
        self.submits.last()
    }

    /// Total draws issued across all recorded submits.
    pub fn total_draw_calls(&self) -> usize {
        self.submits.iter().map(|s| s.calls.len()).sum()
    }

    /// Total vertices covered by issued draws (excludes alignment padding).
    pub fn total_vertices_drawn(&self) -> usize {
        self.submits
            .iter()
            .flat_map(|s| &s.calls)
            .map(|c| c.vertex_count as usize)
            .sum()
    }

    /// Buffer-sets currently registered.
    pub fn loaded_buffer_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.loaded).count()
    }

    /// Length of the static index pattern registered for a set.
    pub fn index_count(&self, set: BufferSetId) -> usize {
        self.sets[set.0].index_count
    }

    /// Positions from the most recent upload to a set.
    pub fn uploaded_positions(&self, set: BufferSetId) -> &[[f32; 3]] {
        &self.sets[set.0].last_positions
    }

    /// Texcoords from the most recent upload to a set.
    pub fn uploaded_texcoords(&self, set: BufferSetId) -> &[[f32; 2]] {
        &self.sets[set.0].last_texcoords
    }

    /// Colors from the most recent upload to a set.
    pub fn uploaded_colors(&self, set: BufferSetId) -> &[[u8; 4]] {
        &self.sets[set.0].last_colors
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn scissor(&self) -> Option<ScissorRect> {
        self.scissor
    }

    pub fn viewport(&self) -> Option<(i32, i32, u32, u32)> {
        self.viewport
    }

    /// Drop recorded submits, keeping registered buffer-sets.
    pub fn clear_records(&mut self) {
        self.submits.clear();
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn load_buffer_set(&mut self, vertex_capacity: usize, indices: &[u32]) -> BufferSetId {
        self.sets.push(RecordedSet {
            vertex_capacity,
            index_count: indices.len(),
            loaded: true,
            ..Default::default()
        });
        BufferSetId(self.sets.len() - 1)
    }

    fn unload_buffer_set(&mut self, set: BufferSetId) {
        self.sets[set.0].loaded = false;
    }

    fn upload(&mut self, set: BufferSetId, data: VertexSlice<'_>) {
        debug_assert_eq!(data.positions.len(), data.texcoords.len());
        debug_assert_eq!(data.positions.len(), data.colors.len());
        let entry = &mut self.sets[set.0];
        debug_assert!(data.positions.len() <= entry.vertex_capacity);
        entry.last_positions = data.positions.to_vec();
        entry.last_texcoords = data.texcoords.to_vec();
        entry.last_colors = data.colors.to_vec();
    }

    fn submit(&mut self, set: BufferSetId, mvp: Mat4, calls: &[DrawSubmission]) {
        let vertices_uploaded = self.sets[set.0].last_positions.len();
        log::trace!(
            "headless submit: set {} with {} draw(s), {} vertices uploaded",
            set.0,
            calls.len(),
            vertices_uploaded
        );
        self.submits.push(SubmitRecord {
            set,
            mvp,
            calls: calls.to_vec(),
            vertices_uploaded,
        });
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    fn set_scissor(&mut self, rect: Option<ScissorRect>) {
        self.scissor = rect;
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Some((x, y, width, height));
    }

    fn white_texture(&self) -> TextureId {
        TextureId::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::DrawMode;

    #[test]
    fn records_uploads_and_submits() {
        let mut backend = HeadlessBackend::new();
        let set = backend.load_buffer_set(16, &[0, 1, 2, 0, 2, 3]);

        let positions = [[0.0f32; 3]; 4];
        let texcoords = [[0.0f32; 2]; 4];
        let colors = [[255u8; 4]; 4];
        backend.upload(
            set,
            VertexSlice {
                positions: &positions,
                texcoords: &texcoords,
                colors: &colors,
            },
        );
        backend.submit(
            set,
            Mat4::IDENTITY,
            &[DrawSubmission {
                mode: DrawMode::Quads,
                vertex_offset: 0,
                vertex_count: 4,
                texture: TextureId::DEFAULT,
            }],
        );

        assert_eq!(backend.total_draw_calls(), 1);
        assert_eq!(backend.total_vertices_drawn(), 4);
        assert_eq!(backend.last_submit().unwrap().vertices_uploaded, 4);
    }
}
