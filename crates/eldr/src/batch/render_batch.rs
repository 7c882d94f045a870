//! The render batch: buffer-sets plus the draw-call list.

use crate::backend::{GraphicsBackend, TextureId};

use super::draw_call::DrawCall;
use super::vertex_buffer::VertexBuffer;
use super::{DEFAULT_BATCH_BUFFER_COUNT, DEFAULT_BATCH_DRAW_CALLS, DEFAULT_BATCH_ELEMENTS};
use super::{DEPTH_INCREMENT, INITIAL_DEPTH};

/// A self-contained accumulation target: one or more vertex buffer-sets and
/// a bounded draw-call list.
///
/// The context creates a default batch at construction; custom batches (for
/// offscreen or specially-sized workloads) are created by the caller, made
/// active with [`GfxContext::set_custom_batch`](crate::context::GfxContext::set_custom_batch),
/// and must be explicitly [`unload`](RenderBatch::unload)ed.
#[derive(Debug)]
pub struct RenderBatch {
    vertex_buffers: Vec<VertexBuffer>,
    current_buffer: usize,
    draw_calls: Vec<DrawCall>,
    draw_calls_used: usize,
    current_depth: f32,
}

impl RenderBatch {
    /// Create a batch with `buffer_count` buffer-sets of `elements` quads
    /// each and a draw-call list of `draw_call_capacity` entries, and
    /// register the GPU-side buffers with `backend` (the static index
    /// pattern uploads once, here).
    pub fn new<B: GraphicsBackend>(
        backend: &mut B,
        buffer_count: usize,
        elements: usize,
        draw_call_capacity: usize,
    ) -> Self {
        assert!(buffer_count > 0, "batch needs at least one buffer-set");
        assert!(draw_call_capacity > 0, "batch needs at least one draw call");

        let mut vertex_buffers = Vec::with_capacity(buffer_count);
        for _ in 0..buffer_count {
            let mut vb = VertexBuffer::new(elements);
            vb.gpu_set = Some(backend.load_buffer_set(elements * 4, vb.indices()));
            vertex_buffers.push(vb);
        }

        let white = backend.white_texture();
        Self {
            vertex_buffers,
            current_buffer: 0,
            draw_calls: vec![DrawCall::reset(white); draw_call_capacity],
            draw_calls_used: 1,
            current_depth: INITIAL_DEPTH,
        }
    }

    /// Create a batch with the default sizes.
    pub fn with_default_size<B: GraphicsBackend>(backend: &mut B) -> Self {
        Self::new(
            backend,
            DEFAULT_BATCH_BUFFER_COUNT,
            DEFAULT_BATCH_ELEMENTS,
            DEFAULT_BATCH_DRAW_CALLS,
        )
    }

    /// Release the GPU-side buffer-sets. The batch must not be active.
    pub fn unload<B: GraphicsBackend>(self, backend: &mut B) {
        for vb in &self.vertex_buffers {
            if let Some(set) = vb.gpu_set {
                backend.unload_buffer_set(set);
            }
        }
    }

    pub fn buffer_count(&self) -> usize {
        self.vertex_buffers.len()
    }

    /// Quad capacity of each buffer-set, in vertices.
    pub fn vertex_capacity(&self) -> usize {
        self.vertex_buffers[0].vertex_capacity()
    }

    pub fn draw_call_capacity(&self) -> usize {
        self.draw_calls.len()
    }

    /// Draw-call entries opened this cycle, in submission order.
    pub fn pending_calls(&self) -> &[DrawCall] {
        &self.draw_calls[..self.draw_calls_used]
    }

    /// Vertices written into the current buffer-set this cycle.
    pub fn pending_vertices(&self) -> usize {
        self.current_vertex_buffer().positions_used()
    }

    pub(crate) fn current_vertex_buffer(&self) -> &VertexBuffer {
        &self.vertex_buffers[self.current_buffer]
    }

    pub(crate) fn current_vertex_buffer_mut(&mut self) -> &mut VertexBuffer {
        &mut self.vertex_buffers[self.current_buffer]
    }

    pub(crate) fn active_call(&self) -> &DrawCall {
        &self.draw_calls[self.draw_calls_used - 1]
    }

    pub(crate) fn active_call_mut(&mut self) -> &mut DrawCall {
        &mut self.draw_calls[self.draw_calls_used - 1]
    }

    pub(crate) fn at_call_capacity(&self) -> bool {
        self.draw_calls_used >= self.draw_calls.len()
    }

    /// Move to the next (pre-reset) draw-call entry.
    pub(crate) fn open_next_call(&mut self) {
        debug_assert!(!self.at_call_capacity(), "draw-call list overflow");
        self.draw_calls_used += 1;
    }

    /// Rewind the draw-call list to a single default entry and reset the
    /// depth cursor; called at the end of a flush.
    pub(crate) fn reset_draw_calls(&mut self, white: TextureId) {
        for call in &mut self.draw_calls {
            *call = DrawCall::reset(white);
        }
        self.draw_calls_used = 1;
        self.current_depth = INITIAL_DEPTH;
    }

    /// Round-robin to the next buffer-set after a flush.
    pub(crate) fn advance_buffer(&mut self) {
        self.current_buffer = (self.current_buffer + 1) % self.vertex_buffers.len();
    }

    pub(crate) fn current_depth(&self) -> f32 {
        self.current_depth
    }

    pub(crate) fn bump_depth(&mut self) {
        self.current_depth += DEPTH_INCREMENT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessBackend;

    #[test]
    fn starts_with_one_default_call() {
        let mut backend = HeadlessBackend::new();
        let batch = RenderBatch::new(&mut backend, 1, 16, 8);
        assert_eq!(batch.pending_calls().len(), 1);
        assert_eq!(batch.active_call().vertex_count, 0);
        assert_eq!(batch.active_call().texture, backend.white_texture());
        assert_eq!(batch.vertex_capacity(), 64);
    }

    #[test]
    fn buffer_rotation_wraps() {
        let mut backend = HeadlessBackend::new();
        let mut batch = RenderBatch::new(&mut backend, 3, 4, 4);
        for _ in 0..3 {
            batch.advance_buffer();
        }
        // Back at the first buffer-set after a full cycle.
        assert_eq!(batch.current_buffer, 0);
    }

    #[test]
    fn registers_one_gpu_set_per_buffer() {
        let mut backend = HeadlessBackend::new();
        let batch = RenderBatch::new(&mut backend, 2, 4, 4);
        assert_eq!(backend.loaded_buffer_sets(), 2);
        batch.unload(&mut backend);
        assert_eq!(backend.loaded_buffer_sets(), 0);
    }
}
