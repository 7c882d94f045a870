//! # GfxContext — The Immediate-Mode Front End
//!
//! [`GfxContext`] is the single entry point into the renderer: it owns the
//! graphics backend, the matrix state, and the default render batch, and
//! exposes the stateful `begin`/`vertex*`/`end` API that every drawing
//! helper is built on.
//!
//! ## Per-Frame Flow
//!
//! ```text
//! begin(mode)                 open/extend the tail draw call
//!   color4ub / tex_coord2f    set sticky vertex state
//!   vertex2f / vertex3f       write position + sticky state, advance
//!                             the three lockstep cursors
//! end()                       bump depth, early-flush when nearly full
//! ...
//! flush()                     upload + one GPU draw per entry, reset
//! ```
//!
//! ## Design Decisions
//!
//! **Explicit handle, no singleton.** All state lives in the context value
//! and every entry point takes `&mut self`. Multiple independent contexts
//! can coexist (each with its own backend), and tests construct throwaway
//! contexts freely.
//!
//! **Sticky vertex state.** `color4ub` and `tex_coord2f` only record the
//! current color/texcoord; each `vertex*` call writes the position *and*
//! replicates that sticky state, so the position, texcoord and color
//! cursors advance strictly in lockstep. This is observable: after N
//! vertices all three cursors equal N.
//!
//! **Transparent overflow.** Emission never fails and never drops
//! geometry. [`flush_if_needed`](GfxContext::flush_if_needed) runs at
//! every primitive boundary, reserving room for one whole primitive so a
//! forced flush can never split a quad (or line, or triangle) down the
//! middle; after the flush the interrupted (mode, texture) pair is
//! reopened and accumulation continues.
//!
//! **Flush keeps the matrix stack.** Emitted vertices are already
//! transformed CPU-side by the pushed transform matrix, and the uniform
//! snapshot takes the camera modelview, so a forced flush between
//! `push_matrix`/`pop_matrix` needs no stack unwinding.

use glam::Vec3;

use crate::backend::{
    BlendMode, DrawSubmission, GraphicsBackend, ScissorRect, TextureId, VertexSlice,
};
use crate::batch::{DrawCall, DrawMode, MatrixMode, MatrixStack, RenderBatch};
use crate::math::{Color, Mat4};

/// The renderer: a graphics backend, matrix state, and the active render
/// batch, driven through an immediate-mode API.
pub struct GfxContext<B: GraphicsBackend> {
    backend: B,
    matrices: MatrixStack,
    default_batch: RenderBatch,
    custom_batch: Option<RenderBatch>,
    /// `Some(mode)` between `begin` and `end`.
    recording: Option<DrawMode>,
    current_color: [u8; 4],
    current_texcoord: [f32; 2],
    blend_mode: BlendMode,
}

impl<B: GraphicsBackend> GfxContext<B> {
    /// Create a context with a default-sized batch registered against
    /// `backend`.
    pub fn new(mut backend: B) -> Self {
        let default_batch = RenderBatch::with_default_size(&mut backend);
        log::info!(
            "gfx context ready: {} vertices per buffer-set, {} draw-call entries",
            default_batch.vertex_capacity(),
            default_batch.draw_call_capacity()
        );
        Self {
            backend,
            matrices: MatrixStack::new(),
            default_batch,
            custom_batch: None,
            recording: None,
            current_color: [255; 4],
            current_texcoord: [0.0; 2],
            blend_mode: BlendMode::Alpha,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn matrix_stack(&self) -> &MatrixStack {
        &self.matrices
    }

    // ── Batch selection ─────────────────────────────────────────────────

    fn active_batch(&self) -> &RenderBatch {
        self.custom_batch.as_ref().unwrap_or(&self.default_batch)
    }

    fn active_batch_mut(&mut self) -> &mut RenderBatch {
        self.custom_batch.as_mut().unwrap_or(&mut self.default_batch)
    }

    /// Install a custom batch; all subsequent emission targets it. The
    /// previously installed custom batch, if any, is returned. The batch
    /// that was active is flushed first.
    pub fn set_custom_batch(&mut self, batch: RenderBatch) -> Option<RenderBatch> {
        self.flush();
        self.custom_batch.replace(batch)
    }

    /// Remove the custom batch (flushing it) and revert to the default
    /// batch. The caller keeps ownership and must eventually
    /// [`unload`](RenderBatch::unload) it.
    pub fn take_custom_batch(&mut self) -> Option<RenderBatch> {
        self.flush();
        self.custom_batch.take()
    }

    /// Release a batch's GPU buffers through this context's backend.
    pub fn unload_batch(&mut self, batch: RenderBatch) {
        batch.unload(&mut self.backend);
    }

    /// Draw-call entries accumulated so far this cycle.
    pub fn pending_draw_calls(&self) -> &[DrawCall] {
        self.active_batch().pending_calls()
    }

    /// Vertices accumulated so far this cycle.
    pub fn pending_vertices(&self) -> usize {
        self.active_batch().pending_vertices()
    }

    // ── Matrix operations ───────────────────────────────────────────────

    pub fn matrix_mode(&mut self, mode: MatrixMode) {
        self.matrices.set_mode(mode);
    }

    pub fn push_matrix(&mut self) {
        self.matrices.push();
    }

    pub fn pop_matrix(&mut self) {
        self.matrices.pop();
    }

    pub fn load_identity(&mut self) {
        self.matrices.load_identity();
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.matrices.translate(x, y, z);
    }

    /// Rotate by `angle` radians around `axis`.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        self.matrices.rotate(axis, angle);
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.matrices.scale(x, y, z);
    }

    pub fn mult_matrix(&mut self, m: Mat4) {
        self.matrices.mult_matrix(m);
    }

    pub fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.matrices.ortho(left, right, bottom, top, near, far);
    }

    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.matrices.frustum(left, right, bottom, top, near, far);
    }

    pub fn set_modelview(&mut self, m: Mat4) {
        self.matrices.set_modelview(m);
    }

    pub fn set_projection(&mut self, m: Mat4) {
        self.matrices.set_projection(m);
    }

    /// Viewport plus a top-left-origin orthographic projection where one
    /// world unit is one pixel, the usual setup for 2D drawing.
    pub fn setup_screen_projection(&mut self, width: u32, height: u32) {
        self.backend.set_viewport(0, 0, width, height);
        self.matrices.set_mode(MatrixMode::Projection);
        self.matrices.load_identity();
        self.matrices
            .ortho(0.0, width as f32, height as f32, 0.0, 0.0, 1.0);
        self.matrices.set_mode(MatrixMode::ModelView);
        self.matrices.load_identity();
    }

    // ── Immediate-mode emission ─────────────────────────────────────────

    /// Open a primitive group. Nesting is a protocol error.
    pub fn begin(&mut self, mode: DrawMode) {
        debug_assert!(
            self.recording.is_none(),
            "begin() while a primitive group is open"
        );
        self.recording = Some(mode);
        if self.active_batch().active_call().mode != mode {
            self.split_for_mode(mode);
        }
    }

    /// Close the current primitive group.
    pub fn end(&mut self) {
        debug_assert!(self.recording.is_some(), "end() without begin()");
        {
            let vb = self.active_batch().current_vertex_buffer();
            debug_assert!(
                vb.positions_used() == vb.texcoords_used()
                    && vb.positions_used() == vb.colors_used(),
                "vertex stream cursors diverged"
            );
        }
        self.recording = None;
        self.active_batch_mut().bump_depth();

        // Flush while a whole quad still fits, so the next group never
        // opens into a buffer that forces an immediate split.
        if self.active_batch().current_vertex_buffer().near_capacity() {
            self.flush();
        }
    }

    /// Set the sticky vertex color.
    pub fn color4ub(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.current_color = [r, g, b, a];
    }

    /// Set the sticky vertex color from floats in `[0, 1]`.
    pub fn color4f(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.current_color = Color::from_normalized(r, g, b, a).to_array();
    }

    /// Set the sticky vertex color from floats in `[0, 1]`, opaque.
    pub fn color3f(&mut self, r: f32, g: f32, b: f32) {
        self.color4f(r, g, b, 1.0);
    }

    /// Set the sticky vertex color.
    pub fn color(&mut self, color: Color) {
        self.current_color = color.to_array();
    }

    /// Set the sticky texture coordinate.
    pub fn tex_coord2f(&mut self, u: f32, v: f32) {
        self.current_texcoord = [u, v];
    }

    /// Emit a vertex at the batch's current depth.
    pub fn vertex2f(&mut self, x: f32, y: f32) {
        let depth = self.active_batch().current_depth();
        self.vertex3f(x, y, depth);
    }

    /// Emit a vertex at integer coordinates.
    pub fn vertex2i(&mut self, x: i32, y: i32) {
        self.vertex2f(x as f32, y as f32);
    }

    /// Emit a vertex: the position (transformed if a matrix is pushed)
    /// plus the sticky texcoord and color.
    pub fn vertex3f(&mut self, x: f32, y: f32, z: f32) {
        debug_assert!(
            self.recording.is_some(),
            "vertex emitted outside begin()/end()"
        );
        let mode = match self.recording {
            Some(mode) => mode,
            None => self.active_batch().active_call().mode,
        };

        // Reserve a whole primitive at each primitive boundary; a forced
        // flush must never split one.
        let group = mode.group_size();
        if self.active_batch().active_call().vertex_count % group == 0 {
            self.flush_if_needed(group);
        }

        let position = if self.matrices.transform_required() {
            let v = self.matrices.transform().transform_point3(Vec3::new(x, y, z));
            [v.x, v.y, v.z]
        } else {
            [x, y, z]
        };
        let texcoord = self.current_texcoord;
        let color = self.current_color;

        let batch = self.active_batch_mut();
        let vb = batch.current_vertex_buffer_mut();
        vb.push_position(position);
        vb.push_texcoord(texcoord);
        vb.push_color(color);
        batch.active_call_mut().vertex_count += 1;
    }

    /// Bind `texture` for subsequent emission, splitting the draw call if
    /// it differs from the current binding.
    pub fn enable_texture(&mut self, texture: TextureId) {
        if self.active_batch().active_call().texture != texture {
            self.split_for_texture(texture);
        }
    }

    /// Buffer-limit checkpoint after a textured draw.
    pub fn disable_texture(&mut self) {
        if !self.active_batch().current_vertex_buffer().can_fit(1) {
            self.flush();
        }
    }

    /// Flush now if `incoming` more vertices would not fit, then reopen
    /// the interrupted (mode, texture) pair so accumulation continues
    /// transparently.
    pub fn flush_if_needed(&mut self, incoming: usize) {
        if self.active_batch().current_vertex_buffer().can_fit(incoming) {
            return;
        }
        let interrupted = *self.active_batch().active_call();
        self.flush();
        let call = self.active_batch_mut().active_call_mut();
        call.mode = interrupted.mode;
        call.texture = interrupted.texture;
    }

    // ── State switches (these end the current coalescing run) ───────────

    /// Switch the fragment blend mode. Accumulated geometry is flushed
    /// first so it renders under the mode it was emitted with.
    pub fn blend_mode(&mut self, mode: BlendMode) {
        self.flush();
        self.backend.set_blend_mode(mode);
        self.blend_mode = mode;
    }

    pub fn current_blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Restrict rendering to `rect`. Flushes accumulated geometry first.
    pub fn begin_scissor(&mut self, rect: ScissorRect) {
        self.flush();
        self.backend.set_scissor(Some(rect));
    }

    /// Lift the scissor restriction. Flushes accumulated geometry first.
    pub fn end_scissor(&mut self) {
        self.flush();
        self.backend.set_scissor(None);
    }

    pub fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.backend.set_viewport(x, y, width, height);
    }

    // ── Flush engine ────────────────────────────────────────────────────

    /// Upload the accumulated vertex data and issue one GPU draw per
    /// pending draw-call entry, in submission order, then reset the batch
    /// for the next cycle. A flush with nothing accumulated is a no-op.
    pub fn flush(&mut self) {
        let Self {
            backend,
            matrices,
            default_batch,
            custom_batch,
            ..
        } = self;
        let batch = custom_batch.as_mut().unwrap_or(default_batch);

        let vb = batch.current_vertex_buffer();
        if vb.is_empty() {
            return;
        }
        let set = vb.gpu_set.expect("batch buffers not registered with a backend");

        backend.upload(
            set,
            VertexSlice {
                positions: vb.positions(),
                texcoords: vb.texcoords(),
                colors: vb.colors(),
            },
        );

        // Resolve each entry's cumulative vertex offset; padding charged
        // to earlier entries shifts everything after them.
        let mvp = matrices.model_view_projection();
        let mut submissions = Vec::with_capacity(batch.pending_calls().len());
        let mut offset = 0u32;
        for call in batch.pending_calls() {
            if call.vertex_count > 0 {
                submissions.push(DrawSubmission {
                    mode: call.mode,
                    vertex_offset: offset,
                    vertex_count: call.vertex_count as u32,
                    texture: call.texture,
                });
            }
            offset += (call.vertex_count + call.vertex_alignment) as u32;
        }
        backend.submit(set, mvp, &submissions);

        batch.current_vertex_buffer_mut().reset();
        let white = backend.white_texture();
        batch.reset_draw_calls(white);
        batch.advance_buffer();
    }

    // ── Draw-call splitting ─────────────────────────────────────────────

    fn split_for_mode(&mut self, mode: DrawMode) {
        self.close_active_call();
        let white = self.backend.white_texture();
        let call = self.active_batch_mut().active_call_mut();
        call.mode = mode;
        call.vertex_count = 0;
        call.texture = white;
    }

    fn split_for_texture(&mut self, texture: TextureId) {
        self.close_active_call();
        let recording = self.recording;
        let call = self.active_batch_mut().active_call_mut();
        call.texture = texture;
        call.vertex_count = 0;
        if let Some(mode) = recording {
            call.mode = mode;
        }
    }

    /// Close the tail draw call, charging alignment padding so the next
    /// quads call stays index-aligned, and step to a fresh entry. Flushes
    /// instead when the padding would not fit or the list is full.
    fn close_active_call(&mut self) {
        if self.active_batch().active_call().vertex_count > 0 {
            let padding = self.active_batch().active_call().alignment_padding();
            if !self.active_batch().current_vertex_buffer().can_fit(padding) {
                self.flush();
                return;
            }

            let batch = self.active_batch_mut();
            batch.active_call_mut().vertex_alignment = padding;
            batch.current_vertex_buffer_mut().advance_padding(padding);

            if batch.at_call_capacity() {
                self.flush();
                return;
            }
            self.active_batch_mut().open_next_call();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessBackend;

    fn test_context(elements: usize, draw_calls: usize) -> GfxContext<HeadlessBackend> {
        let mut backend = HeadlessBackend::new();
        let batch = RenderBatch::new(&mut backend, 1, elements, draw_calls);
        let mut ctx = GfxContext::new(backend);
        ctx.set_custom_batch(batch);
        ctx
    }

    fn emit_quad(ctx: &mut GfxContext<HeadlessBackend>) {
        ctx.begin(DrawMode::Quads);
        ctx.vertex2f(0.0, 0.0);
        ctx.vertex2f(0.0, 1.0);
        ctx.vertex2f(1.0, 1.0);
        ctx.vertex2f(1.0, 0.0);
        ctx.end();
    }

    #[test]
    fn consecutive_same_state_quads_coalesce() {
        let mut ctx = test_context(64, 16);
        for _ in 0..5 {
            emit_quad(&mut ctx);
        }
        let calls = ctx.pending_draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].vertex_count, 20);
        assert_eq!(calls[0].mode, DrawMode::Quads);
    }

    #[test]
    fn texture_change_splits_and_resplits() {
        // Three untextured quads, one textured, two untextured: exactly
        // three entries in emission order, never merged across the change.
        let mut ctx = test_context(64, 16);
        for _ in 0..3 {
            emit_quad(&mut ctx);
        }
        ctx.enable_texture(TextureId(5));
        emit_quad(&mut ctx);
        ctx.enable_texture(TextureId::DEFAULT);
        for _ in 0..2 {
            emit_quad(&mut ctx);
        }

        let calls = ctx.pending_draw_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            (calls[0].vertex_count, calls[0].texture),
            (12, TextureId::DEFAULT)
        );
        assert_eq!((calls[1].vertex_count, calls[1].texture), (4, TextureId(5)));
        assert_eq!(
            (calls[2].vertex_count, calls[2].texture),
            (8, TextureId::DEFAULT)
        );
        assert!(calls.iter().all(|c| c.mode == DrawMode::Quads));

        ctx.flush();
        let submit = ctx.backend().last_submit().unwrap().clone();
        assert_eq!(submit.calls.len(), 3);
        assert_eq!(submit.calls[0].vertex_offset, 0);
        assert_eq!(submit.calls[1].vertex_offset, 12);
        assert_eq!(submit.calls[2].vertex_offset, 16);
    }

    #[test]
    fn mode_change_splits() {
        let mut ctx = test_context(64, 16);
        emit_quad(&mut ctx);
        ctx.begin(DrawMode::Lines);
        ctx.vertex2f(0.0, 0.0);
        ctx.vertex2f(4.0, 4.0);
        ctx.end();
        emit_quad(&mut ctx);

        let calls = ctx.pending_draw_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].mode, DrawMode::Quads);
        assert_eq!(calls[1].mode, DrawMode::Lines);
        assert_eq!(calls[2].mode, DrawMode::Quads);
    }

    #[test]
    fn cursors_stay_in_lockstep() {
        let mut ctx = test_context(64, 16);
        ctx.begin(DrawMode::Triangles);
        ctx.color4ub(200, 100, 50, 255);
        for i in 0..9 {
            // One texcoord for every third vertex; stickiness still writes
            // one per vertex.
            if i % 3 == 0 {
                ctx.tex_coord2f(0.5, 0.5);
            }
            ctx.vertex2f(i as f32, 0.0);
        }
        ctx.end();
        assert_eq!(ctx.pending_vertices(), 9);
        ctx.flush();
        assert_eq!(ctx.backend().last_submit().unwrap().vertices_uploaded, 9);
    }

    #[test]
    fn overflow_forces_exactly_one_extra_flush() {
        // Capacity is 4 quads (16 vertices); 5 quads must land in two
        // flush cycles with nothing lost.
        let mut ctx = test_context(4, 16);
        ctx.begin(DrawMode::Quads);
        for i in 0..20 {
            ctx.vertex2f(i as f32, 0.0);
        }
        ctx.end();
        ctx.flush();

        let submits = ctx.backend().submits();
        assert_eq!(submits.len(), 2);
        assert_eq!(submits[0].calls.len(), 1);
        assert_eq!(submits[0].calls[0].vertex_count, 16);
        assert_eq!(submits[1].calls[0].vertex_count, 4);
        assert_eq!(ctx.backend().total_vertices_drawn(), 20);
    }

    #[test]
    fn draw_call_list_overflow_forces_flush() {
        let mut ctx = test_context(64, 2);
        emit_quad(&mut ctx);
        ctx.enable_texture(TextureId(7));
        emit_quad(&mut ctx);
        // Third state change exceeds the two-entry list: the batch flushes
        // before the new entry opens.
        ctx.enable_texture(TextureId(9));
        emit_quad(&mut ctx);
        ctx.flush();

        let submits = ctx.backend().submits();
        assert_eq!(submits.len(), 2);
        assert_eq!(ctx.backend().total_vertices_drawn(), 12);
        assert_eq!(submits[1].calls[0].texture, TextureId(9));
    }

    #[test]
    fn quads_offsets_stay_aligned_across_mode_mixes() {
        let mut ctx = test_context(64, 16);

        ctx.begin(DrawMode::Lines);
        ctx.vertex2f(0.0, 0.0);
        ctx.vertex2f(1.0, 1.0);
        ctx.end();
        emit_quad(&mut ctx);
        ctx.begin(DrawMode::Triangles);
        ctx.vertex2f(0.0, 0.0);
        ctx.vertex2f(1.0, 0.0);
        ctx.vertex2f(0.0, 1.0);
        ctx.end();
        emit_quad(&mut ctx);
        // An odd lines count still may not knock quads off alignment.
        ctx.begin(DrawMode::Lines);
        for i in 0..5 {
            ctx.vertex2f(i as f32, 0.0);
        }
        ctx.end();
        emit_quad(&mut ctx);
        ctx.flush();

        let submit = ctx.backend().last_submit().unwrap();
        for call in &submit.calls {
            if call.mode == DrawMode::Quads {
                assert_eq!(
                    call.vertex_offset % 4,
                    0,
                    "quads draw at misaligned offset {}",
                    call.vertex_offset
                );
            }
        }
    }

    #[test]
    fn flush_with_nothing_accumulated_is_a_noop() {
        let mut ctx = test_context(64, 16);
        emit_quad(&mut ctx);
        ctx.flush();
        ctx.flush();
        assert_eq!(ctx.backend().submits().len(), 1);
    }

    #[test]
    fn sticky_color_replicates_per_vertex() {
        let mut backend = HeadlessBackend::new();
        let batch = RenderBatch::new(&mut backend, 1, 8, 4);
        let mut ctx = GfxContext::new(backend);
        ctx.set_custom_batch(batch);

        ctx.begin(DrawMode::Quads);
        ctx.color4ub(10, 20, 30, 40);
        for _ in 0..4 {
            ctx.vertex2f(0.0, 0.0);
        }
        ctx.end();

        let batch = ctx.take_custom_batch();
        assert!(batch.is_some());
        // The flush in take_custom_batch uploaded four identical colors:
        // the color was set once, each vertex replicated it.
        let set = ctx.backend().last_submit().unwrap().set;
        assert_eq!(
            ctx.backend().uploaded_colors(set),
            &[[10, 20, 30, 40]; 4]
        );
    }

    #[test]
    fn pushed_transform_applies_to_vertices() {
        let mut ctx = test_context(8, 4);
        ctx.push_matrix();
        ctx.translate(100.0, 50.0, 0.0);
        ctx.begin(DrawMode::Quads);
        ctx.vertex3f(0.0, 0.0, 0.0);
        ctx.vertex3f(0.0, 1.0, 0.0);
        ctx.vertex3f(1.0, 1.0, 0.0);
        ctx.vertex3f(1.0, 0.0, 0.0);
        ctx.end();
        ctx.pop_matrix();
        ctx.flush();

        // The transform was baked in CPU-side; the uniform is the plain
        // projection * modelview (both identity here).
        let submit = ctx.backend().last_submit().unwrap();
        assert_eq!(submit.mvp, Mat4::IDENTITY);
        let set = submit.set;
        let positions = ctx.backend().uploaded_positions(set);
        assert_eq!(positions[0], [100.0, 50.0, 0.0]);
        assert_eq!(positions[2], [101.0, 51.0, 0.0]);
    }

    #[test]
    fn blend_mode_switch_flushes_first() {
        let mut ctx = test_context(64, 16);
        emit_quad(&mut ctx);
        ctx.blend_mode(BlendMode::Additive);
        assert_eq!(ctx.backend().submits().len(), 1);
        assert_eq!(ctx.backend().blend_mode(), BlendMode::Additive);
    }

    #[test]
    fn scissor_switch_flushes_first() {
        let mut ctx = test_context(64, 16);
        emit_quad(&mut ctx);
        ctx.begin_scissor(ScissorRect {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        });
        assert_eq!(ctx.backend().submits().len(), 1);
        assert!(ctx.backend().scissor().is_some());
        emit_quad(&mut ctx);
        ctx.end_scissor();
        assert_eq!(ctx.backend().submits().len(), 2);
        assert!(ctx.backend().scissor().is_none());
    }

    #[test]
    fn custom_batch_swaps_in_and_out() {
        let mut backend = HeadlessBackend::new();
        let custom = RenderBatch::new(&mut backend, 1, 8, 4);
        let mut ctx = GfxContext::new(backend);

        emit_quad(&mut ctx);
        assert_eq!(ctx.pending_vertices(), 4);

        // Installing the custom batch flushes the default batch.
        let previous = ctx.set_custom_batch(custom);
        assert!(previous.is_none());
        assert_eq!(ctx.backend().submits().len(), 1);
        assert_eq!(ctx.pending_vertices(), 0);

        emit_quad(&mut ctx);
        let custom = ctx.take_custom_batch().unwrap();
        assert_eq!(ctx.backend().submits().len(), 2);
        ctx.unload_batch(custom);
    }

    #[test]
    fn end_flushes_when_nearly_full() {
        // Two-quad capacity: the first quad leaves exactly one quad of
        // room, so end() flushes eagerly.
        let mut ctx = test_context(2, 4);
        emit_quad(&mut ctx);
        assert_eq!(ctx.backend().submits().len(), 1);
    }
}
