//! # Batch — CPU-Side Vertex Accumulation
//!
//! Everything the renderer draws in a frame funnels through one *render
//! batch*: a fixed-capacity, CPU-side staging area for vertex data plus an
//! ordered list of pending GPU draw calls. Geometry is accumulated through
//! the immediate-mode API on [`GfxContext`](crate::context::GfxContext) and
//! handed to the GPU in a single flush at the frame boundary (or earlier,
//! when a buffer fills up).
//!
//! ## Architecture
//!
//! ```text
//!  begin(mode) / vertex* / end            (immediate-mode front end)
//!         │
//!         ▼
//!  ┌─────────────────────────────────────────────┐
//!  │ RenderBatch                                  │
//!  │  ┌────────────────┐   ┌───────────────────┐  │
//!  │  │ VertexBuffer    │   │ DrawCall list      │  │
//!  │  │ positions       │   │ {mode, count,      │  │
//!  │  │ texcoords       │   │  alignment,        │  │
//!  │  │ colors          │   │  texture}          │  │
//!  │  │ static indices  │   │ coalesced on       │  │
//!  │  │ (× buffer-sets) │   │ (mode, texture)    │  │
//!  │  └────────────────┘   └───────────────────┘  │
//!  └─────────────────────┬───────────────────────┘
//!                        │ flush()
//!                        ▼
//!            one bulk upload + one GPU draw
//!            per draw-call entry, in order
//! ```
//!
//! ## Design Decisions
//!
//! **Fixed capacity, forced flush.** Neither the vertex buffers nor the
//! draw-call list ever grow. When either would overflow, the engine flushes
//! the accumulated frame early and keeps going in the now-empty buffers.
//! The caller never sees this; the cost is an extra GPU submission, the
//! payoff is bounded, predictable memory.
//!
//! **Coalescing on (mode, texture).** Consecutive primitives that share a
//! primitive mode and a bound texture extend the tail draw-call entry
//! instead of opening a new one. Draw calls are the dominant per-frame GPU
//! overhead for immediate-mode workloads, so the batch emits the minimum
//! number of them that preserves submission order.
//!
//! **Quad-shaped shared index buffer.** The index buffer is pre-filled at
//! construction with the `(0,1,2, 0,2,3)` pattern, offset by four per quad,
//! and never rewritten. Lines and triangles draw as raw vertex ranges from
//! the same vertex stream; padding vertices are inserted when leaving a
//! non-quad draw call so that every quads call starts on a multiple of four
//! and stays aligned with the static index pattern.

pub(crate) mod draw_call;
pub(crate) mod matrix_stack;
pub(crate) mod render_batch;
pub(crate) mod vertex_buffer;

pub use draw_call::DrawCall;
pub use matrix_stack::{MatrixMode, MatrixStack};
pub use render_batch::RenderBatch;
pub use vertex_buffer::VertexBuffer;

/// Primitive mode for a group of emitted vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Independent line segments, two vertices each.
    Lines,
    /// Independent triangles, three vertices each.
    Triangles,
    /// Independent quads, four vertices each, expanded to two triangles by
    /// the shared index buffer.
    Quads,
}

impl DrawMode {
    /// Vertices per whole primitive; emission never splits a primitive
    /// across a forced flush.
    pub(crate) const fn group_size(self) -> usize {
        match self {
            DrawMode::Lines => 2,
            DrawMode::Triangles => 3,
            DrawMode::Quads => 4,
        }
    }
}

/// Default quad capacity of a batch buffer-set.
#[cfg(not(any(target_os = "android", target_os = "ios")))]
pub const DEFAULT_BATCH_ELEMENTS: usize = 8192;
/// Default quad capacity of a batch buffer-set.
#[cfg(any(target_os = "android", target_os = "ios"))]
pub const DEFAULT_BATCH_ELEMENTS: usize = 2048;

/// Default draw-call list capacity per batch.
pub const DEFAULT_BATCH_DRAW_CALLS: usize = 256;

/// Default number of buffer-sets per batch (no multi-buffering).
pub const DEFAULT_BATCH_BUFFER_COUNT: usize = 1;

/// Maximum matrix stack depth.
pub const MAX_MATRIX_STACK_DEPTH: usize = 32;

/// Depth advance applied after each `end()` so later primitives win when
/// depth testing is enabled for 2D ordering.
pub(crate) const DEPTH_INCREMENT: f32 = 1.0 / 20_000.0;

/// Depth value at the start of a flush cycle.
pub(crate) const INITIAL_DEPTH: f32 = -1.0;
