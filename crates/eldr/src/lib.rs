//! # Eldr — Immediate-Mode Batched Renderer
//!
//! A small rendering core in the raylib tradition: geometry is specified
//! through a stateful `begin`/`vertex*`/`end` API, accumulated CPU-side
//! into fixed-capacity buffers, coalesced into the minimum number of GPU
//! draw calls that preserves painter's-algorithm order, and flushed in one
//! bulk upload per frame.
//!
//! The engine is backend-agnostic: all GPU work goes through the
//! [`GraphicsBackend`](backend::GraphicsBackend) trait. A wgpu adapter
//! ships behind the `wgpu-backend` feature (on by default), and a
//! recording [`HeadlessBackend`](backend::headless::HeadlessBackend)
//! drives the test suite and runs anywhere.
//!
//! ```
//! use eldr::prelude::*;
//!
//! let mut ctx = GfxContext::new(HeadlessBackend::new());
//! ctx.setup_screen_projection(800, 450);
//!
//! ctx.draw_rectangle(100.0, 100.0, 64.0, 64.0, Color::RED);
//! ctx.draw_circle(Vec2::new(300.0, 200.0), 40.0, Color::BLUE);
//! ctx.flush();
//! ```
//!
//! Texture decoding, font rasterization, and window/surface management
//! live outside this crate; the engine consumes already-uploaded texture
//! ids and renders into caller-provided targets.

pub mod backend;
pub mod batch;
pub mod context;
pub mod math;
pub mod prelude;
pub(crate) mod shapes;
