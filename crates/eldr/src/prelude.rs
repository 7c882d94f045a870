//! Convenience re-exports for the common path.

pub use crate::backend::headless::HeadlessBackend;
pub use crate::backend::{BlendMode, GraphicsBackend, ScissorRect, TextureId};
#[cfg(feature = "wgpu-backend")]
pub use crate::backend::wgpu::WgpuBackend;
pub use crate::batch::{
    DrawMode, MatrixMode, RenderBatch, DEFAULT_BATCH_DRAW_CALLS, DEFAULT_BATCH_ELEMENTS,
};
pub use crate::context::GfxContext;
pub use crate::math::{Color, Mat4, Rect, Vec2, Vec3};
