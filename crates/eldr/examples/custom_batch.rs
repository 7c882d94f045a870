//! Install a deliberately tiny custom batch and overflow it, showing the
//! forced early flushes that keep accumulation bounded.
//!
//! Run with `RUST_LOG=info cargo run --example custom_batch`.

use eldr::prelude::*;

fn main() {
    env_logger::init();

    let mut ctx = GfxContext::new(HeadlessBackend::new());
    ctx.setup_screen_projection(320, 240);

    // Eight quads per buffer-set instead of the default thousands.
    let batch = RenderBatch::new(ctx.backend_mut(), 1, 8, 16);
    ctx.set_custom_batch(batch);

    for i in 0..20 {
        ctx.draw_rectangle(i as f32 * 12.0, 0.0, 10.0, 10.0, Color::BLUE);
    }

    let batch = ctx.take_custom_batch().expect("custom batch installed above");
    ctx.unload_batch(batch);

    let backend = ctx.backend();
    log::info!(
        "20 quads through an 8-quad batch: {} flush(es), {} vertices drawn",
        backend.submits().len(),
        backend.total_vertices_drawn()
    );
}
