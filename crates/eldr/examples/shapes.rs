//! Draw a small scene through the recording backend and report the
//! draw-call structure the coalescer produced.
//!
//! Run with `RUST_LOG=info cargo run --example shapes`.

use eldr::prelude::*;

fn main() {
    env_logger::init();

    let mut ctx = GfxContext::new(HeadlessBackend::new());
    ctx.setup_screen_projection(800, 450);

    // Background, a few shapes, and one textured quad in the middle. The
    // texture id is opaque to the engine; any value stands in here.
    ctx.draw_rectangle(0.0, 0.0, 800.0, 450.0, Color::rgb(40, 44, 52));
    ctx.draw_circle(Vec2::new(400.0, 225.0), 80.0, Color::RED);
    ctx.draw_rectangle_lines(Rect::new(40.0, 40.0, 720.0, 370.0), Color::WHITE);
    for i in 0..10 {
        ctx.draw_rectangle(60.0 + i as f32 * 70.0, 330.0, 50.0, 50.0, Color::GREEN);
    }
    ctx.draw_texture(
        TextureId(1),
        Rect::new(350.0, 60.0, 100.0, 100.0),
        Color::WHITE,
    );
    ctx.flush();

    let backend = ctx.backend();
    log::info!(
        "{} flush(es), {} draw call(s), {} vertices drawn",
        backend.submits().len(),
        backend.total_draw_calls(),
        backend.total_vertices_drawn()
    );
    for (i, submit) in backend.submits().iter().enumerate() {
        for call in &submit.calls {
            log::info!(
                "flush {i}: {:?} x{} at offset {} (texture {})",
                call.mode,
                call.vertex_count,
                call.vertex_offset,
                call.texture.0
            );
        }
    }
}
