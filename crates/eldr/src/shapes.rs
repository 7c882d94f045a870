//! Shape and texture drawing helpers.
//!
//! Thin wrappers over the immediate-mode API: every helper is an ordinary
//! `begin`/`vertex*`/`end` sequence with no private access to the batch,
//! so anything drawn here coalesces with anything the caller emits
//! directly. Untextured shapes bind the white fallback texture and batch
//! together with each other.

use crate::backend::{GraphicsBackend, TextureId};
use crate::batch::DrawMode;
use crate::context::GfxContext;
use crate::math::{Color, Rect, Vec2};

impl<B: GraphicsBackend> GfxContext<B> {
    /// Draw a single pixel.
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.begin(DrawMode::Lines);
        self.color(color);
        self.vertex2i(x, y);
        self.vertex2i(x + 1, y + 1);
        self.end();
    }

    /// Draw a one-pixel line between two points.
    pub fn draw_line(&mut self, start: Vec2, end: Vec2, color: Color) {
        self.begin(DrawMode::Lines);
        self.color(color);
        self.vertex2f(start.x, start.y);
        self.vertex2f(end.x, end.y);
        self.end();
    }

    /// Draw a filled rectangle.
    pub fn draw_rectangle(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.draw_rectangle_rec(Rect::new(x, y, width, height), color);
    }

    /// Draw a filled rectangle.
    pub fn draw_rectangle_rec(&mut self, rec: Rect, color: Color) {
        self.enable_texture(TextureId::DEFAULT);
        self.begin(DrawMode::Quads);
        self.color(color);

        self.tex_coord2f(0.0, 0.0);
        self.vertex2f(rec.x, rec.y);
        self.tex_coord2f(0.0, 1.0);
        self.vertex2f(rec.x, rec.y + rec.height);
        self.tex_coord2f(1.0, 1.0);
        self.vertex2f(rec.x + rec.width, rec.y + rec.height);
        self.tex_coord2f(1.0, 0.0);
        self.vertex2f(rec.x + rec.width, rec.y);

        self.end();
        self.disable_texture();
    }

    /// Draw the outline of a rectangle.
    pub fn draw_rectangle_lines(&mut self, rec: Rect, color: Color) {
        self.begin(DrawMode::Lines);
        self.color(color);

        self.vertex2f(rec.x, rec.y);
        self.vertex2f(rec.x + rec.width, rec.y);
        self.vertex2f(rec.x + rec.width, rec.y);
        self.vertex2f(rec.x + rec.width, rec.y + rec.height);
        self.vertex2f(rec.x + rec.width, rec.y + rec.height);
        self.vertex2f(rec.x, rec.y + rec.height);
        self.vertex2f(rec.x, rec.y + rec.height);
        self.vertex2f(rec.x, rec.y);

        self.end();
    }

    /// Draw a filled triangle. Vertices are expected counter-clockwise.
    pub fn draw_triangle(&mut self, v1: Vec2, v2: Vec2, v3: Vec2, color: Color) {
        self.begin(DrawMode::Triangles);
        self.color(color);
        self.vertex2f(v1.x, v1.y);
        self.vertex2f(v2.x, v2.y);
        self.vertex2f(v3.x, v3.y);
        self.end();
    }

    /// Draw a filled circle as a 36-segment fan.
    pub fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.draw_circle_sector(center, radius, 0.0, std::f32::consts::TAU, 36, color);
    }

    /// Draw a piece of a circle between two angles (radians).
    pub fn draw_circle_sector(
        &mut self,
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        segments: u32,
        color: Color,
    ) {
        let radius = radius.max(0.1); // avoid degenerate fans
        let (start_angle, end_angle) = if end_angle < start_angle {
            (end_angle, start_angle)
        } else {
            (start_angle, end_angle)
        };
        let segments = segments.max(4);
        let step = (end_angle - start_angle) / segments as f32;

        // Keep the whole fan in one flush cycle.
        self.flush_if_needed(segments as usize * 3);

        self.begin(DrawMode::Triangles);
        self.color(color);
        let mut angle = start_angle;
        for _ in 0..segments {
            self.vertex2f(center.x, center.y);
            self.vertex2f(
                center.x + angle.sin() * radius,
                center.y + angle.cos() * radius,
            );
            let next = angle + step;
            self.vertex2f(
                center.x + next.sin() * radius,
                center.y + next.cos() * radius,
            );
            angle = next;
        }
        self.end();
    }

    /// Draw the outline of a circle as a 36-segment line loop.
    pub fn draw_circle_lines(&mut self, center: Vec2, radius: f32, color: Color) {
        let segments = 36;
        let step = std::f32::consts::TAU / segments as f32;

        self.begin(DrawMode::Lines);
        self.color(color);
        for i in 0..segments {
            let a = i as f32 * step;
            let b = a + step;
            self.vertex2f(center.x + a.sin() * radius, center.y + a.cos() * radius);
            self.vertex2f(center.x + b.sin() * radius, center.y + b.cos() * radius);
        }
        self.end();
    }

    /// Draw a texture stretched over a destination rectangle.
    pub fn draw_texture(&mut self, texture: TextureId, dest: Rect, tint: Color) {
        self.draw_texture_region(texture, Rect::new(0.0, 0.0, 1.0, 1.0), dest, tint);
    }

    /// Draw a sub-region of a texture over a destination rectangle.
    ///
    /// `source` is in normalized texture coordinates (the engine holds no
    /// texture dimensions; convert from pixels at the call site).
    pub fn draw_texture_region(
        &mut self,
        texture: TextureId,
        source: Rect,
        dest: Rect,
        tint: Color,
    ) {
        self.enable_texture(texture);
        self.begin(DrawMode::Quads);
        self.color(tint);

        self.tex_coord2f(source.x, source.y);
        self.vertex2f(dest.x, dest.y);
        self.tex_coord2f(source.x, source.y + source.height);
        self.vertex2f(dest.x, dest.y + dest.height);
        self.tex_coord2f(source.x + source.width, source.y + source.height);
        self.vertex2f(dest.x + dest.width, dest.y + dest.height);
        self.tex_coord2f(source.x + source.width, source.y);
        self.vertex2f(dest.x + dest.width, dest.y);

        self.end();
        self.disable_texture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessBackend;
    use crate::batch::RenderBatch;

    fn test_context() -> GfxContext<HeadlessBackend> {
        let mut backend = HeadlessBackend::new();
        let batch = RenderBatch::new(&mut backend, 1, 256, 16);
        let mut ctx = GfxContext::new(backend);
        ctx.set_custom_batch(batch);
        ctx
    }

    #[test]
    fn rectangle_is_one_quad() {
        let mut ctx = test_context();
        ctx.draw_rectangle(10.0, 10.0, 20.0, 30.0, Color::RED);
        let calls = ctx.pending_draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].mode, DrawMode::Quads);
        assert_eq!(calls[0].vertex_count, 4);
    }

    #[test]
    fn shapes_batch_together_untextured() {
        let mut ctx = test_context();
        ctx.draw_rectangle(0.0, 0.0, 8.0, 8.0, Color::RED);
        ctx.draw_rectangle(8.0, 0.0, 8.0, 8.0, Color::GREEN);
        ctx.draw_rectangle(16.0, 0.0, 8.0, 8.0, Color::BLUE);
        // Same mode, same white texture: a single coalesced entry.
        assert_eq!(ctx.pending_draw_calls().len(), 1);
        assert_eq!(ctx.pending_draw_calls()[0].vertex_count, 12);
    }

    #[test]
    fn circle_emits_full_fan() {
        let mut ctx = test_context();
        ctx.draw_circle(Vec2::new(0.0, 0.0), 10.0, Color::WHITE);
        let calls = ctx.pending_draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].mode, DrawMode::Triangles);
        assert_eq!(calls[0].vertex_count, 36 * 3);
    }

    #[test]
    fn rectangle_lines_uses_line_pairs() {
        let mut ctx = test_context();
        ctx.draw_rectangle_lines(Rect::new(0.0, 0.0, 4.0, 4.0), Color::BLACK);
        let calls = ctx.pending_draw_calls();
        assert_eq!(calls[0].mode, DrawMode::Lines);
        assert_eq!(calls[0].vertex_count, 8);
    }

    #[test]
    fn textured_quad_splits_from_shapes() {
        let mut ctx = test_context();
        ctx.draw_rectangle(0.0, 0.0, 8.0, 8.0, Color::WHITE);
        ctx.draw_texture(TextureId(3), Rect::new(10.0, 10.0, 32.0, 32.0), Color::WHITE);
        ctx.draw_rectangle(20.0, 0.0, 8.0, 8.0, Color::WHITE);

        let calls = ctx.pending_draw_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].texture, TextureId(3));
        assert_eq!(calls[1].vertex_count, 4);
    }

    #[test]
    fn mixed_scene_flushes_cleanly() {
        let mut ctx = test_context();
        ctx.draw_circle(Vec2::new(50.0, 50.0), 12.0, Color::GREEN);
        ctx.draw_line(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0), Color::BLACK);
        ctx.draw_rectangle(0.0, 0.0, 10.0, 10.0, Color::RED);
        ctx.flush();

        let submit = ctx.backend().last_submit().unwrap();
        assert_eq!(submit.calls.len(), 3);
        for call in &submit.calls {
            if call.mode == DrawMode::Quads {
                assert_eq!(call.vertex_offset % 4, 0);
            }
        }
    }
}
