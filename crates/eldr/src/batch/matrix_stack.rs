//! Bounded fixed-function-style matrix stack.
//!
//! Mirrors the classic GL matrix model: a current-matrix selector over the
//! modelview and projection slots, plus a bounded push/pop stack. Pushing
//! while in modelview mode routes subsequent mutations to a separate
//! *transform* matrix that is applied CPU-side to every emitted vertex;
//! the camera modelview itself stays untouched and is combined with the
//! projection into the uniform uploaded at flush time. Popping back to
//! depth zero returns mutations to the modelview slot.
//!
//! Conventions are column-major right-handed (`glam`). Local transforms
//! (`translate`, `rotate`, `scale`) post-multiply the current matrix, as
//! `glTranslatef` and friends do; `mult_matrix`, `ortho` and `frustum`
//! pre-multiply.

use glam::{Mat4, Vec3, Vec4};

use super::MAX_MATRIX_STACK_DEPTH;

/// Which logical matrix subsequent operations target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixMode {
    ModelView,
    Projection,
}

/// The matrix state of a [`GfxContext`](crate::context::GfxContext).
#[derive(Debug)]
pub struct MatrixStack {
    stack: [Mat4; MAX_MATRIX_STACK_DEPTH],
    depth: usize,
    mode: MatrixMode,
    modelview: Mat4,
    projection: Mat4,
    transform: Mat4,
    transform_required: bool,
}

impl MatrixStack {
    pub fn new() -> Self {
        Self {
            stack: [Mat4::IDENTITY; MAX_MATRIX_STACK_DEPTH],
            depth: 0,
            mode: MatrixMode::ModelView,
            modelview: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            transform: Mat4::IDENTITY,
            transform_required: false,
        }
    }

    /// Select the matrix subsequent operations mutate.
    pub fn set_mode(&mut self, mode: MatrixMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> MatrixMode {
        self.mode
    }

    /// Copy the current matrix onto the stack. At capacity the push is
    /// logged and ignored.
    pub fn push(&mut self) {
        if self.depth >= MAX_MATRIX_STACK_DEPTH {
            log::error!("matrix stack limit reached ({MAX_MATRIX_STACK_DEPTH})");
            return;
        }
        if self.mode == MatrixMode::ModelView {
            self.transform_required = true;
        }
        self.stack[self.depth] = self.current();
        self.depth += 1;
    }

    /// Restore the current matrix from the stack. A pop at depth zero is a
    /// no-op.
    pub fn pop(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
            let restored = self.stack[self.depth];
            *self.current_mut() = restored;
        }
        if self.depth == 0 && self.mode == MatrixMode::ModelView {
            self.transform_required = false;
        }
    }

    pub fn stack_depth(&self) -> usize {
        self.depth
    }

    pub fn load_identity(&mut self) {
        *self.current_mut() = Mat4::IDENTITY;
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        let m = Mat4::from_translation(Vec3::new(x, y, z));
        *self.current_mut() = self.current() * m;
    }

    /// Rotate by `angle` radians around `axis`.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        let m = Mat4::from_axis_angle(axis.normalize(), angle);
        *self.current_mut() = self.current() * m;
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        let m = Mat4::from_scale(Vec3::new(x, y, z));
        *self.current_mut() = self.current() * m;
    }

    pub fn mult_matrix(&mut self, m: Mat4) {
        *self.current_mut() = m * self.current();
    }

    pub fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        let m = Mat4::orthographic_rh_gl(left, right, bottom, top, near, far);
        *self.current_mut() = m * self.current();
    }

    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        let m = frustum_rh_gl(left, right, bottom, top, near, far);
        *self.current_mut() = m * self.current();
    }

    /// Value of the currently targeted matrix.
    pub fn current(&self) -> Mat4 {
        match self.mode {
            MatrixMode::ModelView if self.transform_required => self.transform,
            MatrixMode::ModelView => self.modelview,
            MatrixMode::Projection => self.projection,
        }
    }

    fn current_mut(&mut self) -> &mut Mat4 {
        match self.mode {
            MatrixMode::ModelView if self.transform_required => &mut self.transform,
            MatrixMode::ModelView => &mut self.modelview,
            MatrixMode::Projection => &mut self.projection,
        }
    }

    pub fn modelview(&self) -> Mat4 {
        self.modelview
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn set_modelview(&mut self, m: Mat4) {
        self.modelview = m;
    }

    pub fn set_projection(&mut self, m: Mat4) {
        self.projection = m;
    }

    /// Whether emitted vertices must be multiplied by the transform matrix.
    pub(crate) fn transform_required(&self) -> bool {
        self.transform_required
    }

    pub(crate) fn transform(&self) -> Mat4 {
        self.transform
    }

    /// The combined matrix uploaded at flush time.
    pub(crate) fn model_view_projection(&self) -> Mat4 {
        self.projection * self.modelview
    }
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

/// GL-style perspective frustum (clip z in [-1, 1]); glam has no direct
/// constructor for the off-center form.
fn frustum_rh_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let rl = right - left;
    let tb = top - bottom;
    let fnear = far - near;
    Mat4::from_cols(
        Vec4::new(2.0 * near / rl, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / tb, 0.0, 0.0),
        Vec4::new((right + left) / rl, (top + bottom) / tb, -(far + near) / fnear, -1.0),
        Vec4::new(0.0, 0.0, -2.0 * far * near / fnear, 0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_round_trip() {
        let mut stack = MatrixStack::new();
        stack.set_mode(MatrixMode::Projection);
        stack.ortho(0.0, 800.0, 450.0, 0.0, 0.0, 1.0);
        let before = stack.current();

        stack.push();
        stack.load_identity();
        stack.translate(5.0, -3.0, 1.0);
        stack.pop();

        assert_eq!(stack.current(), before);
    }

    #[test]
    fn round_trip_at_every_depth() {
        let mut stack = MatrixStack::new();
        stack.set_mode(MatrixMode::Projection);
        let mut saved = Vec::new();
        for level in 1..MAX_MATRIX_STACK_DEPTH {
            saved.push(stack.current());
            stack.push();
            stack.translate(level as f32, 0.0, 0.0);
            stack.scale(2.0, 2.0, 1.0);
        }
        for _ in (1..MAX_MATRIX_STACK_DEPTH).rev() {
            stack.pop();
            assert_eq!(Some(stack.current()), saved.pop());
        }
    }

    #[test]
    fn overflow_push_is_ignored() {
        let mut stack = MatrixStack::new();
        stack.set_mode(MatrixMode::Projection);
        for _ in 0..MAX_MATRIX_STACK_DEPTH {
            stack.push();
        }
        assert_eq!(stack.stack_depth(), MAX_MATRIX_STACK_DEPTH);
        stack.push();
        assert_eq!(stack.stack_depth(), MAX_MATRIX_STACK_DEPTH);
    }

    #[test]
    fn underflow_pop_is_noop() {
        let mut stack = MatrixStack::new();
        stack.pop();
        assert_eq!(stack.stack_depth(), 0);
        assert_eq!(stack.current(), Mat4::IDENTITY);
    }

    #[test]
    fn modelview_push_routes_to_transform() {
        let mut stack = MatrixStack::new();
        assert!(!stack.transform_required());

        stack.push();
        assert!(stack.transform_required());
        stack.translate(10.0, 0.0, 0.0);
        // The camera modelview is untouched while pushed.
        assert_eq!(stack.modelview(), Mat4::IDENTITY);
        assert_ne!(stack.transform(), Mat4::IDENTITY);

        stack.pop();
        assert!(!stack.transform_required());
    }

    #[test]
    fn local_transforms_compose_left_to_right() {
        // translate-then-rotate must place the rotation in the translated
        // frame, matching glTranslatef/glRotatef ordering.
        let mut stack = MatrixStack::new();
        stack.push();
        stack.translate(10.0, 0.0, 0.0);
        stack.rotate(Vec3::Z, std::f32::consts::FRAC_PI_2);
        let p = stack.transform().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn frustum_matches_ortho_shape_conventions() {
        // Near-plane center maps to clip origin with -1 depth scale.
        let m = frustum_rh_gl(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        let p = m * Vec4::new(0.0, 0.0, -1.0, 1.0);
        assert!((p.x).abs() < 1e-6);
        assert!((p.y).abs() < 1e-6);
        assert!((p.z / p.w + 1.0).abs() < 1e-6);
    }
}
