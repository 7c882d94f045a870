//! Draw-call descriptors and the index-alignment rule.

use crate::backend::TextureId;

use super::DrawMode;

/// One pending GPU draw: a contiguous vertex range sharing a primitive mode
/// and a bound texture.
///
/// Entries are opened when mode or texture changes and extended in place
/// while they stay the same (coalescing). `vertex_alignment` is the number
/// of padding vertices charged to this call when it was closed, so the next
/// quads call starts on a multiple of four (the shared index buffer is
/// quad-shaped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub mode: DrawMode,
    pub vertex_count: usize,
    pub vertex_alignment: usize,
    pub texture: TextureId,
}

impl DrawCall {
    /// A fresh entry as the list holds after a flush: quads, empty, bound
    /// to the white fallback texture.
    pub(crate) const fn reset(texture: TextureId) -> Self {
        Self {
            mode: DrawMode::Quads,
            vertex_count: 0,
            vertex_alignment: 0,
            texture,
        }
    }

    /// Padding vertices needed after this call so the cumulative vertex
    /// offset returns to a multiple of four.
    ///
    /// Quads keep the offset aligned by construction. For lines and
    /// triangles the next multiple of four is rounded up to, which also
    /// covers odd lines counts (a two-vertex line followed by quads pads
    /// by two; a five-vertex lines call pads by three).
    pub(crate) fn alignment_padding(&self) -> usize {
        match self.mode {
            DrawMode::Quads => 0,
            DrawMode::Lines | DrawMode::Triangles => (4 - self.vertex_count % 4) % 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(mode: DrawMode, vertex_count: usize) -> DrawCall {
        DrawCall {
            mode,
            vertex_count,
            vertex_alignment: 0,
            texture: TextureId::DEFAULT,
        }
    }

    #[test]
    fn quads_never_pad() {
        for count in [0, 4, 8, 32768] {
            assert_eq!(call(DrawMode::Quads, count).alignment_padding(), 0);
        }
    }

    #[test]
    fn padding_restores_multiple_of_four() {
        for mode in [DrawMode::Lines, DrawMode::Triangles] {
            for count in 0..64 {
                let c = call(mode, count);
                assert_eq!(
                    (count + c.alignment_padding()) % 4,
                    0,
                    "mode {mode:?} count {count}"
                );
            }
        }
    }

    #[test]
    fn aligned_counts_pad_zero() {
        assert_eq!(call(DrawMode::Lines, 4).alignment_padding(), 0);
        assert_eq!(call(DrawMode::Lines, 8).alignment_padding(), 0);
        assert_eq!(call(DrawMode::Triangles, 12).alignment_padding(), 0);
    }
}
