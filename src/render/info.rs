use crate::gl::DrawMode;

/// Frame statistics accumulated by the draw loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderInfo {
    pub draw_calls: u32,
    pub triangles: u64,
    pub lines: u64,
    pub points: u64,
}

impl RenderInfo {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record one draw of `count` elements across `instances` instances,
    /// using the per-mode primitive counting formula.
    pub fn record(&mut self, mode: DrawMode, count: u64, instances: u64) {
        self.draw_calls += 1;
        match mode {
            DrawMode::Triangles => self.triangles += count / 3 * instances,
            DrawMode::TriangleStrip | DrawMode::TriangleFan => {
                self.triangles += count.saturating_sub(2) * instances;
            }
            DrawMode::Lines => self.lines += count / 2 * instances,
            DrawMode::LineStrip => self.lines += count.saturating_sub(1) * instances,
            DrawMode::LineLoop => self.lines += count * instances,
            DrawMode::Points => self.points += count * instances,
        }
    }
}
