use cardboard_tracking::math::write_into;

/// Pixel rectangle, origin at the bottom-left of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Every component multiplied by `scale` and truncated, as for a render
    /// target of `scale` times the screen resolution.
    pub fn scaled(&self, scale: f32) -> Self {
        let s = |v: i32| (v as f32 * scale) as i32;
        Self::new(s(self.x), s(self.y), s(self.width), s(self.height))
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn top(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn overlaps(&self, other: &Viewport) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }

    /// Writes `[x, y, width, height]`.
    pub fn write_as_array(&self, out: &mut [i32], offset: usize) {
        write_into(out, offset, &[self.x, self.y, self.width, self.height]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_truncates_each_component() {
        let vp = Viewport::new(641, 0, 639, 720);
        assert_eq!(vp.scaled(0.5), Viewport::new(320, 0, 319, 360));
        assert_eq!(vp.scaled(1.0), vp);
    }

    #[test]
    fn adjacent_halves_do_not_overlap() {
        let left = Viewport::new(0, 0, 640, 720);
        let right = Viewport::new(640, 0, 640, 720);
        assert!(!left.overlaps(&right));
        assert!(left.overlaps(&Viewport::new(639, 0, 10, 10)));
    }

    #[test]
    #[should_panic(expected = "not enough space")]
    fn write_needs_four_slots() {
        let mut out = [0i32; 5];
        Viewport::default().write_as_array(&mut out, 2);
    }
}
