/// Per-pixel distance-to-camera buffer shared by the wall and sprite passes.
///
/// Values are forward (view-axis) distances in map units; `f32::INFINITY`
/// means nothing has been drawn at that pixel this frame.
#[derive(Clone, Debug)]
pub struct DepthBuffer {
    depths: Box<[f32]>,
    width: usize,
    height: usize,
}

impl DepthBuffer {
    /// Create a new depth buffer with given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        let depths = vec![f32::INFINITY; width * height].into_boxed_slice();
        Self {
            depths,
            width,
            height,
        }
    }

    /// Reset the depth buffer for a new frame
    pub fn reset(&mut self) {
        self.depths.fill(f32::INFINITY);
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.depths[y * self.width + x]
    }

    /// Index of `(x, y)` if `depth` is strictly nearer than what is stored.
    #[inline]
    pub fn test(&self, x: usize, y: usize, depth: f32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y * self.width + x;
        (depth < self.depths[index]).then_some(index)
    }

    #[inline(always)]
    pub fn set(&mut self, index: usize, depth: f32) {
        self.depths[index] = depth;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.depths
    }

    /// Number of pixels still at infinite depth.
    pub fn unwritten(&self) -> usize {
        self.depths.iter().filter(|d| d.is_infinite()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_strict() {
        let mut db = DepthBuffer::new(4, 4);
        let idx = db.test(1, 2, 10.0).unwrap();
        db.set(idx, 10.0);
        assert_eq!(db.test(1, 2, 10.0), None);
        assert_eq!(db.test(1, 2, 9.5), Some(idx));
        assert_eq!(db.get(1, 2), 10.0);
    }

    #[test]
    fn out_of_bounds_never_passes() {
        let db = DepthBuffer::new(2, 2);
        assert_eq!(db.test(2, 0, 0.0), None);
        assert_eq!(db.test(0, 2, 0.0), None);
    }

    #[test]
    fn reset_restores_infinity() {
        let mut db = DepthBuffer::new(3, 1);
        db.set(1, 4.0);
        assert_eq!(db.unwritten(), 2);
        db.reset();
        assert_eq!(db.unwritten(), 3);
    }
}
