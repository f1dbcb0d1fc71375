use crate::renderer::Rgba;
use crate::world::TextureId;

/// Which ceiling flat means "open sky" and what to paint there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkyConfig {
    pub flat: TextureId,
    pub texture: TextureId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Horizontal field of view, degrees.
    pub fov: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Segs whose closest point is farther than this are not drawn.
    pub max_draw_distance: f32,
    pub clear_color: Rgba,
    pub sky: Option<SkyConfig>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 400,
            fov: 90.0,
            min_scale: 1.0 / 256.0,
            max_scale: 64.0,
            max_draw_distance: 8192.0,
            clear_color: 0xFF_202020,
            sky: None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("screen size {0}x{1} is empty")]
    EmptyScreen(usize, usize),
    #[error("screen size {0}x{1} does not fit the 16-bit clip rows")]
    ScreenTooLarge(usize, usize),
    #[error("field of view {0}° outside (0, 180)")]
    BadFov(f32),
    #[error("scale band [{0}, {1}] is empty")]
    BadScaleBand(f32, f32),
    #[error("draw distance {0} must be positive")]
    BadDrawDistance(f32),
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyScreen(self.width, self.height));
        }
        // clip arrays store rows (and the screen height itself) as i16
        let limit = i16::MAX as usize;
        if self.width > limit || self.height > limit {
            return Err(ConfigError::ScreenTooLarge(self.width, self.height));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(ConfigError::BadFov(self.fov));
        }
        if !(self.min_scale > 0.0 && self.min_scale < self.max_scale) {
            return Err(ConfigError::BadScaleBand(self.min_scale, self.max_scale));
        }
        if !(self.max_draw_distance > 0.0) {
            return Err(ConfigError::BadDrawDistance(self.max_draw_distance));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(RenderConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_values() {
        let mut c = RenderConfig::default();
        c.fov = 180.0;
        assert_eq!(c.validate(), Err(ConfigError::BadFov(180.0)));

        let mut c = RenderConfig::default();
        c.height = 0;
        assert!(matches!(c.validate(), Err(ConfigError::EmptyScreen(640, 0))));

        let mut c = RenderConfig::default();
        c.height = 40_000;
        assert_eq!(c.validate(), Err(ConfigError::ScreenTooLarge(640, 40_000)));

        let mut c = RenderConfig::default();
        c.width = i16::MAX as usize + 1;
        assert!(matches!(c.validate(), Err(ConfigError::ScreenTooLarge(..))));

        let mut c = RenderConfig::default();
        c.min_scale = 64.0;
        assert!(matches!(c.validate(), Err(ConfigError::BadScaleBand(..))));

        let mut c = RenderConfig::default();
        c.max_draw_distance = f32::NAN;
        assert!(c.validate().is_err());
    }
}
