//! Texture storage shared by walls, flats, sky and sprites.
//!
//! Everything outside this module refers to images through a [`TextureId`];
//! where the pixels came from (generated, decoded, test fixtures) is the
//! caller's business.

use std::collections::HashMap;

/// Index into a [`TextureBank`]. Ids never change once handed out.
pub type TextureId = u16;

/// Id of the fallback checkerboard every bank starts with.
pub const NO_TEXTURE: TextureId = 0;

/// Name the fallback is registered under.
const FALLBACK_NAME: &str = "MISSING";

/// Row-major `0xAARRGGBB` image. Alpha 0 = transparent (sprites only;
/// walls and flats ignore it).
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub name: String,
    pub w: usize,
    pub h: usize,
    pub pixels: Vec<u32>,
}

impl Texture {
    /// Every texel the same colour.
    pub fn solid<S: Into<String>>(name: S, w: usize, h: usize, color: u32) -> Self {
        Self {
            name: name.into(),
            w,
            h,
            pixels: vec![color; w * h],
        }
    }

    /// 8×8 grey checkerboard, the stand-in for unknown ids.
    pub fn checker() -> Self {
        let pixels = (0..64)
            .map(|i| {
                let (x, y) = (i % 8, i / 8);
                if (x + y) % 2 == 0 { 0xFF_A0A0A0 } else { 0xFF_505050 }
            })
            .collect();
        Self {
            name: FALLBACK_NAME.into(),
            w: 8,
            h: 8,
            pixels,
        }
    }

    /// Tiled lookup: both coordinates wrap, negatives included.
    #[inline(always)]
    pub fn texel(&self, u: i32, v: i32) -> u32 {
        let u = u.rem_euclid(self.w as i32) as usize;
        let v = v.rem_euclid(self.h as i32) as usize;
        self.pixels[v * self.w + u]
    }
}

/// Darken `color` by `light` in `0.0 ..= 1.0`; alpha passes through.
#[inline(always)]
pub fn shade(color: u32, light: f32) -> u32 {
    if light >= 1.0 {
        return color;
    }
    let k = (light.max(0.0) * 256.0) as u32;
    let channel = |shift: u32| ((((color >> shift) & 0xFF) * k) >> 8) << shift;
    (color & 0xFF00_0000) | channel(16) | channel(8) | channel(0)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    #[error("texture `{0}` is already registered")]
    Duplicate(String),

    #[error("no texture with id {0}")]
    BadId(TextureId),
}

/// Name ↔ id registry plus the pixel data.
///
/// Slot 0 always holds the fallback; names are unique.
pub struct TextureBank {
    ids: HashMap<String, TextureId>,
    textures: Vec<Texture>,
}

impl TextureBank {
    /// Bank whose only entry is `fallback`, registered as `"MISSING"`.
    pub fn new(fallback: Texture) -> Self {
        Self {
            ids: HashMap::from([(FALLBACK_NAME.to_string(), NO_TEXTURE)]),
            textures: vec![fallback],
        }
    }

    pub fn default_with_checker() -> Self {
        Self::new(Texture::checker())
    }

    /// Entries including the fallback.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Nothing registered beyond the fallback.
    pub fn is_empty(&self) -> bool {
        self.textures.len() <= 1
    }

    pub fn id(&self, name: &str) -> Option<TextureId> {
        self.ids.get(name).copied()
    }

    /// Like [`id`](Self::id) but unknown names map to [`NO_TEXTURE`].
    pub fn id_or_missing(&self, name: &str) -> TextureId {
        self.id(name).unwrap_or(NO_TEXTURE)
    }

    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.textures.get(id as usize).ok_or(TextureError::BadId(id))
    }

    /// Register `tex` under `name` and return its new id.
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        tex: Texture,
    ) -> Result<TextureId, TextureError> {
        let name = name.into();
        if self.ids.contains_key(&name) {
            return Err(TextureError::Duplicate(name));
        }
        let id = self.textures.len() as TextureId;
        self.textures.push(tex);
        self.ids.insert(name, id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_after_the_fallback() {
        let mut bank = TextureBank::default_with_checker();
        assert!(bank.is_empty());
        let a = bank.insert("A", Texture::solid("A", 2, 2, 0xFF_FF0000)).unwrap();
        let b = bank.insert("B", Texture::solid("B", 2, 2, 0xFF_0000FF)).unwrap();

        assert_eq!((a, b), (1, 2));
        assert_eq!(bank.id("B"), Some(b));
        assert_eq!(bank.id("MISSING"), Some(NO_TEXTURE));
        assert_eq!(bank.id_or_missing("C"), NO_TEXTURE);
        assert_eq!(bank.texture(a).unwrap().pixels[3], 0xFF_FF0000);
        assert_eq!(bank.texture(NO_TEXTURE).unwrap().w, 8);
    }

    #[test]
    fn names_are_unique() {
        let mut bank = TextureBank::default_with_checker();
        bank.insert("WALL", Texture::solid("WALL", 1, 1, 1)).unwrap();
        assert_eq!(
            bank.insert("WALL", Texture::solid("WALL", 1, 1, 2)),
            Err(TextureError::Duplicate("WALL".into()))
        );
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.texture(9), Err(TextureError::BadId(9)));
    }

    #[test]
    fn texel_tiles_in_both_directions() {
        let mut tex = Texture::solid("T", 4, 2, 0);
        tex.pixels[4 + 1] = 7; // (1, 1)
        assert_eq!(tex.texel(1, 1), 7);
        assert_eq!(tex.texel(5, 3), 7);
        assert_eq!(tex.texel(-3, -1), 7);
        assert_eq!(tex.texel(2, 1), 0);
    }

    #[test]
    fn shading_keeps_alpha() {
        assert_eq!(shade(0xFF_808080, 1.0), 0xFF_808080);
        assert_eq!(shade(0xFF_808080, 0.5), 0xFF_404040);
        assert_eq!(shade(0x80_FFFFFF, 0.0), 0x80_000000);
    }
}
