//! Presented page surface

/// RGBA front buffer for one page
///
/// Holds the most recently committed render output. The rasterizer swaps
/// a freshly rendered back buffer in only when its generation check
/// passes, so a surface never shows a superseded render.
#[derive(Debug, Clone)]
pub struct PageSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PageSurface {
    /// Wrap RGBA pixel data
    ///
    /// Returns `None` if the byte length does not match `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major, 4 bytes per pixel.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_accepts_matching_length() {
        let surface = PageSurface::from_rgba(2, 3, vec![0; 24]).unwrap();
        assert_eq!(surface.width(), 2);
        assert_eq!(surface.height(), 3);
        assert_eq!(surface.pixels().len(), 24);
    }

    #[test]
    fn test_from_rgba_rejects_wrong_length() {
        assert!(PageSurface::from_rgba(2, 3, vec![0; 23]).is_none());
        assert!(PageSurface::from_rgba(2, 3, vec![0; 25]).is_none());
    }
}
