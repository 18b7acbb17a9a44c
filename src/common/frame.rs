use image::{DynamicImage, RgbaImage};
use std::sync::Arc;

use crate::error::AppError;

/// Borrowed, read-only view over a captured screen.
///
/// Samples are stored B, G, R(, A) with `stride` bytes between rows. The view is
/// only valid for one detection pass; nothing keeps it past `NpcNameFinder::update`.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    bytes_per_pixel: usize,
}

impl<'a> PixelBuffer<'a> {
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        bytes_per_pixel: usize,
    ) -> Result<Self, AppError> {
        if bytes_per_pixel != 3 && bytes_per_pixel != 4 {
            return Err(AppError::InvalidFrame(format!(
                "unsupported pixel size {bytes_per_pixel}"
            )));
        }
        let row_bytes = width as usize * bytes_per_pixel;
        if stride < row_bytes {
            return Err(AppError::InvalidFrame(format!(
                "stride {stride} shorter than row of {row_bytes} bytes"
            )));
        }
        let required = match height {
            0 => 0,
            h => stride * (h as usize - 1) + row_bytes,
        };
        if data.len() < required {
            return Err(AppError::InvalidFrame(format!(
                "buffer holds {} bytes, {required} required for {width}x{height}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            stride,
            bytes_per_pixel,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// The visible bytes of row `y`, without stride padding.
    pub fn row(&self, y: u32) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        self.data
            .get(start..start + self.width as usize * self.bytes_per_pixel)
    }

    /// Channels at `(x, y)` returned as `(r, g, b)`.
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let i = x as usize * self.bytes_per_pixel;
        Some((row[i + 2], row[i + 1], row[i]))
    }
}

/// An owned BGRA capture, cheap to clone between the capture and scanner tasks.
#[derive(Clone)]
pub struct Frame {
    pixels: Arc<Vec<u8>>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Wrap tightly packed BGRA bytes.
    pub fn from_bgra(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self, AppError> {
        let frame = Self {
            pixels: Arc::new(pixels),
            width,
            height,
        };
        frame.view()?;
        Ok(frame)
    }

    pub fn from_rgba_image(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        // -- pixel order is R G B A; convert to B G R A
        for pixel in image.pixels() {
            let [r, g, b, a] = pixel.0;
            pixels.extend_from_slice(&[b, g, r, a]);
        }
        Self {
            pixels: Arc::new(pixels),
            width,
            height,
        }
    }

    pub fn from_dynamic_image(image: &DynamicImage) -> Self {
        Self::from_rgba_image(&image.to_rgba8())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn view(&self) -> Result<PixelBuffer<'_>, AppError> {
        PixelBuffer::new(
            &self.pixels,
            self.width,
            self.height,
            self.width as usize * 4,
            4,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    #[test]
    fn cloning_frame_shares_pixel_buffer() {
        let img: RgbaImage = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_pixel(16, 16, Rgba([1, 2, 3, 255]));
        let f1 = Frame::from_rgba_image(&img);
        let f2 = f1.clone();
        assert!(Arc::ptr_eq(&f1.pixels, &f2.pixels));
    }

    #[test]
    fn rgba_image_is_stored_as_bgra() {
        let img: RgbaImage = ImageBuffer::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let frame = Frame::from_rgba_image(&img);
        let view = frame.view().unwrap();
        assert_eq!(&view.row(0).unwrap()[..4], &[30, 20, 10, 255]);
        assert_eq!(view.rgb_at(1, 1), Some((10, 20, 30)));
    }

    #[test]
    fn padded_stride_is_respected() {
        // 2x2 BGR rows padded to 8 bytes
        let data: [u8; 16] = [
            1, 2, 3, 4, 5, 6, 0, 0, //
            7, 8, 9, 10, 11, 12, 0, 0,
        ];
        let view = PixelBuffer::new(&data, 2, 2, 8, 3).unwrap();
        assert_eq!(view.row(1).unwrap(), &[7, 8, 9, 10, 11, 12]);
        assert_eq!(view.rgb_at(1, 1), Some((12, 11, 10)));
        assert_eq!(view.rgb_at(2, 1), None);
        assert_eq!(view.row(2), None);
    }

    #[test]
    fn undersized_buffer_is_rejected() {
        let data = [0u8; 10];
        assert!(matches!(
            PixelBuffer::new(&data, 4, 4, 16, 4),
            Err(AppError::InvalidFrame(_))
        ));
        assert!(PixelBuffer::new(&data, 4, 4, 8, 4).is_err());
        assert!(PixelBuffer::new(&data, 1, 1, 4, 2).is_err());
    }
}
