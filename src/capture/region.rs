//! Pure compositing and cropping — functional core.
//!
//! No OS access here: monitor frames in, pixels out.

use image::{imageops, RgbaImage};

use super::{MonitorRect, PixelRect};

/// Paint each monitor frame into a canvas covering `area`.
///
/// Frames are placed at their offset from `area`'s origin and clipped to
/// it. Canvas pixels no frame covers stay transparent black.
pub fn compose(area: &MonitorRect, frames: &[(MonitorRect, RgbaImage)]) -> RgbaImage {
    let mut canvas = RgbaImage::new(area.width, area.height);

    for (monitor, pixels) in frames {
        let dx = monitor.x as i64 - area.x as i64;
        let dy = monitor.y as i64 - area.y as i64;
        imageops::replace(&mut canvas, pixels, dx, dy);
    }

    canvas
}

/// Copy `rect` out of `image` into a new buffer.
pub fn crop(image: &RgbaImage, rect: PixelRect) -> Result<RgbaImage, CropError> {
    if rect.width == 0 || rect.height == 0 {
        return Err(CropError::ZeroDimension);
    }

    let (img_width, img_height) = image.dimensions();

    if rect.x as u64 + rect.width as u64 > img_width as u64
        || rect.y as u64 + rect.height as u64 > img_height as u64
    {
        return Err(CropError::OutOfBounds {
            requested: (rect.x, rect.y, rect.width, rect.height),
            image_size: (img_width, img_height),
        });
    }

    Ok(imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image())
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error(
        "Crop rectangle ({},{},{},{}) exceeds image bounds ({}x{})",
        requested.0, requested.1, requested.2, requested.3,
        image_size.0, image_size.1
    )]
    OutOfBounds {
        requested: (u32, u32, u32, u32),
        image_size: (u32, u32),
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    fn rect(x: u32, y: u32, width: u32, height: u32) -> PixelRect {
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn crop_valid_region() {
        let mut img = RgbaImage::new(100, 100);
        img.put_pixel(10, 10, Rgba([1, 2, 3, 4]));
        let cropped = crop(&img, rect(10, 10, 50, 50)).unwrap();
        assert_eq!(cropped.dimensions(), (50, 50));
        assert_eq!(*cropped.get_pixel(0, 0), Rgba([1, 2, 3, 4]));
    }

    #[test]
    fn crop_zero_dimension_fails() {
        let img = RgbaImage::new(100, 100);
        let result = crop(&img, rect(0, 0, 0, 50));
        assert!(matches!(result, Err(CropError::ZeroDimension)));
    }

    #[test]
    fn crop_out_of_bounds_fails() {
        let img = RgbaImage::new(100, 100);
        let result = crop(&img, rect(80, 80, 30, 30));
        assert!(matches!(result, Err(CropError::OutOfBounds { .. })));
    }

    #[test]
    fn compose_places_frames_relative_to_area_origin() {
        let area = MonitorRect {
            id: 0,
            x: -4,
            y: 0,
            width: 8,
            height: 2,
        };
        let left = MonitorRect {
            id: 1,
            x: -4,
            y: 0,
            width: 4,
            height: 2,
        };
        let right = MonitorRect {
            id: 2,
            x: 0,
            y: 0,
            width: 4,
            height: 2,
        };

        let canvas = compose(&area, &[(left, solid(4, 2, 10)), (right, solid(4, 2, 20))]);

        assert_eq!(canvas.get_pixel(3, 1)[0], 10);
        assert_eq!(canvas.get_pixel(4, 0)[0], 20);
    }

    #[test]
    fn compose_leaves_uncovered_pixels_transparent() {
        let area = MonitorRect {
            id: 0,
            x: 0,
            y: 0,
            width: 4,
            height: 4,
        };
        let small = MonitorRect {
            id: 1,
            x: 0,
            y: 0,
            width: 2,
            height: 2,
        };

        let canvas = compose(&area, &[(small, solid(2, 2, 50))]);

        assert_eq!(*canvas.get_pixel(3, 3), Rgba([0, 0, 0, 0]));
        assert_eq!(canvas.get_pixel(1, 1)[0], 50);
    }
}
