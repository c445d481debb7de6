use image::{Rgb, RgbImage};

use super::model::{ImageShape, ImageStack};

// ---------------------------------------------------------------------------
// 16-bit multi-channel → 8-bit RGB
// ---------------------------------------------------------------------------

/// Convert one `H,W,C` image of 16-bit samples to 8-bit RGB.
///
/// Channel mapping (input index → output):
/// * R ← 1, G ← 2, B ← 0
/// * channel 3, when present, is added to all three outputs
/// * a single-channel image is rendered as grey
/// * missing input channels read as zero, channels past 3 are ignored
///
/// Sums saturate at 65535 before the 16 → 8 bit shift.
pub fn channels_to_rgb8(samples: &[u16], shape: ImageShape) -> RgbImage {
    let c = shape.channels;
    RgbImage::from_fn(shape.width as u32, shape.height as u32, |x, y| {
        let base = (y as usize * shape.width + x as usize) * c;
        let ch = |i: usize| -> u32 {
            if i < c {
                samples.get(base + i).copied().unwrap_or(0) as u32
            } else {
                0
            }
        };

        let (r, g, b) = if c == 1 {
            (ch(0), ch(0), ch(0))
        } else {
            (ch(1), ch(2), ch(0))
        };
        let overlay = ch(3);

        Rgb([
            to_u8(r + overlay),
            to_u8(g + overlay),
            to_u8(b + overlay),
        ])
    })
}

/// Render every image of the stack.
pub fn render_stack(stack: &ImageStack) -> Vec<RgbImage> {
    let shape = stack.shape();
    (0..stack.len())
        .filter_map(|id| stack.image(id))
        .map(|samples| channels_to_rgb8(samples, shape))
        .collect()
}

fn to_u8(value: u32) -> u8 {
    (value.min(u16::MAX as u32) / 256) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(channels: usize) -> ImageShape {
        ImageShape { height: 1, width: 2, channels }
    }

    #[test]
    fn four_channels_are_remapped_and_overlaid() {
        // pixel 0: c0=0x0100, c1=0x0200, c2=0x0300, c3=0x0100
        // pixel 1: overlay pushes every channel past 16 bits
        let samples = [0x0100, 0x0200, 0x0300, 0x0100, 0xF000, 0xF000, 0xF000, 0x2000];
        let img = channels_to_rgb8(&samples, shape(4));
        assert_eq!(img.get_pixel(0, 0), &Rgb([3, 4, 2]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn three_channels_are_rotated() {
        let samples = [0x1000, 0x2000, 0x3000, 0, 0, 0xFFFF];
        let img = channels_to_rgb8(&samples, shape(3));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0x20, 0x30, 0x10]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([0, 255, 0]));
    }

    #[test]
    fn single_channel_is_grey() {
        let img = channels_to_rgb8(&[0x8000, 0x00FF], shape(1));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0x80, 0x80, 0x80]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn two_channels_leave_green_empty() {
        let img = channels_to_rgb8(&[0x4000, 0x5000, 0, 0], shape(2));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0x50, 0, 0x40]));
    }

    #[test]
    fn extra_channels_are_ignored() {
        let img = channels_to_rgb8(&[0, 0, 0, 0, 0xFFFF, 0, 0, 0, 0, 0], shape(5));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn whole_stack_is_rendered() {
        let stack = ImageStack::new(shape(1), vec![0; 6]).unwrap();
        let rendered = render_stack(&stack);
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[0].dimensions(), (2, 1));
    }
}
