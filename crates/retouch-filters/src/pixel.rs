//! Shared per-pixel math for the built-in kernels.

use image::{GrayImage, Rgba, RgbaImage};

/// Channel byte to unit float.
pub(crate) fn unit(channel: u8) -> f32 {
    f32::from(channel) / 255.0
}

/// Unit float to channel byte, clamped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Rec. 709 luminance of a pixel, in `0.0..=1.0`.
pub(crate) fn luminance(px: Rgba<u8>) -> f32 {
    0.2126_f32.mul_add(
        unit(px.0[0]),
        0.7152_f32.mul_add(unit(px.0[1]), 0.0722 * unit(px.0[2])),
    )
}

/// Linear interpolation between `a` and `b`.
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}

/// Hermite smoothstep between edges `e0` and `e1`.
pub(crate) fn smoothstep(e0: f32, e1: f32, x: f32) -> f32 {
    if (e1 - e0).abs() < f32::EPSILON {
        return if x < e0 { 0.0 } else { 1.0 };
    }
    let t = ((x - e0) / (e1 - e0)).clamp(0.0, 1.0);
    t * t * 2.0_f32.mul_add(-t, 3.0)
}

/// Map the RGB channels of every pixel through `f`, preserving alpha.
pub(crate) fn map_rgb<F>(input: &RgbaImage, f: F) -> RgbaImage
where
    F: Fn(f32, f32, f32) -> (f32, f32, f32),
{
    RgbaImage::from_fn(input.width(), input.height(), |x, y| {
        let px = *input.get_pixel(x, y);
        let (r, g, b) = f(unit(px.0[0]), unit(px.0[1]), unit(px.0[2]));
        Rgba([channel(r), channel(g), channel(b), px.0[3]])
    })
}

/// Apply Gaussian blur to an RGBA image by blurring each channel
/// independently.
///
/// `imageproc::filter::gaussian_blur_f32` only accepts `GrayImage`, so
/// this splits the image into four single-channel images, blurs each,
/// and reassembles. Gaussian blur is linear and per-channel, so the
/// result equals blurring in color space. Non-positive sigma returns
/// the image unchanged (the underlying function panics on
/// `sigma <= 0.0`).
pub(crate) fn gaussian_blur_rgba(image: &RgbaImage, sigma: f32) -> RgbaImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    let (w, h) = (image.width(), image.height());

    let channels: [GrayImage; 4] = std::array::from_fn(|c| {
        GrayImage::from_fn(w, h, |x, y| image::Luma([image.get_pixel(x, y).0[c]]))
    });

    let blurred: [GrayImage; 4] =
        std::array::from_fn(|c| imageproc::filter::gaussian_blur_f32(&channels[c], sigma));

    RgbaImage::from_fn(w, h, |x, y| {
        Rgba([
            blurred[0].get_pixel(x, y).0[0],
            blurred[1].get_pixel(x, y).0[0],
            blurred[2].get_pixel(x, y).0[0],
            blurred[3].get_pixel(x, y).0[0],
        ])
    })
}
