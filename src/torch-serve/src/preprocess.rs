//! Image to input tensor transform.
//!
//! The steps and constants match the statistics the bundled models were
//! trained with, so they must not be reordered or tuned:
//!
//! 1. `u8` pixels to `f32` in `[0, 1]`, channels first
//! 2. bilinear resize to 224x224, ignoring aspect ratio, optionally
//!    antialiased (torchvision >= 0.17 does so by default)
//! 3. per-channel normalisation with the ImageNet mean and std

use image::RgbImage;
use tch::{Kind, Tensor};

pub const INPUT_SIZE: i64 = 224;
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// How the resize step samples the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Plain bilinear, `align_corners = false`
    #[default]
    Bilinear,

    /// Bilinear with an antialiasing filter when downscaling
    BilinearAntialias,
}

/// `3xHxW` float tensor with values in `[0, 1]`.
pub fn to_tensor(image: &RgbImage) -> Tensor {
    let (width, height) = image.dimensions();

    Tensor::from_slice(image.as_raw())
        .view([height as i64, width as i64, 3])
        .permute([2, 0, 1])
        .to_kind(Kind::Float)
        / 255.0
}

/// Bilinear resize of an `NxCxHxW` tensor to `NxCx224x224`.
pub fn resize(batch: &Tensor, interpolation: Interpolation) -> Tensor {
    let size = [INPUT_SIZE, INPUT_SIZE];
    match interpolation {
        Interpolation::Bilinear => batch.upsample_bilinear2d(size, false, None, None),
        Interpolation::BilinearAntialias => {
            batch.internal_upsample_bilinear2d_aa(size, false, None, None)
        }
    }
}

/// Per-channel `(x - mean) / std` of an `NxCxHxW` tensor.
pub fn normalize(batch: &Tensor) -> Tensor {
    let mean = Tensor::from_slice(&MEAN).view([1, 3, 1, 1]);
    let std = Tensor::from_slice(&STD).view([1, 3, 1, 1]);

    (batch - mean) / std
}

/// Full pipeline: a `1x3x224x224` tensor ready for the model.
pub fn preprocess(image: &RgbImage, interpolation: Interpolation) -> Tensor {
    let batch = to_tensor(image).unsqueeze(0);
    normalize(&resize(&batch, interpolation))
}
