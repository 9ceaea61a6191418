use super::{Region, luma};
use image::RgbImage;

#[derive(Debug, Default)]
struct Moments {
    n: u64,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    fn push(&mut self, value: f32) {
        let value = value as f64;
        self.n += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    fn variance(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let mean = self.sum / self.n as f64;
        (self.sum_sq / self.n as f64 - mean * mean).max(0.0)
    }
}

/// Directional edge measure: `|var(gx) - var(gy)|` over forward luma
/// differences in [-1, 1].
///
/// Vertical stripes put all their energy into `gx`; isotropic texture such
/// as round spots spreads it evenly and lands near zero. Regions narrower
/// than two pixels in either direction have no gradient and yield `None`.
pub fn edge_variance(image: &RgbImage, region: Region) -> Option<f32> {
    if region.width < 2 || region.height < 2 {
        return None;
    }

    let width = region.width as usize;
    let height = region.height as usize;
    let values: Vec<f32> = region
        .pixels(image)
        .map(|p| luma(p) as f32 / 255.0)
        .collect();

    let mut gx = Moments::default();
    let mut gy = Moments::default();
    for row in 0..height {
        for col in 0..width {
            let here = values[row * width + col];
            if col + 1 < width {
                gx.push(values[row * width + col + 1] - here);
            }
            if row + 1 < height {
                gy.push(values[(row + 1) * width + col] - here);
            }
        }
    }

    Some((gx.variance() - gy.variance()).abs() as f32)
}
