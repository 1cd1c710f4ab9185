use super::error::ScoreError;

/// 帧数据结构（1-based 帧号，RGB 像素，预先计算的像素方差）
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGB 格式
    pub number: u64,
    /// 像素强度离散度（标准差），低于门限视为空白/黑帧
    pub variance: f64,
}

impl Frame {
    /// Build an RGB frame, deriving the variance from its own bytes.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>, number: u64) -> Self {
        let variance = pixel_std_dev(&data);
        Self {
            width,
            height,
            data,
            number,
            variance,
        }
    }

    /// Build a frame whose variance was measured upstream (e.g. on the decoded planes).
    pub fn with_variance(width: u32, height: u32, data: Vec<u8>, number: u64, variance: f64) -> Self {
        Self {
            width,
            height,
            data,
            number,
            variance,
        }
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// 转成 image 的 RgbImage，供打分模型使用
    pub fn to_rgb_image(&self) -> Result<image::RgbImage, ScoreError> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or(ScoreError::InvalidFrame(self.number))
    }
}

/// 从解码器传递的 I420 原始帧
#[derive(Debug)]
pub struct YuvFrame {
    pub width: u32,
    pub height: u32,
    pub y_plane: Vec<u8>,
    pub u_plane: Vec<u8>,
    pub v_plane: Vec<u8>,
    pub number: u64,
}

impl YuvFrame {
    /// Spread of the raw planar samples, measured before any color conversion.
    pub fn variance(&self) -> f64 {
        let planes = [&self.y_plane[..], &self.u_plane[..], &self.v_plane[..]];
        std_dev_of(planes.iter().flat_map(|p| p.iter().copied()))
    }

    pub fn to_frame(&self) -> Frame {
        let variance = self.variance();
        let w = self.width as usize;
        let h = self.height as usize;
        let uv_width = w.div_ceil(2);
        let mut rgb_data = vec![0u8; w * h * 3];

        for y in 0..h {
            for x in 0..w {
                let y_idx = y * w + x;
                let uv_idx = (y / 2) * uv_width + x / 2;

                let y_val = self.y_plane.get(y_idx).copied().unwrap_or(0) as f32;
                let u_val = self.u_plane.get(uv_idx).copied().unwrap_or(128) as f32 - 128.0;
                let v_val = self.v_plane.get(uv_idx).copied().unwrap_or(128) as f32 - 128.0;

                let r = (y_val + 1.402 * v_val).clamp(0.0, 255.0) as u8;
                let g = (y_val - 0.344136 * u_val - 0.714136 * v_val).clamp(0.0, 255.0) as u8;
                let b = (y_val + 1.772 * u_val).clamp(0.0, 255.0) as u8;

                let rgb_idx = y_idx * 3;
                rgb_data[rgb_idx] = r;
                rgb_data[rgb_idx + 1] = g;
                rgb_data[rgb_idx + 2] = b;
            }
        }

        Frame::with_variance(self.width, self.height, rgb_data, self.number, variance)
    }
}

/// Population standard deviation of raw sample bytes. Empty input has zero spread.
pub fn pixel_std_dev(samples: &[u8]) -> f64 {
    std_dev_of(samples.iter().copied())
}

fn std_dev_of<I>(samples: I) -> f64
where
    I: Iterator<Item = u8> + Clone,
{
    let (count, sum) = samples
        .clone()
        .fold((0u64, 0f64), |(n, s), v| (n + 1, s + v as f64));
    if count == 0 {
        return 0.0;
    }
    let mean = sum / count as f64;
    let sq_sum: f64 = samples.map(|v| (v as f64 - mean).powi(2)).sum();
    (sq_sum / count as f64).sqrt()
}
