//! Structure for source video metadata.
//!
//! `VideoProperties` is what the prober returns and what the complex encode
//! parameters are derived from. Audio fields are optional because sources
//! without an audio track are still valid inputs.

use serde::Serialize;

/// Video metadata gathered by ffprobe.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VideoProperties {
    /// Duration of the container in seconds
    pub duration_secs: f64,

    /// Width of the first video stream in pixels
    pub width: u32,

    /// Height of the first video stream in pixels
    pub height: u32,

    /// Real frame rate (`r_frame_rate`) in frames per second
    pub frame_rate: Option<f64>,

    /// Sample (pixel) aspect ratio as `(num, den)`, absent when square or unknown
    pub sample_aspect_ratio: Option<(u32, u32)>,

    /// Sample rate of the first audio stream in Hz
    pub sample_rate: Option<u32>,

    /// Channel count of the first audio stream
    pub channels: Option<u32>,

    /// Codec of the first video stream (e.g. "h264")
    pub video_codec: Option<String>,
}

impl VideoProperties {
    /// Display aspect ratio: frame aspect ratio times sample aspect ratio.
    pub fn display_aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        let frame = f64::from(self.width) / f64::from(self.height);
        match self.sample_aspect_ratio {
            Some((num, den)) if num > 0 && den > 0 => frame * f64::from(num) / f64::from(den),
            _ => frame,
        }
    }

    /// Output resolution for the complex encode.
    ///
    /// Odd dimensions are rounded down to even values, then the width is
    /// corrected to `height * DAR` when pixels are not square.
    pub fn target_resolution(&self) -> (u32, u32) {
        let width = self.width - self.width % 2;
        let height = self.height - self.height % 2;
        if height == 0 {
            return (width, height);
        }

        let even = VideoProperties {
            width,
            height,
            ..self.clone()
        };
        let ratio = f64::from(width) / f64::from(height);
        let dar = even.display_aspect_ratio();
        if (ratio - dar).abs() > f64::EPSILON {
            ((f64::from(height) * dar).round() as u32, height)
        } else {
            (width, height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(width: u32, height: u32, sar: Option<(u32, u32)>) -> VideoProperties {
        VideoProperties {
            duration_secs: 60.0,
            width,
            height,
            sample_aspect_ratio: sar,
            ..Default::default()
        }
    }

    #[test]
    fn square_pixels_keep_resolution() {
        assert_eq!(props(1920, 1080, None).target_resolution(), (1920, 1080));
        assert_eq!(props(1920, 1080, Some((1, 1))).target_resolution(), (1920, 1080));
    }

    #[test]
    fn odd_dimensions_round_down() {
        assert_eq!(props(721, 481, None).target_resolution(), (720, 480));
    }

    #[test]
    fn anamorphic_width_is_corrected() {
        // 1440x1080 with 4:3 pixels displays as 16:9
        assert_eq!(props(1440, 1080, Some((4, 3))).target_resolution(), (1920, 1080));
        // PAL DVD widescreen
        assert_eq!(props(720, 576, Some((64, 45))).target_resolution(), (1024, 576));
    }

    #[test]
    fn zero_height_does_not_divide() {
        assert_eq!(props(0, 0, None).target_resolution(), (0, 0));
        assert_eq!(props(0, 0, None).display_aspect_ratio(), 0.0);
    }
}
