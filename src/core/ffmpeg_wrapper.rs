//! FFmpeg wrapper providing a safe video decoder around unsafe FFmpeg C bindings
//!
//! This module encapsulates all unsafe FFmpeg operations. Decoded frames are
//! converted to packed RGB24 so they can go straight to the pose estimator.

use crate::core::video_source::{VideoOpener, VideoSource};
use crate::models::capture::{DecodeError, DecodeResult, DecodedFrame, VideoMetadata};
use log::{debug, warn};
use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::ptr;
use uuid::Uuid;

// Import FFmpeg C bindings
use ffmpeg_sys_next::*;

/// Safe wrapper around an FFmpeg demuxer + video decoder
pub struct FFmpegDecoder {
    format_context: *mut AVFormatContext,
    codec_context: *mut AVCodecContext,
    frame: *mut AVFrame,
    packet: *mut AVPacket,
    sws_context: *mut SwsContext,
    stream_index: i32,
    metadata: VideoMetadata,
    draining: bool,
    finished: bool,
    // Spooled upload, removed when the decoder is dropped
    temp_path: Option<PathBuf>,
}

unsafe impl Send for FFmpegDecoder {}

impl FFmpegDecoder {
    /// Open a video file and prepare its best video stream for decoding
    pub fn open(path: &Path) -> DecodeResult<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| DecodeError::OpenFailed(format!("Non UTF-8 path: {}", path.display())))?;
        let path_c = CString::new(path_str)
            .map_err(|_| DecodeError::OpenFailed(format!("Invalid path: {}", path_str)))?;

        unsafe {
            let mut format_context: *mut AVFormatContext = ptr::null_mut();
            let ret = avformat_open_input(
                &mut format_context,
                path_c.as_ptr(),
                ptr::null_mut(),
                ptr::null_mut(),
            );
            if ret < 0 || format_context.is_null() {
                return Err(DecodeError::OpenFailed(format!(
                    "avformat_open_input failed: {}",
                    ret
                )));
            }

            let ret = avformat_find_stream_info(format_context, ptr::null_mut());
            if ret < 0 {
                avformat_close_input(&mut format_context);
                return Err(DecodeError::OpenFailed(format!(
                    "No stream info: {}",
                    ret
                )));
            }

            let stream_index = av_find_best_stream(
                format_context,
                AVMediaType::AVMEDIA_TYPE_VIDEO,
                -1,
                -1,
                ptr::null_mut(),
                0,
            );
            if stream_index < 0 {
                avformat_close_input(&mut format_context);
                return Err(DecodeError::OpenFailed("No video stream found".to_string()));
            }

            let stream = *(*format_context).streams.offset(stream_index as isize);
            let codecpar = (*stream).codecpar;

            let codec = avcodec_find_decoder((*codecpar).codec_id);
            if codec.is_null() {
                avformat_close_input(&mut format_context);
                return Err(DecodeError::OpenFailed("No decoder for video codec".to_string()));
            }

            let mut codec_context = avcodec_alloc_context3(codec);
            if codec_context.is_null() {
                avformat_close_input(&mut format_context);
                return Err(DecodeError::OpenFailed(
                    "Failed to allocate codec context".to_string(),
                ));
            }

            let ret = avcodec_parameters_to_context(codec_context, codecpar);
            if ret < 0 {
                avcodec_free_context(&mut codec_context);
                avformat_close_input(&mut format_context);
                return Err(DecodeError::OpenFailed(format!(
                    "Failed to copy codec parameters: {}",
                    ret
                )));
            }

            let ret = avcodec_open2(codec_context, codec, ptr::null_mut());
            if ret < 0 {
                avcodec_free_context(&mut codec_context);
                avformat_close_input(&mut format_context);
                return Err(DecodeError::OpenFailed(format!(
                    "Failed to open codec: {}",
                    ret
                )));
            }

            let mut frame = av_frame_alloc();
            let packet = av_packet_alloc();
            if frame.is_null() || packet.is_null() {
                if !frame.is_null() {
                    av_frame_free(&mut frame);
                }
                avcodec_free_context(&mut codec_context);
                avformat_close_input(&mut format_context);
                return Err(DecodeError::OpenFailed(
                    "Failed to allocate frame or packet".to_string(),
                ));
            }

            let fps = rational_to_f64((*stream).avg_frame_rate)
                .or_else(|| rational_to_f64((*stream).r_frame_rate))
                .unwrap_or(0.0);
            let total_frame_count = if (*stream).nb_frames > 0 {
                Some((*stream).nb_frames as u64)
            } else {
                None
            };

            debug!(
                "Opened video stream {} ({}x{}, fps {:.3}, frames {:?})",
                stream_index,
                (*codec_context).width,
                (*codec_context).height,
                fps,
                total_frame_count
            );

            Ok(Self {
                format_context,
                codec_context,
                frame,
                packet,
                sws_context: ptr::null_mut(),
                stream_index,
                metadata: VideoMetadata {
                    fps,
                    total_frame_count,
                },
                draining: false,
                finished: false,
                temp_path: None,
            })
        }
    }

    /// Receive decoded frames, feeding packets until one is available
    fn decode_next(&mut self) -> DecodeResult<Option<DecodedFrame>> {
        unsafe {
            loop {
                let ret = avcodec_receive_frame(self.codec_context, self.frame);

                if ret == 0 {
                    let converted = self.convert_frame();
                    av_frame_unref(self.frame);
                    return converted.map(Some);
                }

                if ret == AVERROR_EOF {
                    return Ok(None);
                }

                if ret != AVERROR(EAGAIN) {
                    return Err(DecodeError::ReadFailed(format!(
                        "Receive frame failed: {}",
                        ret
                    )));
                }

                if self.draining {
                    return Ok(None);
                }

                let ret = av_read_frame(self.format_context, self.packet);
                if ret < 0 {
                    // End of container: flush the decoder
                    avcodec_send_packet(self.codec_context, ptr::null());
                    self.draining = true;
                    continue;
                }

                if (*self.packet).stream_index == self.stream_index {
                    let ret = avcodec_send_packet(self.codec_context, self.packet);
                    av_packet_unref(self.packet);
                    if ret < 0 && ret != AVERROR(EAGAIN) {
                        return Err(DecodeError::ReadFailed(format!(
                            "Send packet failed: {}",
                            ret
                        )));
                    }
                } else {
                    av_packet_unref(self.packet);
                }
            }
        }
    }

    /// Convert the current decoder frame to packed RGB24
    fn convert_frame(&mut self) -> DecodeResult<DecodedFrame> {
        unsafe {
            let width = (*self.frame).width;
            let height = (*self.frame).height;
            if width <= 0 || height <= 0 {
                return Err(DecodeError::InvalidFrame(format!(
                    "Frame has invalid size {}x{}",
                    width, height
                )));
            }

            // The frame's own format; it can differ from the codec context's
            let source_format = frame_pixel_format((*self.frame).format).ok_or_else(|| {
                DecodeError::InvalidFrame(format!(
                    "Frame has unknown pixel format {}",
                    (*self.frame).format
                ))
            })?;

            self.sws_context = sws_getCachedContext(
                self.sws_context,
                width,
                height,
                source_format,
                width,
                height,
                AVPixelFormat::AV_PIX_FMT_RGB24,
                1, // SWS_BILINEAR flag
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null(),
            );
            if self.sws_context.is_null() {
                return Err(DecodeError::InvalidFrame(
                    "Failed to initialize swscale context".to_string(),
                ));
            }

            let mut rgb = vec![0u8; width as usize * height as usize * 3];
            let dst_data = [
                rgb.as_mut_ptr(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
            ];
            let dst_linesize = [width * 3, 0, 0, 0];

            let ret = sws_scale(
                self.sws_context,
                (*self.frame).data.as_ptr() as *const *const u8,
                (*self.frame).linesize.as_ptr(),
                0,
                height,
                dst_data.as_ptr(),
                dst_linesize.as_ptr(),
            );
            if ret < 0 {
                return Err(DecodeError::InvalidFrame("Color conversion failed".to_string()));
            }

            DecodedFrame::new(width as u32, height as u32, rgb)
        }
    }
}

impl VideoSource for FFmpegDecoder {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn next_frame(&mut self) -> DecodeResult<Option<DecodedFrame>> {
        if self.finished {
            return Ok(None);
        }

        let next = self.decode_next();
        if !matches!(next, Ok(Some(_))) {
            self.finished = true;
        }
        next
    }
}

impl Drop for FFmpegDecoder {
    fn drop(&mut self) {
        unsafe {
            // Clean up resources in reverse order
            if !self.sws_context.is_null() {
                sws_freeContext(self.sws_context);
            }

            if !self.packet.is_null() {
                av_packet_free(&mut self.packet);
            }

            if !self.frame.is_null() {
                av_frame_free(&mut self.frame);
            }

            if !self.codec_context.is_null() {
                avcodec_free_context(&mut self.codec_context);
            }

            if !self.format_context.is_null() {
                avformat_close_input(&mut self.format_context);
            }
        }

        if let Some(path) = self.temp_path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove temporary video {}: {}", path.display(), e);
            }
        }
    }
}

fn rational_to_f64(rational: AVRational) -> Option<f64> {
    if rational.num > 0 && rational.den > 0 {
        Some(rational.num as f64 / rational.den as f64)
    } else {
        None
    }
}

/// Pixel format of a decoded frame, `None` for `AV_PIX_FMT_NONE` or out-of-range values
fn frame_pixel_format(raw: i32) -> Option<AVPixelFormat> {
    if raw < 0 || raw >= AVPixelFormat::AV_PIX_FMT_NB as i32 {
        return None;
    }

    // In range of the enum's discriminants, which are contiguous from 0
    Some(unsafe { std::mem::transmute::<i32, AVPixelFormat>(raw) })
}

/// Opens uploaded video bytes by spooling them to a temporary file
pub struct FFmpegVideoOpener {
    temp_dir: PathBuf,
}

impl FFmpegVideoOpener {
    pub fn new() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
        }
    }

    pub fn with_temp_dir(temp_dir: PathBuf) -> Self {
        Self { temp_dir }
    }
}

impl Default for FFmpegVideoOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoOpener for FFmpegVideoOpener {
    fn open(&self, data: &[u8]) -> DecodeResult<Box<dyn VideoSource>> {
        if data.is_empty() {
            return Err(DecodeError::EmptyInput);
        }

        let path = self
            .temp_dir
            .join(format!("posture_pro_{}.video", Uuid::new_v4()));
        std::fs::write(&path, data)?;

        match FFmpegDecoder::open(&path) {
            Ok(mut decoder) => {
                decoder.temp_path = Some(path);
                Ok(Box::new(decoder))
            }
            Err(e) => {
                let _ = std::fs::remove_file(&path);
                Err(e)
            }
        }
    }

    fn backend_info(&self) -> String {
        "FFmpeg video decoder (libavformat/libavcodec)".to_string()
    }
}
