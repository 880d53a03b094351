use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    foundation::error::{BlockreelError, BlockreelResult},
    render::FrameRGBA,
};

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn validate(&self) -> BlockreelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BlockreelError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(BlockreelError::validation("encode fps must be non-zero"));
        }
        // yuv420p subsampling needs even dimensions.
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(BlockreelError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }

    fn frame_bytes(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

pub fn default_mp4_config(
    out_path: impl Into<PathBuf>,
    width: u32,
    height: u32,
    fps: u32,
) -> EncodeConfig {
    EncodeConfig {
        width,
        height,
        fps,
        out_path: out_path.into(),
        overwrite: true,
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> BlockreelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Spawn the system `ffmpeg` binary reading rawvideo RGBA from stdin and
/// writing h264 yuv420p MP4. Using the external binary keeps the build free
/// of native FFmpeg headers and libraries.
fn spawn_ffmpeg(cfg: &EncodeConfig) -> BlockreelResult<Child> {
    let mut cmd = Command::new("ffmpeg");
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .arg(if cfg.overwrite { "-y" } else { "-n" })
        .args(["-loglevel", "error"])
        .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
        .args(["-s", &format!("{}x{}", cfg.width, cfg.height)])
        .args(["-r", &cfg.fps.to_string()])
        .args(["-i", "pipe:0", "-an"])
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .args(["-movflags", "+faststart"])
        .arg(&cfg.out_path);

    cmd.spawn().map_err(|e| {
        BlockreelError::render(format!(
            "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
        ))
    })
}

/// Streams premultiplied RGBA8 frames into a system `ffmpeg` process as
/// rawvideo and muxes to MP4. Frames are flattened over the video's
/// background color before writing, so the encoder only ever sees opaque
/// pixels.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    bg_rgba: [u8; 4],
    child: Child,
    stdin: Option<ChildStdin>,
    flat: Vec<u8>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig, bg_rgba: [u8; 4]) -> BlockreelResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(BlockreelError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(BlockreelError::render(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut child = spawn_ffmpeg(&cfg)?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BlockreelError::render("failed to open ffmpeg stdin (unexpected)"))?;

        let flat = vec![0u8; cfg.frame_bytes()];
        Ok(Self {
            cfg,
            bg_rgba,
            child,
            stdin: Some(stdin),
            flat,
        })
    }

    pub fn encode_frame(&mut self, frame: &FrameRGBA) -> BlockreelResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(BlockreelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }
        if frame.data.len() != self.flat.len() {
            return Err(BlockreelError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(BlockreelError::render("ffmpeg encoder is already finalized"));
        };

        flatten_premul_to_opaque_rgba8(&mut self.flat, &frame.data, self.bg_rgba)?;
        stdin.write_all(&self.flat).map_err(|e| {
            BlockreelError::render(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    /// Close the pipe and wait for ffmpeg to finalize the file. Must be
    /// called; dropping the encoder without finishing abandons the child.
    pub fn finish(mut self) -> BlockreelResult<()> {
        drop(self.stdin.take());

        let output = self.child.wait_with_output().map_err(|e| {
            BlockreelError::render(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BlockreelError::render(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Composite premultiplied RGBA8 over an opaque background color, yielding
/// fully opaque output for the encoder. Source-over with premultiplied
/// source: `out = src + bg * (1 - src_a)`.
fn flatten_premul_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    bg_rgba: [u8; 4],
) -> BlockreelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(BlockreelError::validation(
            "flatten expects equal-length rgba8 buffers",
        ));
    }

    let over = |s: u8, bg: u8, inv: u32| -> u8 {
        let blended = u32::from(s) + (u32::from(bg) * inv + 127) / 255;
        blended.min(255) as u8
    };

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        match s[3] {
            255 => {
                d.copy_from_slice(s);
            }
            a => {
                let inv = u32::from(255 - a);
                d[0] = over(s[0], bg_rgba[0], inv);
                d[1] = over(s[1], bg_rgba[1], inv);
                d[2] = over(s[2], bg_rgba[2], inv);
                d[3] = 255;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(width: u32, height: u32, fps: u32) -> EncodeConfig {
        EncodeConfig {
            width,
            height,
            fps,
            out_path: PathBuf::from("out/clip.mp4"),
            overwrite: true,
        }
    }

    #[test]
    fn config_validation_catches_bad_values() {
        assert!(cfg(0, 10, 30).validate().is_err());
        assert!(cfg(11, 10, 30).validate().is_err(), "odd width");
        assert!(cfg(10, 10, 0).validate().is_err());
        cfg(10, 10, 30).validate().unwrap();
    }

    #[test]
    fn flatten_premul_over_black_produces_expected_rgb() {
        // Premultiplied red @ 50% alpha has rgb 128,0,0 already.
        let src = vec![128u8, 0, 0, 128];
        let mut dst = vec![0u8; 4];
        flatten_premul_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]).unwrap();
        assert_eq!(dst, vec![128, 0, 0, 255]);
    }

    #[test]
    fn flatten_blends_toward_background() {
        let src = vec![0u8, 0, 0, 0];
        let mut dst = vec![0u8; 4];
        flatten_premul_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, vec![10, 20, 30, 255]);
    }

    #[test]
    fn flatten_rejects_mismatched_buffers() {
        let src = vec![0u8; 8];
        let mut dst = vec![0u8; 4];
        assert!(flatten_premul_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]).is_err());
    }
}
