use crate::scene::frame::{DrawOp, SceneFrame, TextAlign};

/// 128-bit identity of a resolved display list. Two frames with equal
/// fingerprints draw the same pixels, so exporters can reuse the previous
/// raster for held frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameFingerprint {
    pub hi: u64,
    pub lo: u64,
}

pub fn fingerprint_frame(frame: &SceneFrame) -> FrameFingerprint {
    let mut a = Fnv1a64::new(0xcbf29ce484222325);
    let mut b = Fnv1a64::new(0x9ae16a3b2f90404f);

    write_u64_pair(&mut a, &mut b, u64::from(frame.canvas.width));
    write_u64_pair(&mut a, &mut b, u64::from(frame.canvas.height));
    write_u64_pair(&mut a, &mut b, frame.ops.len() as u64);

    for op in &frame.ops {
        match op {
            DrawOp::FillPath {
                path,
                transform,
                color,
                opacity,
                z,
            } => {
                write_u8_pair(&mut a, &mut b, 0);
                write_str_pair(&mut a, &mut b, &path.to_svg());
                write_affine_pair(&mut a, &mut b, transform);
                write_color_pair(&mut a, &mut b, color);
                write_u64_pair(&mut a, &mut b, u64::from(opacity.to_bits()));
                write_i64_pair(&mut a, &mut b, i64::from(*z));
            }
            DrawOp::FillRect {
                rect,
                transform,
                color,
                opacity,
                z,
            } => {
                write_u8_pair(&mut a, &mut b, 1);
                for v in [rect.x0, rect.y0, rect.x1, rect.y1] {
                    write_u64_pair(&mut a, &mut b, v.to_bits());
                }
                write_affine_pair(&mut a, &mut b, transform);
                write_color_pair(&mut a, &mut b, color);
                write_u64_pair(&mut a, &mut b, u64::from(opacity.to_bits()));
                write_i64_pair(&mut a, &mut b, i64::from(*z));
            }
            DrawOp::Text {
                content,
                origin,
                size_px,
                max_width,
                align,
                transform,
                color,
                opacity,
                z,
            } => {
                write_u8_pair(&mut a, &mut b, 2);
                write_str_pair(&mut a, &mut b, content);
                write_u64_pair(&mut a, &mut b, origin.0.to_bits());
                write_u64_pair(&mut a, &mut b, origin.1.to_bits());
                write_u64_pair(&mut a, &mut b, u64::from(size_px.to_bits()));
                match max_width {
                    Some(w) => {
                        write_u8_pair(&mut a, &mut b, 1);
                        write_u64_pair(&mut a, &mut b, u64::from(w.to_bits()));
                    }
                    None => write_u8_pair(&mut a, &mut b, 0),
                }
                write_u8_pair(
                    &mut a,
                    &mut b,
                    match align {
                        TextAlign::Start => 0,
                        TextAlign::Center => 1,
                        TextAlign::End => 2,
                    },
                );
                write_affine_pair(&mut a, &mut b, transform);
                write_color_pair(&mut a, &mut b, color);
                write_u64_pair(&mut a, &mut b, u64::from(opacity.to_bits()));
                write_i64_pair(&mut a, &mut b, i64::from(*z));
            }
        }
    }

    FrameFingerprint {
        hi: a.finish(),
        lo: b.finish(),
    }
}

fn write_affine_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, t: &kurbo::Affine) {
    for c in t.as_coeffs() {
        write_u64_pair(a, b, c.to_bits());
    }
}

fn write_color_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, c: &crate::foundation::core::Rgba8Premul) {
    for v in [c.r, c.g, c.b, c.a] {
        write_u8_pair(a, b, v);
    }
}

fn write_u8_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, v: u8) {
    a.write_u8(v);
    b.write_u8(v);
}

fn write_u64_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, v: u64) {
    a.write_u64(v);
    b.write_u64(v);
}

fn write_i64_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, v: i64) {
    write_u64_pair(a, b, v as u64);
}

fn write_str_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, s: &str) {
    write_u64_pair(a, b, s.len() as u64);
    a.write_bytes(s.as_bytes());
    b.write_bytes(s.as_bytes());
}

#[derive(Clone, Copy)]
struct Fnv1a64(u64);

impl Fnv1a64 {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        self.0 = h;
    }

    fn finish(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{Affine, Canvas, Rect, Rgba8Premul};

    fn frame_with_opacity(opacity: f32) -> SceneFrame {
        let mut frame = SceneFrame::new(Canvas {
            width: 64,
            height: 64,
        });
        frame.push(DrawOp::FillRect {
            rect: Rect::new(0.0, 0.0, 32.0, 32.0),
            transform: Affine::IDENTITY,
            color: Rgba8Premul::from_straight_rgba(200, 100, 50, 255),
            opacity,
            z: 0,
        });
        frame
    }

    #[test]
    fn fingerprint_is_deterministic_for_same_frame() {
        let frame = frame_with_opacity(1.0);
        assert_eq!(fingerprint_frame(&frame), fingerprint_frame(&frame));
    }

    #[test]
    fn fingerprint_changes_when_an_op_changes() {
        let a = frame_with_opacity(1.0);
        let b = frame_with_opacity(0.5);
        assert_ne!(fingerprint_frame(&a), fingerprint_frame(&b));
    }

    #[test]
    fn fingerprint_sees_text_content() {
        let mut a = SceneFrame::new(Canvas {
            width: 64,
            height: 64,
        });
        let mut b = a.clone();
        let text = |content: &str| DrawOp::Text {
            content: content.to_string(),
            origin: (0.0, 0.0),
            size_px: 12.0,
            max_width: None,
            align: TextAlign::Start,
            transform: Affine::IDENTITY,
            color: Rgba8Premul::from_straight_rgba(255, 255, 255, 255),
            opacity: 1.0,
            z: 1,
        };
        a.push(text("one"));
        b.push(text("two"));
        assert_ne!(fingerprint_frame(&a), fingerprint_frame(&b));
    }
}
