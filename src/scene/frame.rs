use crate::foundation::core::{Affine, BezPath, Canvas, Rect, Rgba8Premul};

/// Resolved display list for a single frame.
///
/// A `SceneFrame` is backend-agnostic: renderers emit geometry and text runs
/// here, and a rasterization backend turns the list into premultiplied RGBA8
/// pixels. Ops are composited in ascending `z`, ties broken by emit order.
#[derive(Clone, Debug)]
pub struct SceneFrame {
    pub canvas: Canvas,
    pub ops: Vec<DrawOp>,
}

impl SceneFrame {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    /// Ops sorted by z, stable within equal z. Backends draw in this order.
    pub fn ops_by_z(&self) -> Vec<&DrawOp> {
        let mut out: Vec<&DrawOp> = self.ops.iter().collect();
        out.sort_by_key(|op| op.z());
        out
    }
}

#[derive(Clone, Debug)]
pub enum DrawOp {
    FillPath {
        path: BezPath,
        transform: Affine,
        color: Rgba8Premul,
        opacity: f32,
        z: i32,
    },
    FillRect {
        rect: Rect,
        transform: Affine,
        color: Rgba8Premul,
        opacity: f32,
        z: i32,
    },
    Text {
        content: String,
        origin: (f64, f64),
        size_px: f32,
        max_width: Option<f32>,
        align: TextAlign,
        transform: Affine,
        color: Rgba8Premul,
        opacity: f32,
        z: i32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
}

impl DrawOp {
    pub fn z(&self) -> i32 {
        match self {
            DrawOp::FillPath { z, .. } => *z,
            DrawOp::FillRect { z, .. } => *z,
            DrawOp::Text { z, .. } => *z,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            DrawOp::FillPath { opacity, .. } => *opacity,
            DrawOp::FillRect { opacity, .. } => *opacity,
            DrawOp::Text { opacity, .. } => *opacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_op(z: i32) -> DrawOp {
        DrawOp::FillRect {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            transform: Affine::IDENTITY,
            color: Rgba8Premul::from_straight_rgba(255, 255, 255, 255),
            opacity: 1.0,
            z,
        }
    }

    #[test]
    fn ops_by_z_sorts_stable() {
        let mut frame = SceneFrame::new(Canvas {
            width: 64,
            height: 64,
        });
        frame.push(rect_op(5));
        frame.push(rect_op(-1));
        frame.push(rect_op(5));
        frame.push(rect_op(0));

        let zs: Vec<i32> = frame.ops_by_z().iter().map(|op| op.z()).collect();
        assert_eq!(zs, vec![-1, 0, 5, 5]);
    }
}
