use crate::backend::PageSize;
use crate::config::RenderConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Viewport {
    pub fn new(page: PageSize, scale: f32) -> Self {
        Self {
            width: page.width * scale,
            height: page.height * scale,
            scale,
        }
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (floor_px(self.width), floor_px(self.height))
    }
}

fn floor_px(value: f32) -> u32 {
    if value.is_finite() {
        (value.floor() as u32).max(1)
    } else {
        1
    }
}

pub fn compute_render_scale(intrinsic_width: f32, render: &RenderConfig) -> f32 {
    let min_scale = render.min_scale;
    let max_scale = render.max_scale.max(min_scale);
    if !intrinsic_width.is_finite() || intrinsic_width <= 0.0 {
        return min_scale;
    }

    let scale = render.target_width / intrinsic_width;
    if !scale.is_finite() {
        return min_scale;
    }
    scale.clamp(min_scale, max_scale)
}

pub fn target_viewport(page: PageSize, render: &RenderConfig) -> Viewport {
    let intrinsic = Viewport::new(page, 1.0);
    Viewport::new(page, compute_render_scale(intrinsic.width, render))
}
