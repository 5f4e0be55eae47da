//! Application and renderer settings
//!
//! Plain structs with defaults and `with_*` builders; nothing is read from
//! disk.

/// Renderer settings applied when the device is created
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// RGBA color the frame is cleared to
    pub clear_color: [f32; 4],
    pub depth_test: bool,
    /// Present with `Fifo` when set, `Immediate` (falling back to `Fifo`) otherwise
    pub vsync: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            depth_test: true,
            vsync: true,
        }
    }
}

impl RenderConfig {
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_depth_test(mut self, enabled: bool) -> Self {
        self.depth_test = enabled;
        self
    }

    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.vsync = enabled;
        self
    }

    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::Immediate
        }
    }
}

/// Window settings plus the renderer settings
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub title: String,
    /// Initial inner size in logical pixels
    pub width: u32,
    pub height: u32,
    pub render: RenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "pallet3d".to_string(),
            width: 1200,
            height: 800,
            render: RenderConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let config = AppConfig::default()
            .with_title("Pallet")
            .with_size(800, 600)
            .with_render(RenderConfig::default().with_vsync(false).with_depth_test(false));

        assert_eq!(config.title, "Pallet");
        assert_eq!((config.width, config.height), (800, 600));
        assert!(!config.render.depth_test);
        assert_eq!(config.render.present_mode(), wgpu::PresentMode::Immediate);
    }
}
