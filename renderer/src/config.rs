//! Viewer configuration and tessellation limits

use anyhow::ensure;

pub const MIN_SLICES: u32 = 1;
pub const MIN_STACKS: u32 = 2;
pub const MAX_SUBDIVISIONS: u32 = 256;

/// Startup options for the sphere viewer.
///
/// Parsed from the command line on native targets, defaulted on the web.
#[derive(Debug, Clone)]
#[cfg_attr(not(target_arch = "wasm32"), derive(clap::Parser))]
#[cfg_attr(
    not(target_arch = "wasm32"),
    command(name = "renderer", about = "Render a tessellated sphere as triangle strips")
)]
pub struct ViewerConfig {
    /// Sphere radius
    #[cfg_attr(not(target_arch = "wasm32"), arg(long, default_value_t = 1.0))]
    pub radius: f32,

    /// Subdivisions around the vertical axis
    #[cfg_attr(not(target_arch = "wasm32"), arg(long, default_value_t = 24))]
    pub slices: u32,

    /// Subdivisions from pole to pole
    #[cfg_attr(not(target_arch = "wasm32"), arg(long, default_value_t = 16))]
    pub stacks: u32,

    /// Shade with latitude bands from generated texture coordinates
    #[cfg_attr(not(target_arch = "wasm32"), arg(long))]
    pub textured: bool,

    /// Window title
    #[cfg_attr(not(target_arch = "wasm32"), arg(long, default_value = "Sphere Viewer"))]
    pub title: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            slices: 24,
            stacks: 16,
            textured: false,
            title: "Sphere Viewer".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.radius.is_finite() && self.radius > 0.0,
            "radius must be a positive number, got {}",
            self.radius
        );
        ensure!(
            (MIN_SLICES..=MAX_SUBDIVISIONS).contains(&self.slices),
            "slices must be between {MIN_SLICES} and {MAX_SUBDIVISIONS}, got {}",
            self.slices
        );
        ensure!(
            (MIN_STACKS..=MAX_SUBDIVISIONS).contains(&self.stacks),
            "stacks must be between {MIN_STACKS} and {MAX_SUBDIVISIONS}, got {}",
            self.stacks
        );
        Ok(())
    }

    pub fn tessellation(&self) -> Tessellation {
        Tessellation {
            slices: self.slices,
            stacks: self.stacks,
        }
    }
}

/// Slice and stack counts of the displayed sphere
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tessellation {
    pub slices: u32,
    pub stacks: u32,
}

impl Tessellation {
    pub fn with_slices_delta(self, delta: i32) -> Self {
        Self {
            slices: clamp_add(self.slices, delta, MIN_SLICES),
            ..self
        }
    }

    pub fn with_stacks_delta(self, delta: i32) -> Self {
        Self {
            stacks: clamp_add(self.stacks, delta, MIN_STACKS),
            ..self
        }
    }
}

fn clamp_add(value: u32, delta: i32, min: u32) -> u32 {
    let sum = i64::from(value) + i64::from(delta);
    // clamped into u32 range, the cast is lossless
    sum.clamp(i64::from(min), i64::from(MAX_SUBDIVISIONS)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.tessellation(),
            Tessellation {
                slices: 24,
                stacks: 16
            }
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let bad_radius = ViewerConfig {
            radius: 0.0,
            ..ViewerConfig::default()
        };
        assert!(bad_radius.validate().is_err());

        let bad_slices = ViewerConfig {
            slices: 0,
            ..ViewerConfig::default()
        };
        assert!(bad_slices.validate().is_err());

        let bad_stacks = ViewerConfig {
            stacks: 1,
            ..ViewerConfig::default()
        };
        let err = bad_stacks.validate().unwrap_err();
        assert_eq!(err.to_string(), "stacks must be between 2 and 256, got 1");
    }

    #[test]
    fn test_tessellation_deltas_clamp() {
        let tessellation = Tessellation {
            slices: 1,
            stacks: 2,
        };
        assert_eq!(tessellation.with_slices_delta(-1).slices, 1);
        assert_eq!(tessellation.with_stacks_delta(-5).stacks, 2);
        assert_eq!(tessellation.with_slices_delta(3).slices, 4);
        assert_eq!(tessellation.with_slices_delta(3).stacks, 2);

        let dense = Tessellation {
            slices: 255,
            stacks: 256,
        };
        assert_eq!(dense.with_slices_delta(10).slices, MAX_SUBDIVISIONS);
        assert_eq!(dense.with_stacks_delta(1).stacks, MAX_SUBDIVISIONS);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_parse_command_line() {
        use clap::Parser;

        let config = ViewerConfig::try_parse_from([
            "renderer",
            "--radius",
            "2.5",
            "--slices",
            "8",
            "--textured",
        ])
        .unwrap();
        assert_eq!(config.radius, 2.5);
        assert_eq!(config.slices, 8);
        assert_eq!(config.stacks, 16);
        assert!(config.textured);
        assert_eq!(config.title, "Sphere Viewer");
    }
}
