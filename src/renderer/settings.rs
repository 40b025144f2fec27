//! Renderer settings with two-stage construction.
//!
//! Settings are assembled in layers (defaults, config file, command-line
//! flags) on a mutable [`RendererSettingsBuilder`], then validated once by
//! [`RendererSettingsBuilder::build`] into an immutable [`RendererSettings`].
//!
//! Optional filters stay `None` unless explicitly configured. That absence is
//! significant: [`RendererSettings::extra_parameters`] only lists filters that
//! are set, which keeps "unset" and "explicitly neutral" apart in cache keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_QUALITY, DEFAULT_RESOLUTION, MAX_CONTRAST, MAX_MODULATE, MAX_RESOLUTION,
    NEUTRAL_CONTRAST, NEUTRAL_MODULATE,
};
use crate::core::{PageCacheError, Result};

/// Output image formats supported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Tiff,
    Gif,
    Bmp,
}

impl ImageFormat {
    /// File extension, also used in canonical parameter strings.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    /// Whether the encoder honors a quality setting in the command line.
    #[must_use]
    pub const fn uses_quality(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl FromStr for ImageFormat {
    type Err = PageCacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            "tif" | "tiff" => Ok(Self::Tiff),
            "gif" => Ok(Self::Gif),
            "bmp" => Ok(Self::Bmp),
            other => Err(PageCacheError::settings(
                "format",
                format!("unsupported format '{other}' (expected png, jpeg, webp, tiff, gif or bmp)"),
            )),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Settings every render has, always resolved to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseSettings {
    pub format: ImageFormat,
    /// Rasterization density in dots per inch
    pub resolution: u32,
    /// Encoder quality, 1-100
    pub quality: u8,
}

/// Optional image filters. `None` means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Background color used to flatten transparency
    pub background: Option<String>,
    /// Brightness percent, 100 is neutral
    pub brightness: Option<i32>,
    /// Contrast adjustment, 0 is neutral
    pub contrast: Option<i32>,
    /// Clockwise rotation in degrees
    pub rotation: Option<i32>,
    /// Saturation percent, 100 is neutral
    pub saturation: Option<i32>,
}

/// Mutable draft of renderer settings.
///
/// Deserialized from the `renderer` section of the config file and filled
/// from command-line flags. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererSettingsBuilder {
    pub format: Option<String>,
    pub resolution: Option<u32>,
    pub quality: Option<u8>,
    pub brightness: Option<i32>,
    pub contrast: Option<i32>,
    pub saturation: Option<i32>,
    pub rotation: Option<i32>,
    pub background: Option<String>,
    /// Override for the ImageMagick executable
    pub program: Option<String>,
}

impl RendererSettingsBuilder {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            format: other.format.or(self.format),
            resolution: other.resolution.or(self.resolution),
            quality: other.quality.or(self.quality),
            brightness: other.brightness.or(self.brightness),
            contrast: other.contrast.or(self.contrast),
            saturation: other.saturation.or(self.saturation),
            rotation: other.rotation.or(self.rotation),
            background: other.background.or(self.background),
            program: other.program.or(self.program),
        }
    }

    /// Apply defaults, validate every field and freeze the result.
    pub fn build(self) -> Result<RendererSettings> {
        let format = match self.format.as_deref() {
            Some(format) => format.parse()?,
            None => ImageFormat::Png,
        };

        let resolution = self.resolution.unwrap_or(DEFAULT_RESOLUTION);
        if resolution == 0 || resolution > MAX_RESOLUTION {
            return Err(PageCacheError::settings(
                "resolution",
                format!("must be between 1 and {MAX_RESOLUTION}, got {resolution}"),
            ));
        }

        let quality = self.quality.unwrap_or(DEFAULT_QUALITY);
        if quality == 0 || quality > 100 {
            return Err(PageCacheError::settings(
                "quality",
                format!("must be between 1 and 100, got {quality}"),
            ));
        }

        check_range("brightness", self.brightness, 0, MAX_MODULATE)?;
        check_range("saturation", self.saturation, 0, MAX_MODULATE)?;
        check_range("contrast", self.contrast, -MAX_CONTRAST, MAX_CONTRAST)?;

        if let Some(background) = &self.background {
            validate_color(background)?;
        }

        if self.program.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(PageCacheError::settings("program", "must not be empty"));
        }

        Ok(RendererSettings {
            base: BaseSettings {
                format,
                resolution,
                quality,
            },
            filters: Filters {
                background: self.background,
                brightness: self.brightness,
                contrast: self.contrast,
                rotation: self.rotation,
                saturation: self.saturation,
            },
            program: self.program,
        })
    }
}

fn check_range(field: &str, value: Option<i32>, min: i32, max: i32) -> Result<()> {
    match value {
        Some(v) if v < min || v > max => Err(PageCacheError::settings(
            field,
            format!("must be between {min} and {max}, got {v}"),
        )),
        _ => Ok(()),
    }
}

fn validate_color(color: &str) -> Result<()> {
    if color.trim().is_empty() {
        return Err(PageCacheError::settings("background", "must not be empty"));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || "#(),.% ".contains(c);
    if !color.chars().all(allowed) {
        return Err(PageCacheError::settings(
            "background",
            format!("'{color}' is not a color name, hex value or rgb() expression"),
        ));
    }
    Ok(())
}

/// Validated, immutable renderer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererSettings {
    base: BaseSettings,
    filters: Filters,
    program: Option<String>,
}

impl RendererSettings {
    /// Format, resolution and quality.
    #[must_use]
    pub const fn base(&self) -> &BaseSettings {
        &self.base
    }

    /// Optional filters as configured.
    #[must_use]
    pub const fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Explicit renderer executable, if configured.
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    /// `key=value` strings for every configured filter, sorted by key.
    ///
    /// Filters at their neutral value are still listed; only unset filters
    /// are left out.
    #[must_use]
    pub fn extra_parameters(&self) -> Vec<String> {
        let Filters {
            background,
            brightness,
            contrast,
            rotation,
            saturation,
        } = &self.filters;

        let mut params = Vec::new();
        if let Some(v) = background {
            params.push(format!("background={v}"));
        }
        if let Some(v) = brightness {
            params.push(format!("brightness={v}"));
        }
        if let Some(v) = contrast {
            params.push(format!("contrast={v}"));
        }
        if let Some(v) = rotation {
            params.push(format!("rotation={v}"));
        }
        if let Some(v) = saturation {
            params.push(format!("saturation={v}"));
        }
        params
    }

    /// Whether the brightness/saturation pair changes the image.
    #[must_use]
    pub fn modulates(&self) -> bool {
        let brightness = self.filters.brightness.unwrap_or(NEUTRAL_MODULATE);
        let saturation = self.filters.saturation.unwrap_or(NEUTRAL_MODULATE);
        brightness != NEUTRAL_MODULATE || saturation != NEUTRAL_MODULATE
    }

    /// Effective contrast, or `None` when it would be a no-op.
    #[must_use]
    pub fn effective_contrast(&self) -> Option<i32> {
        self.filters.contrast.filter(|c| *c != NEUTRAL_CONTRAST)
    }

    /// Effective rotation in `1..360`, or `None` when it would be a no-op.
    #[must_use]
    pub fn effective_rotation(&self) -> Option<i32> {
        self.filters
            .rotation
            .map(|r| r.rem_euclid(360))
            .filter(|r| *r != 0)
    }
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            base: BaseSettings {
                format: ImageFormat::Png,
                resolution: DEFAULT_RESOLUTION,
                quality: DEFAULT_QUALITY,
            },
            filters: Filters::default(),
            program: None,
        }
    }
}
