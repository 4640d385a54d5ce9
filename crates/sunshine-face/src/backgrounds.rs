//! Condition backgrounds and their per-surface variants.

use std::collections::HashMap;

use sunshine_core::ResourceError;
use sunshine_weather::IconId;

use crate::graphics::Bitmap;

/// Background shown before the first weather sync
pub const INITIAL_ICON: IconId = IconId::MostlyClear;

/// One decoded background per condition icon
#[derive(Debug, Clone)]
pub struct BackgroundSet {
    bitmaps: HashMap<IconId, Bitmap>,
}

impl BackgroundSet {
    /// Every icon must be present; the draw step never falls back.
    pub fn new(bitmaps: HashMap<IconId, Bitmap>) -> Result<Self, ResourceError> {
        for icon in IconId::ALL {
            if !bitmaps.contains_key(&icon) {
                tracing::error!(icon = %icon, "Background bitmap missing");
                return Err(ResourceError::MissingIcon(icon.resource_name().to_string()));
            }
        }
        Ok(Self { bitmaps })
    }

    /// Flat-colored stand-ins, one hue per icon
    pub fn placeholder(width: u32, height: u32) -> Self {
        let bitmaps = IconId::ALL
            .iter()
            .map(|&icon| (icon, Bitmap::solid(width, height, placeholder_color(icon))))
            .collect();
        Self { bitmaps }
    }

    pub fn get(&self, icon: IconId) -> &Bitmap {
        // Presence of every icon is checked in `new`
        &self.bitmaps[&icon]
    }
}

fn placeholder_color(icon: IconId) -> u32 {
    match icon {
        IconId::Clear => 0xFF4F_C3F7,
        IconId::MostlyClear => 0xFF81_D4FA,
        IconId::Cloudy => 0xFF90_A4AE,
        IconId::Drizzle => 0xFF64_B5F6,
        IconId::Fog => 0xFFB0_BEC5,
        IconId::Rain => 0xFF19_76D2,
        IconId::Snow => 0xFFE3_F2FD,
        IconId::Storm => 0xFF37_474F,
        IconId::Thunderstorm => 0xFF45_27A0,
    }
}

/// Current background in full color and desaturated, keyed by icon and surface width.
///
/// Both variants are only rebuilt when the icon or the width changes.
#[derive(Debug, Clone)]
pub struct BackgroundCache {
    icon: IconId,
    width: Option<u32>,
    color: Bitmap,
    gray: Option<Bitmap>,
}

impl BackgroundCache {
    pub fn new(set: &BackgroundSet) -> Self {
        Self {
            icon: INITIAL_ICON,
            width: None,
            color: set.get(INITIAL_ICON).clone(),
            gray: None,
        }
    }

    pub fn icon(&self) -> IconId {
        self.icon
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn has_gray(&self) -> bool {
        self.gray.is_some()
    }

    fn load(&mut self, set: &BackgroundSet) {
        let source = set.get(self.icon);
        self.color = match self.width {
            Some(width) => source.scaled_to_width(width),
            None => source.clone(),
        };
        self.gray = None;
    }

    /// Switch to `icon`; `None` keeps the current background.
    ///
    /// Returns whether anything was rebuilt.
    pub fn select(&mut self, set: &BackgroundSet, icon: Option<IconId>) -> bool {
        match icon {
            Some(icon) if icon != self.icon => {
                tracing::debug!(from = %self.icon, to = %icon, "Background changed");
                self.icon = icon;
                self.load(set);
                true
            }
            _ => false,
        }
    }

    /// Rescale for a new surface width. Returns whether anything was rebuilt.
    pub fn resize(&mut self, set: &BackgroundSet, width: u32) -> bool {
        if width == 0 || self.width == Some(width) {
            return false;
        }
        self.width = Some(width);
        self.load(set);
        true
    }

    pub fn color(&self) -> &Bitmap {
        &self.color
    }

    /// Desaturated variant, built on first use after a change
    pub fn gray(&mut self) -> &Bitmap {
        let color = &self.color;
        self.gray.get_or_insert_with(|| color.desaturated())
    }

    /// Build the desaturated variant now if it is stale
    pub fn prepare_gray(&mut self) {
        let _ = self.gray();
    }
}
