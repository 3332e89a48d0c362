use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Display color for a particle species, each channel in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Builds a color from 8-bit channel values.
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Rgb { r: r as f32 / 255.0, g: g as f32 / 255.0, b: b as f32 / 255.0 }
    }
}

/// Fixed species palette (8-bit RGB). Its length caps the supported number of colors.
pub const PALETTE: [(u8, u8, u8); 12] = [
    (255, 0, 0),
    (0, 255, 0),
    (0, 0, 255),
    (93, 138, 168),
    (164, 198, 57),
    (205, 149, 117),
    (253, 238, 0),
    (138, 43, 226),
    (102, 255, 0),
    (237, 135, 45),
    (128, 128, 0),
    (165, 11, 94),
];

/// Returns the first `count` palette entries.
pub fn species_colors(count: usize) -> Result<Vec<Rgb>> {
    if count > PALETTE.len() {
        anyhow::bail!(
            "colors_count {} exceeds the palette size of {}.",
            count,
            PALETTE.len()
        );
    }
    Ok(PALETTE[..count].iter().map(|&(r, g, b)| Rgb::from_u8(r, g, b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_slices_and_limits() {
        assert_eq!(species_colors(0).unwrap().len(), 0);
        let colors = species_colors(3).unwrap();
        assert_eq!(colors[0], Rgb { r: 1.0, g: 0.0, b: 0.0 });
        assert_eq!(colors[2], Rgb { r: 0.0, g: 0.0, b: 1.0 });
        assert!(species_colors(PALETTE.len()).is_ok());
        assert!(species_colors(PALETTE.len() + 1).is_err());
    }
}
