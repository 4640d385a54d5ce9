use sunshine_core::FaceConfig;

/// Offsets and text sizes for one screen shape.
///
/// Derived once per insets event, never per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub x_offset: f32,
    pub y_offset: f32,
    pub text_size: f32,
    pub date_text_size: f32,
    pub temp_text_size: f32,
}

impl Layout {
    pub fn for_shape(config: &FaceConfig, is_round: bool) -> Self {
        let (x_offset, text_size) = if is_round {
            (config.x_offset_round, config.text_size_round)
        } else {
            (config.x_offset, config.text_size)
        };
        Self {
            x_offset,
            y_offset: config.y_offset,
            text_size,
            date_text_size: config.date_text_size,
            temp_text_size: config.temp_text_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_uses_round_dimensions() {
        let config = FaceConfig::default();
        let square = Layout::for_shape(&config, false);
        let round = Layout::for_shape(&config, true);

        assert_eq!(square.x_offset, config.x_offset);
        assert_eq!(square.text_size, config.text_size);
        assert_eq!(round.x_offset, config.x_offset_round);
        assert_eq!(round.text_size, config.text_size_round);
        assert_eq!(round.y_offset, square.y_offset);
        assert_eq!(round.date_text_size, square.date_text_size);
    }
}
