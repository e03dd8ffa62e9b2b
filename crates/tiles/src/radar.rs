/// Minimap colour per tile, parsed from the tileset's `.radar` side file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadarPalette {
    colours: Vec<[u8; 3]>,
}

fn parse_hex_pair(pair: &[u8]) -> Option<u8> {
    let text = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(text, 16).ok()
}

impl RadarPalette {
    /// Reads consecutive `RRGGBB` triplets, whitespace between them allowed.
    /// Stops at the first malformed triplet or when fewer than six characters remain.
    pub fn parse(bytes: &[u8]) -> Self {
        let mut colours = Vec::new();
        let mut cursor = 0;
        loop {
            while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                cursor += 1;
            }
            let Some(triplet) = bytes.get(cursor..cursor + 6) else {
                break;
            };
            let (Some(r), Some(g), Some(b)) = (
                parse_hex_pair(&triplet[0..2]),
                parse_hex_pair(&triplet[2..4]),
                parse_hex_pair(&triplet[4..6]),
            ) else {
                break;
            };
            colours.push([r, g, b]);
            cursor += 6;
        }
        Self { colours }
    }

    pub fn colour(&self, ordinal: u32) -> Option<[u8; 3]> {
        self.colours.get(ordinal as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_triplet_per_line() {
        let palette = RadarPalette::parse(b"ff0000\n00ff00\r\n0000FF\n");
        assert_eq!(palette.len(), 3);
        assert_eq!(palette.colour(0), Some([0xff, 0, 0]));
        assert_eq!(palette.colour(2), Some([0, 0, 0xff]));
        assert_eq!(palette.colour(3), None);
    }

    #[test]
    fn stops_at_first_malformed_triplet() {
        let palette = RadarPalette::parse(b"102030 zz0000 405060");
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.colour(0), Some([0x10, 0x20, 0x30]));
    }

    #[test]
    fn truncated_tail_is_ignored() {
        let palette = RadarPalette::parse(b"aabbcc\nddee");
        assert_eq!(palette.len(), 1);
        assert!(RadarPalette::parse(b"").is_empty());
    }
}
