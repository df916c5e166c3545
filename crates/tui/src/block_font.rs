use std::collections::HashMap;

use once_cell::sync::Lazy;

const FONT_HEIGHT: usize = 5;
const FILL_CHAR: char = '█';
const SPACING: usize = 1;

type Glyph = [&'static str; FONT_HEIGHT];

const UNKNOWN: Glyph = ["111", "  1", " 1 ", "   ", " 1 "];

static DIGITS: Lazy<HashMap<char, Glyph>> = Lazy::new(|| {
    HashMap::from([
        ('0', ["111", "1 1", "1 1", "1 1", "111"]),
        ('1', [" 1 ", "11 ", " 1 ", " 1 ", "111"]),
        ('2', ["111", "  1", "111", "1  ", "111"]),
        ('3', ["111", "  1", " 11", "  1", "111"]),
        ('4', ["1 1", "1 1", "111", "  1", "  1"]),
        ('5', ["111", "1  ", "111", "  1", "111"]),
        ('6', ["111", "1  ", "111", "1 1", "111"]),
        ('7', ["111", "  1", " 1 ", " 1 ", " 1 "]),
        ('8', ["111", "1 1", "111", "1 1", "111"]),
        ('9', ["111", "1 1", "111", "  1", "111"]),
        ('$', [" 11", "11 ", " 1 ", " 11", "11 "]),
        ('-', ["   ", "   ", "111", "   ", "   "]),
        (' ', ["   ", "   ", "   ", "   ", "   "]),
    ])
});

/// Render an amount such as `$-1500` in double-width block digits.
pub fn render(text: &str) -> Vec<String> {
    let mut rows = vec![String::new(); FONT_HEIGHT];
    for (index, ch) in text.chars().enumerate() {
        let glyph = DIGITS.get(&ch).unwrap_or(&UNKNOWN);
        for (row, pattern) in rows.iter_mut().zip(glyph.iter()) {
            if index > 0 {
                row.push_str(&" ".repeat(SPACING));
            }
            for symbol in pattern.chars() {
                let cell = if symbol == '1' { FILL_CHAR } else { ' ' };
                row.push(cell);
                row.push(cell);
            }
        }
    }
    rows.into_iter()
        .map(|row| row.trim_end().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_row_per_font_line() {
        let rows = render("$1500");
        assert_eq!(rows.len(), FONT_HEIGHT);
        assert!(rows[0].contains(FILL_CHAR));
    }

    #[test]
    fn glyphs_are_double_width() {
        let rows = render("1");
        assert_eq!(rows[4], "██████");
        assert_eq!(rows[0], "  ██");
    }

    #[test]
    fn unknown_characters_fall_back() {
        assert_eq!(render("x"), render("?"));
    }
}
