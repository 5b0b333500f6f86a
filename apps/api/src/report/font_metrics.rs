//! Static glyph-width table for the report font, used for word wrapping.
//!
//! Widths are in em units (AFM widths / 1000). Hangul and other CJK glyphs are full-width
//! (1 em); any other non-ASCII character falls back to `average_char_width`.
//! Index = (char as usize) - 32, covering ASCII 0x20..=0x7E.

/// Points to millimetres.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

pub struct FontMetricTable {
    widths: [f32; 95],
    pub average_char_width: f32,
    pub wide_char_width: f32,
    pub space_width: f32,
}

/// Helvetica (PDF base-14), regular weight.
pub static HELVETICA: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp    !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0     1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :     ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A     B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N     O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [     \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a     b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n     o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {     |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
    wide_char_width: 1.0,
    space_width: 0.278,
};

impl FontMetricTable {
    pub fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else if is_wide(c) {
            self.wide_char_width
        } else {
            self.average_char_width
        }
    }

    /// Rendered width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Rendered width in millimetres at `font_size_pt`.
    pub fn measure_mm(&self, s: &str, font_size_pt: f32) -> f32 {
        self.measure_str(s) * font_size_pt * PT_TO_MM
    }

    /// Greedy word wrap to `max_width_mm`. Newlines start new lines; an empty input line
    /// stays an empty output line. Words wider than a full line are broken by character.
    pub fn wrap(&self, text: &str, max_width_mm: f32, font_size_pt: f32) -> Vec<String> {
        let space = self.space_width * font_size_pt * PT_TO_MM;
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let mut current = String::new();
            let mut current_width = 0.0_f32;

            for word in paragraph.split_whitespace() {
                let word_width = self.measure_mm(word, font_size_pt);

                if !current.is_empty() && current_width + space + word_width <= max_width_mm {
                    current.push(' ');
                    current.push_str(word);
                    current_width += space + word_width;
                    continue;
                }
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }

                if word_width <= max_width_mm {
                    current.push_str(word);
                    current_width = word_width;
                } else {
                    // Hard-break an overlong word; its tail continues the next line.
                    current_width = 0.0;
                    for c in word.chars() {
                        let w = self.char_width(c) * font_size_pt * PT_TO_MM;
                        if !current.is_empty() && current_width + w > max_width_mm {
                            lines.push(std::mem::take(&mut current));
                            current_width = 0.0;
                        }
                        current.push(c);
                        current_width += w;
                    }
                }
            }
            lines.push(current);
        }
        lines
    }
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x11FF   // Hangul Jamo
        | 0x2E80..=0x9FFF // CJK radicals through unified ideographs
        | 0xAC00..=0xD7AF // Hangul syllables
        | 0xF900..=0xFAFF // CJK compatibility ideographs
        | 0xFF00..=0xFF60 // Fullwidth forms
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_str_empty_returns_zero() {
        assert_eq!(HELVETICA.measure_str(""), 0.0);
    }

    #[test]
    fn test_measure_str_ascii_characters() {
        // "Rust" = R(0.722) + u(0.556) + s(0.500) + t(0.278) = 2.056
        let width = HELVETICA.measure_str("Rust");
        assert!((width - 2.056).abs() < 1e-3, "got {width}");
    }

    #[test]
    fn test_hangul_is_full_width() {
        assert!((HELVETICA.measure_str("시장") - 2.0).abs() < 1e-4);
        assert!((HELVETICA.char_width('é') - HELVETICA.average_char_width).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_short_text_is_one_line() {
        assert_eq!(HELVETICA.wrap("hello world", 170.0, 10.0), ["hello world"]);
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "word ".repeat(200);
        let lines = HELVETICA.wrap(&text, 170.0, 10.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(HELVETICA.measure_mm(line, 10.0) <= 170.0 + 1e-3, "line too wide: {line}");
        }
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
        assert_eq!(rejoined.len(), 200);
    }

    #[test]
    fn test_wrap_keeps_paragraph_breaks() {
        assert_eq!(HELVETICA.wrap("a\n\nb", 170.0, 10.0), ["a", "", "b"]);
        assert_eq!(HELVETICA.wrap("", 170.0, 10.0), [""]);
    }

    #[test]
    fn test_wrap_breaks_overlong_word() {
        let url = format!("https://example.com/{}", "a".repeat(400));
        let lines = HELVETICA.wrap(&url, 160.0, 8.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), url);
    }
}
