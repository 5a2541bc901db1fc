//! Static Helvetica metric tables (the PDF standard-14 font used by both the
//! text-flow export and the cover letter).
//!
//! Character widths are in em units (AFM width / 1000). Tables cover ASCII
//! 0x20..=0x7E; Spanish accented letters fold to their base letter, which
//! shares its advance width in Helvetica. Oblique faces reuse the upright
//! widths. Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontWeight {
    Regular,
    Bold,
}

impl FontWeight {
    pub fn from_bold(bold: bool) -> Self {
        if bold {
            FontWeight::Bold
        } else {
            FontWeight::Regular
        }
    }
}

/// Per-character advance widths for one Helvetica weight.
///
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    pub weight: FontWeight,
    widths: [f32; 95],
    /// Fallback width for characters with no ASCII fold.
    pub average_char_width: f32,
    pub space_width: f32,
}

fn fold(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'Ñ' => 'N',
        'Ç' => 'C',
        '¿' => '?',
        '¡' => '!',
        '\u{2018}' | '\u{2019}' => '\'',
        '\u{201C}' | '\u{201D}' => '"',
        '\u{2013}' => '-',
        other => other,
    }
}

impl FontMetricTable {
    pub fn char_width(&self, c: char) -> f32 {
        match fold(c) {
            '\u{2022}' => 0.35,
            '\u{2014}' => 1.0,
            folded => {
                let code = folded as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            }
        }
    }

    /// Measures the rendered width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Width of `s` at `size` (same unit as `size`).
    pub fn width(&self, s: &str, size: f32) -> f32 {
        self.measure_str(s) * size
    }

    /// Greedy word wrap at `max_width` (same unit as `size`). Words are never
    /// split; a word wider than the line gets a line of its own.
    pub fn wrap(&self, s: &str, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;
        let space = self.space_width * size;

        for word in s.split_whitespace() {
            let word_width = self.width(word, size);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_width;
            } else if current_width + space + word_width > max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_width;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    weight: FontWeight::Regular,
    #[rustfmt::skip]
    widths: [
        // sp    !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
    space_width: 0.278,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    weight: FontWeight::Bold,
    #[rustfmt::skip]
    widths: [
        // sp    !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.611,
    space_width: 0.278,
};

/// Returns the static metric table for a given weight.
pub fn get_metrics(weight: FontWeight) -> &'static FontMetricTable {
    match weight {
        FontWeight::Regular => &HELVETICA_TABLE,
        FontWeight::Bold => &HELVETICA_BOLD_TABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_str_empty_returns_zero() {
        assert_eq!(get_metrics(FontWeight::Regular).measure_str(""), 0.0);
    }

    #[test]
    fn test_measure_str_ascii_characters() {
        let metrics = get_metrics(FontWeight::Regular);
        // "Rust" = R(0.722) + u(0.556) + s(0.500) + t(0.278) = 2.056
        let width = metrics.measure_str("Rust");
        assert!((width - 2.056).abs() < 1e-3, "Rust width should be ~2.056, got {width}");
    }

    #[test]
    fn test_accented_letters_fold_to_base_width() {
        let metrics = get_metrics(FontWeight::Regular);
        assert_eq!(metrics.measure_str("rápido"), metrics.measure_str("rapido"));
        assert_eq!(metrics.measure_str("Ñandú"), metrics.measure_str("Nandu"));
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let text = "Fortalezas destacadas";
        assert!(
            get_metrics(FontWeight::Bold).measure_str(text)
                > get_metrics(FontWeight::Regular).measure_str(text)
        );
    }

    #[test]
    fn test_wrap_keeps_words_whole() {
        let metrics = get_metrics(FontWeight::Regular);
        let lines = metrics.wrap("uno dos tres cuatro cinco seis", 12.0, 60.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "uno dos tres cuatro cinco seis");
        for line in &lines {
            assert!(
                metrics.width(line, 12.0) <= 60.0 || !line.contains(' '),
                "line '{line}' overflows"
            );
        }
    }

    #[test]
    fn test_wrap_overlong_word_gets_own_line() {
        let metrics = get_metrics(FontWeight::Regular);
        let lines = metrics.wrap("a supercalifragilistico b", 12.0, 40.0);
        assert_eq!(lines, vec!["a", "supercalifragilistico", "b"]);
    }

    #[test]
    fn test_wrap_empty_yields_no_lines() {
        assert!(get_metrics(FontWeight::Bold).wrap("   ", 12.0, 100.0).is_empty());
    }
}
