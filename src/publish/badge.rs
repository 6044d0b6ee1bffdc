//! SVG score badge rendering
//!
//! Produces a flat, shields-style badge from the normalized score. The
//! badge is regenerated from scratch every run and is safe to overwrite.

/// Approximate Verdana glyph width at font-size 11
const CHAR_WIDTH: u32 = 7;
/// Horizontal padding per side of each badge segment
const PADDING: u32 = 5;

/// Badge color for a normalized total
pub fn score_color(total: u32) -> &'static str {
    match total {
        90..=u32::MAX => "#4c1",
        75..=89 => "#97ca00",
        60..=74 => "#dfb317",
        40..=59 => "#fe7d37",
        _ => "#e05d44",
    }
}

/// Render the score badge as a standalone SVG document
pub fn render_badge(total: u32, grade: &str) -> String {
    let label = "Karen Score";
    let value = format!("{total}/100 \u{b7} {grade}");

    let label_width = segment_width(label);
    let value_width = segment_width(&value);
    let width = label_width + value_width;
    let color = score_color(total);

    // Text coordinates are segment centers; text-anchor does the rest
    let label_x = label_width / 2;
    let value_x = label_width + value_width / 2;
    let value = xml_escape(&value);

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="20" role="img" aria-label="{label}: {value}">
  <clipPath id="r"><rect width="{width}" height="20" rx="3" fill="#fff"/></clipPath>
  <g clip-path="url(#r)">
    <rect width="{label_width}" height="20" fill="#555"/>
    <rect x="{label_width}" width="{value_width}" height="20" fill="{color}"/>
  </g>
  <g fill="#fff" text-anchor="middle" font-family="Verdana,Geneva,DejaVu Sans,sans-serif" font-size="11">
    <text x="{label_x}" y="14">{label}</text>
    <text x="{value_x}" y="14">{value}</text>
  </g>
</svg>
"##
    )
}

fn segment_width(text: &str) -> u32 {
    text.chars().count() as u32 * CHAR_WIDTH + 2 * PADDING
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_carries_score_and_grade() {
        let svg = render_badge(62, "Mediocre");
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("62/100"));
        assert!(svg.contains("Mediocre"));
        assert!(svg.contains("Karen Score"));
    }

    #[test]
    fn color_tiers() {
        assert_eq!(score_color(95), "#4c1");
        assert_eq!(score_color(90), "#4c1");
        assert_eq!(score_color(80), "#97ca00");
        assert_eq!(score_color(65), "#dfb317");
        assert_eq!(score_color(45), "#fe7d37");
        assert_eq!(score_color(10), "#e05d44");
    }

    #[test]
    fn width_tracks_text_length() {
        let long = render_badge(99, "Actually Impressive");
        let short = render_badge(99, "Hot Mess");
        let width = |svg: &str| {
            let start = svg.find("width=\"").unwrap() + 7;
            let end = svg[start..].find('"').unwrap() + start;
            svg[start..end].parse::<u32>().unwrap()
        };
        assert!(width(&long) > width(&short));
    }

    #[test]
    fn grade_text_is_escaped() {
        let svg = render_badge(50, "Needs <Adult> & Supervision");
        assert!(svg.contains("&lt;Adult&gt; &amp;"));
        assert!(!svg.contains("<Adult>"));
    }
}
