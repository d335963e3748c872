use palette::Srgb;

use super::PaletteEntry;

/// Format an entry as `#rrggbb | pp.pp%`, as a terminal swatch when colorful
pub fn format_entry(entry: &PaletteEntry, colorful: bool) -> String {
    let [r, g, b] = entry.color.to_u8();
    let hex = format!("#{:x}", Srgb::new(r, g, b));
    let percentage = entry.proportion * 100.0;
    if !colorful {
        return format!("{hex} | {percentage:5.2}%");
    }
    // Black text on light backgrounds, white otherwise
    let k = if r > 127 && g > 127 && b > 127 { 0 } else { 255 };
    format!(
        "\x1b[1m\x1b[38;2;{k};{k};{k}m\x1b[48;2;{r};{g};{b}m  {hex} | {percentage:5.2}%  \x1b[0m"
    )
}
