//! Texture-name normalization.
//!
//! Compiled levels decorate the names of instanced textures: a face that was
//! given `brick/brick06c` in the editor may reference
//! `maps/<mapname>/brick/brick06c_x_y_z` after compilation, where the trailing
//! triple is the world position the instance was baked at. Consumers want the
//! undecorated name, so [`normalize_name`] strips the decoration back off.

use regex::Regex;
use std::sync::OnceLock;

/// Marker token in a normalized texture name identifying non-rendering
/// tool/helper surfaces (clip brushes, skip faces, trigger textures).
const TOOL_MARKERS: [&str; 2] = ["tools/", "tools\\"];

static DECORATED_NAME: OnceLock<Regex> = OnceLock::new();

fn decorated_name() -> &'static Regex {
    DECORATED_NAME.get_or_init(|| {
        Regex::new(r"^maps[\\/]\w+[\\/](.+)(?:_-?(?:\d*\.)?\d+){3}$")
            .expect("decorated-name pattern is valid")
    })
}

/// Strip map/coordinate-suffix decoration from an instanced texture name.
///
/// `maps/<mapname>/brick/brick06c_512_-32_0.25` becomes `brick/brick06c`;
/// undecorated names pass through unchanged, case preserved.
pub fn normalize_name(raw: &str) -> String {
    if let Some(captures) = decorated_name().captures(raw) {
        captures[1].to_string()
    } else {
        raw.to_string()
    }
}

/// Whether a normalized texture name marks a non-rendering tool surface.
///
/// The check is case-insensitive; faces carrying such a name produce no
/// geometry at all.
pub fn is_tool_texture(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    TOOL_MARKERS.iter().any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecorated_name_passes_through() {
        assert_eq!(normalize_name("brick/brick06c"), "brick/brick06c");
        assert_eq!(normalize_name("CONCRETE/CONCRETEFLOOR028A"), "CONCRETE/CONCRETEFLOOR028A");
    }

    #[test]
    fn decorated_name_is_stripped() {
        assert_eq!(normalize_name("maps/d1_trainstation/brick/brick06c_512_-32_64"), "brick/brick06c");
        assert_eq!(normalize_name(r"maps\d1_canals\metal/metalwall048a_-8_0.5_1024"), "metal/metalwall048a");
    }

    #[test]
    fn partial_decoration_is_left_alone() {
        // Only two coordinate suffixes: not the baked-instance form.
        assert_eq!(normalize_name("maps/d1_town/brick/brick06c_512_-32"), "maps/d1_town/brick/brick06c_512_-32");
        // No maps/ prefix.
        assert_eq!(normalize_name("brick/brick06c_512_-32_64"), "brick/brick06c_512_-32_64");
    }

    #[test]
    fn tool_textures_are_detected() {
        assert!(is_tool_texture("tools/toolsnodraw"));
        assert!(is_tool_texture("TOOLS\\TOOLSTRIGGER"));
        assert!(!is_tool_texture("brick/brick06c"));
    }
}
