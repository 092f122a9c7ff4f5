use std::sync::OnceLock;

use regex::Regex;

const BONE_CHANNEL_PATTERN: &str = r#"^pose\.bones\[(?:"([^"]*)"|'([^']*)')\]"#;

static BONE_CHANNEL_REGEX: OnceLock<Regex> = OnceLock::new();

fn bone_channel_regex() -> &'static Regex {
    BONE_CHANNEL_REGEX
        .get_or_init(|| Regex::new(BONE_CHANNEL_PATTERN).expect("invalid regex pattern"))
}

/// Builds `pose.bones["<bone>"].<property>`.
pub fn bone_channel_path(bone_name: &str, property: &str) -> String {
    format!(r#"pose.bones["{bone_name}"].{property}"#)
}

/// Bone name embedded in a pose-bone channel path, with either quote style.
pub fn bone_name_of(channel_path: &str) -> Option<&str> {
    let captures = bone_channel_regex().captures(channel_path)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|name| name.as_str())
}

/// Replaces the quoted bone segment naming `source_bone` with `target_bone`.
///
/// Only `pose.bones["source"]` and `pose.bones['source']` are touched; the
/// property suffix and any other bone segment stay as they are. The rewritten
/// segment always uses double quotes.
pub fn rewrite_bone(channel_path: &str, source_bone: &str, target_bone: &str) -> String {
    let replacement = format!(r#"pose.bones["{target_bone}"]"#);
    channel_path
        .replace(&format!(r#"pose.bones["{source_bone}"]"#), &replacement)
        .replace(&format!("pose.bones['{source_bone}']"), &replacement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn given_double_quoted_path_when_rewriting_then_only_bone_segment_changes() {
        let path = r#"pose.bones["mixamorig:Hips"].rotation_quaternion"#;
        assert_eq!(
            rewrite_bone(path, "mixamorig:Hips", "hips"),
            r#"pose.bones["hips"].rotation_quaternion"#
        );
    }

    #[test]
    fn given_single_quoted_path_when_rewriting_then_double_quotes_are_written() {
        let path = "pose.bones['Spine'].location";
        assert_eq!(
            rewrite_bone(path, "Spine", "spine_01"),
            r#"pose.bones["spine_01"].location"#
        );
    }

    #[test]
    fn given_bone_name_as_prefix_of_another_when_rewriting_then_other_bone_is_untouched() {
        let path = r#"pose.bones["Hand.L"].location"#;
        assert_eq!(rewrite_bone(path, "Hand", "hand"), path);
    }

    #[test]
    fn given_non_bone_path_when_reading_bone_name_then_none() {
        assert_eq!(bone_name_of("location"), None);
        assert_eq!(bone_name_of(r#"pose.bones["Hips"].scale"#), Some("Hips"));
        assert_eq!(bone_name_of("pose.bones['upper_arm.L'].location"), Some("upper_arm.L"));
    }

    #[test]
    fn given_bone_and_property_when_building_path_then_template_is_filled() {
        assert_eq!(
            bone_channel_path("upper_arm.L", "rotation_euler"),
            r#"pose.bones["upper_arm.L"].rotation_euler"#
        );
    }

    proptest! {
        #[test]
        fn rewrite_keeps_property_suffix(
            source in "[A-Za-z:_.]{1,12}",
            target in "[A-Za-z:_.]{1,12}",
            property in "(location|rotation_euler|rotation_quaternion|scale)",
        ) {
            let path = bone_channel_path(&source, &property);
            let rewritten = rewrite_bone(&path, &source, &target);
            prop_assert_eq!(rewritten, bone_channel_path(&target, &property));
        }
    }
}
