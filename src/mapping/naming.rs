use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ─── Normalization ────────────────────────────────────────────────────────────

/// Rig prefixes removed before comparing names. Only the first match is
/// stripped.
const STRIPPED_PREFIXES: [&str; 9] = [
    "mixamorig:",
    "def-",
    "mch-",
    "org-",
    "ctrl-",
    "ik-",
    "fk-",
    "root.",
    "rig.",
];

const SEPARATOR_PATTERN: &str = r"[-:. ]";
const UNDERSCORE_RUN_PATTERN: &str = r"_+";

static SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();
static UNDERSCORE_RUN_REGEX: OnceLock<Regex> = OnceLock::new();
static SIDE_PATTERNS: OnceLock<Vec<(Regex, Side)>> = OnceLock::new();

fn separator_regex() -> &'static Regex {
    SEPARATOR_REGEX.get_or_init(|| Regex::new(SEPARATOR_PATTERN).expect("invalid regex pattern"))
}

fn underscore_run_regex() -> &'static Regex {
    UNDERSCORE_RUN_REGEX
        .get_or_init(|| Regex::new(UNDERSCORE_RUN_PATTERN).expect("invalid regex pattern"))
}

/// Side patterns in evaluation order: suffixes before prefixes, left before
/// right within each group.
fn side_patterns() -> &'static [(Regex, Side)] {
    SIDE_PATTERNS.get_or_init(|| {
        [
            (r"[._-]l$", Side::Left),
            (r"[._-]left$", Side::Left),
            (r"[._-]r$", Side::Right),
            (r"[._-]right$", Side::Right),
            (r"^l[._-]", Side::Left),
            (r"^left[._-]", Side::Left),
            (r"^r[._-]", Side::Right),
            (r"^right[._-]", Side::Right),
        ]
        .into_iter()
        .map(|(pattern, side)| (Regex::new(pattern).expect("invalid regex pattern"), side))
        .collect()
    })
}

/// Canonicalizes a bone name for comparison.
///
/// Lowercases, strips the first known rig prefix (`mixamorig:`, `DEF-`, ...),
/// turns every separator into `_`, collapses repeated underscores and trims
/// them from both ends. The result is a fixed point: normalizing it again
/// returns it unchanged.
pub fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = STRIPPED_PREFIXES
        .iter()
        .find_map(|prefix| lowered.strip_prefix(*prefix))
        .unwrap_or(&lowered);

    let separated = separator_regex().replace_all(stripped, "_");
    let collapsed = underscore_run_regex().replace_all(&separated, "_");
    collapsed.trim_matches('_').to_string()
}

// ─── Side detection ───────────────────────────────────────────────────────────

/// Bilateral side tag carried by a bone name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    None,
}

impl Side {
    /// True when both sides are known and point to opposite halves of the body.
    pub fn conflicts_with(self, other: Side) -> bool {
        match (self, other) {
            (Side::Left, Side::Right) | (Side::Right, Side::Left) => true,
            (Side::Left | Side::Right | Side::None, _) => false,
        }
    }

    /// Equal sides, or at least one side unknown.
    pub fn is_compatible_with(self, other: Side) -> bool {
        !self.conflicts_with(other)
    }
}

/// Splits a side token (`.L`, `_right`, `L_`, ...) from a bone name.
///
/// The name is lowercased first. Returns the remaining base name and the
/// detected side, or the lowercased name and [`Side::None`] when no pattern
/// matches.
pub fn extract_side(name: &str) -> (String, Side) {
    let lowered = name.to_lowercase();

    for (pattern, side) in side_patterns() {
        if pattern.is_match(&lowered) {
            return (pattern.replace(&lowered, "").into_owned(), *side);
        }
    }

    (lowered, Side::None)
}

// ─── Naming conventions ───────────────────────────────────────────────────────

/// Dominant naming style of a skeleton, reported in summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamingConvention {
    /// `mixamorig:LeftArm`
    Mixamo,
    /// `DEF-upper_arm.L`, `ORG-spine`
    Rigify,
    /// `upper_arm.L`
    DotSide,
    /// `upper_arm_l`, `hand-R`
    UnderscoreSide,
    /// No recognizable decoration.
    Plain,
}

impl NamingConvention {
    const ALL: [NamingConvention; 5] = [
        NamingConvention::Mixamo,
        NamingConvention::Rigify,
        NamingConvention::DotSide,
        NamingConvention::UnderscoreSide,
        NamingConvention::Plain,
    ];

    /// Classifies a single bone name.
    pub fn of(name: &str) -> NamingConvention {
        let lowered = name.to_lowercase();

        if lowered.starts_with("mixamorig:") {
            return NamingConvention::Mixamo;
        }

        if ["def-", "mch-", "org-", "ctrl-"]
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
        {
            return NamingConvention::Rigify;
        }

        if [".l", ".r", ".left", ".right"]
            .iter()
            .any(|suffix| lowered.ends_with(suffix))
        {
            return NamingConvention::DotSide;
        }

        if ["_l", "_r", "-l", "-r", "_left", "_right", "-left", "-right"]
            .iter()
            .any(|suffix| lowered.ends_with(suffix))
        {
            return NamingConvention::UnderscoreSide;
        }

        NamingConvention::Plain
    }

    pub fn label(self) -> &'static str {
        match self {
            NamingConvention::Mixamo => "mixamo",
            NamingConvention::Rigify => "rigify",
            NamingConvention::DotSide => "dot-side",
            NamingConvention::UnderscoreSide => "underscore-side",
            NamingConvention::Plain => "plain",
        }
    }
}

/// Returns the most common decorated convention among `names`, falling back
/// to [`NamingConvention::Plain`] when no name carries a decoration.
pub fn detect_convention<S: AsRef<str>>(names: &[S]) -> NamingConvention {
    let mut counts = [0usize; NamingConvention::ALL.len()];
    for name in names {
        let convention = NamingConvention::of(name.as_ref());
        if let Some(slot) = NamingConvention::ALL
            .iter()
            .position(|candidate| *candidate == convention)
        {
            counts[slot] += 1;
        }
    }

    NamingConvention::ALL
        .iter()
        .zip(counts)
        .filter(|(convention, count)| **convention != NamingConvention::Plain && *count > 0)
        .fold(None::<(NamingConvention, usize)>, |best, (convention, count)| {
            match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((*convention, count)),
            }
        })
        .map(|(convention, _)| convention)
        .unwrap_or(NamingConvention::Plain)
}
