/// A named, versioned bundle of directory name patterns for a common cleanup
/// profile. Read-only reference data for the whole process lifetime.
#[derive(Debug, PartialEq, Eq)]
pub struct PresetRule {
    pub name: &'static str,
    pub version: u32,
    pub patterns: &'static [&'static str],
}

const PRESETS: &[PresetRule] = &[
    PresetRule {
        name: "node-modules",
        version: 1,
        patterns: &["node_modules"],
    },
    PresetRule {
        name: "build-artifacts",
        version: 1,
        patterns: &["build", "dist", "target", "out", "bin", "obj"],
    },
    PresetRule {
        name: "cache-dirs",
        version: 1,
        patterns: &[".cache", "__pycache__", ".gradle", ".npm", ".nuget"],
    },
    PresetRule {
        name: "temp-files",
        version: 1,
        patterns: &["tmp", "temp", "*tmp", "*bak"],
    },
];

pub fn presets() -> &'static [PresetRule] {
    PRESETS
}

pub fn find_preset(name: &str) -> Option<&'static PresetRule> {
    PRESETS.iter().find(|preset| preset.name == name)
}

#[cfg(test)]
mod test {
    use super::{find_preset, presets};

    #[test]
    fn lookup() {
        assert_eq!(find_preset("build-artifacts").unwrap().name, "build-artifacts");
        assert!(find_preset("no-such-preset").is_none());
        assert_eq!(presets().len(), 4);
    }
}
