//! Engine version.

pub const MAJOR_VERSION: u32 = 1;
pub const MINOR_VERSION: u32 = 12;
pub const PATCH_VERSION: u32 = 13;
pub const SUFFIX_VERSION: u32 = 0;

/// `<major>.<minor>.<patch>.<suffix>`
pub fn version() -> String {
    format!(
        "{}.{}.{}.{}",
        MAJOR_VERSION, MINOR_VERSION, PATCH_VERSION, SUFFIX_VERSION
    )
}

pub fn versions() -> (u32, u32, u32, u32) {
    (MAJOR_VERSION, MINOR_VERSION, PATCH_VERSION, SUFFIX_VERSION)
}

/// Whether this version is at least the given one, most significant
/// component first.
pub fn version_at_least(major: u32, minor: u32, patch: u32, suffix: u32) -> bool {
    versions() >= (major, minor, patch, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string() {
        assert_eq!(version(), "1.12.13.0");
        assert_eq!(versions(), (1, 12, 13, 0));
    }

    #[test]
    fn test_version_at_least() {
        assert!(version_at_least(1, 0, 0, 0));
        assert!(version_at_least(1, 12, 13, 0));
        assert!(version_at_least(0, 99, 99, 99));
        assert!(version_at_least(1, 11, 99, 0));
        assert!(!version_at_least(1, 12, 13, 1));
        assert!(!version_at_least(1, 13, 0, 0));
        assert!(!version_at_least(2, 0, 0, 0));
    }
}
