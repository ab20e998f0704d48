//! Version-range gating for upgrade modules.

use crate::core::version::{Version, VersionRange};

/// Returns true if `installed` falls inside `range`.
///
/// Pure comparison, no errors: malformed ranges are rejected at parse time,
/// before this is ever called. A `to` component of -1 is unbounded; a `from`
/// build of -1 is treated as 0.
pub fn applies(installed: Version, range: &VersionRange) -> bool {
    if range.from_major > installed.major {
        return false;
    }
    if range.to_major != -1 && range.to_major < installed.major {
        return false;
    }
    if range.from_major == installed.major && installed.minor < range.from_minor {
        return false;
    }
    if range.to_major == installed.major
        && range.to_minor != -1
        && installed.minor > range.to_minor
    {
        return false;
    }
    if range.from_major == installed.major
        && range.from_minor == installed.minor
        && installed.micro < range.from_micro
    {
        return false;
    }
    if range.to_major == installed.major
        && range.to_minor == installed.minor
        && range.to_micro != -1
        && installed.micro > range.to_micro
    {
        return false;
    }

    let build_from = if range.from_build == -1 {
        0
    } else {
        range.from_build
    };
    let build_to = if range.to_build == -1 {
        i32::MAX
    } else {
        range.to_build
    };
    installed.build >= build_from && installed.build <= build_to
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(from: [i32; 4], to: [i32; 4]) -> VersionRange {
        VersionRange {
            from_major: from[0],
            from_minor: from[1],
            from_micro: from[2],
            from_build: from[3],
            to_major: to[0],
            to_minor: to[1],
            to_micro: to[2],
            to_build: to[3],
        }
    }

    #[test]
    fn inside_range_applies() {
        let range = range([5, 0, 0, -1], [6, 0, 0, -1]);
        assert!(applies(Version::new(5, 3, 2, 100), &range));
    }

    #[test]
    fn above_upper_micro_does_not_apply() {
        let range = range([5, 0, 0, -1], [6, 0, 0, -1]);
        assert!(!applies(Version::new(6, 0, 1, 1), &range));
    }

    #[test]
    fn unbounded_upper_micro_applies() {
        let range = range([5, 0, 0, -1], [6, 0, -1, -1]);
        assert!(applies(Version::new(6, 0, 0, 1), &range));
        assert!(applies(Version::new(6, 0, 9, 1), &range));
    }

    #[test]
    fn below_lower_major_does_not_apply() {
        let range = range([5, 0, 0, -1], [6, 0, -1, -1]);
        assert!(!applies(Version::new(4, 9, 9, 500), &range));
    }

    #[test]
    fn above_unbounded_major_applies() {
        let range = range([5, 0, 0, -1], [-1, 0, -1, -1]);
        assert!(applies(Version::new(9, 0, 0, 1), &range));
    }

    #[test]
    fn minor_checked_only_on_boundary_major() {
        // Installed major strictly between the bounds: minor is irrelevant.
        let range = range([5, 9, 0, -1], [7, 1, 0, -1]);
        assert!(applies(Version::new(6, 0, 0, 1), &range));
        assert!(!applies(Version::new(5, 8, 0, 1), &range));
        assert!(!applies(Version::new(7, 2, 0, 1), &range));
    }

    #[test]
    fn micro_checked_only_on_boundary_minor() {
        let range = range([5, 3, 5, -1], [5, 5, 2, -1]);
        assert!(!applies(Version::new(5, 3, 4, 1), &range));
        assert!(applies(Version::new(5, 4, 0, 1), &range));
        assert!(!applies(Version::new(5, 5, 3, 1), &range));
    }

    #[test]
    fn build_bounds_are_inclusive() {
        let range = range([5, 0, 0, 100], [6, 0, -1, 200]);
        assert!(applies(Version::new(5, 3, 0, 100), &range));
        assert!(applies(Version::new(5, 3, 0, 200), &range));
        assert!(!applies(Version::new(5, 3, 0, 99), &range));
        assert!(!applies(Version::new(5, 3, 0, 201), &range));
    }

    #[test]
    fn unbounded_build_accepts_any_build() {
        let range = range([5, 0, 0, -1], [6, 0, -1, -1]);
        assert!(applies(Version::new(5, 3, 0, 0), &range));
        assert!(applies(Version::new(5, 3, 0, i32::MAX), &range));
    }

    #[test]
    fn gate_is_pure() {
        let range = range([5, 0, 0, -1], [6, 0, 0, -1]);
        let installed = Version::new(5, 3, 2, 100);
        assert_eq!(applies(installed, &range), applies(installed, &range));
    }
}
