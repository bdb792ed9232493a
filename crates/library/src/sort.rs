//! Ordering of the nodes within one directory level.

use crate::error::ParseParamError;
use crate::node::MediaNode;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Case-insensitive name.
    #[default]
    Name,
    Size,
    /// Last modification time.
    Modified,
    /// Unknown durations sort as zero.
    Duration,
    /// Folders first, then grouped by kind, then by name.
    Type,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Size => "size",
            Self::Modified => "modified",
            Self::Duration => "duration",
            Self::Type => "type",
        }
    }

    fn compare(&self, a: &MediaNode, b: &MediaNode) -> Ordering {
        match self {
            Self::Name => compare_names(&a.name, &b.name),
            Self::Size => a.size.cmp(&b.size),
            Self::Modified => a.modified.cmp(&b.modified),
            Self::Duration => a.duration.unwrap_or(0.0).total_cmp(&b.duration.unwrap_or(0.0)),
            Self::Type => (!a.is_folder(), a.kind.as_str())
                .cmp(&(!b.is_folder(), b.kind.as_str()))
                .then_with(|| compare_names(&a.name, &b.name)),
        }
    }
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortKey {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            "modified" => Ok(Self::Modified),
            "duration" => Ok(Self::Duration),
            "type" => Ok(Self::Type),
            _ => Err(ParseParamError {
                param: "sort key",
                value: s.to_string(),
                expected: "name, size, modified, duration, type",
            }),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ParseParamError {
                param: "sort order",
                value: s.to_string(),
                expected: "asc, desc",
            }),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare two names ignoring case, without allocating.
pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    a.chars().flat_map(char::to_lowercase).cmp(b.chars().flat_map(char::to_lowercase))
}

/// Sort one directory level in place. The sort is stable, so nodes that
/// compare equal keep their relative order in both directions.
pub fn sort_nodes(nodes: &mut [MediaNode], key: SortKey, order: SortOrder) {
    match order {
        SortOrder::Asc => nodes.sort_by(|a, b| key.compare(a, b)),
        SortOrder::Desc => nodes.sort_by(|a, b| key.compare(a, b).reverse()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::MediaPath;
    use rstest::rstest;
    use time::{Duration, OffsetDateTime};

    fn file(name: &str, size: u64, age_secs: i64, duration: Option<f64>) -> MediaNode {
        let modified = OffsetDateTime::UNIX_EPOCH + Duration::seconds(1_000_000 - age_secs);
        let mut node = MediaNode::file(MediaPath::root().join(name), lumen_media::classify(name), size, modified);
        node.duration = duration;
        node
    }

    fn sample() -> Vec<MediaNode> {
        vec![
            file("b.mp4", 300, 30, Some(120.0)),
            MediaNode::folder(MediaPath::root().join("Zeta"), OffsetDateTime::UNIX_EPOCH),
            file("A.mp3", 100, 10, None),
            file("c.mkv", 200, 20, Some(60.0)),
            MediaNode::folder(MediaPath::root().join("alpha"), OffsetDateTime::UNIX_EPOCH),
        ]
    }

    fn names(nodes: &[MediaNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[rstest]
    #[case(SortKey::Name, vec!["A.mp3", "alpha", "b.mp4", "c.mkv", "Zeta"])]
    #[case(SortKey::Size, vec!["Zeta", "alpha", "A.mp3", "c.mkv", "b.mp4"])]
    #[case(SortKey::Modified, vec!["Zeta", "alpha", "b.mp4", "c.mkv", "A.mp3"])]
    #[case(SortKey::Duration, vec!["Zeta", "A.mp3", "alpha", "c.mkv", "b.mp4"])]
    #[case(SortKey::Type, vec!["alpha", "Zeta", "A.mp3", "b.mp4", "c.mkv"])]
    fn test_sort_ascending(#[case] key: SortKey, #[case] expected: Vec<&str>) {
        let mut nodes = sample();
        sort_nodes(&mut nodes, key, SortOrder::Asc);
        assert_eq!(names(&nodes), expected);
    }

    #[rstest]
    #[case(SortKey::Name)]
    #[case(SortKey::Size)]
    #[case(SortKey::Modified)]
    #[case(SortKey::Duration)]
    #[case(SortKey::Type)]
    fn test_sort_is_idempotent(#[case] key: SortKey, #[values(SortOrder::Asc, SortOrder::Desc)] order: SortOrder) {
        let mut once = sample();
        sort_nodes(&mut once, key, order);
        let mut twice = once.clone();
        sort_nodes(&mut twice, key, order);
        assert_eq!(once, twice);
    }

    #[rstest]
    #[case(SortKey::Name)]
    #[case(SortKey::Type)]
    fn test_desc_reverses_strict_orderings(#[case] key: SortKey) {
        let mut asc = sample();
        sort_nodes(&mut asc, key, SortOrder::Asc);
        let mut desc = sample();
        sort_nodes(&mut desc, key, SortOrder::Desc);
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_parse_params() {
        assert_eq!("Duration".parse::<SortKey>().unwrap(), SortKey::Duration);
        assert_eq!(" desc ".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        let err = "rating".parse::<SortKey>().unwrap_err();
        assert_eq!(err.to_string(), r#"unknown sort key "rating", expected one of: name, size, modified, duration, type"#);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(SortKey::default(), SortKey::Name);
        assert_eq!(SortOrder::default(), SortOrder::Asc);
        assert_eq!(SortKey::default().to_string(), "name");
    }
}
