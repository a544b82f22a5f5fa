//! Policy versions, version patterns and id references

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{PdpError, Result};
use crate::identifier::Identifier;

/// Dotted numeric version, e.g. `1.0.3`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Version(Vec<u32>);

impl Version {
    pub fn new(segments: Vec<u32>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }
}

impl Default for Version {
    fn default() -> Self {
        Self(vec![1, 0])
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Version {
    type Err = PdpError;

    fn from_str(s: &str) -> Result<Self> {
        s.split('.')
            .map(|segment| {
                segment
                    .parse::<u32>()
                    .map_err(|_| PdpError::Syntax(format!("Invalid version \"{}\"", s)))
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segments: Vec<String> = self.0.iter().map(u32::to_string).collect();
        f.write_str(&segments.join("."))
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Version {
    type Error = PdpError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Number(u32),
    /// `*`: exactly one segment
    Any,
    /// `+`: one or more segments
    Plus,
}

/// Version pattern such as `1.*.3` or `2.+`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMatch {
    pattern: String,
    segments: Vec<Segment>,
}

impl VersionMatch {
    pub fn matches(&self, version: &Version) -> bool {
        Self::matches_from(&self.segments, version.segments())
    }

    fn matches_from(pattern: &[Segment], version: &[u32]) -> bool {
        match (pattern.split_first(), version.split_first()) {
            (None, None) => true,
            (Some((Segment::Plus, rest)), Some((_, remaining))) => {
                // consume one segment, then either stop consuming or keep going
                Self::matches_from(rest, remaining) || Self::matches_from(pattern, remaining)
            }
            (Some((Segment::Any, rest)), Some((_, remaining))) => Self::matches_from(rest, remaining),
            (Some((Segment::Number(expected), rest)), Some((actual, remaining))) => {
                expected == actual && Self::matches_from(rest, remaining)
            }
            _ => false,
        }
    }
}

impl FromStr for VersionMatch {
    type Err = PdpError;

    fn from_str(s: &str) -> Result<Self> {
        let segments = s
            .split('.')
            .map(|segment| match segment {
                "*" => Ok(Segment::Any),
                "+" => Ok(Segment::Plus),
                number => number
                    .parse::<u32>()
                    .map(Segment::Number)
                    .map_err(|_| PdpError::Syntax(format!("Invalid version match \"{}\"", s))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            pattern: s.to_string(),
            segments,
        })
    }
}

impl fmt::Display for VersionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Whether a reference names a Policy or a PolicySet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    Policy,
    PolicySet,
}

/// Reference to a policy by id with optional version constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdReference {
    pub id: Identifier,
    pub version: Option<VersionMatch>,
    pub earliest_version: Option<VersionMatch>,
    pub latest_version: Option<VersionMatch>,
}

impl IdReference {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self {
            id: id.into(),
            version: None,
            earliest_version: None,
            latest_version: None,
        }
    }

    pub fn with_version(mut self, pattern: &str) -> Result<Self> {
        self.version = Some(pattern.parse()?);
        Ok(self)
    }

    pub fn with_earliest_version(mut self, pattern: &str) -> Result<Self> {
        self.earliest_version = Some(pattern.parse()?);
        Ok(self)
    }

    pub fn with_latest_version(mut self, pattern: &str) -> Result<Self> {
        self.latest_version = Some(pattern.parse()?);
        Ok(self)
    }

    /// Whether `version` of a policy with `id` satisfies this reference.
    ///
    /// Bound patterns are compared segment-wise with wildcards matching
    /// anything.
    pub fn matches(&self, id: &Identifier, version: &Version) -> bool {
        if &self.id != id {
            return false;
        }
        if let Some(pattern) = &self.version {
            if !pattern.matches(version) {
                return false;
            }
        }
        if let Some(earliest) = &self.earliest_version {
            if bound_cmp(earliest, version) == Ordering::Greater {
                return false;
            }
        }
        if let Some(latest) = &self.latest_version {
            if bound_cmp(latest, version) == Ordering::Less {
                return false;
            }
        }
        true
    }
}

/// Compare a bound pattern to a version; wildcard segments compare equal
fn bound_cmp(bound: &VersionMatch, version: &Version) -> Ordering {
    for (segment, actual) in bound.segments.iter().zip(version.segments()) {
        match segment {
            Segment::Number(expected) => match expected.cmp(actual) {
                Ordering::Equal => continue,
                other => return other,
            },
            Segment::Any => continue,
            Segment::Plus => return Ordering::Equal,
        }
    }
    bound.segments.len().cmp(&version.segments().len())
}

impl fmt::Display for IdReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(version) = &self.version {
            write!(f, " version {}", version)?;
        }
        Ok(())
    }
}

/// A policy that contributed to a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyIdentifier {
    pub kind: ReferenceKind,
    pub id: Identifier,
    pub version: Version,
}
