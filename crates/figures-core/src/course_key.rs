//! Course identifiers.
//!
//! Two textual forms are accepted:
//! - `course-v1:ORG+COURSE+RUN` (current)
//! - `ORG/COURSE/RUN` (legacy slash form)
//!
//! Parsing is strict; anything else is a malformed id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const V1_PREFIX: &str = "course-v1:";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed course key: {0}")]
pub struct InvalidKeyError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum KeyForm {
    V1,
    Slash,
}

/// Parsed course key. Surrounding whitespace is not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CourseKey {
    org: String,
    course: String,
    run: String,
    form: KeyForm,
}

impl CourseKey {
    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn run(&self) -> &str {
        &self.run
    }
}

fn valid_part(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '~' | '%'))
}

fn split3(s: &str, sep: char) -> Option<(&str, &str, &str)> {
    let mut it = s.split(sep);
    let (a, b, c) = (it.next()?, it.next()?, it.next()?);
    if it.next().is_some() {
        return None;
    }
    Some((a, b, c))
}

impl FromStr for CourseKey {
    type Err = InvalidKeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        let (parts, form) = match s.strip_prefix(V1_PREFIX) {
            Some(rest) => (split3(rest, '+'), KeyForm::V1),
            None => (split3(s, '/'), KeyForm::Slash),
        };
        let (org, course, run) = parts.ok_or_else(|| InvalidKeyError(raw.to_string()))?;
        if !(valid_part(org) && valid_part(course) && valid_part(run)) {
            return Err(InvalidKeyError(raw.to_string()));
        }
        Ok(Self {
            org: org.to_string(),
            course: course.to_string(),
            run: run.to_string(),
            form,
        })
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.form {
            KeyForm::V1 => write!(f, "{V1_PREFIX}{}+{}+{}", self.org, self.course, self.run),
            KeyForm::Slash => write!(f, "{}/{}/{}", self.org, self.course, self.run),
        }
    }
}

impl Serialize for CourseKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CourseKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
