use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::{AppError, AppResult};

/// Media family of a consumed item or recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaFamily {
    Book,
    Movie,
    Tv,
}

impl MediaFamily {
    /// Movies and TV shows are served by the screen catalog
    pub fn is_screen(&self) -> bool {
        matches!(self, MediaFamily::Movie | MediaFamily::Tv)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFamily::Book => "book",
            MediaFamily::Movie => "movie",
            MediaFamily::Tv => "tv",
        }
    }
}

impl Display for MediaFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaFamily {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "book" => Ok(MediaFamily::Book),
            "movie" => Ok(MediaFamily::Movie),
            "tv" => Ok(MediaFamily::Tv),
            other => Err(AppError::InvalidInput(format!(
                "Unknown media family: {}",
                other
            ))),
        }
    }
}

/// Parsed form of a media identifier
///
/// Books are keyed by their bibliographic work key (`/works/OL82563W`),
/// screen media by `<family>_<numeric id>` (`movie_27205`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaId {
    Work(String),
    Screen { family: MediaFamily, external_id: u64 },
}

const WORK_PREFIX: &str = "/works/";

impl MediaId {
    /// Builds the canonical id for a bibliographic work key.
    /// A bare `OL..W` key is normalized to `/works/OL..W`.
    pub fn work(key: &str) -> AppResult<Self> {
        let bare = key.strip_prefix(WORK_PREFIX).unwrap_or(key);
        let valid = bare.len() > 3
            && bare.starts_with("OL")
            && bare.ends_with('W')
            && bare[2..bare.len() - 1].chars().all(|c| c.is_ascii_digit());

        if !valid {
            return Err(AppError::InvalidInput(format!("Invalid work key: {}", key)));
        }

        Ok(MediaId::Work(format!("{}{}", WORK_PREFIX, bare)))
    }

    pub fn screen(family: MediaFamily, external_id: u64) -> Self {
        MediaId::Screen {
            family,
            external_id,
        }
    }

    /// Parses a stored identifier against the family it was recorded under
    pub fn parse(family: MediaFamily, raw: &str) -> AppResult<Self> {
        match family {
            MediaFamily::Book => Self::work(raw),
            MediaFamily::Movie | MediaFamily::Tv => {
                let (prefix, number) = raw.split_once('_').ok_or_else(|| {
                    AppError::InvalidInput(format!("Screen id missing family prefix: {}", raw))
                })?;

                if prefix != family.as_str() {
                    return Err(AppError::InvalidInput(format!(
                        "Screen id {} does not belong to family {}",
                        raw, family
                    )));
                }

                let external_id = number.parse::<u64>().map_err(|_| {
                    AppError::InvalidInput(format!("Screen id has non-numeric part: {}", raw))
                })?;

                Ok(Self::screen(family, external_id))
            }
        }
    }

    pub fn family(&self) -> MediaFamily {
        match self {
            MediaId::Work(_) => MediaFamily::Book,
            MediaId::Screen { family, .. } => *family,
        }
    }
}

impl Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaId::Work(key) => write!(f, "{}", key),
            MediaId::Screen {
                family,
                external_id,
            } => write!(f, "{}_{}", family, external_id),
        }
    }
}
