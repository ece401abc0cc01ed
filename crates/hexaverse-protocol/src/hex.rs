use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Cube coordinates for a hex grid. Invariant: `q + r + s == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CubeCoord {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoordError {
    #[error("cube invariant violated: {0} + {1} + {2} != 0")]
    Invariant(i32, i32, i32),
    #[error("malformed coordinate key: {0:?}")]
    MalformedKey(String),
}

impl CubeCoord {
    pub const ORIGIN: CubeCoord = CubeCoord { q: 0, r: 0, s: 0 };

    pub const DIRECTIONS: [CubeCoord; 6] = [
        CubeCoord { q: 1, r: -1, s: 0 },
        CubeCoord { q: 0, r: -1, s: 1 },
        CubeCoord { q: -1, r: 0, s: 1 },
        CubeCoord { q: -1, r: 1, s: 0 },
        CubeCoord { q: 0, r: 1, s: -1 },
        CubeCoord { q: 1, r: 0, s: -1 },
    ];

    /// Checked constructor; rejects coordinates off the `q + r + s == 0` plane.
    pub fn new(q: i32, r: i32, s: i32) -> Result<CubeCoord, CoordError> {
        if Self::is_valid(q, r, s) {
            Ok(CubeCoord { q, r, s })
        } else {
            Err(CoordError::Invariant(q, r, s))
        }
    }

    /// Construct from axial coordinates; `s` is implied.
    #[inline]
    pub const fn axial(q: i32, r: i32) -> CubeCoord {
        CubeCoord { q, r, s: -q - r }
    }

    #[inline]
    pub const fn is_valid(q: i32, r: i32, s: i32) -> bool {
        q + r + s == 0
    }

    pub fn neighbors(self) -> impl Iterator<Item = CubeCoord> {
        Self::DIRECTIONS.into_iter().map(move |d| self + d)
    }

    #[inline]
    pub fn distance(self, other: CubeCoord) -> i32 {
        ((self.q - other.q).abs() + (self.r - other.r).abs() + (self.s - other.s).abs()) / 2
    }

    /// Canonical string key, `"q,r,s"`. Reversible via [`FromStr`].
    pub fn key(self) -> String {
        self.to_string()
    }

    /// Pointy-top projection to pixel space for a given hex size.
    pub fn to_pixel(self, size: f64) -> (f64, f64) {
        let x = size * (SQRT_3 * self.q as f64 + SQRT_3 / 2.0 * self.r as f64);
        let y = size * (1.5 * self.r as f64);
        (x, y)
    }

    /// Inverse pointy-top projection; snaps to the nearest hex via [`CubeCoord::round`].
    pub fn from_pixel(x: f64, y: f64, size: f64) -> CubeCoord {
        let fq = (SQRT_3 / 3.0 * x - y / 3.0) / size;
        let fr = (2.0 / 3.0 * y) / size;
        Self::round(fq, fr, -fq - fr)
    }

    /// Round fractional cube coordinates to the containing hex.
    ///
    /// The axis with the strictly largest rounding error is discarded and
    /// recomputed from the other two; q takes precedence over r, r over s.
    pub fn round(fq: f64, fr: f64, fs: f64) -> CubeCoord {
        let mut q = fq.round();
        let mut r = fr.round();
        let mut s = fs.round();

        let dq = (q - fq).abs();
        let dr = (r - fr).abs();
        let ds = (s - fs).abs();

        if dq > dr && dq > ds {
            q = -r - s;
        } else if dr > ds {
            r = -q - s;
        } else {
            s = -q - r;
        }

        CubeCoord {
            q: q as i32,
            r: r as i32,
            s: s as i32,
        }
    }
}

const SQRT_3: f64 = 1.732_050_807_568_877_2;

impl std::ops::Add for CubeCoord {
    type Output = CubeCoord;

    fn add(self, other: CubeCoord) -> CubeCoord {
        CubeCoord {
            q: self.q + other.q,
            r: self.r + other.r,
            s: self.s + other.s,
        }
    }
}

impl fmt::Display for CubeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.q, self.r, self.s)
    }
}

impl FromStr for CubeCoord {
    type Err = CoordError;

    fn from_str(key: &str) -> Result<CubeCoord, CoordError> {
        let malformed = || CoordError::MalformedKey(key.to_string());
        let mut parts = key.split(',');
        let mut next = || -> Result<i32, CoordError> {
            parts
                .next()
                .and_then(|p| p.trim().parse().ok())
                .ok_or_else(malformed)
        };
        let (q, r, s) = (next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(malformed());
        }
        CubeCoord::new(q, r, s)
    }
}

// Hand-written so wire data violating the cube invariant is rejected at
// parse time rather than propagating into the tile state.
impl<'de> Deserialize<'de> for CubeCoord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            q: i32,
            r: i32,
            s: i32,
        }
        let raw = Raw::deserialize(deserializer)?;
        CubeCoord::new(raw.q, raw.r, raw.s).map_err(serde::de::Error::custom)
    }
}
