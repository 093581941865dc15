use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{thread_rng, Rng, SeedableRng};

use crate::error::{Error, Result};

/// Optional construction arguments collected from the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionParams {
    pub min: Option<u32>,
    pub max: Option<u32>,
    pub hold: Option<u32>,
}

/// A registry entry: either directly usable, or parameterized and carrying its
/// construction arguments as typed fields. `Shrink` is parameterized by the
/// frame count, which only the driver knows, so it stays unbound until
/// [`FunctionSpec::instantiate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionSpec {
    Identity,
    Cyclic,
    Random,
    RandomSlow,
    RandomBounded { min: u32, max: u32, hold: u32 },
    Shrink,
}

impl FunctionSpec {
    pub fn resolve(name: &str, params: &FunctionParams) -> Result<Self> {
        match name {
            "identity" => Ok(Self::Identity),
            "cyclic" => Ok(Self::Cyclic),
            "random" => Ok(Self::Random),
            "random_slow" => Ok(Self::RandomSlow),
            "random_bounded" => {
                let (Some(min), Some(max), Some(hold)) = (params.min, params.max, params.hold)
                else {
                    return Err(Error::input(
                        "random_bounded requires --min, --max and --hold",
                    ));
                };
                if min > max {
                    return Err(Error::input(format!(
                        "random_bounded requires --min <= --max (got {min} > {max})"
                    )));
                }
                if hold == 0 {
                    return Err(Error::input("random_bounded requires --hold >= 1"));
                }
                Ok(Self::RandomBounded { min, max, hold })
            }
            "shrink" => Ok(Self::Shrink),
            other => Err(Error::UnknownFunction(other.to_string())),
        }
    }

    /// Bind the spec to a concrete run. `frame_count` fixes shrink's horizon at
    /// the last frame index, so the final frame still maps to a positive size.
    pub fn instantiate(&self, frame_count: u64) -> ResolutionFn {
        ResolutionFn(match *self {
            Self::Identity => Kind::Identity,
            Self::Cyclic => Kind::Cyclic,
            Self::Random => Kind::Random,
            Self::RandomSlow => Kind::RandomSlow,
            Self::RandomBounded { min, max, hold } => Kind::RandomBounded { min, max, hold },
            Self::Shrink => Kind::Shrink {
                until: frame_count.saturating_sub(1),
            },
        })
    }
}

/// A concrete per-frame mapping from `(frame index, base dimension)` to a
/// target dimension.
pub struct ResolutionFn(Kind);

enum Kind {
    Identity,
    Cyclic,
    Random,
    RandomSlow,
    RandomBounded { min: u32, max: u32, hold: u32 },
    Shrink { until: u64 },
}

impl ResolutionFn {
    /// May return zero or a negative value (shrink past its horizon); callers
    /// must validate before handing the result to the encoder.
    pub fn dimension(&self, frame: u64, base: u32) -> i64 {
        match self.0 {
            Kind::Identity => i64::from(base),
            Kind::Cyclic => {
                let d = f64::from(base);
                ((d / 4.0) * (frame as f64 / PI).cos() + d * 0.75).ceil() as i64
            }
            Kind::Random => thread_rng().gen_range(2..=320),
            Kind::RandomSlow => seeded_draw(frame / 4, base, 2, 320),
            Kind::RandomBounded { min, max, hold } => {
                seeded_draw(frame / u64::from(hold), base, min, max)
            }
            Kind::Shrink { until } => {
                let remaining = until as i64 + 1 - frame as i64;
                (remaining as f64 * f64::from(base) / (until as f64 + 1.0)).ceil() as i64
            }
        }
    }
}

// Each call builds a fresh RNG from the bucket formula, so a draw depends only
// on (bucket, base) and never on ambient generator state.
fn seeded_draw(bucket: u64, base: u32, min: u32, max: u32) -> i64 {
    let mut rng = StdRng::seed_from_u64(bucket.wrapping_mul(u64::from(base)));
    i64::from(rng.gen_range(min..=max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_direct(name: &str) -> ResolutionFn {
        FunctionSpec::resolve(name, &FunctionParams::default())
            .unwrap()
            .instantiate(0)
    }

    #[test]
    fn identity_returns_base_unchanged() {
        let f = resolve_direct("identity");
        for frame in [0u64, 1, 17, 100_000] {
            assert_eq!(f.dimension(frame, 1), 1);
            assert_eq!(f.dimension(frame, 1080), 1080);
        }
    }

    #[test]
    fn cyclic_stays_within_cosine_envelope() {
        let f = resolve_direct("cyclic");
        for frame in 0..500u64 {
            let v = f.dimension(frame, 240);
            assert!((120..=240).contains(&v), "frame {frame}: {v} out of range");
        }
    }

    #[test]
    fn random_slow_is_reproducible_and_holds_per_bucket() {
        let f = resolve_direct("random_slow");
        assert_eq!(f.dimension(9, 640), f.dimension(9, 640));

        // frames 4..8 share the f/4 bucket for a fixed base
        let first = f.dimension(4, 640);
        for frame in 5..8u64 {
            assert_eq!(f.dimension(frame, 640), first);
        }
    }

    #[test]
    fn random_slow_draws_stay_in_range() {
        let f = resolve_direct("random_slow");
        for frame in 0..200u64 {
            let v = f.dimension(frame, 777);
            assert!((2..=320).contains(&v));
        }
    }

    #[test]
    fn random_bounded_respects_bounds() {
        let spec = FunctionSpec::resolve(
            "random_bounded",
            &FunctionParams {
                min: Some(16),
                max: Some(128),
                hold: Some(3),
            },
        )
        .unwrap();
        let f = spec.instantiate(0);

        let mut rng = thread_rng();
        for _ in 0..10_000 {
            let frame: u64 = rng.gen_range(0..1_000_000);
            let base: u32 = rng.gen_range(1..8192);
            let v = f.dimension(frame, base);
            assert!((16..=128).contains(&v), "frame {frame} base {base}: {v}");
        }
    }

    #[test]
    fn random_bounded_holds_value_for_hold_frames() {
        let spec = FunctionSpec::RandomBounded {
            min: 2,
            max: 320,
            hold: 5,
        };
        let f = spec.instantiate(0);
        let first = f.dimension(10, 480);
        for frame in 11..15u64 {
            assert_eq!(f.dimension(frame, 480), first);
        }
    }

    #[test]
    fn random_bounded_rejects_missing_or_bad_params() {
        let err = FunctionSpec::resolve("random_bounded", &FunctionParams::default()).unwrap_err();
        assert!(err.to_string().contains("--min"), "{err}");

        let err = FunctionSpec::resolve(
            "random_bounded",
            &FunctionParams {
                min: Some(100),
                max: Some(10),
                hold: Some(1),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("--min <= --max"), "{err}");

        let err = FunctionSpec::resolve(
            "random_bounded",
            &FunctionParams {
                min: Some(2),
                max: Some(320),
                hold: Some(0),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("--hold"), "{err}");
    }

    #[test]
    fn shrink_starts_at_base_and_follows_the_series() {
        // Three frames at base 100: the horizon sits on the last index.
        let f = FunctionSpec::Shrink.instantiate(3);
        assert_eq!(f.dimension(0, 100), 100);
        assert_eq!(f.dimension(1, 100), 67);
        assert_eq!(f.dimension(2, 100), 34);
    }

    #[test]
    fn shrink_past_horizon_is_non_positive() {
        let f = FunctionSpec::Shrink.instantiate(3);
        assert!(f.dimension(3, 100) <= 0);
        assert!(f.dimension(50, 100) < 0);
    }

    #[test]
    fn unknown_name_is_rejected_by_name() {
        let err = FunctionSpec::resolve("nonexistent", &FunctionParams::default()).unwrap_err();
        match err {
            Error::UnknownFunction(name) => assert_eq!(name, "nonexistent"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
