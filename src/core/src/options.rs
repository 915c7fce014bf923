//! # Sketch parameters
//!
//! The options record is held by the component, edited through form
//! controls and sent verbatim to the worker with every sketching request.
//! Its semantics belong to the sketching collaborator: values are passed
//! through without range checks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{Error, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TypedBuilder)]
#[serde(default)]
pub struct SketchOptions {
    #[builder(default = 0)]
    pub num: u32,

    #[builder(default = 51)]
    pub ksize: u32,

    #[builder(default = false)]
    pub is_protein: bool,

    #[builder(default = false)]
    pub dayhoff: bool,

    #[builder(default = false)]
    pub hp: bool,

    #[builder(default = 42)]
    pub seed: u64,

    #[builder(default = 10_000)]
    pub scaled: u64,

    #[builder(default = true)]
    pub track_abundance: bool,
}

impl Default for SketchOptions {
    fn default() -> SketchOptions {
        SketchOptions::builder().build()
    }
}

/// Molecule type the worker hashes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moltype {
    Dna,
    Protein,
    Dayhoff,
    Hp,
}

impl fmt::Display for Moltype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Moltype::Dna => "dna",
                Moltype::Protein => "protein",
                Moltype::Dayhoff => "dayhoff",
                Moltype::Hp => "hp",
            }
        )
    }
}

/// Names of the fields in [`SketchOptions`], as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Num,
    Ksize,
    IsProtein,
    Dayhoff,
    Hp,
    Seed,
    Scaled,
    TrackAbundance,
}

impl OptionKey {
    pub const ALL: [OptionKey; 8] = [
        OptionKey::Num,
        OptionKey::Ksize,
        OptionKey::IsProtein,
        OptionKey::Dayhoff,
        OptionKey::Hp,
        OptionKey::Seed,
        OptionKey::Scaled,
        OptionKey::TrackAbundance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::Num => "num",
            OptionKey::Ksize => "ksize",
            OptionKey::IsProtein => "is_protein",
            OptionKey::Dayhoff => "dayhoff",
            OptionKey::Hp => "hp",
            OptionKey::Seed => "seed",
            OptionKey::Scaled => "scaled",
            OptionKey::TrackAbundance => "track_abundance",
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(
            self,
            OptionKey::IsProtein | OptionKey::Dayhoff | OptionKey::Hp | OptionKey::TrackAbundance
        )
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        OptionKey::ALL
            .iter()
            .find(|key| key.as_str() == name)
            .copied()
            .ok_or_else(|| Error::UnknownOption { name: name.into() })
    }
}

/// What a form control reports when it changes.
#[derive(Debug, Clone, PartialEq)]
pub enum FormInput {
    /// A checkbox, carrying its checked state.
    Checkbox(bool),
    /// Any other control, carrying its raw string value.
    Value(String),
}

impl FormInput {
    fn invalid(&self, key: OptionKey) -> Error {
        Error::InvalidOptionValue {
            name: key.to_string(),
            value: match self {
                FormInput::Value(raw) => raw.clone(),
                FormInput::Checkbox(checked) => checked.to_string(),
            },
        }
    }

    fn integer<T: TryFrom<u64>>(&self, key: OptionKey) -> Result<T> {
        let value = match self {
            FormInput::Checkbox(checked) => Some(u64::from(*checked)),
            FormInput::Value(raw) => parse_integer(raw),
        };
        value
            .and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| self.invalid(key))
    }

    fn flag(&self, key: OptionKey) -> Result<bool> {
        match self {
            FormInput::Checkbox(checked) => Ok(*checked),
            FormInput::Value(raw) => parse_number(raw)
                .map(|v| v != 0.0)
                .ok_or_else(|| self.invalid(key)),
        }
    }
}

// An empty control reads as zero, like a cleared number input.
fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0.0);
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

// Plain digits are parsed exactly; forms like `1e3` or `21.0` go through
// f64 and must land on a whole number inside the u64 range.
fn parse_integer(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<u64>() {
        return Some(value);
    }
    parse_number(trimmed)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v < u64::MAX as f64)
        .map(|v| v as u64)
}

impl SketchOptions {
    /// Store a form input into the field named by `key`.
    ///
    /// Checkboxes store their checked state, everything else the numeric
    /// parse of the control value. On error the record is left untouched.
    pub fn apply(&mut self, key: OptionKey, input: &FormInput) -> Result<()> {
        if key.is_flag() {
            let flag = input.flag(key)?;
            match key {
                OptionKey::IsProtein => self.is_protein = flag,
                OptionKey::Dayhoff => self.dayhoff = flag,
                OptionKey::Hp => self.hp = flag,
                OptionKey::TrackAbundance => self.track_abundance = flag,
                _ => unreachable!("non-flag key {}", key),
            }
            return Ok(());
        }

        match key {
            OptionKey::Num => self.num = input.integer(key)?,
            OptionKey::Ksize => self.ksize = input.integer(key)?,
            OptionKey::Seed => self.seed = input.integer(key)?,
            OptionKey::Scaled => self.scaled = input.integer(key)?,
            _ => unreachable!("flag key {}", key),
        }
        Ok(())
    }

    // TODO: at most one of (is_protein, dayhoff, hp) should be true
    pub fn moltype(&self) -> Moltype {
        if self.dayhoff {
            Moltype::Dayhoff
        } else if self.hp {
            Moltype::Hp
        } else if self.is_protein {
            Moltype::Protein
        } else {
            Moltype::Dna
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_match_component() {
        let opts = SketchOptions::default();
        assert_eq!(opts.num, 0);
        assert_eq!(opts.ksize, 51);
        assert_eq!(opts.seed, 42);
        assert_eq!(opts.scaled, 10_000);
        assert!(opts.track_abundance);
        assert!(!opts.is_protein && !opts.dayhoff && !opts.hp);
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_value(SketchOptions::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "num": 0,
                "ksize": 51,
                "is_protein": false,
                "dayhoff": false,
                "hp": false,
                "seed": 42,
                "scaled": 10000,
                "track_abundance": true,
            })
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let opts: SketchOptions = serde_json::from_str(r#"{"ksize": 21}"#).unwrap();
        assert_eq!(opts.ksize, 21);
        assert_eq!(opts.scaled, 10_000);
    }

    #[test]
    fn keys_roundtrip_names() {
        for key in OptionKey::ALL {
            assert_eq!(key.as_str().parse::<OptionKey>().unwrap(), key);
        }
        assert_matches!(
            "kmer".parse::<OptionKey>(),
            Err(Error::UnknownOption { name }) if name == "kmer"
        );
    }

    #[test]
    fn checkbox_stores_checked_state() {
        let mut opts = SketchOptions::default();
        opts.apply(OptionKey::TrackAbundance, &FormInput::Checkbox(false))
            .unwrap();
        assert!(!opts.track_abundance);
        opts.apply(OptionKey::IsProtein, &FormInput::Checkbox(true))
            .unwrap();
        assert!(opts.is_protein);
    }

    #[test]
    fn value_stores_numeric_parse() {
        let mut opts = SketchOptions::default();
        opts.apply(OptionKey::Ksize, &FormInput::Value("21".into()))
            .unwrap();
        opts.apply(OptionKey::Scaled, &FormInput::Value(" 1000 ".into()))
            .unwrap();
        assert_eq!(opts.ksize, 21);
        assert_eq!(opts.scaled, 1000);
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let mut opts = SketchOptions::default();
        opts.apply(OptionKey::Ksize, &FormInput::Value("0".into()))
            .unwrap();
        opts.apply(OptionKey::Scaled, &FormInput::Value("".into()))
            .unwrap();
        assert_eq!(opts.ksize, 0);
        assert_eq!(opts.scaled, 0);
    }

    #[test]
    fn unparsable_value_leaves_record_unchanged() {
        let mut opts = SketchOptions::default();
        let res = opts.apply(OptionKey::Ksize, &FormInput::Value("abc".into()));
        assert_matches!(res, Err(Error::InvalidOptionValue { .. }));
        let res = opts.apply(OptionKey::Seed, &FormInput::Value("-3".into()));
        assert_matches!(res, Err(Error::InvalidOptionValue { .. }));
        let res = opts.apply(OptionKey::Num, &FormInput::Value("1e12".into()));
        assert_matches!(res, Err(Error::InvalidOptionValue { .. }));
        let res = opts.apply(OptionKey::Seed, &FormInput::Value("1e30".into()));
        assert_matches!(res, Err(Error::InvalidOptionValue { .. }));
        let res = opts.apply(OptionKey::Scaled, &FormInput::Value("18446744073709551616".into()));
        assert_matches!(res, Err(Error::InvalidOptionValue { .. }));
        let res = opts.apply(OptionKey::Ksize, &FormInput::Value("2.5".into()));
        assert_matches!(res, Err(Error::InvalidOptionValue { .. }));
        assert_eq!(opts, SketchOptions::default());
    }

    #[test]
    fn large_integers_are_exact() {
        let mut opts = SketchOptions::default();
        opts.apply(OptionKey::Scaled, &FormInput::Value("9007199254740993".into()))
            .unwrap();
        assert_eq!(opts.scaled, 9_007_199_254_740_993);
        opts.apply(OptionKey::Seed, &FormInput::Value("18446744073709551615".into()))
            .unwrap();
        assert_eq!(opts.seed, u64::MAX);
        opts.apply(OptionKey::Ksize, &FormInput::Value("2.1e1".into()))
            .unwrap();
        assert_eq!(opts.ksize, 21);
    }

    #[test]
    fn checkbox_on_numeric_field() {
        let mut opts = SketchOptions::default();
        opts.apply(OptionKey::Num, &FormInput::Checkbox(true))
            .unwrap();
        assert_eq!(opts.num, 1);
        opts.apply(OptionKey::Scaled, &FormInput::Checkbox(false))
            .unwrap();
        assert_eq!(opts.scaled, 0);
    }

    #[test]
    fn value_on_flag_field() {
        let mut opts = SketchOptions::default();
        opts.apply(OptionKey::Hp, &FormInput::Value("0".into()))
            .unwrap();
        assert!(!opts.hp);
        opts.apply(OptionKey::Hp, &FormInput::Value("0.5".into()))
            .unwrap();
        assert!(opts.hp);
        opts.apply(OptionKey::TrackAbundance, &FormInput::Value("".into()))
            .unwrap();
        assert!(!opts.track_abundance);
        let res = opts.apply(OptionKey::Dayhoff, &FormInput::Value("yes".into()));
        assert_matches!(res, Err(Error::InvalidOptionValue { .. }));
        assert!(!opts.dayhoff);
    }

    #[test]
    fn moltype_precedence() {
        let mut opts = SketchOptions::default();
        assert_eq!(opts.moltype(), Moltype::Dna);
        opts.is_protein = true;
        assert_eq!(opts.moltype(), Moltype::Protein);
        opts.hp = true;
        assert_eq!(opts.moltype(), Moltype::Hp);
        opts.dayhoff = true;
        assert_eq!(opts.moltype(), Moltype::Dayhoff);
    }
}
