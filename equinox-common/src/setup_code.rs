use core::{fmt::Display, str::FromStr};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Pairing password shown to a controller on first pairing, formatted `NNN-NN-NNN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SetupCode(CompactString);

impl SetupCode {
    /// Checked during const evaluation, so a malformed constant fails the build.
    pub const fn const_new(code: &'static str) -> Self {
        if validate(code.as_bytes()).is_err() {
            panic!("setup code must have the form NNN-NN-NNN");
        }

        Self(CompactString::const_new(code))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Codes made of one repeated digit, or the two obvious sequences, which HAP
    /// discourages because controllers can guess them.
    pub fn is_trivial(&self) -> bool {
        let mut digits = self.0.bytes().filter(u8::is_ascii_digit);
        let first = digits.next();

        digits.all(|d| Some(d) == first)
            || self.as_str() == "123-45-678"
            || self.as_str() == "876-54-321"
    }
}

const fn validate(code: &[u8]) -> Result<(), &'static str> {
    if code.len() != 10 {
        return Err("setup code must be 10 characters long");
    }

    let mut i = 0;
    while i < code.len() {
        match i {
            3 | 6 if code[i] != b'-' => return Err("expected '-' after digit groups"),
            3 | 6 => {}
            _ if !code[i].is_ascii_digit() => return Err("setup code digits must be 0-9"),
            _ => {}
        }
        i += 1;
    }

    Ok(())
}

impl FromStr for SetupCode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s.as_bytes())?;
        Ok(SetupCode(s.into()))
    }
}

impl<'de> Deserialize<'de> for SetupCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;

        CompactString::deserialize(deserializer)?
            .parse()
            .map_err(D::Error::custom)
    }
}

impl Display for SetupCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
