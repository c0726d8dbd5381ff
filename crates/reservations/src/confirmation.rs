//! Human-readable booking codes such as `DB-7KQ2M9XA`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use dreambook_core::{DomainError, DomainResult};

const PREFIX: &str = "DB-";
const CODE_LENGTH: usize = 8;
/// Upper-case letters and digits without the look-alikes 0/O and 1/I.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const MAX_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationNumber(String);

impl ConfirmationNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ConfirmationNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn generate_confirmation_number<R: Rng + ?Sized>(rng: &mut R) -> ConfirmationNumber {
    let code: String = (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    ConfirmationNumber(format!("{PREFIX}{code}"))
}

/// Draw codes until one is not `taken`.
pub fn unique_confirmation_number<R, F>(rng: &mut R, taken: F) -> DomainResult<ConfirmationNumber>
where
    R: Rng + ?Sized,
    F: Fn(&ConfirmationNumber) -> bool,
{
    for _ in 0..MAX_ATTEMPTS {
        let candidate = generate_confirmation_number(rng);
        if !taken(&candidate) {
            return Ok(candidate);
        }
    }
    Err(DomainError::conflict(
        "could not allocate a unique confirmation number",
    ))
}
