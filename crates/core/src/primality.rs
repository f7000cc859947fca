//! Trial-division primality oracle.
//!
//! Deliberately naive: `is_prime(n)` costs O(n) divisions. The dispatch
//! policy exists to keep large inputs off the request path rather than to
//! make the test itself cheaper, so no sieve or probabilistic shortcut is
//! used here.

use std::num::IntErrorKind;
use std::time::Instant;

use crate::types::Candidate;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Why a raw value could not be turned into a [`Candidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseCandidateError {
    /// The text is not an integer at all (`"abc"`, `"1.5"`, `""`).
    NotAnInteger,
    /// The text is a positive integer larger than `Candidate::MAX`.
    TooLarge,
}

/// Parse user input into a candidate integer.
///
/// Surrounding whitespace and a leading `+`/`-` sign are accepted. A positive
/// integer that does not fit in a [`Candidate`] is reported as
/// [`ParseCandidateError::TooLarge`] so callers can reject it on range grounds
/// instead of calling it garbage.
pub fn parse_candidate(raw: &str) -> Result<Candidate, ParseCandidateError> {
    raw.trim().parse::<Candidate>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => ParseCandidateError::TooLarge,
        _ => ParseCandidateError::NotAnInteger,
    })
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

/// Return `true` if `n` is prime.
///
/// `n` is prime iff `n >= 2` and no `i` in `[2, n-1]` divides it. Values
/// below 2 (including 0 and negatives) are not prime.
pub fn is_prime(n: Candidate) -> bool {
    if n < 2 {
        return false;
    }
    for i in 2..n {
        if n % i == 0 {
            return false;
        }
    }
    true
}

/// Divisions between clock reads in [`is_prime_within`].
const DEADLINE_CHECK_INTERVAL: Candidate = 1 << 16;

/// [`is_prime`] that gives up once `deadline` has passed.
///
/// Returns `None` when the answer was not reached in time. The clock is read
/// every [`DEADLINE_CHECK_INTERVAL`] divisions, so the overshoot is bounded
/// by that many divisions.
pub fn is_prime_within(n: Candidate, deadline: Instant) -> Option<bool> {
    if n < 2 {
        return Some(false);
    }
    let mut i: Candidate = 2;
    while i < n {
        let end = i.saturating_add(DEADLINE_CHECK_INTERVAL).min(n);
        for d in i..end {
            if n % d == 0 {
                return Some(false);
            }
        }
        i = end;
        if i < n && Instant::now() >= deadline {
            return None;
        }
    }
    Some(true)
}

/// Untyped entry point: `None` when `raw` cannot be read as an integer.
///
/// Overflowing input is also `None` here; only [`parse_candidate`] tells the
/// two apart.
pub fn check(raw: &str) -> Option<bool> {
    parse_candidate(raw).ok().map(is_prime)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
