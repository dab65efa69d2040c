use crate::obs::sink::{self, DenormEvent};
use std::{
    sync::{LazyLock, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};
use xxhash_rust::xxh3::xxh3_64;

///
/// GENERATOR is lazily initiated with a Mutex
/// it has to keep state so consecutive tokens never repeat
///

static GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

/// Issue a fresh cache-key token from the global generator.
///
/// Tokens are opaque: only "changes on every regeneration,
/// collision-improbable" is promised. The mixing algorithm is not part of
/// any stored format and may change.
#[must_use]
pub fn next_token() -> i64 {
    let token = GENERATOR
        .lock()
        .expect("token generator mutex poisoned")
        .next();
    sink::record(DenormEvent::TokenIssued);

    token
}

///
/// Generator
///
/// Mixes wall-clock milliseconds and a per-process counter through XXH3.
/// The counter advances on every draw, so tokens stay distinct even when
/// the clock stalls or regresses. Zero is reserved: columns default to 0,
/// so 0 always reads as "never issued".
///

struct Generator {
    previous: i64,
    counter: u64,
}

impl Generator {
    const fn new() -> Self {
        Self {
            previous: 0,
            counter: 0,
        }
    }

    fn next(&mut self) -> i64 {
        let millis = now_millis();

        loop {
            self.counter = self.counter.wrapping_add(1);

            let mut buf = [0u8; 16];
            buf[..8].copy_from_slice(&millis.to_be_bytes());
            buf[8..].copy_from_slice(&self.counter.to_be_bytes());

            #[allow(clippy::cast_possible_wrap)]
            let token = (xxh3_64(&buf) & (i64::MAX as u64)) as i64;
            if token != 0 && token != self.previous {
                self.previous = token;

                return token;
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(0))
}

///
/// TESTS
///
