//! Default id generator.

use chrono::Utc;
use rand::Rng;

use ledger_types::IdGenerator;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RANDOM_LEN: usize = 6;

/// Produces `PREFIX_<base36 millis><6 random base36 chars>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixedIdGenerator;

impl PrefixedIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for PrefixedIdGenerator {
    fn new_id(&self, prefix: &str) -> String {
        let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let mut rng = rand::rng();
        let random: String = (0..RANDOM_LEN)
            .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
            .collect();

        format!("{}_{}{}", prefix, to_base36(millis), random)
    }
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
