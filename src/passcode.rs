//! APRS-IS verification passcodes.
//!
//! A passcode is a 15-bit hash of the base callsign, the same one computed by
//! APRS-IS servers such as aprsc. It is a convention for identifying licensed
//! stations, not a security mechanism.

const SEED: u16 = 0x73e2;

/// Passcode that asks the server for an unverified (receive-only) login.
pub const UNVERIFIED: i32 = -1;

/// Generate the passcode for a callsign. Case and any `-SSID` suffix are ignored.
pub fn generate(callsign: &str) -> u16 {
    let call = callsign.to_uppercase();
    let base = call.split('-').next().unwrap_or_default();

    let mut pass = SEED;
    for pair in base.as_bytes().chunks(2) {
        pass ^= u16::from(pair[0]) << 8;
        if let Some(&lo) = pair.get(1) {
            pass ^= u16::from(lo);
        }
    }

    // Mask off the high bit so the number is always positive
    pass & 0x7fff
}
