//! Telemetry downlink demo.
//!
//! Feeds a noisy, fragmented byte stream through a framer configured with
//! the CCSDS attached sync marker (0x1ACFFC1D), stripping the marker from
//! each frame via the leading-byte discard.
//!
//! Run with:
//!
//! ```sh
//! cargo run --example telemetry
//! ```

use deframer::{Framer, Outcome, SyncPattern};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut framer = Framer::<String>::builder()
        .name("DOWNLINK")
        .sync_pattern(SyncPattern::from_hex("0x1ACFFC1D")?)
        .discard_leading_bytes(4)
        .build();

    // Chunks as a radio might deliver them: leading noise, then a marker
    // and payload split across two reads.
    let chunks: &[&[u8]] = &[
        b"\xFF\xFF\xFF",
        b"\x1A\xCF\xFC\x1D\x08\x01temp=21.5",
        b"\x1A\xCF",
        b"\xFC\x1D\x08\x02temp=21.7",
    ];

    for chunk in chunks {
        match framer.read(chunk, Some("radio-0".to_string())) {
            Outcome::Data { payload, extra } => {
                println!(
                    "frame from {}: {:02X?}",
                    extra.as_deref().unwrap_or("?"),
                    &payload[..]
                );
            }
            Outcome::Control { signal, .. } => {
                println!("no frame yet ({:?})", signal);
            }
        }
    }

    Ok(())
}
