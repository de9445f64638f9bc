use anyhow::{anyhow, bail, Result};

/// Normalize a public key to its canonical 64-character lowercase hex form.
/// Accepts either an `npub1...` bech32 string or hex directly.
pub fn normalize_pubkey(input: &str) -> Result<String> {
    let input = input.trim();
    if input.starts_with("npub1") {
        return npub_to_hex(input);
    }
    if is_hex_pubkey(input) {
        return Ok(input.to_lowercase());
    }
    bail!("expected an npub or a 64-character hex public key")
}

/// Decode an npub (NIP-19 bech32 public key) to hex
pub fn npub_to_hex(npub: &str) -> Result<String> {
    let (hrp, data) =
        bech32::decode(npub).map_err(|e| anyhow!("invalid npub encoding: {}", e))?;
    if hrp.as_str() != "npub" {
        bail!("unexpected bech32 prefix: {}", hrp);
    }
    if data.len() != 32 {
        bail!("npub payload must be 32 bytes, got {}", data.len());
    }
    Ok(hex::encode(data))
}

fn is_hex_pubkey(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bech32::{Bech32, Hrp};

    // NIP-19 reference vector
    const NPUB: &str = "npub10elfcs4fr0l0r8af98jlmgdh9c8tcxjvz9qkw038js35mp4dma8qzvjptg";
    const HEX: &str = "7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e";

    #[test]
    fn decodes_known_npub() {
        assert_eq!(npub_to_hex(NPUB).unwrap(), HEX);
    }

    #[test]
    fn round_trips_encoded_pubkey() {
        let bytes = hex::decode(HEX).unwrap();
        let npub = bech32::encode::<Bech32>(Hrp::parse("npub").unwrap(), &bytes).unwrap();
        assert_eq!(npub_to_hex(&npub).unwrap(), HEX);
    }

    #[test]
    fn normalize_passes_hex_through_lowercased() {
        let upper = HEX.to_uppercase();
        assert_eq!(normalize_pubkey(&upper).unwrap(), HEX);
        assert_eq!(normalize_pubkey(HEX).unwrap(), HEX);
    }

    #[test]
    fn normalize_decodes_npub() {
        assert_eq!(normalize_pubkey(NPUB).unwrap(), HEX);
    }

    #[test]
    fn rejects_wrong_prefix() {
        let bytes = hex::decode(HEX).unwrap();
        let note = bech32::encode::<Bech32>(Hrp::parse("note").unwrap(), &bytes).unwrap();
        assert!(npub_to_hex(&note).is_err());
    }

    #[test]
    fn rejects_wrong_payload_length() {
        let npub = bech32::encode::<Bech32>(Hrp::parse("npub").unwrap(), &[0u8; 20]).unwrap();
        assert!(npub_to_hex(&npub).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(normalize_pubkey("not-a-key").is_err());
        assert!(normalize_pubkey("npub1qqqq").is_err());
        assert!(normalize_pubkey("").is_err());
        // right length, not hex
        assert!(normalize_pubkey(&"z".repeat(64)).is_err());
    }
}
