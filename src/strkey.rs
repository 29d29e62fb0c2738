// ============================================================================
// WORD-PAYMENTS - StrKey Encoding/Decoding
// ============================================================================
// Stellar "StrKey" codec: version byte + payload + CRC16 checksum, base32.
// Account ids are G... strings, secret seeds are S... strings; both wrap the
// same 32 raw Ed25519 key bytes.
// ============================================================================

use crate::error::DistributionError;
use crate::Result;

/// Version byte for G... account ids (6 << 3 = 48)
const VERSION_ACCOUNT_ID: u8 = 6 << 3;

/// Version byte for S... secret seeds (18 << 3 = 144)
const VERSION_SECRET_SEED: u8 = 18 << 3;

/// CRC16-CCITT polynomial
const CRC16_POLY: u16 = 0x1021;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Encode raw Ed25519 public key bytes as a Stellar G... address
pub fn encode_account_id(key_bytes: &[u8; 32]) -> String {
    encode_check(VERSION_ACCOUNT_ID, key_bytes)
}

/// Decode a Stellar G... address to raw Ed25519 public key bytes
pub fn decode_account_id(address: &str) -> Result<[u8; 32]> {
    if !address.starts_with('G') {
        return Err(DistributionError::InvalidAddress(
            "Must start with 'G'".to_string(),
        ));
    }

    if address.len() != 56 {
        return Err(DistributionError::InvalidAddress(format!(
            "Expected 56 chars, got {}",
            address.len()
        )));
    }

    decode_check(VERSION_ACCOUNT_ID, address).map_err(|reason| {
        DistributionError::InvalidAddress(reason.to_string())
    })
}

/// Encode raw Ed25519 seed bytes as a Stellar S... secret seed
pub fn encode_secret_seed(seed_bytes: &[u8; 32]) -> String {
    encode_check(VERSION_SECRET_SEED, seed_bytes)
}

/// Decode a Stellar S... secret seed to raw Ed25519 seed bytes.
///
/// Errors stay deliberately vague: seed material never shows up in messages.
pub fn decode_secret_seed(secret: &str) -> Result<[u8; 32]> {
    if !secret.starts_with('S') || secret.len() != 56 {
        return Err(DistributionError::InvalidSecretSeed);
    }

    decode_check(VERSION_SECRET_SEED, secret)
        .map_err(|_| DistributionError::InvalidSecretSeed)
}

// ============================================================================
// CHECKED ENCODING
// ============================================================================

fn encode_check(version: u8, key_bytes: &[u8; 32]) -> String {
    // Payload: version byte + key + CRC16 (little-endian)
    let mut payload = Vec::with_capacity(35);
    payload.push(version);
    payload.extend_from_slice(key_bytes);

    let checksum = crc16(&payload);
    payload.push((checksum & 0xFF) as u8);
    payload.push((checksum >> 8) as u8);

    base32_encode(&payload)
}

fn decode_check(version: u8, input: &str) -> std::result::Result<[u8; 32], &'static str> {
    let decoded = base32_decode(input).ok_or("invalid base32 character")?;

    if decoded.len() != 35 {
        return Err("invalid decoded length");
    }

    if decoded[0] != version {
        return Err("invalid version byte");
    }

    let stored_checksum = (decoded[33] as u16) | ((decoded[34] as u16) << 8);
    let calculated_checksum = crc16(&decoded[0..33]);
    if stored_checksum != calculated_checksum {
        return Err("checksum mismatch");
    }

    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&decoded[1..33]);
    Ok(key_bytes)
}

// ============================================================================
// BASE32 (RFC 4648 alphabet, no padding)
// ============================================================================

const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

fn base32_encode(data: &[u8]) -> String {
    let mut result = String::new();
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in data {
        buffer = (buffer << 8) | (byte as u64);
        bits_in_buffer += 8;

        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let index = ((buffer >> bits_in_buffer) & 0x1F) as usize;
            result.push(BASE32_ALPHABET[index] as char);
        }
    }

    if bits_in_buffer > 0 {
        let index = ((buffer << (5 - bits_in_buffer)) & 0x1F) as usize;
        result.push(BASE32_ALPHABET[index] as char);
    }

    result
}

fn base32_decode(encoded: &str) -> Option<Vec<u8>> {
    let mut result = Vec::new();
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for c in encoded.chars() {
        let value = match c {
            'A'..='Z' => (c as u8) - b'A',
            '2'..='7' => (c as u8) - b'2' + 26,
            _ => return None,
        };

        buffer = (buffer << 5) | (value as u64);
        bits_in_buffer += 5;

        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            result.push(((buffer >> bits_in_buffer) & 0xFF) as u8);
        }
    }

    Some(result)
}

// ============================================================================
// CRC16-CCITT (XModem variant used by Stellar)
// ============================================================================

fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_roundtrip() {
        let key = [7u8; 32];
        let address = encode_account_id(&key);
        assert!(address.starts_with('G'));
        assert_eq!(address.len(), 56);
        assert_eq!(decode_account_id(&address).unwrap(), key);
    }

    #[test]
    fn test_secret_seed_roundtrip() {
        let seed = [42u8; 32];
        let secret = encode_secret_seed(&seed);
        assert!(secret.starts_with('S'));
        assert_eq!(secret.len(), 56);
        assert_eq!(decode_secret_seed(&secret).unwrap(), seed);
    }

    #[test]
    fn test_known_zero_vectors() {
        assert_eq!(
            encode_account_id(&[0u8; 32]),
            "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF"
        );
        assert_eq!(
            encode_secret_seed(&[0u8; 32]),
            "SAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABSU2"
        );
    }

    #[test]
    fn test_known_live_address() {
        // Address from the Stellar docs, checksum included
        let address = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";
        let key = decode_account_id(address).unwrap();
        assert_eq!(encode_account_id(&key), address);
    }

    #[test]
    fn test_rejects_wrong_prefix() {
        let seed_as_address = encode_secret_seed(&[1u8; 32]);
        assert!(decode_account_id(&seed_as_address).is_err());

        let address_as_seed = encode_account_id(&[1u8; 32]);
        assert!(matches!(
            decode_secret_seed(&address_as_seed),
            Err(DistributionError::InvalidSecretSeed)
        ));
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(decode_account_id("GAAAA").is_err());
        assert!(decode_secret_seed("SAAAA").is_err());
    }

    #[test]
    fn test_rejects_corrupted_checksum() {
        let mut address = encode_account_id(&[9u8; 32]);
        // Flip the final character to break the checksum
        let last = address.pop().unwrap();
        let replacement = if last == 'A' { 'B' } else { 'A' };
        address.push(replacement);

        assert!(decode_account_id(&address).is_err());
    }

    #[test]
    fn test_rejects_invalid_base32() {
        let address = format!("G{}", "0".repeat(55));
        assert!(decode_account_id(&address).is_err());
    }
}
