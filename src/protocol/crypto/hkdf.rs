use super::CryptoError;
use hkdf::Hkdf;
use sha2::Sha512;

/// HKDF-SHA-512 expand to a 32-byte key, the shape every HAP derivation uses
///
/// # Errors
///
/// Returns error if expansion fails
pub fn sha512(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<[u8; 32], CryptoError> {
    let hkdf = Hkdf::<Sha512>::new(Some(salt), ikm);
    let mut okm = [0u8; 32];
    hkdf.expand(info, &mut okm)
        .map_err(|_| CryptoError::KeyDerivationFailed("HKDF expand failed".into()))?;
    Ok(okm)
}
