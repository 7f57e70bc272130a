//! SRP-6a over the RFC 5054 3072-bit group with SHA-512.
//!
//! HAP prescribes the Stanford SRP-6a design with
//! `x = H(s | H(I | ":" | P))` and
//! `M1 = H(H(N) xor H(g), H(I), s, A, B, K)`.
//! Values hashed into `k` and `u` are left-padded to the 384-byte group size.

use super::CryptoError;
use num_bigint::{BigUint, RandomBits};
use num_traits::Zero;
use rand::Rng;
use sha2::{Digest, Sha512};
use zeroize::Zeroize;

/// Group size of rfc5054.3072 in bytes
pub const GROUP_SIZE: usize = 384;

const N_HEX: &[u8] = b"FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E08\
      8A67CC74020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B\
      302B0A6DF25F14374FE1356D6D51C245E485B576625E7EC6F44C42E9\
      A637ED6B0BFF5CB6F406B7EDEE386BFB5A899FA5AE9F24117C4B1FE6\
      49286651ECE45B3DC2007CB8A163BF0598DA48361C55D39A69163FA8\
      FD24CF5F83655D23DCA3AD961C62F356208552BB9ED529077096966D\
      670C354E4ABC9804F1746C08CA18217C32905E462E36CE3BE39E772C\
      180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF695581718\
      3995497CEA956AE515D2261898FA051015728E5A8AAAC42DAD33170D\
      04507A33A85521ABDF1CBA64ECFB850458DBEF0A8AEA71575D060C7D\
      B3970F85A6E1E4C7ABF5AE8CDB0933D71E8C94E04A25619DCEE3D226\
      1AD2EE6BF12FFA06D98A0864D87602733EC86A64521F2B18177B200C\
      BBE117577A615D6C770988C0BAD946E208E24FA074E5AB3143DB5BFC\
      E0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF";

struct Group {
    n: BigUint,
    g: BigUint,
    k: BigUint,
}

impl Group {
    fn rfc5054_3072() -> Result<Self, CryptoError> {
        let n = BigUint::parse_bytes(N_HEX, 16)
            .ok_or_else(|| CryptoError::SrpError("failed to parse group modulus".to_string()))?;
        let g = BigUint::from(5u32);

        // k = H(N, pad(g))
        let k = {
            let mut hasher = Sha512::new();
            hasher.update(n.to_bytes_be());
            hasher.update(pad(&g.to_bytes_be()));
            BigUint::from_bytes_be(&hasher.finalize())
        };

        Ok(Self { n, g, k })
    }
}

fn pad(bytes: &[u8]) -> Vec<u8> {
    let mut padded = vec![0u8; GROUP_SIZE];
    padded[GROUP_SIZE - bytes.len()..].copy_from_slice(bytes);
    padded
}

// x = H(salt, H(username, ":", password))
fn private_key(username: &[u8], password: &[u8], salt: &[u8]) -> BigUint {
    let mut inner = Sha512::new();
    inner.update(username);
    inner.update(b":");
    inner.update(password);
    let h_up = inner.finalize();

    let mut outer = Sha512::new();
    outer.update(salt);
    outer.update(h_up);
    BigUint::from_bytes_be(&outer.finalize())
}

// u = H(pad(A), pad(B))
fn scrambler(a_pub: &BigUint, b_pub: &BigUint) -> BigUint {
    let mut hasher = Sha512::new();
    hasher.update(pad(&a_pub.to_bytes_be()));
    hasher.update(pad(&b_pub.to_bytes_be()));
    BigUint::from_bytes_be(&hasher.finalize())
}

// M1 = H(H(N) xor H(g), H(I), salt, A, B, K)
fn client_proof(
    group: &Group,
    username: &[u8],
    salt: &[u8],
    a_pub_padded: &[u8],
    b_pub: &BigUint,
    session_key: &[u8],
) -> Vec<u8> {
    let hn = Sha512::digest(group.n.to_bytes_be());
    let hg = Sha512::digest(group.g.to_bytes_be());
    let mut hn_xor_hg = [0u8; 64];
    for i in 0..64 {
        hn_xor_hg[i] = hn[i] ^ hg[i];
    }

    let h_user = Sha512::digest(username);

    let mut hasher = Sha512::new();
    hasher.update(hn_xor_hg);
    hasher.update(h_user);
    hasher.update(salt);
    hasher.update(a_pub_padded);
    hasher.update(b_pub.to_bytes_be());
    hasher.update(session_key);
    hasher.finalize().to_vec()
}

/// SRP client half, holding the ephemeral secret until the challenge arrives
pub struct SrpClient {
    group: Group,
    a: BigUint,
    public_key: Vec<u8>,
}

impl SrpClient {
    /// Create a client with a fresh random ephemeral
    ///
    /// # Errors
    ///
    /// Returns error if the group fails to initialise
    pub fn new() -> Result<Self, CryptoError> {
        let group = Group::rfc5054_3072()?;

        let mut rng = rand::thread_rng();
        let a: BigUint = rng.sample(RandomBits::new(256));
        let a = a % &group.n;

        // A = g^a % n, padded to the group size
        let a_pub = group.g.modpow(&a, &group.n);
        let public_key = pad(&a_pub.to_bytes_be());

        Ok(Self {
            group,
            a,
            public_key,
        })
    }

    /// Public key `A`, padded to 384 bytes
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Process the server challenge (salt and `B`), producing the proof
    /// and session key
    ///
    /// # Errors
    ///
    /// Returns error if the server key is invalid
    pub fn process_challenge(
        &self,
        username: &[u8],
        password: &[u8],
        salt: &[u8],
        server_public: &[u8],
    ) -> Result<SrpVerifier, CryptoError> {
        let b_pub = BigUint::from_bytes_be(server_public);
        if (&b_pub % &self.group.n).is_zero() {
            return Err(CryptoError::SrpError("invalid server public key".to_string()));
        }

        let u = scrambler(&BigUint::from_bytes_be(&self.public_key), &b_pub);
        if u.is_zero() {
            return Err(CryptoError::SrpError("scrambler is zero".to_string()));
        }

        let x = private_key(username, password, salt);

        // S = (B - k * g^x) ^ (a + u * x) % n, computed without underflow
        let g_x = self.group.g.modpow(&x, &self.group.n);
        let k_g_x = (&self.group.k * g_x) % &self.group.n;
        let base = if b_pub >= k_g_x {
            (&b_pub - &k_g_x) % &self.group.n
        } else {
            (&self.group.n - (&k_g_x - &b_pub) % &self.group.n) % &self.group.n
        };
        let exp = &self.a + (&u * x);
        let s_shared = base.modpow(&exp, &self.group.n);

        // K = H(S)
        let session_key = Sha512::digest(s_shared.to_bytes_be()).to_vec();

        let m1 = client_proof(
            &self.group,
            username,
            salt,
            &self.public_key,
            &b_pub,
            &session_key,
        );

        Ok(SrpVerifier {
            a_pub: BigUint::from_bytes_be(&self.public_key),
            m1,
            session_key,
        })
    }
}

/// Holds the computed proof and session key while the server proof is awaited
pub struct SrpVerifier {
    a_pub: BigUint,
    m1: Vec<u8>,
    session_key: Vec<u8>,
}

impl SrpVerifier {
    /// Client proof `M1`
    #[must_use]
    pub fn client_proof(&self) -> &[u8] {
        &self.m1
    }

    /// Check the server proof `M2 = H(A, M1, K)`
    ///
    /// # Errors
    ///
    /// Returns error if the proof does not match
    pub fn verify_server(&self, server_proof: &[u8]) -> Result<SessionKey, CryptoError> {
        let mut hasher = Sha512::new();
        hasher.update(self.a_pub.to_bytes_be());
        hasher.update(&self.m1);
        hasher.update(&self.session_key);
        let expected = hasher.finalize();

        if expected.as_slice() != server_proof {
            return Err(CryptoError::SrpError(
                "server proof verification failed".to_string(),
            ));
        }

        Ok(SessionKey {
            key: self.session_key.clone(),
        })
    }
}

/// Negotiated SRP session key `K`, zeroised on drop
pub struct SessionKey {
    key: Vec<u8>,
}

impl SessionKey {
    /// Session key bytes (64, SHA-512 output)
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// SRP server half (accessory side), used by the in-process test accessory
pub struct SrpServer {
    group: Group,
    username: Vec<u8>,
    salt: Vec<u8>,
    v: BigUint,
    b: BigUint,
    b_pub: BigUint,
}

impl SrpServer {
    /// Create a server for the given credentials with a fresh ephemeral
    ///
    /// # Errors
    ///
    /// Returns error if the group fails to initialise
    pub fn new(username: &[u8], password: &[u8], salt: &[u8]) -> Result<Self, CryptoError> {
        let group = Group::rfc5054_3072()?;

        let x = private_key(username, password, salt);
        let v = group.g.modpow(&x, &group.n);

        let mut rng = rand::thread_rng();
        let b: BigUint = rng.sample(RandomBits::new(256));
        let b = b % &group.n;

        // B = (k*v + g^b) % n
        let b_pub = ((&group.k * &v) + group.g.modpow(&b, &group.n)) % &group.n;

        Ok(Self {
            group,
            username: username.to_vec(),
            salt: salt.to_vec(),
            v,
            b,
            b_pub,
        })
    }

    /// Public key `B`, padded to 384 bytes
    #[must_use]
    pub fn public_key(&self) -> Vec<u8> {
        pad(&self.b_pub.to_bytes_be())
    }

    /// Verify the client proof and, on success, return `(M2, K)`
    ///
    /// # Errors
    ///
    /// Returns error if the client key or proof is invalid
    pub fn verify_client(
        &self,
        client_public: &[u8],
        client_m1: &[u8],
    ) -> Result<(Vec<u8>, SessionKey), CryptoError> {
        let a_pub = BigUint::from_bytes_be(client_public);
        if (&a_pub % &self.group.n).is_zero() {
            return Err(CryptoError::SrpError("invalid client public key".to_string()));
        }

        let u = scrambler(&a_pub, &self.b_pub);

        // S = (A * v^u) ^ b % n
        let s_shared =
            ((&a_pub * self.v.modpow(&u, &self.group.n)) % &self.group.n).modpow(&self.b, &self.group.n);
        let session_key = Sha512::digest(s_shared.to_bytes_be()).to_vec();

        let expected_m1 = client_proof(
            &self.group,
            &self.username,
            &self.salt,
            &pad(&a_pub.to_bytes_be()),
            &self.b_pub,
            &session_key,
        );
        if expected_m1 != client_m1 {
            return Err(CryptoError::SrpError("client proof invalid".to_string()));
        }

        // M2 = H(A, M1, K)
        let mut hasher = Sha512::new();
        hasher.update(a_pub.to_bytes_be());
        hasher.update(client_m1);
        hasher.update(&session_key);
        let m2 = hasher.finalize().to_vec();

        Ok((m2, SessionKey { key: session_key }))
    }
}
